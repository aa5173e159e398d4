//! The display as seen by a host front end: probe once, write text buffers, shut down.
use crate::config::{ControllerConfig, ModuleParams, SessionOptions};
use crate::error::{LcdError, LcdResult};
use crate::provider::LineProvider;
use crate::session::DisplaySession;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use std::sync::Mutex;

/// Largest buffer accepted by [Lcd1602Device::write].
pub const MAX_WRITE_LEN: usize = 63;

/// A probed display.
///
/// The device can be shared between threads. Writes from several callers are serialized on the whole
/// session, so one text is always rendered completely before the next one starts.
#[derive(Debug)]
pub struct Lcd1602Device<'a, D: DelayNs> {
    session: Mutex<DisplaySession<'a, D>>,
}

impl<'a, D: DelayNs> Lcd1602Device<'a, D> {
    /// Takes the lines from `provider`, configures the controller from `params` and clears it.
    pub fn probe<P: LineProvider>(
        provider: &'a P,
        params: ModuleParams,
        delay: D,
        options: SessionOptions,
    ) -> LcdResult<Self> {
        let config = ControllerConfig::try_from(params)?;
        let bus = provider.acquire_bus()?;
        debug!("Bus acquired: {:?}", bus);

        let mut session = DisplaySession::new(bus, delay, options);
        session.configure(config)?;
        session.clear()?;

        info!("LCD1602 ready: {:?}, {:?}", config.line_count, config.font);
        Ok(Lcd1602Device {
            session: Mutex::new(session),
        })
    }

    /// Renders `buf` and returns the number of bytes accepted.
    ///
    /// Buffers longer than [MAX_WRITE_LEN] are refused before anything is sent. Rendering stops at the
    /// first NUL byte, the rest of the buffer is still reported as accepted.
    pub fn write(&self, buf: &[u8]) -> LcdResult<usize> {
        if buf.len() > MAX_WRITE_LEN {
            warn!("Refusing write of {} bytes", buf.len());
            return Err(LcdError::OversizeInput {
                len: buf.len(),
                max: MAX_WRITE_LEN,
            });
        }

        let text = match buf.iter().position(|&c| c == 0) {
            Some(end) => &buf[..end],
            None => buf,
        };

        let mut session = self.session.lock().map_err(|_| LcdError::Failed)?;
        session.write_text(text)?;
        Ok(buf.len())
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut DisplaySession<'a, D>) -> LcdResult<T>) -> LcdResult<T> {
        let mut session = self.session.lock().map_err(|_| LcdError::Failed)?;
        f(&mut session)
    }

    /// Clears the display and releases every line.
    pub fn shutdown(self) -> LcdResult<()> {
        let session = self.session.into_inner().map_err(|_| LcdError::Failed)?;
        session.shutdown()
    }
}
