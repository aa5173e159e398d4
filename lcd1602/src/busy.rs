//! Waiting for the controller to clear its busy flag.
//!
//! Reading the flag means turning DB7 around: it is switched to input, the bus is put in instruction
//! read mode (RS low, RW high) and DB7 is sampled while enable is high. Afterwards RS and RW get their
//! previous levels back and DB7 is driven low again. [StatusRead] owns that sequence so DB7 is
//! restored on every way out, including the timeout and an I/O error in the middle of the poll.
use crate::bus::ParallelBus;
use crate::error::{LcdError, LcdResult};
use embedded_hal::delay::DelayNs;
use lcd1602_gpio::{GpioDirection, GpioResult};
use log::{error, trace};

/// Bounds of the busy-flag poll.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BusyWaiter {
    pub poll_limit: u32,
    pub poll_interval_us: u32,
}

impl BusyWaiter {
    pub fn new(poll_limit: u32, poll_interval_us: u32) -> Self {
        BusyWaiter { poll_limit, poll_interval_us }
    }

    /// Polls the busy flag until it reads low.
    ///
    /// Returns the number of samples taken. A controller that is ready right away costs one sample
    /// and no delay.
    ///
    /// # Errors
    /// - `LcdError::DirectionSwitch` if DB7 could not be made an input. Nothing was changed on the bus.
    /// - `LcdError::DirectionRestore` if DB7 could not be made an output again.
    /// - `LcdError::BusyTimeout` if the flag stayed high for `poll_limit` samples. The bus is restored.
    pub fn wait_ready(&self, bus: &mut ParallelBus<'_>, delay: &mut impl DelayNs) -> LcdResult<u32> {
        let mut status = StatusRead::begin(bus)?;
        let polls = self.poll(&mut status, delay);
        status.finish()?;

        match polls? {
            Some(polls) => Ok(polls),
            None => Err(LcdError::BusyTimeout { polls: self.poll_limit }),
        }
    }

    fn poll(&self, status: &mut StatusRead<'_, '_>, delay: &mut impl DelayNs) -> GpioResult<Option<u32>> {
        for poll in 1..=self.poll_limit {
            if !status.sample()? {
                trace!("Controller ready after {} polls", poll);
                return Ok(Some(poll));
            }
            delay.delay_us(self.poll_interval_us);
        }
        Ok(None)
    }
}

/// Exclusive use of the bus for a status read. Undone by [StatusRead::finish], or on drop.
struct StatusRead<'s, 'a> {
    bus: &'s mut ParallelBus<'a>,
    rs: bool,
    rw: bool,
    restored: bool,
}

impl<'s, 'a> StatusRead<'s, 'a> {
    fn begin(bus: &'s mut ParallelBus<'a>) -> LcdResult<Self> {
        let (rs, rw) = bus.register_lines()?;

        bus.busy_line()
            .set_direction(GpioDirection::Input)
            .map_err(LcdError::DirectionSwitch)?;

        let mut status = StatusRead { bus, rs, rw, restored: false };
        status.bus.set_register_lines(false, true)?;
        Ok(status)
    }

    /// Reads DB7 during one enable strobe.
    fn sample(&mut self) -> GpioResult<bool> {
        self.bus.enable_line().write(true)?;
        let busy = self.bus.busy_line().read();
        self.bus.enable_line().write(false)?;
        busy
    }

    fn restore(&mut self) -> LcdResult<()> {
        self.restored = true;
        let lines = self.bus.set_register_lines(self.rs, self.rw);

        let busy_line = self.bus.busy_line();
        busy_line
            .set_direction(GpioDirection::Output)
            .map_err(LcdError::DirectionRestore)?;
        busy_line.write(false).map_err(LcdError::DirectionRestore)?;

        lines?;
        Ok(())
    }

    fn finish(mut self) -> LcdResult<()> {
        self.restore()
    }
}

impl Drop for StatusRead<'_, '_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(err) = self.restore() {
            error!("Could not restore the bus after a status read: {}", err);
        }
    }
}
