mod config;

use crate::config::Config;
use dotenv::dotenv;
use embedded_hal::delay::DelayNs;
use lcd1602::{DriverLines, Lcd1602Device, MAX_WRITE_LEN, StdDelay};
use lcd1602_gpio::gpiod::GpiodDriver;
use log::{debug, info, warn};
use std::io::{ErrorKind, Read};

/// Feeds every chunk read from `input` to the display until end of input.
///
/// Chunks are read with room for one byte over the limit, so oversize writes get rejected by the
/// device rather than silently split. After a rejection, reads are discarded up to and including the
/// next short read, so the tail of an oversize write is never rendered on its own.
fn serve<D: DelayNs>(device: &Lcd1602Device<'_, D>, mut input: impl Read) -> eyre::Result<()> {
    let mut buf = [0u8; MAX_WRITE_LEN + 1];
    let mut discarding = false;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };

        if discarding {
            debug!("Discarded {} bytes of an oversize write", n);
            discarding = n == buf.len();
            continue;
        }

        match device.write(&buf[..n]) {
            Ok(accepted) => debug!("Rendered {} bytes", accepted),
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!("Write rejected: {}", err);
                discarding = n == buf.len();
            }
        }
    }
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("lcd1602d starting...");

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    let params = config.module_params()?;
    let options = config.session_options();
    info!("LCD @ {} RS: {}, RW: {}, E: {}, Data: {:?}",
        config.chip, config.pins.rs, config.pins.rw, config.pins.e, config.pins.data);

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::new(gpiod::Chip::new(&config.chip)?);
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let lines = DriverLines::new(&gpio, config.pins.clone().into());
    let device = Lcd1602Device::probe(&lines, params, StdDelay, options)?;
    info!("LCD initialized, reading text from stdin.");

    let served = serve(&device, std::io::stdin().lock());

    info!("Shutting down...");
    device.shutdown()?;
    served
}
