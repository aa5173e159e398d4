//! Driver for HD44780-compatible character LCDs (LCD1602 modules) on an 8-bit parallel GPIO bus.
//!
//! The pieces, from the pins up:
//! - [bus::ParallelBus] drives the data, RS, RW and E lines,
//! - [busy::BusyWaiter] waits for the busy flag before every command,
//! - [command::Command] encodes controller instructions into bus words,
//! - [glyph] maps text bytes to character ROM addresses,
//! - [DisplaySession] sequences all of the above into display operations,
//! - [Lcd1602Device] is what a host front end talks to.
//!
//! Lines come from a [LineProvider], usually [DriverLines] over a [lcd1602_gpio::GpioDriver].
pub mod bus;
pub mod busy;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod glyph;
pub mod provider;
pub mod session;

pub use bus::{ParallelBus, StdDelay};
pub use config::{BusWidth, BusyTimeoutPolicy, ControllerConfig, Font, LineCount, ModuleParams, SessionOptions};
pub use device::{Lcd1602Device, MAX_WRITE_LEN};
pub use error::{LcdError, LcdResult, SetupError};
pub use provider::{ControlRole, DriverLines, LineProvider, PinMap};
pub use session::{DisplaySession, SessionState};
