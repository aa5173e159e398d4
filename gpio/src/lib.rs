//! GPIO line abstraction used by the LCD1602 driver.
//!
//! A [GpioDriver] hands out single [GpioLine]s by their offset on a chip. Every line can be switched
//! between input and output at runtime, which the busy-flag read of the display needs.
//!
//! Backends:
//! - [gpiod::GpiodDriver] for the Linux GPIO character device,
//! - [sim::SimDriver], an in-memory chip that records everything done to it.
pub mod gpiod;
pub mod sim;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("line already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("line is not configured as {0:?}")]
    WrongDirection(GpioDirection),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Direction of a single GPIO line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDirection {
    Input,
    #[default] Output,
}

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn count(&self) -> GpioResult<usize>;

    /// Requests the line at the given offset, configured in the given direction.
    ///
    /// Output lines start driven low. The line is released when the returned handle is dropped.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the offset is out of range.
    /// - `GpioError::AlreadyInUse` if the line is held by another handle.
    fn get_line(&self, index: usize, direction: GpioDirection) -> GpioResult<Box<dyn GpioLine + '_>>;
}

/// One physical line, owned for as long as the handle lives.
pub trait GpioLine: Debug + Send {
    /// Gets the offset of the line on its chip.
    fn index(&self) -> usize;

    /// Gets the current direction of the line.
    fn direction(&self) -> GpioDirection;

    /// Switches the line to the given direction.
    ///
    /// Switching to output drives the line low. Switching to the current direction is a no-op.
    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()>;

    /// Drives the line. Only valid in output direction.
    fn write(&mut self, value: bool) -> GpioResult<()>;

    /// Reads the line.
    ///
    /// In input direction this samples the pin. In output direction it returns the driven level.
    fn read(&self) -> GpioResult<bool>;
}
