use crate::provider::ControlRole;
use lcd1602_gpio::GpioError;
use thiserror::Error;

/// Errors raised while wiring the display up, before any command is sent.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum SetupError {
    #[error("could not acquire the {role:?} line: {source}")]
    MissingLine { role: ControlRole, source: GpioError },
    #[error("expected {expected} data lines, but found {found}")]
    WrongLineCount { expected: usize, found: usize },
    #[error("could not acquire data line D{bit}: {source}")]
    MissingDataLine { bit: usize, source: GpioError },
    #[error("invalid value {value} for parameter {name}")]
    InvalidParameter { name: &'static str, value: u8 },
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    /// DB7 could not be switched to input for the busy-flag read.
    #[error("could not switch DB7 to input: {0}")]
    DirectionSwitch(GpioError),
    /// DB7 could not be switched back to output. The bus is in an unknown state.
    #[error("could not switch DB7 back to output: {0}")]
    DirectionRestore(GpioError),
    #[error("controller still busy after {polls} polls")]
    BusyTimeout { polls: u32 },
    #[error("input of {len} bytes exceeds the maximum of {max}")]
    OversizeInput { len: usize, max: usize },
    #[error("display is not configured")]
    NotConfigured,
    #[error("display is in a failed state")]
    Failed,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

impl LcdError {
    /// Whether the error leaves the bus untrustworthy, so the session refuses further commands.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LcdError::DirectionSwitch(_) | LcdError::DirectionRestore(_) | LcdError::Failed
        )
    }
}

pub type LcdResult<T> = Result<T, LcdError>;
