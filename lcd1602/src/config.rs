//! Controller and session configuration.
use crate::error::SetupError;

/// Width of the data bus. Only [BusWidth::Eight] can be driven by this crate.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BusWidth {
    Four,
    #[default] Eight,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LineCount {
    One,
    #[default] Two,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Font {
    #[default] Font5x7,
    Font5x10,
}

/// Configuration written to the controller by [DisplaySession::configure](crate::DisplaySession::configure).
///
/// The default is the start-up state of the display: 8-bit bus, two lines, 5x7 font, cursor moving
/// right without shifting the display, display and cursor on, cursor blinking.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub bus_width: BusWidth,
    pub line_count: LineCount,
    pub font: Font,
    /// Increment the address counter after each write (cursor moves right).
    pub entry_cursor_move: bool,
    /// Shift the whole display after each write.
    pub entry_display_shift: bool,
    pub display_on: bool,
    pub cursor_on: bool,
    pub cursor_blink: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            bus_width: BusWidth::Eight,
            line_count: LineCount::Two,
            font: Font::Font5x7,
            entry_cursor_move: true,
            entry_display_shift: false,
            display_on: true,
            cursor_on: true,
            cursor_blink: true,
        }
    }
}

/// Start-up parameters as given by the host: font height in pixel rows and number of lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModuleParams {
    pub font_size: u8,
    pub line_no: u8,
}

impl Default for ModuleParams {
    fn default() -> Self {
        ModuleParams {
            font_size: 7,
            line_no: 2,
        }
    }
}

impl TryFrom<ModuleParams> for ControllerConfig {
    type Error = SetupError;

    fn try_from(params: ModuleParams) -> Result<Self, Self::Error> {
        let font = match params.font_size {
            7 => Font::Font5x7,
            10 => Font::Font5x10,
            value => return Err(SetupError::InvalidParameter { name: "font_size", value }),
        };
        let line_count = match params.line_no {
            1 => LineCount::One,
            2 => LineCount::Two,
            value => return Err(SetupError::InvalidParameter { name: "line_no", value }),
        };
        Ok(ControllerConfig {
            font,
            line_count,
            ..ControllerConfig::default()
        })
    }
}

/// What to do when the controller does not clear its busy flag in time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BusyTimeoutPolicy {
    /// Log a warning and send the command anyway.
    #[default] Proceed,
    /// Fail with [LcdError::BusyTimeout](crate::LcdError::BusyTimeout) without sending the command.
    Abort,
}

/// Timing and failure policy of a session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SessionOptions {
    pub busy_timeout: BusyTimeoutPolicy,
    /// Maximum number of busy-flag samples before giving up.
    pub busy_poll_limit: u32,
    pub busy_poll_interval_us: u32,
    pub enable_pulse_us: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        // No command takes longer than 1.64 ms once the controller is up, 165 * 10 us covers it.
        SessionOptions {
            busy_timeout: BusyTimeoutPolicy::Proceed,
            busy_poll_limit: 165,
            busy_poll_interval_us: 10,
            enable_pulse_us: 1,
        }
    }
}
