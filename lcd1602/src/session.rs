//! A configured display and the operations on it.
use crate::bus::ParallelBus;
use crate::busy::BusyWaiter;
use crate::command::{Command, CursorDirection, DisplayRow, ShiftTarget};
use crate::config::{BusWidth, BusyTimeoutPolicy, ControllerConfig, SessionOptions};
use crate::error::{LcdError, LcdResult};
use crate::glyph;
use embedded_hal::delay::DelayNs;
use log::{debug, error, warn};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Lines are held, but no function set was sent yet.
    Unconfigured,
    Ready,
    /// The bus could not be restored after a status read. Every operation fails from here on.
    Failed,
}

/// Whether `c` moves the cursor to the second row instead of printing.
pub fn is_line_break(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// Owner of the bus of one display.
///
/// Commands are sent one at a time: each waits for the busy flag to clear, puts its word on the bus
/// and pulses enable. A configured session clears the display when dropped.
#[derive(Debug)]
pub struct DisplaySession<'a, D: DelayNs> {
    bus: ParallelBus<'a>,
    delay: D,
    options: SessionOptions,
    waiter: BusyWaiter,
    config: ControllerConfig,
    state: SessionState,
}

impl<'a, D: DelayNs> DisplaySession<'a, D> {
    pub fn new(bus: ParallelBus<'a>, delay: D, options: SessionOptions) -> Self {
        DisplaySession {
            bus,
            delay,
            options,
            waiter: BusyWaiter::new(options.busy_poll_limit, options.busy_poll_interval_us),
            config: ControllerConfig::default(),
            state: SessionState::Unconfigured,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Gets the configuration last written by [Self::configure], or the default before that.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Writes `config` to the controller: function set, display off, display on, entry mode.
    ///
    /// Can be called again at any time to change the configuration; the whole sequence is resent.
    pub fn configure(&mut self, config: ControllerConfig) -> LcdResult<()> {
        if self.state == SessionState::Failed {
            return Err(LcdError::Failed);
        }
        if config.bus_width != BusWidth::Eight {
            return Err(LcdError::Unsupported("4-bit bus"));
        }

        self.issue(Command::FunctionSet {
            width: config.bus_width,
            lines: config.line_count,
            font: config.font,
        })?;
        // Blank while the rest is set up.
        self.issue(Command::DisplayControl {
            on: false,
            cursor: config.cursor_on,
            blink: config.cursor_blink,
        })?;
        self.issue(Command::DisplayControl {
            on: config.display_on,
            cursor: config.cursor_on,
            blink: config.cursor_blink,
        })?;
        self.issue(Command::EntryMode {
            cursor_move: config.entry_cursor_move,
            shift: config.entry_display_shift,
        })?;

        self.config = config;
        if self.state != SessionState::Ready {
            debug!("Display configured: {:?}", config);
            self.state = SessionState::Ready;
        }
        Ok(())
    }

    /// Clears the display and returns the cursor to the first cell.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.ensure_ready()?;
        self.clear_screen()
    }

    /// Returns the cursor to the first cell and undoes any display shift.
    pub fn home(&mut self) -> LcdResult<()> {
        self.ensure_ready()?;
        self.issue(Command::ReturnHome)
    }

    pub fn set_display(&mut self, on: bool, cursor: bool, blink: bool) -> LcdResult<()> {
        self.ensure_ready()?;
        self.issue(Command::DisplayControl { on, cursor, blink })?;
        self.config.display_on = on;
        self.config.cursor_on = cursor;
        self.config.cursor_blink = blink;
        Ok(())
    }

    /// Moves the cursor, or shifts the whole display, by one cell.
    pub fn shift(&mut self, target: ShiftTarget, direction: CursorDirection) -> LcdResult<()> {
        self.ensure_ready()?;
        self.issue(Command::CursorShift { target, direction })
    }

    /// Moves the cursor to the start of `row`.
    pub fn switch_line(&mut self, row: DisplayRow) -> LcdResult<()> {
        self.ensure_ready()?;
        self.issue(Command::SetAddress { row })
    }

    /// Replaces the contents of the display with `text`.
    ///
    /// The display is cleared first. A run of line breaks (`\n` or `\r`) moves the cursor to the start
    /// of the second row once; every other byte is shown as its glyph, or a space if it has none.
    pub fn write_text(&mut self, text: &[u8]) -> LcdResult<()> {
        self.ensure_ready()?;
        self.clear_screen()?;

        let mut after_break = false;
        for &c in text {
            if is_line_break(c) {
                if !after_break {
                    self.issue(Command::SetAddress { row: DisplayRow::Second })?;
                }
                after_break = true;
            } else {
                self.issue(Command::WriteChar { glyph: glyph::lookup(c) })?;
                after_break = false;
            }
        }
        Ok(())
    }

    /// Clears the display and gives the bus back.
    pub fn shutdown(mut self) -> LcdResult<()> {
        let result = self.clear();
        // Nothing left for drop to do.
        self.state = SessionState::Unconfigured;
        debug!("Display shut down");
        result
    }

    fn ensure_ready(&self) -> LcdResult<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Unconfigured => Err(LcdError::NotConfigured),
            SessionState::Failed => Err(LcdError::Failed),
        }
    }

    /// Clear also sets the entry mode to increment, so a decrementing entry mode is sent again.
    fn clear_screen(&mut self) -> LcdResult<()> {
        self.issue(Command::Clear)?;
        if !self.config.entry_cursor_move {
            self.issue(Command::EntryMode {
                cursor_move: false,
                shift: self.config.entry_display_shift,
            })?;
        }
        Ok(())
    }

    fn issue(&mut self, command: Command) -> LcdResult<()> {
        let word = command.encode();
        self.bus.set_register_lines(word.rs, word.rw)?;

        match self.waiter.wait_ready(&mut self.bus, &mut self.delay) {
            Ok(_) => {}
            Err(LcdError::BusyTimeout { polls }) if self.options.busy_timeout == BusyTimeoutPolicy::Proceed => {
                warn!("Controller still busy after {} polls, sending {:?} anyway", polls, command);
            }
            Err(err) => {
                if err.is_fatal() {
                    error!("Bus unusable: {}", err);
                    self.state = SessionState::Failed;
                }
                return Err(err);
            }
        }

        self.bus.present(word)?;
        self.bus.pulse_enable(&mut self.delay, self.options.enable_pulse_us)?;
        Ok(())
    }
}

impl<D: DelayNs> Drop for DisplaySession<'_, D> {
    fn drop(&mut self) {
        if self.state != SessionState::Ready {
            return;
        }
        if let Err(err) = self.clear_screen() {
            error!("Could not clear the display on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CLEAR_DISPLAY, RETURN_HOME};
    use crate::config::{Font, LineCount};
    use crate::test_support::{CountingDelay, SimBus};
    use lcd1602_gpio::GpioDirection;

    const BUSY: usize = SimBus::MAP.data[7];

    fn session(sim: &SimBus) -> DisplaySession<'_, CountingDelay> {
        DisplaySession::new(sim.bus(), CountingDelay::default(), SessionOptions::default())
    }

    fn ready(sim: &SimBus) -> DisplaySession<'_, CountingDelay> {
        let mut session = session(sim);
        session.configure(ControllerConfig::default()).unwrap();
        sim.driver.clear_events();
        session
    }

    fn instructions(data: &[u8]) -> Vec<(bool, u8)> {
        data.iter().map(|&d| (false, d)).collect()
    }

    #[test]
    fn configure_sends_init_sequence() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        assert_eq!(session.state(), SessionState::Unconfigured);

        session.configure(ControllerConfig::default()).unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(sim.latched(), instructions(&[0x38, 0x0B, 0x0F, 0x06]));
    }

    #[test]
    fn configure_encodes_font_and_lines() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        let config = ControllerConfig {
            line_count: LineCount::One,
            font: Font::Font5x10,
            cursor_on: false,
            cursor_blink: false,
            ..ControllerConfig::default()
        };

        session.configure(config).unwrap();

        assert_eq!(sim.latched(), instructions(&[0x34, 0x08, 0x0C, 0x06]));
        assert_eq!(session.config(), &config);
    }

    #[test]
    fn configure_twice_resends_everything() {
        let sim = SimBus::new();
        let mut session = session(&sim);

        session.configure(ControllerConfig::default()).unwrap();
        let first = sim.latched();
        session.configure(ControllerConfig::default()).unwrap();
        let both = sim.latched();

        assert_eq!(both.len(), 2 * first.len());
        assert_eq!(&both[first.len()..], &first[..]);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn four_bit_bus_is_refused_without_touching_the_bus() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        sim.driver.clear_events();
        let config = ControllerConfig { bus_width: BusWidth::Four, ..ControllerConfig::default() };

        assert_eq!(session.configure(config), Err(LcdError::Unsupported("4-bit bus")));
        assert_eq!(sim.driver.activity(), 0);
        assert_eq!(session.state(), SessionState::Unconfigured);
    }

    #[test]
    fn operations_need_configuration() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        sim.driver.clear_events();

        assert_eq!(session.clear(), Err(LcdError::NotConfigured));
        assert_eq!(session.home(), Err(LcdError::NotConfigured));
        assert_eq!(session.write_text(b"hi"), Err(LcdError::NotConfigured));
        assert_eq!(sim.driver.activity(), 0);
    }

    #[test]
    fn clear_and_home() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.clear().unwrap();
        session.home().unwrap();

        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY, RETURN_HOME]));
    }

    #[test]
    fn write_text_clears_then_writes_glyphs() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.write_text(b"Hi~").unwrap();

        assert_eq!(sim.latched(), [(false, 0x01), (true, b'H'), (true, b'i'), (true, 0x20)]);
    }

    #[test]
    fn line_breaks_switch_to_second_row_once_per_run() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.write_text(b"a\r\n\nb").unwrap();

        assert_eq!(sim.latched(), [(false, 0x01), (true, b'a'), (false, 0xC0), (true, b'b')]);
    }

    #[test]
    fn separate_breaks_each_target_second_row() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.write_text(b"a\nb\nc").unwrap();

        assert_eq!(
            sim.latched(),
            [(false, 0x01), (true, b'a'), (false, 0xC0), (true, b'b'), (false, 0xC0), (true, b'c')]
        );
    }

    #[test]
    fn write_after_clear_repeats_sequence() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.write_text(b"Hello\nWorld").unwrap();
        let first = sim.latched();
        sim.driver.clear_events();

        session.clear().unwrap();
        session.write_text(b"Hello\nWorld").unwrap();
        let second = sim.latched();

        assert_eq!(second[0], (false, CLEAR_DISPLAY));
        assert_eq!(&second[1..], &first[..]);
    }

    #[test]
    fn decrementing_entry_mode_survives_clear() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        let config = ControllerConfig { entry_cursor_move: false, ..ControllerConfig::default() };
        session.configure(config).unwrap();
        sim.driver.clear_events();

        session.clear().unwrap();
        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY, 0x04]));
        sim.driver.clear_events();

        session.write_text(b"ab").unwrap();
        assert_eq!(sim.latched(), [(false, CLEAR_DISPLAY), (false, 0x04), (true, b'a'), (true, b'b')]);
        sim.driver.clear_events();

        drop(session);
        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY, 0x04]));
    }

    #[test]
    fn shift_moves_cursor_or_display() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.shift(ShiftTarget::Display, CursorDirection::Right).unwrap();
        session.shift(ShiftTarget::Cursor, CursorDirection::Left).unwrap();

        assert_eq!(sim.latched(), instructions(&[0x1C, 0x10]));
    }

    #[test]
    fn switch_line_addresses_row_starts() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.switch_line(DisplayRow::First).unwrap();
        session.switch_line(DisplayRow::Second).unwrap();

        assert_eq!(sim.latched(), instructions(&[0x80, 0xC0]));
    }

    #[test]
    fn set_display_updates_config() {
        let sim = SimBus::new();
        let mut session = ready(&sim);

        session.set_display(true, false, false).unwrap();

        assert_eq!(sim.latched(), instructions(&[0x0C]));
        let config = session.config();
        assert!(config.display_on);
        assert!(!config.cursor_on);
        assert!(!config.cursor_blink);
    }

    #[test]
    fn cursor_operations_need_configuration() {
        let sim = SimBus::new();
        let mut session = session(&sim);
        sim.driver.clear_events();

        assert_eq!(session.shift(ShiftTarget::Cursor, CursorDirection::Right), Err(LcdError::NotConfigured));
        assert_eq!(session.switch_line(DisplayRow::Second), Err(LcdError::NotConfigured));
        assert_eq!(session.set_display(false, false, false), Err(LcdError::NotConfigured));
        assert_eq!(sim.driver.activity(), 0);
        assert_eq!(session.config(), &ControllerConfig::default());
    }

    #[test]
    fn busy_timeout_proceeds_by_default() {
        let sim = SimBus::new();
        let mut session = ready(&sim);
        sim.driver.set_default_input(BUSY, true);

        session.clear().unwrap();

        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY]));
        assert_eq!(sim.driver.reads_of(BUSY), 165);
    }

    #[test]
    fn busy_timeout_can_abort() {
        let sim = SimBus::new();
        let options = SessionOptions { busy_timeout: BusyTimeoutPolicy::Abort, ..SessionOptions::default() };
        let mut session = DisplaySession::new(sim.bus(), CountingDelay::default(), options);
        session.configure(ControllerConfig::default()).unwrap();
        sim.driver.clear_events();
        sim.driver.set_default_input(BUSY, true);

        assert_eq!(session.clear(), Err(LcdError::BusyTimeout { polls: 165 }));
        assert!(sim.latched().is_empty());
        // a timeout is not fatal
        assert_eq!(session.state(), SessionState::Ready);
        sim.driver.set_default_input(BUSY, false);
        session.clear().unwrap();
    }

    #[test]
    fn direction_failure_fails_the_session() {
        let sim = SimBus::new();
        let mut session = ready(&sim);
        sim.driver.refuse_direction(BUSY, GpioDirection::Input);

        assert!(matches!(session.write_text(b"x"), Err(LcdError::DirectionSwitch(_))));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.clear(), Err(LcdError::Failed));
        assert_eq!(session.configure(ControllerConfig::default()), Err(LcdError::Failed));
        assert!(sim.latched().is_empty());
    }

    #[test]
    fn drop_clears_a_configured_display() {
        let sim = SimBus::new();
        let session = ready(&sim);

        drop(session);

        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY]));
        assert!(!sim.driver.is_in_use(SimBus::MAP.e));
    }

    #[test]
    fn drop_of_unconfigured_session_sends_nothing() {
        let sim = SimBus::new();
        drop(session(&sim));
        assert!(sim.latched().is_empty());
    }

    #[test]
    fn shutdown_clears_once_and_releases() {
        let sim = SimBus::new();
        let session = ready(&sim);

        session.shutdown().unwrap();

        assert_eq!(sim.latched(), instructions(&[CLEAR_DISPLAY]));
        for line in 0..SimBus::LINES {
            assert!(!sim.driver.is_in_use(line));
        }
    }
}
