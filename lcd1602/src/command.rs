//! Encoding of controller operations into bus words.
//!
//! Each command is a single byte on the data bus plus the levels of the RS and RW lines while it is
//! latched. Instructions go to the instruction register (RS low), character writes go to the data
//! register (RS high). Encoding is pure; nothing here touches the bus.
use crate::config::{BusWidth, Font, LineCount};
use crate::glyph::GlyphAddress;

pub const CLEAR_DISPLAY: u8 = 0b0000_0001;
pub const RETURN_HOME: u8 = 0b0000_0010;
pub const ENTRY_MODE_BASE: u8 = 0b0000_0100;
pub const DISPLAY_CONTROL_BASE: u8 = 0b0000_1000;
pub const CURSOR_SHIFT_BASE: u8 = 0b0001_0000;
pub const FUNCTION_SET_BASE: u8 = 0b0010_0000;
pub const SET_DDRAM_ADDRESS_BASE: u8 = 0b1000_0000;

/// DDRAM address of the first cell of each row.
pub const ROW_1_START: u8 = 0x00;
pub const ROW_2_START: u8 = 0x40;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorDirection {
    Left,
    Right,
}

/// What a cursor/display shift moves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShiftTarget {
    Cursor,
    Display,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DisplayRow {
    First,
    Second,
}

impl DisplayRow {
    pub fn start_address(self) -> u8 {
        match self {
            DisplayRow::First => ROW_1_START,
            DisplayRow::Second => ROW_2_START,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Clear,
    ReturnHome,
    EntryMode { cursor_move: bool, shift: bool },
    DisplayControl { on: bool, cursor: bool, blink: bool },
    CursorShift { target: ShiftTarget, direction: CursorDirection },
    FunctionSet { width: BusWidth, lines: LineCount, font: Font },
    SetAddress { row: DisplayRow },
    WriteChar { glyph: GlyphAddress },
}

/// A command as it appears on the bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BusWord {
    pub data: u8,
    /// Register select: low for instructions, high for character data.
    pub rs: bool,
    /// Read/write: always low, reads only happen during the busy-flag poll.
    pub rw: bool,
}

impl BusWord {
    fn instruction(data: u8) -> Self {
        BusWord { data, rs: false, rw: false }
    }
}

impl Command {
    pub fn encode(&self) -> BusWord {
        match *self {
            Command::Clear => BusWord::instruction(CLEAR_DISPLAY),
            Command::ReturnHome => BusWord::instruction(RETURN_HOME),
            Command::EntryMode { cursor_move, shift } => BusWord::instruction(
                ENTRY_MODE_BASE | (cursor_move as u8) << 1 | shift as u8,
            ),
            Command::DisplayControl { on, cursor, blink } => BusWord::instruction(
                DISPLAY_CONTROL_BASE | (on as u8) << 2 | (cursor as u8) << 1 | blink as u8,
            ),
            Command::CursorShift { target, direction } => {
                let mut command = CURSOR_SHIFT_BASE;
                if target == ShiftTarget::Display {
                    command |= 0b0000_1000;
                }
                if direction == CursorDirection::Right {
                    command |= 0b0000_0100;
                }
                BusWord::instruction(command)
            }
            Command::FunctionSet { width, lines, font } => {
                let mut command = FUNCTION_SET_BASE;
                if width == BusWidth::Eight {
                    command |= 0b0001_0000;
                }
                if lines == LineCount::Two {
                    command |= 0b0000_1000;
                }
                if font == Font::Font5x10 {
                    command |= 0b0000_0100;
                }
                BusWord::instruction(command)
            }
            Command::SetAddress { row } => BusWord::instruction(SET_DDRAM_ADDRESS_BASE | row.start_address()),
            Command::WriteChar { glyph } => BusWord {
                data: glyph.value(),
                rs: true,
                rw: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph;

    #[test]
    fn fixed_instructions() {
        assert_eq!(Command::Clear.encode(), BusWord { data: 0x01, rs: false, rw: false });
        assert_eq!(Command::ReturnHome.encode(), BusWord { data: 0x02, rs: false, rw: false });
    }

    #[test]
    fn entry_mode_bits() {
        let word = |cursor_move, shift| Command::EntryMode { cursor_move, shift }.encode().data;
        assert_eq!(word(false, false), 0x04);
        assert_eq!(word(true, false), 0x06);
        assert_eq!(word(false, true), 0x05);
        assert_eq!(word(true, true), 0x07);
    }

    #[test]
    fn display_control_bits() {
        let word = |on, cursor, blink| Command::DisplayControl { on, cursor, blink }.encode().data;
        assert_eq!(word(false, false, false), 0x08);
        assert_eq!(word(true, false, false), 0x0C);
        assert_eq!(word(false, true, false), 0x0A);
        assert_eq!(word(false, false, true), 0x09);
        assert_eq!(word(true, true, true), 0x0F);
    }

    #[test]
    fn cursor_shift_bits() {
        let word = |target, direction| Command::CursorShift { target, direction }.encode().data;
        assert_eq!(word(ShiftTarget::Cursor, CursorDirection::Left), 0x10);
        assert_eq!(word(ShiftTarget::Cursor, CursorDirection::Right), 0x14);
        assert_eq!(word(ShiftTarget::Display, CursorDirection::Left), 0x18);
        assert_eq!(word(ShiftTarget::Display, CursorDirection::Right), 0x1C);
    }

    #[test]
    fn function_set_bits() {
        let word = |width, lines, font| Command::FunctionSet { width, lines, font }.encode().data;
        assert_eq!(word(BusWidth::Four, LineCount::One, Font::Font5x7), 0x20);
        assert_eq!(word(BusWidth::Eight, LineCount::One, Font::Font5x7), 0x30);
        assert_eq!(word(BusWidth::Eight, LineCount::Two, Font::Font5x7), 0x38);
        assert_eq!(word(BusWidth::Eight, LineCount::One, Font::Font5x10), 0x34);
    }

    #[test]
    fn set_address_targets_row_start() {
        assert_eq!(Command::SetAddress { row: DisplayRow::First }.encode().data, 0x80);
        assert_eq!(Command::SetAddress { row: DisplayRow::Second }.encode().data, 0xC0);
    }

    #[test]
    fn write_char_selects_data_register() {
        let word = Command::WriteChar { glyph: glyph::lookup(b'A') }.encode();
        assert_eq!(word, BusWord { data: 0x41, rs: true, rw: false });
    }

    #[test]
    fn only_write_char_raises_rs_and_nothing_raises_rw() {
        let commands = [
            Command::Clear,
            Command::ReturnHome,
            Command::EntryMode { cursor_move: true, shift: true },
            Command::DisplayControl { on: true, cursor: true, blink: true },
            Command::CursorShift { target: ShiftTarget::Display, direction: CursorDirection::Right },
            Command::FunctionSet { width: BusWidth::Eight, lines: LineCount::Two, font: Font::Font5x10 },
            Command::SetAddress { row: DisplayRow::Second },
            Command::WriteChar { glyph: glyph::SPACE },
        ];
        for command in commands {
            let word = command.encode();
            assert_eq!(word, command.encode());
            assert_eq!(word.rs, matches!(command, Command::WriteChar { .. }));
            assert!(!word.rw);
        }
    }
}
