//! Mapping from input bytes to glyph addresses in the character generator ROM.
//!
//! The ROM is laid out as an 8x16 grid: the row is the high nibble of the address and the column the
//! low nibble. Rows 0 and 1 hold the CGRAM slots and nothing printable, so they are never searched.
//! A few slots in the printable rows hold glyphs that differ from ASCII (`¥` in place of `\`, arrows
//! in place of `~` and DEL) and are left unmapped.

/// Address of the space glyph, used for every byte without a glyph.
pub const SPACE: GlyphAddress = GlyphAddress(0x20);

const ROWS: usize = 8;
const COLUMNS: usize = 16;
const FIRST_MAPPED_ROW: usize = 2;

/// `0` marks a slot without a matching byte.
const GLYPHS: [[u8; COLUMNS]; ROWS] = [
    [0; COLUMNS],
    [0; COLUMNS],
    *b" !\"#$%&'()*+,-./",
    *b"0123456789:;<=>?",
    *b"@ABCDEFGHIJKLMNO",
    [b'P', b'Q', b'R', b'S', b'T', b'U', b'V', b'W', b'X', b'Y', b'Z', b'[', 0, b']', b'^', b'_'],
    [0, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o'],
    [b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', b'{', b'|', b'}', 0, 0],
];

/// Address of a glyph: 3-bit row in bits 4-6, 4-bit column in bits 0-3.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GlyphAddress(u8);

impl GlyphAddress {
    /// Builds the address of the glyph at `row`, `column`.
    /// Returns `None` if either is outside the grid.
    pub fn new(row: u8, column: u8) -> Option<Self> {
        if row as usize >= ROWS || column as usize >= COLUMNS {
            return None;
        }
        Some(GlyphAddress((row << 4) | column))
    }

    pub fn row(self) -> u8 {
        self.0 >> 4
    }

    pub fn column(self) -> u8 {
        self.0 & 0x0F
    }

    /// The address as written to the data bus.
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Finds the glyph for `c`. Bytes without a glyph resolve to [SPACE].
pub fn lookup(c: u8) -> GlyphAddress {
    if c == 0 {
        return SPACE;
    }

    for (row, glyphs) in GLYPHS.iter().enumerate().skip(FIRST_MAPPED_ROW) {
        if let Some(column) = glyphs.iter().position(|&glyph| glyph == c) {
            return GlyphAddress(((row as u8) << 4) | column as u8);
        }
    }

    SPACE
}

/// Gets the byte shown by the glyph at `address`, if it has one.
pub fn glyph_at(address: GlyphAddress) -> Option<u8> {
    match GLYPHS[address.row() as usize][address.column() as usize] {
        0 => None,
        c => Some(c),
    }
}
