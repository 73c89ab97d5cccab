//! The 8x8 glyph ROM.
//!
//! Covers the 95 printable ASCII code points, from space (32) to tilde (126).
//! The shapes are the public-domain `font8x8_basic` set. In each byte, bit 0
//! is the left-most pixel.
//!
//! The encoder wants one glyph row at a time, for every character on a text
//! row, so the data is stored row-major: the row-0 byte of all 95 glyphs, then
//! the row-1 byte of all 95 glyphs, and so on.

// -----------------------------------------------------------------------------
// Licence Statement
// -----------------------------------------------------------------------------
// Copyright (c) The Sensor Dash Developers, 2026
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.
// -----------------------------------------------------------------------------

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Width of a glyph in pixels.
pub const WIDTH_PX: usize = 8;

/// Height of a glyph in the ROM, in pixels.
pub const HEIGHT_PX: usize = 8;

/// Each glyph row is repeated this many times on screen.
pub const SCALE: usize = 3;

/// The code point of the first glyph in the ROM.
pub const FIRST_CHAR: u8 = 32;

/// How many glyphs are in the ROM.
pub const NUM_CHARS: usize = 95;

/// The font we draw the screen with.
pub static FONT_8X8: Font = Font::from_glyphs(&GLYPHS);

/// Glyph-major source data: eight row bytes per glyph, top row first.
static GLYPHS: [[u8; HEIGHT_PX]; NUM_CHARS] = [
	[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
	[0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // '!'
	[0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
	[0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // '#'
	[0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // '$'
	[0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // '%'
	[0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // '&'
	[0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '''
	[0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // '('
	[0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // ')'
	[0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
	[0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // '+'
	[0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ','
	[0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // '-'
	[0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // '.'
	[0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // '/'
	[0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // '0'
	[0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // '1'
	[0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // '2'
	[0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // '3'
	[0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // '4'
	[0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // '5'
	[0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // '6'
	[0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // '7'
	[0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // '8'
	[0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // '9'
	[0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // ':'
	[0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ';'
	[0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // '<'
	[0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // '='
	[0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // '>'
	[0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // '?'
	[0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // '@'
	[0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // 'A'
	[0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // 'B'
	[0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // 'C'
	[0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // 'D'
	[0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // 'E'
	[0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // 'F'
	[0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // 'G'
	[0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // 'H'
	[0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'I'
	[0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // 'J'
	[0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // 'K'
	[0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // 'L'
	[0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // 'M'
	[0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // 'N'
	[0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // 'O'
	[0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // 'P'
	[0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // 'Q'
	[0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // 'R'
	[0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // 'S'
	[0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'T'
	[0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // 'U'
	[0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'V'
	[0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 'W'
	[0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // 'X'
	[0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // 'Y'
	[0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // 'Z'
	[0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // '['
	[0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // '\'
	[0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ']'
	[0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // '^'
	[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
	[0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
	[0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // 'a'
	[0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // 'b'
	[0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // 'c'
	[0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // 'd'
	[0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // 'e'
	[0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // 'f'
	[0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'g'
	[0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // 'h'
	[0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'i'
	[0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // 'j'
	[0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // 'k'
	[0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'l'
	[0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // 'm'
	[0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // 'n'
	[0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // 'o'
	[0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // 'p'
	[0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // 'q'
	[0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // 'r'
	[0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // 's'
	[0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // 't'
	[0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // 'u'
	[0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'v'
	[0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // 'w'
	[0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // 'x'
	[0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'y'
	[0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // 'z'
	[0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // '{'
	[0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // '|'
	[0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // '}'
	[0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '~'
];

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A row-major bitmap font.
pub struct Font {
	data: [u8; NUM_CHARS * HEIGHT_PX],
}

/// One row of every glyph in a [`Font`].
///
/// This is the `font + row * 95 - 32` pointer of the encoder interface, with
/// the bias applied on look-up rather than in the pointer.
#[derive(Clone, Copy)]
pub struct GlyphRow<'a> {
	row: &'a [u8],
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl Font {
	/// Build a row-major font from glyph-major data.
	const fn from_glyphs(glyphs: &[[u8; HEIGHT_PX]; NUM_CHARS]) -> Font {
		let mut data = [0u8; NUM_CHARS * HEIGHT_PX];
		let mut row = 0;
		while row < HEIGHT_PX {
			let mut glyph = 0;
			while glyph < NUM_CHARS {
				data[row * NUM_CHARS + glyph] = glyphs[glyph][row];
				glyph += 1;
			}
			row += 1;
		}
		Font { data }
	}

	/// Get the row-`row` slice of every glyph.
	///
	/// Panics if `row` is not below [`HEIGHT_PX`].
	pub fn glyph_row(&self, row: usize) -> GlyphRow<'_> {
		let start = row * NUM_CHARS;
		GlyphRow {
			row: &self.data[start..start + NUM_CHARS],
		}
	}
}

impl<'a> GlyphRow<'a> {
	/// Get the eight pixels of this row for a code point.
	///
	/// Code points with no glyph come back blank.
	#[inline(always)]
	pub fn bits(&self, code_point: u8) -> u8 {
		match code_point.checked_sub(FIRST_CHAR) {
			Some(index) => self.row.get(usize::from(index)).copied().unwrap_or(0),
			None => 0,
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn row_major_layout() {
		// Row 3 of 'A' (code point 65) lives at 3 * 95 + (65 - 32)
		assert_eq!(FONT_8X8.data[3 * 95 + 33], 0x33);
		assert_eq!(FONT_8X8.glyph_row(3).bits(b'A'), 0x33);
		assert_eq!(FONT_8X8.glyph_row(0).bits(b'~'), 0x6E);
	}

	#[test]
	fn unprintable_code_points_are_blank() {
		for row in 0..HEIGHT_PX {
			let glyphs = FONT_8X8.glyph_row(row);
			assert_eq!(glyphs.bits(0), 0);
			assert_eq!(glyphs.bits(31), 0);
			assert_eq!(glyphs.bits(127), 0);
			assert_eq!(glyphs.bits(255), 0);
		}
	}

	#[test]
	fn space_is_blank_and_underscore_is_not() {
		for row in 0..HEIGHT_PX {
			assert_eq!(FONT_8X8.glyph_row(row).bits(b' '), 0);
		}
		assert_eq!(FONT_8X8.glyph_row(7).bits(b'_'), 0xFF);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
