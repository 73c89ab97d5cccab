//! Software TMDS encoding for the text mode.
//!
//! We only ever send four intensity levels per lane (two bits per plane), so
//! rather than run the full 8b/10b TMDS algorithm per pixel we pick one
//! DC-balanced data symbol for each level at compile time. A balanced symbol
//! has five ones and five zeroes, so it never moves the running disparity and
//! can be sent in any order.
//!
//! The encoder then needs nothing more than a table look-up per pair of
//! pixels.

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
// Imports
// -----------------------------------------------------------------------------

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::font::{self, GlyphRow};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// How many 10-bit symbols we pack into each 32-bit word.
///
/// The first pixel goes in bits 0..=9 and the second in bits 10..=19. The
/// serialiser shifts out to the right and pulls a new word every 20 bits.
pub const SYMBOLS_PER_WORD: usize = 2;

/// The number of bits in a TMDS symbol.
pub const SYMBOL_BITS: u32 = 10;

/// Control symbol for C1 = 0, C0 = 0.
pub const CTRL_00: u16 = 0b11_0101_0100;

/// Control symbol for C1 = 0, C0 = 1.
pub const CTRL_01: u16 = 0b00_1010_1011;

/// Control symbol for C1 = 1, C0 = 0.
pub const CTRL_10: u16 = 0b01_0101_0100;

/// Control symbol for C1 = 1, C0 = 1.
pub const CTRL_11: u16 = 0b10_1010_1011;

/// The data byte each 2-bit intensity level stands for.
const LEVEL_TARGETS: [u8; 4] = [0x00, 0x55, 0xAA, 0xFF];

/// One balanced data symbol per intensity level.
pub const LEVEL_SYMBOLS: [u16; 4] = [
	balanced_symbol(LEVEL_TARGETS[0]),
	balanced_symbol(LEVEL_TARGETS[1]),
	balanced_symbol(LEVEL_TARGETS[2]),
	balanced_symbol(LEVEL_TARGETS[3]),
];

/// Maps `glyph_bits | (colour_nibble << 2)` to one word holding two pixels.
///
/// Bit 0 of `glyph_bits` is the left pixel. The colour nibble is the cell's
/// foreground level in bits 0..=1 and its background level in bits 2..=3.
static PAIR_LUT: [u32; 64] = make_pair_lut();

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Something that turns one row of text cells into TMDS symbol words for one
/// plane.
pub trait SymbolEncoder {
	/// Encode one scan-line of one plane.
	///
	/// * `chars` - the code points for the text row.
	/// * `colour_words` - the plane's packed colour nibbles for the same row.
	/// * `glyphs` - the glyph row to draw.
	/// * `out` - where the words go. The line is `out.len() * SYMBOLS_PER_WORD`
	///   pixels wide.
	fn encode(
		&self,
		chars: &[AtomicU8],
		colour_words: &[AtomicU32],
		glyphs: GlyphRow<'_>,
		out: &mut [u32],
	);
}

/// Encodes 8 pixel wide characters, two bits of colour per plane.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontEncoder;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Decode a TMDS data symbol back to the byte it carries.
pub const fn decode(symbol: u16) -> u8 {
	let mut q = (symbol & 0xFF) as u8;
	if symbol & 0x200 != 0 {
		q = !q;
	}
	let use_xor = symbol & 0x100 != 0;
	let mut data = q & 1;
	let mut i = 1;
	while i < 8 {
		let mut bit = ((q >> i) ^ (q >> (i - 1))) & 1;
		if !use_xor {
			bit ^= 1;
		}
		data |= bit << i;
		i += 1;
	}
	data
}

const fn is_control(symbol: u16) -> bool {
	symbol == CTRL_00 || symbol == CTRL_01 || symbol == CTRL_10 || symbol == CTRL_11
}

/// Find the first balanced data symbol that decodes as close as possible to
/// `target`.
const fn balanced_symbol(target: u8) -> u16 {
	let mut best = 0u16;
	let mut best_error = u16::MAX;
	let mut symbol = 0u16;
	while symbol < (1 << SYMBOL_BITS) {
		if symbol.count_ones() == 5 && !is_control(symbol) {
			let decoded = decode(symbol);
			let error = if decoded > target {
				decoded - target
			} else {
				target - decoded
			};
			let error = error as u16;
			if error < best_error {
				best = symbol;
				best_error = error;
			}
		}
		symbol += 1;
	}
	best
}

const fn make_pair_lut() -> [u32; 64] {
	let mut lut = [0u32; 64];
	let mut index = 0;
	while index < 64 {
		let glyph_bits = index & 3;
		let fg = (index >> 2) & 3;
		let bg = (index >> 4) & 3;
		let left = if glyph_bits & 1 != 0 { fg } else { bg };
		let right = if glyph_bits & 2 != 0 { fg } else { bg };
		lut[index] = LEVEL_SYMBOLS[left] as u32 | ((LEVEL_SYMBOLS[right] as u32) << SYMBOL_BITS);
		index += 1;
	}
	lut
}

/// A word carrying the same control symbol twice.
///
/// `c0` and `c1` are the two control bits. Lane 0 carries HSYNC on C0 and
/// VSYNC on C1.
pub const fn control_word(c0: bool, c1: bool) -> u32 {
	let symbol = match (c1, c0) {
		(false, false) => CTRL_00,
		(false, true) => CTRL_01,
		(true, false) => CTRL_10,
		(true, true) => CTRL_11,
	};
	let symbol = symbol as u32;
	symbol | (symbol << SYMBOL_BITS)
}

/// A word carrying two pixels of the same intensity level.
pub const fn level_word(level: u8) -> u32 {
	let symbol = LEVEL_SYMBOLS[(level & 3) as usize] as u32;
	symbol | (symbol << SYMBOL_BITS)
}

impl SymbolEncoder for FontEncoder {
	fn encode(
		&self,
		chars: &[AtomicU8],
		colour_words: &[AtomicU32],
		glyphs: GlyphRow<'_>,
		out: &mut [u32],
	) {
		const WORDS_PER_CHAR: usize = font::WIDTH_PX / SYMBOLS_PER_WORD;
		const CELLS_PER_COLOUR_WORD: usize = 8;

		for (col, (out_chunk, cell)) in out
			.chunks_exact_mut(WORDS_PER_CHAR)
			.zip(chars.iter())
			.enumerate()
		{
			let Some(colour_word) = colour_words.get(col / CELLS_PER_COLOUR_WORD) else {
				break;
			};
			let nibble = (colour_word.load(Ordering::Relaxed) >> ((col % CELLS_PER_COLOUR_WORD) * 4)) & 0xF;
			let mut bits = glyphs.bits(cell.load(Ordering::Relaxed)) as usize;
			let base = (nibble as usize) << 2;
			for word in out_chunk.iter_mut() {
				*word = PAIR_LUT[base | (bits & 3)];
				bits >>= 2;
			}
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::font::FONT_8X8;

	fn cells(text: &[u8]) -> Vec<AtomicU8> {
		text.iter().map(|b| AtomicU8::new(*b)).collect()
	}

	#[test]
	fn level_symbols_are_balanced_and_exact() {
		for (level, symbol) in LEVEL_SYMBOLS.iter().enumerate() {
			assert_eq!(symbol.count_ones(), 5, "level {}", level);
			assert!(!is_control(*symbol));
			assert!(*symbol < 1 << SYMBOL_BITS);
			assert_eq!(decode(*symbol), LEVEL_TARGETS[level]);
		}
		assert_eq!(LEVEL_SYMBOLS, [0x255, 0x133, 0x166, 0x155]);
	}

	#[test]
	fn control_words() {
		assert_eq!(control_word(false, false), 0x354 | (0x354 << 10));
		assert_eq!(control_word(true, true), 0x2AB | (0x2AB << 10));
		assert_eq!(control_word(true, false) & 0x3FF, u32::from(CTRL_01));
	}

	#[test]
	fn blank_cells_are_background() {
		// 'fg' level 3, 'bg' level 1, in every one of the 8 cells
		let colours = [AtomicU32::new(0x7777_7777)];
		let chars = cells(b"        ");
		let mut out = [0u32; 32];
		FontEncoder.encode(&chars, &colours, FONT_8X8.glyph_row(0), &mut out);
		assert!(out.iter().all(|w| *w == level_word(1)));
	}

	#[test]
	fn glyph_bits_pick_foreground() {
		// Row 7 of '_' is solid
		let colours = [AtomicU32::new(0x0000_0003)];
		let chars = cells(b"_");
		let mut out = [0u32; 4];
		FontEncoder.encode(&chars, &colours, FONT_8X8.glyph_row(7), &mut out);
		assert_eq!(out, [level_word(3); 4]);
	}

	#[test]
	fn left_pixel_is_low_bits() {
		// Row 0 of '!' is 0x18: pixels 3 and 4 lit
		let colours = [AtomicU32::new(0x0000_0002)];
		let chars = cells(b"!");
		let mut out = [0u32; 4];
		FontEncoder.encode(&chars, &colours, FONT_8X8.glyph_row(0), &mut out);
		let fg = u32::from(LEVEL_SYMBOLS[2]);
		let bg = u32::from(LEVEL_SYMBOLS[0]);
		assert_eq!(out[0], bg | (bg << 10));
		assert_eq!(out[1], bg | (fg << 10));
		assert_eq!(out[2], fg | (bg << 10));
		assert_eq!(out[3], bg | (bg << 10));
	}

	#[test]
	fn colour_nibbles_follow_the_column() {
		// Ten cells span two colour words; cell 9 is nibble 1 of word 1.
		let colours = [AtomicU32::new(0), AtomicU32::new(0x0000_00C0)];
		let chars = cells(b"          ");
		let mut out = [0u32; 40];
		FontEncoder.encode(&chars, &colours, FONT_8X8.glyph_row(0), &mut out);
		for (idx, word) in out.iter().enumerate() {
			let expected = if idx / 4 == 9 { level_word(3) } else { level_word(0) };
			assert_eq!(*word, expected, "word {}", idx);
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
