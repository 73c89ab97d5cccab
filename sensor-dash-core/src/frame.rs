//! The shared text-mode frame buffer.
//!
//! A grid of 8-bit code points plus three packed colour planes. The logic core
//! writes to it through the one-and-only [`FrameWriter`]; the display core
//! reads it through any number of [`FrameReader`]s, one scan-line at a time.
//!
//! There is no lock. Each cell and each colour word is an atomic, so every
//! individual write is wait-free and a reader sees either the old or the new
//! value. A scan-line that races with an update shows a mixture for one frame
//! and is correct again on the next.

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

use crate::{colour::Colour, font};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// How many visible pixels per scan-line.
pub const NUM_PIXELS_PER_LINE: usize = 640;

/// How many visible scan-lines per frame.
pub const NUM_LINES: usize = 480;

/// Height of one character cell on screen, after vertical scaling.
pub const CELL_HEIGHT_PX: usize = font::HEIGHT_PX * font::SCALE;

/// The number of text columns.
pub const NUM_TEXT_COLS: usize = NUM_PIXELS_PER_LINE / font::WIDTH_PX;

/// The number of text rows.
pub const NUM_TEXT_ROWS: usize = NUM_LINES / CELL_HEIGHT_PX;

/// The number of cells in the grid.
pub const NUM_CELLS: usize = NUM_TEXT_COLS * NUM_TEXT_ROWS;

/// The number of colour planes (one per TMDS lane).
pub const NUM_PLANES: usize = 3;

/// Each cell takes a 4-bit nibble in each plane: two bits of foreground, then
/// two bits of background.
const BITS_PER_CELL: usize = 4;

/// How many cells fit in one colour word.
const CELLS_PER_WORD: usize = 32 / BITS_PER_CELL;

/// The length of one colour plane, in 32-bit words.
pub const PLANE_SIZE_WORDS: usize = NUM_CELLS * BITS_PER_CELL / 32;

/// The number of colour words covering one text row of one plane.
pub const PLANE_WORDS_PER_ROW: usize = PLANE_SIZE_WORDS / NUM_TEXT_ROWS;

#[allow(clippy::declare_interior_mutable_const)]
const BLANK_CELL: AtomicU8 = AtomicU8::new(b' ');

#[allow(clippy::declare_interior_mutable_const)]
const BLACK_WORD: AtomicU32 = AtomicU32::new(0);

#[allow(clippy::declare_interior_mutable_const)]
const BLACK_PLANE: [AtomicU32; PLANE_SIZE_WORDS] = [BLACK_WORD; PLANE_SIZE_WORDS];

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Holds the character grid and the three colour planes.
///
/// Starts out as spaces, black on black.
#[repr(C)]
pub struct FrameBuffer {
	/// `NUM_TEXT_ROWS` rows of `NUM_TEXT_COLS` code points.
	chars: [AtomicU8; NUM_CELLS],
	/// Three consecutive planes. Cell `i` lives at bit `(i % 8) * 4` of word
	/// `i / 8` in each plane.
	planes: [[AtomicU32; PLANE_SIZE_WORDS]; NUM_PLANES],
	/// Set once the writer has been handed out.
	writer_taken: atomic_polyfill::AtomicBool,
}

/// The single-writer handle to a [`FrameBuffer`].
///
/// Only the logic core holds one of these.
pub struct FrameWriter<'a> {
	frame: &'a FrameBuffer,
}

/// A read-only view of a [`FrameBuffer`].
#[derive(Clone, Copy)]
pub struct FrameReader<'a> {
	frame: &'a FrameBuffer,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Convert a cell position to an index into the grid.
///
/// Returns `None` if the position is off-screen.
const fn cell_index(x: usize, y: usize) -> Option<usize> {
	if x < NUM_TEXT_COLS && y < NUM_TEXT_ROWS {
		Some(x + y * NUM_TEXT_COLS)
	} else {
		None
	}
}

impl FrameBuffer {
	/// Create a blank frame buffer.
	pub const fn new() -> FrameBuffer {
		FrameBuffer {
			chars: [BLANK_CELL; NUM_CELLS],
			planes: [BLACK_PLANE; NUM_PLANES],
			writer_taken: atomic_polyfill::AtomicBool::new(false),
		}
	}

	/// Take the writer.
	///
	/// There is only one. Every call after the first returns `None`.
	pub fn writer(&self) -> Option<FrameWriter<'_>> {
		if self.writer_taken.swap(true, atomic_polyfill::Ordering::AcqRel) {
			None
		} else {
			Some(FrameWriter { frame: self })
		}
	}

	/// Get a read-only view.
	pub fn reader(&self) -> FrameReader<'_> {
		FrameReader { frame: self }
	}
}

impl Default for FrameBuffer {
	fn default() -> Self {
		FrameBuffer::new()
	}
}

impl<'a> FrameWriter<'a> {
	/// Write a code point into a cell. The colour is left alone.
	///
	/// Off-screen positions are ignored.
	pub fn put_char(&mut self, x: usize, y: usize, ch: u8) {
		if let Some(idx) = cell_index(x, y) {
			self.frame.chars[idx].store(ch, Ordering::Relaxed);
		}
	}

	/// Set the foreground and background colour of a cell.
	///
	/// Only the target nibble in each plane changes; the other seven cells
	/// sharing each word keep their colours. Off-screen positions are
	/// ignored.
	pub fn put_attr(&mut self, x: usize, y: usize, fg: Colour, bg: Colour) {
		let Some(idx) = cell_index(x, y) else {
			return;
		};
		let word_idx = idx / CELLS_PER_WORD;
		let shift = (idx % CELLS_PER_WORD) * BITS_PER_CELL;
		let mask = 0xFu32 << shift;
		for (plane_idx, plane) in self.frame.planes.iter().enumerate() {
			let nibble = u32::from(fg.plane(plane_idx) | (bg.plane(plane_idx) << 2));
			// We are the only writer, so a load then a store is enough.
			let old = plane[word_idx].load(Ordering::Relaxed);
			plane[word_idx].store((old & !mask) | (nibble << shift), Ordering::Relaxed);
		}
	}

	/// Draw a string along row `y`, starting at column `x`.
	///
	/// Every cell is clipped on its own, so a string running off the right
	/// edge is cut short.
	pub fn draw_text(&mut self, x: usize, y: usize, text: &str, fg: Colour, bg: Colour) {
		for (offset, ch) in text.bytes().enumerate() {
			let col = x.saturating_add(offset);
			self.put_char(col, y, ch);
			self.put_attr(col, y, fg, bg);
		}
	}

	/// Blank out `len` cells along row `y`, starting at column `x`.
	///
	/// The cells become spaces with a black foreground on the given
	/// background.
	pub fn clear_span(&mut self, x: usize, y: usize, len: usize, bg: Colour) {
		for offset in 0..len {
			let col = x.saturating_add(offset);
			self.put_char(col, y, b' ');
			self.put_attr(col, y, Colour::BLACK, bg);
		}
	}

	/// Draw a frame around the edge of the screen.
	pub fn draw_border(&mut self) {
		const FG: Colour = Colour::GREY;
		const BG: Colour = Colour::BLACK;
		for x in 0..NUM_TEXT_COLS {
			self.put_char(x, 0, b'=');
			self.put_attr(x, 0, FG, BG);
			self.put_char(x, NUM_TEXT_ROWS - 1, b'=');
			self.put_attr(x, NUM_TEXT_ROWS - 1, FG, BG);
		}
		for y in 0..NUM_TEXT_ROWS {
			self.put_char(0, y, b'|');
			self.put_attr(0, y, FG, BG);
			self.put_char(NUM_TEXT_COLS - 1, y, b'|');
			self.put_attr(NUM_TEXT_COLS - 1, y, FG, BG);
		}
	}

	/// Set every cell to a space, black on black.
	pub fn clear_frame(&mut self) {
		for cell in self.frame.chars.iter() {
			cell.store(b' ', Ordering::Relaxed);
		}
		for word in self.frame.planes.iter().flatten() {
			word.store(0, Ordering::Relaxed);
		}
	}

	/// Get a read-only view of the same frame.
	pub fn reader(&self) -> FrameReader<'a> {
		FrameReader { frame: self.frame }
	}
}

impl<'a> FrameReader<'a> {
	/// Read the code point in a cell.
	pub fn get_char(&self, x: usize, y: usize) -> Option<u8> {
		cell_index(x, y).map(|idx| self.frame.chars[idx].load(Ordering::Relaxed))
	}

	/// Read the foreground and background colour of a cell.
	pub fn get_attr(&self, x: usize, y: usize) -> Option<(Colour, Colour)> {
		let idx = cell_index(x, y)?;
		let word_idx = idx / CELLS_PER_WORD;
		let shift = (idx % CELLS_PER_WORD) * BITS_PER_CELL;
		let mut fg = 0;
		let mut bg = 0;
		for (plane_idx, plane) in self.frame.planes.iter().enumerate() {
			let nibble = (plane[word_idx].load(Ordering::Relaxed) >> shift) as u8 & 0xF;
			fg |= (nibble & 3) << (plane_idx * 2);
			bg |= ((nibble >> 2) & 3) << (plane_idx * 2);
		}
		Some((Colour::new(fg), Colour::new(bg)))
	}

	/// Get the code points for one text row.
	///
	/// Panics if `row` is off-screen.
	pub fn row_chars(&self, row: usize) -> &'a [AtomicU8] {
		let start = row * NUM_TEXT_COLS;
		&self.frame.chars[start..start + NUM_TEXT_COLS]
	}

	/// Get the colour words for one text row of one plane.
	///
	/// Panics if `plane` or `row` is off-screen.
	pub fn plane_row(&self, plane: usize, row: usize) -> &'a [AtomicU32] {
		let start = row * PLANE_WORDS_PER_ROW;
		&self.frame.planes[plane][start..start + PLANE_WORDS_PER_ROW]
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn snapshot(frame: &FrameBuffer) -> (Vec<u8>, Vec<u32>) {
		let chars = frame.chars.iter().map(|c| c.load(Ordering::Relaxed)).collect();
		let words = frame
			.planes
			.iter()
			.flatten()
			.map(|w| w.load(Ordering::Relaxed))
			.collect();
		(chars, words)
	}

	#[test]
	fn geometry() {
		assert_eq!(NUM_TEXT_COLS, 80);
		assert_eq!(NUM_TEXT_ROWS, 20);
		assert_eq!(PLANE_SIZE_WORDS, 200);
		assert_eq!(PLANE_WORDS_PER_ROW, 10);
	}

	#[test]
	fn only_one_writer() {
		let frame = FrameBuffer::new();
		let writer = frame.writer();
		assert!(writer.is_some());
		assert!(frame.writer().is_none());
	}

	#[test]
	fn starts_blank() {
		let frame = FrameBuffer::new();
		let reader = frame.reader();
		assert_eq!(reader.get_char(0, 0), Some(b' '));
		assert_eq!(reader.get_attr(79, 19), Some((Colour::BLACK, Colour::BLACK)));
	}

	#[test]
	fn attr_round_trip_every_colour_pair() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		let reader = frame.reader();
		for fg in 0..64 {
			for bg in 0..64 {
				writer.put_attr(13, 7, Colour::new(fg), Colour::new(bg));
				assert_eq!(
					reader.get_attr(13, 7),
					Some((Colour::new(fg), Colour::new(bg)))
				);
			}
		}
	}

	#[test]
	fn attr_packing_layout() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		// Cell 10 is in word 1, nibble 2.
		writer.put_attr(10, 0, Colour::from_rgb(1, 2, 3), Colour::from_rgb(2, 0, 1));
		let reader = frame.reader();
		let shift = 2 * 4;
		// plane 0 (blue): fg 3, bg 1
		assert_eq!(reader.plane_row(0, 0)[1].load(Ordering::Relaxed), 0b0111 << shift);
		// plane 1 (green): fg 2, bg 0
		assert_eq!(reader.plane_row(1, 0)[1].load(Ordering::Relaxed), 0b0010 << shift);
		// plane 2 (red): fg 1, bg 2
		assert_eq!(reader.plane_row(2, 0)[1].load(Ordering::Relaxed), 0b1001 << shift);
	}

	#[test]
	fn plane_row_points_at_the_right_row() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.put_attr(0, 3, Colour::WHITE, Colour::BLACK);
		let reader = frame.reader();
		assert_eq!(reader.plane_row(2, 3)[0].load(Ordering::Relaxed), 0x3);
		assert_eq!(reader.plane_row(2, 2)[0].load(Ordering::Relaxed), 0);
		writer.put_char(5, 3, b'Q');
		assert_eq!(reader.row_chars(3)[5].load(Ordering::Relaxed), b'Q');
	}

	#[test]
	fn draw_text_clips_at_the_edge() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.draw_text(77, 4, "HELLO", Colour::WHITE, Colour::BLUE);
		let reader = frame.reader();
		assert_eq!(reader.get_char(77, 4), Some(b'H'));
		assert_eq!(reader.get_char(79, 4), Some(b'L'));
		assert_eq!(reader.get_char(0, 5), Some(b' '));
		assert_eq!(reader.get_attr(79, 4), Some((Colour::WHITE, Colour::BLUE)));
		assert_eq!(reader.get_attr(0, 5), Some((Colour::BLACK, Colour::BLACK)));
	}

	#[test]
	fn clear_span_blanks_and_recolours() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.draw_text(30, 9, "812.35 m", Colour::WHITE, Colour::BLACK);
		writer.clear_span(30, 9, 10, Colour::BLUE);
		let reader = frame.reader();
		for x in 30..40 {
			assert_eq!(reader.get_char(x, 9), Some(b' '));
			assert_eq!(reader.get_attr(x, 9), Some((Colour::BLACK, Colour::BLUE)));
		}
		assert_eq!(reader.get_attr(40, 9), Some((Colour::BLACK, Colour::BLACK)));
	}

	#[test]
	fn border_and_clear() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.draw_border();
		let reader = frame.reader();
		assert_eq!(reader.get_char(40, 0), Some(b'='));
		assert_eq!(reader.get_char(40, 19), Some(b'='));
		assert_eq!(reader.get_char(0, 10), Some(b'|'));
		assert_eq!(reader.get_char(79, 10), Some(b'|'));
		assert_eq!(reader.get_char(40, 10), Some(b' '));
		assert_eq!(reader.get_attr(0, 10), Some((Colour::GREY, Colour::BLACK)));
		writer.clear_frame();
		assert_eq!(snapshot(&frame), snapshot(&FrameBuffer::new()));
	}

	proptest! {
		#[test]
		fn off_screen_writes_change_nothing(
			x in 0usize..200,
			y in 0usize..100,
			ch in any::<u8>(),
			fg in 0u8..64,
			bg in 0u8..64,
		) {
			prop_assume!(x >= NUM_TEXT_COLS || y >= NUM_TEXT_ROWS);
			let frame = FrameBuffer::new();
			let mut writer = frame.writer().unwrap();
			writer.draw_border();
			let before = snapshot(&frame);
			writer.put_char(x, y, ch);
			writer.put_attr(x, y, Colour::new(fg), Colour::new(bg));
			prop_assert_eq!(snapshot(&frame), before);
		}

		#[test]
		fn put_attr_only_touches_its_own_cell(
			x in 0usize..NUM_TEXT_COLS,
			y in 0usize..NUM_TEXT_ROWS,
			fg in 0u8..64,
			bg in 0u8..64,
			seed in any::<u64>(),
		) {
			let frame = FrameBuffer::new();
			let mut writer = frame.writer().unwrap();
			// Give every cell some colour first
			let mut state = seed;
			for cy in 0..NUM_TEXT_ROWS {
				for cx in 0..NUM_TEXT_COLS {
					state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
					let bits = (state >> 32) as u8;
					writer.put_attr(cx, cy, Colour::new(bits), Colour::new(bits >> 2));
				}
			}
			let reader = frame.reader();
			let before: Vec<_> = (0..NUM_CELLS)
				.map(|i| reader.get_attr(i % NUM_TEXT_COLS, i / NUM_TEXT_COLS))
				.collect();
			writer.put_attr(x, y, Colour::new(fg), Colour::new(bg));
			for i in 0..NUM_CELLS {
				let (cx, cy) = (i % NUM_TEXT_COLS, i / NUM_TEXT_COLS);
				if (cx, cy) == (x, y) {
					prop_assert_eq!(reader.get_attr(cx, cy), Some((Colour::new(fg), Colour::new(bg))));
				} else {
					prop_assert_eq!(reader.get_attr(cx, cy), before[i]);
				}
			}
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
