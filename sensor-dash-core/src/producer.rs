//! The scan-line producer, which runs on the display core.
//!
//! For every visible scan-line it takes a free line buffer, encodes the three
//! colour planes of the text row under that line into it, and hands it back
//! for playing out. Once per frame it bumps the heartbeat so the logic core
//! knows we're still going.

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

use crate::{
	font::{self, Font},
	frame::{self, FrameReader},
	heartbeat::Heartbeat,
	queue::SymbolQueue,
	tmds::SymbolEncoder,
};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Turns the frame buffer into a stream of encoded scan-lines.
pub struct ScanlineProducer<'a, E, Q> {
	frame: FrameReader<'a>,
	heartbeat: &'a Heartbeat,
	encoder: E,
	queue: Q,
	font: &'a Font,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<'a, E, Q> ScanlineProducer<'a, E, Q>
where
	E: SymbolEncoder,
	Q: SymbolQueue,
{
	/// Make a new producer.
	pub fn new(
		frame: FrameReader<'a>,
		heartbeat: &'a Heartbeat,
		encoder: E,
		queue: Q,
		font: &'a Font,
	) -> ScanlineProducer<'a, E, Q> {
		ScanlineProducer {
			frame,
			heartbeat,
			encoder,
			queue,
			font,
		}
	}

	/// Encode visible scan-line `y` and queue it.
	///
	/// Waits for a free buffer if there isn't one. Panics if `y` is not a
	/// visible line.
	#[inline(always)]
	pub fn render_scanline(&mut self, y: usize) {
		let text_row = y / frame::CELL_HEIGHT_PX;
		let glyph_row = (y % frame::CELL_HEIGHT_PX) / font::SCALE;
		let chars = self.frame.row_chars(text_row);
		let glyphs = self.font.glyph_row(glyph_row);

		let mut line = self.queue.dequeue_free();
		for plane in 0..frame::NUM_PLANES {
			self.encoder.encode(
				chars,
				self.frame.plane_row(plane, text_row),
				glyphs,
				line.plane_mut(plane),
			);
		}
		self.queue.enqueue_valid(line);
	}

	/// Bump the heartbeat, then encode every visible line of one frame.
	pub fn render_frame(&mut self) {
		self.heartbeat.bump();
		for y in 0..frame::NUM_LINES {
			self.render_scanline(y);
		}
	}

	/// Produce frames forever.
	pub fn run(&mut self) -> ! {
		loop {
			self.render_frame();
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		colour::Colour,
		font::{GlyphRow, FONT_8X8},
		frame::FrameBuffer,
		queue::LineSymbols,
		tmds::{self, FontEncoder},
	};
	use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

	/// A queue with endless free buffers that keeps everything it is given.
	#[derive(Default)]
	struct CollectQueue {
		lines: Vec<Box<LineSymbols>>,
	}

	impl SymbolQueue for &mut CollectQueue {
		type Line = Box<LineSymbols>;

		fn dequeue_free(&mut self) -> Self::Line {
			Box::new(LineSymbols::blank())
		}

		fn enqueue_valid(&mut self, line: Self::Line) {
			self.lines.push(line);
		}
	}

	/// Records which glyph row it was asked for, in every word.
	struct RowEncoder;

	impl SymbolEncoder for RowEncoder {
		fn encode(
			&self,
			chars: &[AtomicU8],
			_colour_words: &[AtomicU32],
			glyphs: GlyphRow<'_>,
			out: &mut [u32],
		) {
			let first = chars[0].load(Ordering::Relaxed);
			for word in out.iter_mut() {
				*word = u32::from(first) << 8 | u32::from(glyphs.bits(b'_'));
			}
		}
	}

	#[test]
	fn scanline_picks_text_row_and_glyph_row() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.put_char(0, 2, b'A');
		let heartbeat = Heartbeat::new();
		let mut collected = CollectQueue::default();
		let mut producer =
			ScanlineProducer::new(frame.reader(), &heartbeat, RowEncoder, &mut collected, &FONT_8X8);
		// Line 71 is text row 2, the last repeat of glyph row 7
		producer.render_scanline(71);
		// Line 72 is text row 3, glyph row 0
		producer.render_scanline(72);
		drop(producer);
		assert_eq!(collected.lines.len(), 2);
		assert!(collected.lines[0].plane(2).iter().all(|w| *w == (u32::from(b'A') << 8 | 0xFF)));
		assert!(collected.lines[1].plane(0).iter().all(|w| *w == (u32::from(b' ') << 8)));
	}

	#[test]
	fn frame_is_encoded_with_real_font() {
		let frame = FrameBuffer::new();
		let mut writer = frame.writer().unwrap();
		writer.draw_text(0, 0, "_", Colour::RED, Colour::BLUE);
		let heartbeat = Heartbeat::new();
		let mut collected = CollectQueue::default();
		let mut producer =
			ScanlineProducer::new(frame.reader(), &heartbeat, FontEncoder, &mut collected, &FONT_8X8);
		producer.render_frame();
		drop(producer);
		assert_eq!(collected.lines.len(), frame::NUM_LINES);
		// Lines 21 to 23 show glyph row 7 of '_', which is solid.
		let underline = &collected.lines[22];
		assert_eq!(underline.plane(2)[..4], [tmds::level_word(3); 4]);
		assert_eq!(underline.plane(0)[..4], [tmds::level_word(0); 4]);
		// Line 0 is row 0 of '_', which is blank, so we see the background.
		let top = &collected.lines[0];
		assert_eq!(top.plane(0)[..4], [tmds::level_word(3); 4]);
		assert_eq!(top.plane(2)[..4], [tmds::level_word(0); 4]);
		// Every other cell is black on black.
		assert!(top.plane(1).iter().all(|w| *w == tmds::level_word(0)));
	}

	#[test]
	fn heartbeat_counts_frames() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::starting_at(100);
		let mut collected = CollectQueue::default();
		let mut producer =
			ScanlineProducer::new(frame.reader(), &heartbeat, RowEncoder, &mut collected, &FONT_8X8);
		for n in 1..=5 {
			producer.render_frame();
			assert_eq!(heartbeat.sample(), 100 + n);
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
