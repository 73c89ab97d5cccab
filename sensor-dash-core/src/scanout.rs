//! Keeps track of which line buffer the DVI link is sending.
//!
//! The DMA interrupt fires as each scan-line's active period starts. By then
//! the DMA has loaded the buffer for this line, so the handler can:
//!
//! 1. give back the buffer from the line before, which is finished with,
//! 2. pick a buffer for the next line, and
//! 3. point the DMA lists at it.
//!
//! [`Scanout`] does the bookkeeping. The firmware does the register writes.

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

use crate::timing::{LineKind, VideoTiming};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The line buffers the DMA holds, and the scan-line it is on.
pub struct Scanout<B> {
	timing: VideoTiming,
	/// The last scan-line we queued. By the next `advance` it's going out.
	line: u16,
	/// The buffer for the line before `line`
	playing: Option<B>,
	/// The buffer for `line`
	queued: Option<B>,
}

/// What changed when we moved on a line.
#[derive(Debug, PartialEq, Eq)]
pub struct Step<B> {
	/// A buffer the DMA has finished with.
	pub released: Option<B>,
	/// The kind of the line we just queued.
	pub next_kind: LineKind,
	/// The line we just queued is visible, but no buffer was ready.
	pub underrun: bool,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<B> Scanout<B> {
	/// Start on `first_line`, holding no buffers.
	pub const fn new(timing: VideoTiming, first_line: u16) -> Scanout<B> {
		Scanout {
			timing,
			line: first_line,
			playing: None,
			queued: None,
		}
	}

	/// The last scan-line queued, which is the one going out when the next
	/// interrupt fires.
	pub fn line(&self) -> u16 {
		self.line
	}

	/// The kind of [`Scanout::line`].
	pub fn kind(&self) -> LineKind {
		self.timing.line_kind(self.line)
	}

	/// The buffer queued for [`Scanout::line`], if it has one.
	pub fn queued(&self) -> Option<&B> {
		self.queued.as_ref()
	}

	/// Move on, once the active period of the current line has started.
	///
	/// `next_buffer` is only called if the next line is visible.
	pub fn advance<F>(&mut self, next_buffer: F) -> Step<B>
	where
		F: FnOnce() -> Option<B>,
	{
		let released = self.playing.take();
		self.playing = self.queued.take();
		self.line = self.timing.next_line(self.line);
		let next_kind = self.timing.line_kind(self.line);
		let mut underrun = false;
		if next_kind == LineKind::Visible {
			self.queued = next_buffer();
			underrun = self.queued.is_none();
		}
		Step {
			released,
			next_kind,
			underrun,
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
