//! Scan-line buffers and the queues that carry them.
//!
//! There are two queues. The *free* queue carries empty line buffers from the
//! serialiser to the scan-line producer. The *valid* queue carries encoded
//! line buffers back again. Each queue has exactly one producer and one
//! consumer, so we can use the lock-free SPSC queue from `heapless`.

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

use core::ops::DerefMut;

use heapless::spsc::{Consumer, Producer};

use crate::{frame, tmds};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The number of symbol words in one plane of one scan-line.
pub const PLANE_WORDS: usize = frame::NUM_PIXELS_PER_LINE / tmds::SYMBOLS_PER_WORD;

/// The number of symbol words in one scan-line, across all three planes.
pub const LINE_WORDS: usize = PLANE_WORDS * frame::NUM_PLANES;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The TMDS symbols for one visible scan-line.
///
/// Plane 0 comes first, then plane 1, then plane 2, so each lane's DMA channel
/// reads a contiguous run of words.
#[repr(C, align(4))]
pub struct LineSymbols {
	words: [u32; LINE_WORDS],
}

/// Where the scan-line producer gets empty buffers from, and puts full ones.
pub trait SymbolQueue {
	/// A borrowed line buffer.
	type Line: DerefMut<Target = LineSymbols>;

	/// Get an empty buffer, waiting for one if none are free.
	fn dequeue_free(&mut self) -> Self::Line;

	/// Hand over a full buffer, waiting for space if the queue is full.
	fn enqueue_valid(&mut self, line: Self::Line);
}

/// The producer's ends of a pair of `heapless` SPSC queues.
///
/// The consumer of `valid` and the producer of `free` belong to whoever plays
/// the lines out.
pub struct SpscLineQueue<'q, 'b, const N: usize> {
	free: Consumer<'q, &'b mut LineSymbols, N>,
	valid: Producer<'q, &'b mut LineSymbols, N>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl LineSymbols {
	/// A line of solid black.
	pub const fn blank() -> LineSymbols {
		LineSymbols {
			words: [tmds::level_word(0); LINE_WORDS],
		}
	}

	/// Get the words for one plane.
	///
	/// Panics if the plane doesn't exist.
	pub fn plane(&self, plane: usize) -> &[u32] {
		&self.words[plane * PLANE_WORDS..(plane + 1) * PLANE_WORDS]
	}

	/// Get the words for one plane, for writing.
	///
	/// Panics if the plane doesn't exist.
	pub fn plane_mut(&mut self, plane: usize) -> &mut [u32] {
		&mut self.words[plane * PLANE_WORDS..(plane + 1) * PLANE_WORDS]
	}

	/// Get the address of the first word of a plane, for the DMA engine.
	///
	/// Panics if the plane doesn't exist.
	pub fn plane_addr(&self, plane: usize) -> *const u32 {
		self.plane(plane).as_ptr()
	}
}

impl Default for LineSymbols {
	fn default() -> Self {
		LineSymbols::blank()
	}
}

impl<'q, 'b, const N: usize> SpscLineQueue<'q, 'b, N> {
	/// Wrap the producer's ends of the two queues.
	pub fn new(
		free: Consumer<'q, &'b mut LineSymbols, N>,
		valid: Producer<'q, &'b mut LineSymbols, N>,
	) -> SpscLineQueue<'q, 'b, N> {
		SpscLineQueue { free, valid }
	}
}

impl<'q, 'b, const N: usize> SymbolQueue for SpscLineQueue<'q, 'b, N> {
	type Line = &'b mut LineSymbols;

	fn dequeue_free(&mut self) -> Self::Line {
		loop {
			if let Some(line) = self.free.dequeue() {
				return line;
			}
			core::hint::spin_loop();
		}
	}

	fn enqueue_valid(&mut self, line: Self::Line) {
		let mut line = line;
		loop {
			match self.valid.enqueue(line) {
				Ok(()) => return,
				Err(returned) => line = returned,
			}
			core::hint::spin_loop();
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use heapless::spsc::Queue;

	#[test]
	fn plane_views() {
		let mut line = LineSymbols::blank();
		assert_eq!(PLANE_WORDS, 320);
		assert_eq!(LINE_WORDS, 960);
		line.plane_mut(1)[0] = 1;
		line.plane_mut(2)[319] = 2;
		assert_eq!(line.words[320], 1);
		assert_eq!(line.words[959], 2);
		assert_eq!(line.plane(0)[0], tmds::level_word(0));
		assert_eq!(line.plane_addr(1), &line.words[320] as *const u32);
	}

	#[test]
	fn buffers_circulate_between_threads() {
		const LINES: usize = 500;
		let mut buffers = [LineSymbols::blank(), LineSymbols::blank(), LineSymbols::blank()];
		let mut free: Queue<&mut LineSymbols, 4> = Queue::new();
		let mut valid: Queue<&mut LineSymbols, 4> = Queue::new();
		let (mut free_tx, free_rx) = free.split();
		let (valid_tx, mut valid_rx) = valid.split();
		for buffer in buffers.iter_mut() {
			assert!(free_tx.enqueue(buffer).is_ok());
		}
		let mut queue = SpscLineQueue::new(free_rx, valid_tx);

		std::thread::scope(|s| {
			s.spawn(move || {
				for n in 0..LINES {
					let line = queue.dequeue_free();
					line.plane_mut(0)[0] = n as u32;
					queue.enqueue_valid(line);
				}
			});
			// Play the lines out, like the DMA interrupt does
			let mut played = 0;
			while played < LINES {
				if let Some(line) = valid_rx.dequeue() {
					assert_eq!(line.plane(0)[0], played as u32);
					played += 1;
					assert!(free_tx.enqueue(line).is_ok());
				}
			}
		});
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
