//! Splits a stream of serial bytes into lines.

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

/// The longest line we keep, in bytes.
pub const MAX_LINE_LEN: usize = 127;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// What came out of the accumulator when it saw a line ending.
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
	/// A whole line, without its terminator.
	Complete(&'a [u8]),
	/// A line that was longer than [`MAX_LINE_LEN`]. Its contents are gone.
	Overflowed,
}

/// Collects bytes until it sees a CR or an LF.
///
/// Never holds more than [`MAX_LINE_LEN`] bytes. Anything past that is
/// dropped, and the line is reported as [`Line::Overflowed`] when it ends.
#[derive(Debug, Default)]
pub struct LineAccumulator {
	buffer: heapless::Vec<u8, MAX_LINE_LEN>,
	overflowed: bool,
	/// The buffer holds a line we already handed out.
	finished: bool,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl LineAccumulator {
	/// Make an empty accumulator.
	pub const fn new() -> LineAccumulator {
		LineAccumulator {
			buffer: heapless::Vec::new(),
			overflowed: false,
			finished: false,
		}
	}

	/// Add one byte.
	///
	/// Returns the line if this byte ended one.
	pub fn push(&mut self, byte: u8) -> Option<Line<'_>> {
		if self.finished {
			self.buffer.clear();
			self.finished = false;
		}
		match byte {
			b'\r' | b'\n' => {
				self.finished = true;
				if core::mem::replace(&mut self.overflowed, false) {
					Some(Line::Overflowed)
				} else {
					Some(Line::Complete(self.buffer.as_slice()))
				}
			}
			_ => {
				if self.buffer.push(byte).is_err() {
					self.overflowed = true;
				}
				None
			}
		}
	}

	/// Is there a partial line waiting for its terminator?
	pub fn has_partial(&self) -> bool {
		!self.finished && (!self.buffer.is_empty() || self.overflowed)
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	fn feed(acc: &mut LineAccumulator, bytes: &[u8]) -> Vec<Option<Vec<u8>>> {
		let mut lines = Vec::new();
		for b in bytes {
			match acc.push(*b) {
				Some(Line::Complete(line)) => lines.push(Some(line.to_vec())),
				Some(Line::Overflowed) => lines.push(None),
				None => {}
			}
		}
		lines
	}

	#[test]
	fn splits_on_cr_and_lf() {
		let mut acc = LineAccumulator::new();
		let lines = feed(&mut acc, b"one\ntwo\r\nthree\r");
		assert_eq!(
			lines,
			vec![
				Some(b"one".to_vec()),
				Some(b"two".to_vec()),
				Some(b"".to_vec()),
				Some(b"three".to_vec())
			]
		);
		assert!(!acc.has_partial());
	}

	#[test]
	fn partial_line_waits() {
		let mut acc = LineAccumulator::new();
		assert!(feed(&mut acc, b"SENSOR:AHT").is_empty());
		assert!(acc.has_partial());
		assert_eq!(feed(&mut acc, b"20\n"), vec![Some(b"SENSOR:AHT20".to_vec())]);
	}

	#[test]
	fn longest_line_fits() {
		let mut acc = LineAccumulator::new();
		let mut bytes = vec![b'x'; MAX_LINE_LEN];
		bytes.push(b'\n');
		let lines = feed(&mut acc, &bytes);
		assert_eq!(lines.len(), 1);
		assert_eq!(lines[0].as_ref().map(|l| l.len()), Some(MAX_LINE_LEN));
	}

	#[test]
	fn long_line_overflows_then_recovers() {
		let mut acc = LineAccumulator::new();
		let mut bytes = vec![b'7'; 200];
		bytes.push(b'\n');
		bytes.extend_from_slice(b"KILL\n");
		assert_eq!(feed(&mut acc, &bytes), vec![None, Some(b"KILL".to_vec())]);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
