//! Counts watchdog resets across reboots.
//!
//! The count lives in a watchdog scratch register, which survives a watchdog
//! reset but not a power cycle. A second scratch register holds a marker, so
//! we can tell a count we wrote from whatever the register held at power-up.

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

use crate::traits::{BootCause, ScratchStore};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The scratch register holding the reset count.
pub const COUNTER_SCRATCH: usize = 4;

/// The scratch register holding [`COUNTER_MARKER`].
pub const MARKER_SCRATCH: usize = 3;

/// Says the counter register holds a count.
pub const COUNTER_MARKER: u32 = 0x5344_4643;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// What we learned about the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootRecord {
	/// Why we booted.
	///
	/// A watchdog reset we have no valid count for is reported as a
	/// power-on.
	pub cause: BootCause,
	/// How many watchdog resets in a row, including this one.
	pub resets: u32,
}

/// The persistent fault counter.
pub struct FaultCounter<S> {
	store: S,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<S> FaultCounter<S>
where
	S: ScratchStore,
{
	/// Wrap a scratch store.
	pub fn new(store: S) -> FaultCounter<S> {
		FaultCounter { store }
	}

	/// Work out why we booted, and update the count to match.
	///
	/// Call this once, early in boot.
	pub fn read_and_classify_boot(&mut self) -> BootRecord {
		let have_count = self.store.read(MARKER_SCRATCH) == COUNTER_MARKER;
		let cause = self.store.boot_cause();
		match cause {
			BootCause::Watchdog if have_count => BootRecord {
				cause: BootCause::Watchdog,
				resets: self.record_fault_increment(),
			},
			_ => {
				self.store.write(COUNTER_SCRATCH, 0);
				self.store.write(MARKER_SCRATCH, COUNTER_MARKER);
				BootRecord {
					cause: BootCause::PowerOn,
					resets: 0,
				}
			}
		}
	}

	/// Add one to the stored count, and return the new count.
	pub fn record_fault_increment(&mut self) -> u32 {
		let count = self.store.read(COUNTER_SCRATCH).saturating_add(1);
		self.store.write(COUNTER_SCRATCH, count);
		self.store.write(MARKER_SCRATCH, COUNTER_MARKER);
		count
	}

	/// Give the scratch store back.
	pub fn release(self) -> S {
		self.store
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
