//! The heartbeat between the display core and the logic core.
//!
//! The display core bumps it once per frame. The logic core samples it every
//! so often and only feeds the watchdog if it has moved.

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

use crate::mutex::SpinMutex;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A frame counter, shared between the cores under a mutex.
///
/// It wraps around. Readers only ever compare it for equality.
pub struct Heartbeat {
	count: SpinMutex<u32>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl Heartbeat {
	/// Make a heartbeat that starts at zero.
	pub const fn new() -> Heartbeat {
		Heartbeat::starting_at(0)
	}

	/// Make a heartbeat that starts at the given count.
	pub const fn starting_at(count: u32) -> Heartbeat {
		Heartbeat {
			count: SpinMutex::new(count),
		}
	}

	/// Add one to the count.
	pub fn bump(&self) {
		let mut count = self.count.lock();
		*count = count.wrapping_add(1);
	}

	/// Read the count.
	pub fn sample(&self) -> u32 {
		*self.count.lock()
	}
}

impl Default for Heartbeat {
	fn default() -> Self {
		Heartbeat::new()
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
