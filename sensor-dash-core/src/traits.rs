//! The hardware the core logic needs, as traits.
//!
//! The firmware implements these on top of the RP2040 HAL. The tests implement
//! them with simulations.

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
// Types
// -----------------------------------------------------------------------------

/// Why the chip last came out of reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootCause {
	/// Power was applied, or the RUN pin was pulled low.
	PowerOn,
	/// The watchdog timer ran out.
	Watchdog,
}

/// A source of received serial bytes.
pub trait ByteSource {
	/// Get the next byte, if one has arrived.
	///
	/// Never waits. Bytes with framing or parity errors are dropped by the
	/// implementation.
	fn read_byte(&mut self) -> Option<u8>;
}

/// A hardware watchdog that's already running.
pub trait WatchdogPet {
	/// Restart the countdown.
	fn pet(&mut self);
}

/// A few words of storage that survive a watchdog reset.
pub trait ScratchStore {
	/// Why did we boot?
	fn boot_cause(&self) -> BootCause;

	/// Read a scratch register.
	fn read(&self, index: usize) -> u32;

	/// Write a scratch register.
	fn write(&mut self, index: usize, value: u32);
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The `TIMER` bit of the RP2040 watchdog's `REASON` register.
const REASON_TIMER: u32 = 1 << 0;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl BootCause {
	/// Classify the RP2040 watchdog's `REASON` register.
	///
	/// Only a timeout counts. A forced reset (`FORCE`, as used by debuggers
	/// and `picotool reboot`) is a deliberate restart, not a fault.
	pub const fn from_watchdog_reason(reason: u32) -> BootCause {
		if reason & REASON_TIMER != 0 {
			BootCause::Watchdog
		} else {
			BootCause::PowerOn
		}
	}
}

impl<T> ScratchStore for &mut T
where
	T: ScratchStore + ?Sized,
{
	fn boot_cause(&self) -> BootCause {
		(**self).boot_cause()
	}

	fn read(&self, index: usize) -> u32 {
		(**self).read(index)
	}

	fn write(&mut self, index: usize, value: u32) {
		(**self).write(index, value)
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_a_timeout_is_a_watchdog_boot() {
		assert_eq!(BootCause::from_watchdog_reason(0), BootCause::PowerOn);
		assert_eq!(BootCause::from_watchdog_reason(0b01), BootCause::Watchdog);
		assert_eq!(BootCause::from_watchdog_reason(0b10), BootCause::PowerOn);
		assert_eq!(BootCause::from_watchdog_reason(0b11), BootCause::Watchdog);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
