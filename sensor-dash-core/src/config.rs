//! Supervisor timing.

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

/// How often the supervisor does things, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorConfig {
	/// How often we look at the heartbeat.
	pub check_interval_ms: u32,
	/// How long the watchdog waits for a pet before it resets the chip.
	pub watchdog_timeout_ms: u32,
	/// How long the supervisor loop sleeps between polls.
	pub poll_interval_ms: u32,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl SupervisorConfig {
	/// The timings the firmware uses.
	pub const DEFAULT: SupervisorConfig = SupervisorConfig {
		check_interval_ms: 200,
		watchdog_timeout_ms: 5000,
		poll_interval_ms: 10,
	};
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		SupervisorConfig::DEFAULT
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
