//! # Sensor Dash core
//!
//! The board-agnostic half of the Sensor Dash firmware. Everything in here
//! builds for the host as well as for the RP2040, so it can be tested without
//! hardware:
//!
//! * the shared text-mode frame buffer and its colour planes,
//! * the 8x8 font and the software TMDS font encoder,
//! * the scan-line producer that runs on the display core,
//! * the heartbeat channel between the two cores,
//! * the supervisor that runs on the logic core and feeds the watchdog,
//! * the persistent fault counter, and
//! * the 640x480 video timing the DVI link follows, its DMA lists, and the
//!   book-keeping for which line buffer it is sending.
//!
//! The firmware crate supplies the hardware: the DVI serialiser, the UART, the
//! watchdog and its scratch registers.

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

#![cfg_attr(not(test), no_std)]

// -----------------------------------------------------------------------------
// Sub-modules
// -----------------------------------------------------------------------------

pub mod colour;
pub mod config;
pub mod dma;
pub mod fault;
pub mod font;
pub mod frame;
pub mod heartbeat;
pub mod layout;
pub mod line;
pub mod mutex;
pub mod producer;
pub mod queue;
pub mod scanout;
pub mod supervisor;
pub mod telemetry;
pub mod timing;
pub mod tmds;
pub mod traits;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

pub use colour::Colour;
pub use config::SupervisorConfig;
pub use frame::{FrameBuffer, FrameReader, FrameWriter};
pub use heartbeat::Heartbeat;
pub use producer::ScanlineProducer;
pub use supervisor::{Supervisor, SupervisorState};

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
