//! Video timing for the DVI link.
//!
//! Every scan-line is sent as four periods: front porch, sync pulse, back
//! porch and then the active pixels. During the first three, lane 0 carries
//! HSYNC and VSYNC as control symbols and lanes 1 and 2 carry `CTRL_00`.
//! Whole lines of blanking at the bottom of the frame make up the vertical
//! front porch, sync pulse and back porch.

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

use crate::tmds;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Describes the polarity of a sync pulse.
///
/// Some pulses are positive (active-high), some are negative (active-low).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncPolarity {
	/// An active-high pulse
	Positive,
	/// An active-low pulse
	Negative,
}

/// What gets sent on a given scan-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineKind {
	/// Pixels from the frame buffer
	Visible,
	/// Vertical front porch or back porch
	VblankPorch,
	/// Vertical sync pulse
	VblankSync,
}

/// The horizontal and vertical timings of a video mode.
///
/// Horizontal values are in pixels, vertical values are in scan-lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTiming {
	/// Blank pixels between the active area and the sync pulse
	pub h_front_porch: u32,
	/// Length of the horizontal sync pulse
	pub h_sync_width: u32,
	/// Blank pixels between the sync pulse and the active area
	pub h_back_porch: u32,
	/// Visible pixels per line
	pub h_active: u32,
	/// Which way the horizontal sync pulse goes
	pub h_sync_polarity: SyncPolarity,
	/// Blank lines between the last visible line and the sync pulse
	pub v_front_porch: u16,
	/// Length of the vertical sync pulse
	pub v_sync_width: u16,
	/// Blank lines between the sync pulse and the first visible line
	pub v_back_porch: u16,
	/// Visible lines per frame
	pub v_active: u16,
	/// Which way the vertical sync pulse goes
	pub v_sync_polarity: SyncPolarity,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The number of periods in every scan-line.
pub const PERIODS_PER_LINE: usize = 4;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl SyncPolarity {
	/// The level of the sync signal, given whether the pulse is happening.
	pub const fn level(&self, pulse: bool) -> bool {
		match self {
			SyncPolarity::Positive => pulse,
			SyncPolarity::Negative => !pulse,
		}
	}
}

impl VideoTiming {
	/// Standard 640x480 @ 60 Hz, with a 25.2 MHz pixel clock.
	pub const MODE_640X480_60: VideoTiming = VideoTiming {
		h_front_porch: 16,
		h_sync_width: 96,
		h_back_porch: 48,
		h_active: 640,
		h_sync_polarity: SyncPolarity::Negative,
		v_front_porch: 10,
		v_sync_width: 2,
		v_back_porch: 33,
		v_active: 480,
		v_sync_polarity: SyncPolarity::Negative,
	};

	/// Pixels per scan-line, including blanking.
	pub const fn h_total(&self) -> u32 {
		self.h_front_porch + self.h_sync_width + self.h_back_porch + self.h_active
	}

	/// Scan-lines per frame, including blanking.
	pub const fn v_total(&self) -> u16 {
		self.v_front_porch + self.v_sync_width + self.v_back_porch + self.v_active
	}

	/// The last visible scan-line.
	pub const fn visible_lines_ends_at(&self) -> u16 {
		self.v_active - 1
	}

	/// The last scan-line of the front porch.
	pub const fn front_porch_ends_at(&self) -> u16 {
		self.visible_lines_ends_at() + self.v_front_porch
	}

	/// The last scan-line of the sync pulse.
	pub const fn sync_pulse_ends_at(&self) -> u16 {
		self.front_porch_ends_at() + self.v_sync_width
	}

	/// The last scan-line of the back-porch (and the frame).
	pub const fn back_porch_ends_at(&self) -> u16 {
		self.sync_pulse_ends_at() + self.v_back_porch
	}

	/// The scan-line after `line`, wrapping at the end of the frame.
	pub const fn next_line(&self, line: u16) -> u16 {
		if line >= self.back_porch_ends_at() {
			0
		} else {
			line + 1
		}
	}

	/// What goes out on `line`.
	pub const fn line_kind(&self, line: u16) -> LineKind {
		if line <= self.visible_lines_ends_at() {
			LineKind::Visible
		} else if line <= self.front_porch_ends_at() {
			LineKind::VblankPorch
		} else if line <= self.sync_pulse_ends_at() {
			LineKind::VblankSync
		} else {
			LineKind::VblankPorch
		}
	}

	/// The length of each period of a scan-line, in symbol words.
	///
	/// In order: front porch, sync, back porch, active.
	pub const fn period_words(&self) -> [u32; PERIODS_PER_LINE] {
		let per_word = tmds::SYMBOLS_PER_WORD as u32;
		[
			self.h_front_porch / per_word,
			self.h_sync_width / per_word,
			self.h_back_porch / per_word,
			self.h_active / per_word,
		]
	}

	/// The blanking word lane 0 sends, given which sync pulses are happening.
	pub const fn lane0_word(&self, hsync_pulse: bool, vsync_pulse: bool) -> u32 {
		tmds::control_word(
			self.h_sync_polarity.level(hsync_pulse),
			self.v_sync_polarity.level(vsync_pulse),
		)
	}

	/// The blanking word lanes 1 and 2 send.
	pub const fn lane12_word(&self) -> u32 {
		tmds::control_word(false, false)
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	const MODE: VideoTiming = VideoTiming::MODE_640X480_60;

	#[test]
	fn totals() {
		assert_eq!(MODE.h_total(), 800);
		assert_eq!(MODE.v_total(), 525);
		let words: u32 = MODE.period_words().iter().sum();
		assert_eq!(words * tmds::SYMBOLS_PER_WORD as u32, 800);
		assert_eq!(MODE.period_words(), [8, 48, 24, 320]);
	}

	#[test]
	fn line_boundaries() {
		assert_eq!(MODE.visible_lines_ends_at(), 479);
		assert_eq!(MODE.front_porch_ends_at(), 489);
		assert_eq!(MODE.sync_pulse_ends_at(), 491);
		assert_eq!(MODE.back_porch_ends_at(), 524);
		assert_eq!(MODE.line_kind(0), LineKind::Visible);
		assert_eq!(MODE.line_kind(479), LineKind::Visible);
		assert_eq!(MODE.line_kind(480), LineKind::VblankPorch);
		assert_eq!(MODE.line_kind(489), LineKind::VblankPorch);
		assert_eq!(MODE.line_kind(490), LineKind::VblankSync);
		assert_eq!(MODE.line_kind(491), LineKind::VblankSync);
		assert_eq!(MODE.line_kind(492), LineKind::VblankPorch);
		assert_eq!(MODE.line_kind(524), LineKind::VblankPorch);
	}

	#[test]
	fn a_frame_has_every_line_once() {
		let mut line = MODE.visible_lines_ends_at() + 1;
		let mut visible = 0;
		let mut sync = 0;
		for _ in 0..MODE.v_total() {
			match MODE.line_kind(line) {
				LineKind::Visible => visible += 1,
				LineKind::VblankSync => sync += 1,
				LineKind::VblankPorch => {}
			}
			line = MODE.next_line(line);
		}
		assert_eq!(line, MODE.visible_lines_ends_at() + 1);
		assert_eq!(visible, 480);
		assert_eq!(sync, 2);
	}

	#[test]
	fn negative_sync_idles_high() {
		assert_eq!(MODE.lane0_word(false, false), tmds::control_word(true, true));
		assert_eq!(MODE.lane0_word(true, false), tmds::control_word(false, true));
		assert_eq!(MODE.lane0_word(false, true), tmds::control_word(true, false));
		assert_eq!(MODE.lane0_word(true, true), tmds::control_word(false, false));
		assert_eq!(
			MODE.lane12_word() & 0x3FF,
			u32::from(tmds::CTRL_00)
		);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
