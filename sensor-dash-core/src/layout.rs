//! Where everything goes on the screen.
//!
//! ```text
//! ================================================================================
//! | ENERGIZACAO NORMAL                                             RST: 0      * |
//! |                        MONITORAMENTO DE SENSORES                             |
//! |                             (Recebimento via UART)                           |
//! |                                                                              |
//! |         SENSOR BMP280 (Pressao):                                             |
//! |           Temperatura:      25.42 C                                          |
//! |           Altitude...:      812.35 m                                         |
//! ```

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

use core::fmt::Write;

use crate::{
	colour::Colour,
	fault::BootRecord,
	frame::FrameWriter,
	traits::BootCause,
};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The row holding the boot banner, reset count and pulse.
pub const STATUS_ROW: usize = 1;

/// The column of the boot banner.
pub const BANNER_COL: usize = 2;

/// The column of the `RST: N` reset count.
pub const RESET_COUNT_COL: usize = 66;

/// The cell that blinks while the display core is alive.
pub const PULSE_POS: (usize, usize) = (77, 1);

/// The reset count stops short of the pulse.
pub const RESET_COUNT_WIDTH: usize = PULSE_POS.0 - RESET_COUNT_COL;

/// The column every sensor value starts in.
pub const VALUE_COL: usize = 30;

/// How many cells each sensor value may use.
pub const VALUE_WIDTH: usize = 10;

/// The row of the BMP280 temperature.
pub const BMP_TEMP_ROW: usize = 8;

/// The row of the BMP280 altitude.
pub const BMP_ALT_ROW: usize = 9;

/// The row of the AHT20 temperature.
pub const AHT_TEMP_ROW: usize = 14;

/// The row of the AHT20 humidity.
pub const AHT_HUM_ROW: usize = 15;

const NORMAL_BANNER: &str = "ENERGIZACAO NORMAL";
const RECOVERED_BANNER: &str = "RECUPERADO DE FALHA (WATCHDOG)";

/// Fixed text: column, row, text, foreground colour.
static LABELS: [(usize, usize, &str, Colour); 8] = [
	(25, 2, "MONITORAMENTO DE SENSORES", Colour::WHITE),
	(30, 3, "(Recebimento via UART)", Colour::GREY),
	(10, 6, "SENSOR BMP280 (Pressao):", Colour::CYAN),
	(10, BMP_TEMP_ROW, "  Temperatura:", Colour::WHITE),
	(10, BMP_ALT_ROW, "  Altitude...:", Colour::WHITE),
	(10, 12, "SENSOR AHT20  (Umidade):", Colour::YELLOW),
	(10, AHT_TEMP_ROW, "  Temperatura:", Colour::WHITE),
	(10, AHT_HUM_ROW, "  Umidade....:", Colour::WHITE),
];

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A `core::fmt::Write` sink that keeps the first `N` bytes and quietly drops
/// the rest.
pub struct ClippedText<const N: usize> {
	text: heapless::String<N>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Clear the screen and draw everything that doesn't change.
pub fn draw_static(writer: &mut FrameWriter, boot: &BootRecord) {
	writer.clear_frame();
	writer.draw_border();

	let (banner, colour) = match boot.cause {
		BootCause::PowerOn => (NORMAL_BANNER, Colour::GREEN),
		BootCause::Watchdog => (RECOVERED_BANNER, Colour::RED),
	};
	writer.draw_text(BANNER_COL, STATUS_ROW, banner, colour, Colour::BLACK);

	let mut count: ClippedText<RESET_COUNT_WIDTH> = ClippedText::new();
	let _ = write!(count, "RST: {}", boot.resets);
	writer.draw_text(
		RESET_COUNT_COL,
		STATUS_ROW,
		count.as_str(),
		Colour::WHITE,
		Colour::BLACK,
	);

	for (x, y, text, fg) in LABELS.iter() {
		writer.draw_text(*x, *y, text, *fg, Colour::BLACK);
	}
}

/// Blank a value's span, then draw the new value into it.
pub fn draw_value(writer: &mut FrameWriter, row: usize, value: f32, unit: &str) {
	let mut text: ClippedText<VALUE_WIDTH> = ClippedText::new();
	let _ = write!(text, "{:.2} {}", value, unit);
	writer.clear_span(VALUE_COL, row, VALUE_WIDTH, Colour::BLACK);
	writer.draw_text(VALUE_COL, row, text.as_str(), Colour::WHITE, Colour::BLACK);
}

/// Draw the pulse glyph, lit or not.
pub fn draw_pulse(writer: &mut FrameWriter, lit: bool) {
	let (x, y) = PULSE_POS;
	writer.put_char(x, y, if lit { b'*' } else { b' ' });
	writer.put_attr(x, y, Colour::GREEN, Colour::BLACK);
}

impl<const N: usize> ClippedText<N> {
	/// Make an empty one.
	pub fn new() -> ClippedText<N> {
		ClippedText {
			text: heapless::String::new(),
		}
	}

	/// Get what we kept.
	pub fn as_str(&self) -> &str {
		self.text.as_str()
	}
}

impl<const N: usize> Default for ClippedText<N> {
	fn default() -> Self {
		ClippedText::new()
	}
}

impl<const N: usize> core::fmt::Write for ClippedText<N> {
	fn write_str(&mut self, s: &str) -> core::fmt::Result {
		for ch in s.chars() {
			if self.text.push(ch).is_err() {
				break;
			}
		}
		Ok(())
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
