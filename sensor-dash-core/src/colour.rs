//! Code for handling 6-bit text colours.

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

/// Represents a 6-bit colour value.
///
/// Each TMDS lane (or *plane*) gets two bits of intensity. They are packed
/// with plane 0 in the lowest pair, which is the order the encoder consumes
/// them. Plane 0 is lane 0 of the DVI link, which carries blue; plane 1 is
/// green and plane 2 is red.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Colour(u8);

impl Colour {
	/// Black (all bits off)
	pub const BLACK: Colour = Colour::from_rgb(0, 0, 0);

	/// White
	pub const WHITE: Colour = Colour::from_rgb(3, 3, 3);

	/// Mid grey
	pub const GREY: Colour = Colour::from_rgb(1, 1, 1);

	/// Red
	pub const RED: Colour = Colour::from_rgb(3, 0, 0);

	/// Green
	pub const GREEN: Colour = Colour::from_rgb(0, 3, 0);

	/// Blue
	pub const BLUE: Colour = Colour::from_rgb(0, 0, 3);

	/// Cyan
	pub const CYAN: Colour = Colour::from_rgb(0, 3, 3);

	/// Yellow
	pub const YELLOW: Colour = Colour::from_rgb(3, 3, 0);

	/// Make a [`Colour`] from a raw 6-bit value.
	///
	/// The top two bits are discarded.
	pub const fn new(bits: u8) -> Colour {
		Colour(bits & 0x3F)
	}

	/// Make a [`Colour`] from three 2-bit channels.
	///
	/// Only the bottom 2 bits of each channel are retained.
	pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Colour {
		Colour(((red & 3) << 4) | ((green & 3) << 2) | (blue & 3))
	}

	/// Get the raw 6-bit value.
	pub const fn bits(self) -> u8 {
		self.0
	}

	/// Get the two bits this colour contributes to the given plane.
	pub const fn plane(self, plane: usize) -> u8 {
		(self.0 >> (plane * 2)) & 3
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
