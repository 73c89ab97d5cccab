//! Sensor telemetry, as received over the serial port.
//!
//! The sensor board sends one line per reading:
//!
//! ```text
//! SENSOR:BMP280,TB:25.42,AL:812.35
//! SENSOR:AHT20,TA:24.10,UM:61.70
//! ```
//!
//! A line reading `KILL` asks the supervisor to hang, to prove the watchdog
//! works. Anything else is ignored.

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

const BMP280_PREFIX: &str = "SENSOR:BMP280,TB:";
const BMP280_SEPARATOR: &str = ",AL:";
const AHT20_PREFIX: &str = "SENSOR:AHT20,TA:";
const AHT20_SEPARATOR: &str = ",UM:";
const KILL: &str = "KILL";

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Something we were asked to do over the serial port.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
	/// A reading from the BMP280 pressure sensor.
	Bmp280 {
		/// Degrees Celsius
		temperature: f32,
		/// Metres
		altitude: f32,
	},
	/// A reading from the AHT20 humidity sensor.
	Aht20 {
		/// Degrees Celsius
		temperature: f32,
		/// Relative humidity, in percent
		humidity: f32,
	},
	/// Hang the supervisor so the watchdog fires.
	Kill,
}

/// The latest value from each sensor.
///
/// Everything starts at zero, and the last reading wins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
	/// BMP280 temperature, in degrees Celsius
	pub bmp_temp: f32,
	/// BMP280 altitude, in metres
	pub bmp_alt: f32,
	/// AHT20 temperature, in degrees Celsius
	pub aht_temp: f32,
	/// AHT20 relative humidity, in percent
	pub aht_hum: f32,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Parse one line, with its terminator and surrounding whitespace removed.
///
/// The prefix has to match exactly. Each number may have spaces in front of
/// it, and anything after the second number is ignored, so
/// `SENSOR:AHT20,TA: 24.10,UM: 61.70 %` is fine. Values must be finite.
pub fn parse_line(line: &str) -> Option<Command> {
	if line == KILL {
		return Some(Command::Kill);
	}
	if let Some(rest) = line.strip_prefix(BMP280_PREFIX) {
		let (temperature, altitude) = parse_pair(rest, BMP280_SEPARATOR)?;
		return Some(Command::Bmp280 {
			temperature,
			altitude,
		});
	}
	if let Some(rest) = line.strip_prefix(AHT20_PREFIX) {
		let (temperature, humidity) = parse_pair(rest, AHT20_SEPARATOR)?;
		return Some(Command::Aht20 {
			temperature,
			humidity,
		});
	}
	None
}

/// Parse `<number><separator><number><anything>`.
fn parse_pair(text: &str, separator: &str) -> Option<(f32, f32)> {
	let (first, rest) = leading_value(text)?;
	let rest = rest.strip_prefix(separator)?;
	let (second, _tail) = leading_value(rest)?;
	Some((first, second))
}

/// Parse the longest number at the start of `text`, after any spaces.
///
/// Returns the value and whatever follows it.
fn leading_value(text: &str) -> Option<(f32, &str)> {
	let text = text.trim_start();
	let bytes = text.as_bytes();
	let mut end = 0;
	if matches!(bytes.first(), Some(b'+' | b'-')) {
		end += 1;
	}
	let int_digits = count_digits(&bytes[end..]);
	end += int_digits;
	let mut frac_digits = 0;
	if bytes.get(end) == Some(&b'.') {
		frac_digits = count_digits(&bytes[end + 1..]);
		end += 1 + frac_digits;
	}
	if int_digits + frac_digits == 0 {
		return None;
	}
	// An exponent only counts if it has digits
	if matches!(bytes.get(end), Some(b'e' | b'E')) {
		let mut exp_end = end + 1;
		if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
			exp_end += 1;
		}
		let exp_digits = count_digits(&bytes[exp_end..]);
		if exp_digits != 0 {
			end = exp_end + exp_digits;
		}
	}
	let value = text[..end].parse::<f32>().ok().filter(|v| v.is_finite())?;
	Some((value, &text[end..]))
}

fn count_digits(bytes: &[u8]) -> usize {
	bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

impl Readings {
	/// Store the values from a sensor reading.
	///
	/// Returns `false` if the command wasn't a reading.
	pub fn apply(&mut self, command: &Command) -> bool {
		match *command {
			Command::Bmp280 {
				temperature,
				altitude,
			} => {
				self.bmp_temp = temperature;
				self.bmp_alt = altitude;
				true
			}
			Command::Aht20 {
				temperature,
				humidity,
			} => {
				self.aht_temp = temperature;
				self.aht_hum = humidity;
				true
			}
			Command::Kill => false,
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn bmp280() {
		assert_eq!(
			parse_line("SENSOR:BMP280,TB:25.42,AL:812.35"),
			Some(Command::Bmp280 {
				temperature: 25.42,
				altitude: 812.35
			})
		);
	}

	#[test]
	fn aht20() {
		assert_eq!(
			parse_line("SENSOR:AHT20,TA:24.10,UM:61.70"),
			Some(Command::Aht20 {
				temperature: 24.10,
				humidity: 61.70
			})
		);
	}

	#[test]
	fn kill_is_exact() {
		assert_eq!(parse_line("KILL"), Some(Command::Kill));
		assert_eq!(parse_line("KILLED"), None);
		assert_eq!(parse_line("kill"), None);
	}

	#[test]
	fn spaces_before_numbers_are_skipped() {
		assert_eq!(
			parse_line("SENSOR:BMP280,TB: 25.42,AL: 812.35"),
			Some(Command::Bmp280 {
				temperature: 25.42,
				altitude: 812.35
			})
		);
		assert_eq!(
			parse_line("SENSOR:AHT20,TA:\t-3.5,UM:  +40"),
			Some(Command::Aht20 {
				temperature: -3.5,
				humidity: 40.0
			})
		);
	}

	#[test]
	fn text_after_the_second_number_is_ignored() {
		assert_eq!(
			parse_line("SENSOR:BMP280,TB:25.42,AL:812.35,P:1013.2"),
			Some(Command::Bmp280 {
				temperature: 25.42,
				altitude: 812.35
			})
		);
		assert_eq!(
			parse_line("SENSOR:AHT20,TA:24.10,UM:61.70 %"),
			Some(Command::Aht20 {
				temperature: 24.10,
				humidity: 61.70
			})
		);
		// A dangling exponent isn't part of the number
		assert_eq!(
			parse_line("SENSOR:AHT20,TA:2.5e1,UM:7e"),
			Some(Command::Aht20 {
				temperature: 25.0,
				humidity: 7.0
			})
		);
	}

	#[test]
	fn rejects_everything_else() {
		for line in [
			"",
			"SENSOR:XYZ,FOO:1.0",
			"SENSOR:BMP280,TB:25.42",
			"SENSOR:BMP280,TB:25.42,AL:",
			"SENSOR:BMP280,TB:25.42,AL:.",
			"SENSOR:BMP280,TB:abc,AL:1.0",
			"SENSOR:BMP280,TB:1.0x,AL:2.0",
			"SENSOR:BMP280,TB:1.0 ,AL:2.0",
			"SENSOR:BMP280,TA:1.0,UM:2.0",
			"SENSOR:AHT20,TB:1.0,AL:2.0",
			"SENSOR:AHT20,TA:inf,UM:2.0",
			"SENSOR:AHT20,TA:1.0,UM:NaN",
			"SENSOR:AHT20,TA:1e39,UM:2.0",
			" SENSOR:AHT20,TA:1.0,UM:2.0",
		] {
			assert_eq!(parse_line(line), None, "{:?}", line);
		}
	}

	#[test]
	fn apply_only_touches_its_sensor() {
		let mut readings = Readings::default();
		assert!(readings.apply(&Command::Aht20 {
			temperature: 24.1,
			humidity: 61.7
		}));
		assert_eq!(
			readings,
			Readings {
				bmp_temp: 0.0,
				bmp_alt: 0.0,
				aht_temp: 24.1,
				aht_hum: 61.7
			}
		);
		assert!(!readings.apply(&Command::Kill));
	}

	proptest! {
		#[test]
		fn formatted_readings_parse_back(t in -1.0e6f32..1.0e6, v in -1.0e6f32..1.0e6) {
			let line = format!("SENSOR:BMP280,TB:{},AL:{}", t, v);
			prop_assert_eq!(
				parse_line(&line),
				Some(Command::Bmp280 { temperature: t, altitude: v })
			);
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
