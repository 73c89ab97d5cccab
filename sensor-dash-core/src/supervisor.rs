//! The supervisor, which runs on the logic core.
//!
//! Each poll it:
//!
//! 1. Drains the serial port, feeding complete lines to the telemetry parser.
//! 2. Repaints the four sensor values.
//! 3. Every `check_interval_ms`, looks at the heartbeat. If the display core
//!    has moved it on since last time, we pet the watchdog and blink the
//!    pulse glyph. If not, we leave the watchdog alone and let it bite if the
//!    display core never recovers.
//!
//! The caller sleeps for `poll_interval_ms` between polls.

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

use crate::{
	config::SupervisorConfig,
	fault::BootRecord,
	frame::FrameWriter,
	heartbeat::Heartbeat,
	layout,
	line::{Line, LineAccumulator},
	telemetry::{self, Command, Readings},
	traits::{ByteSource, WatchdogPet},
};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// What the supervisor is up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SupervisorState {
	/// Business as usual.
	Running,
	/// We were sent `KILL`. The caller must spin until the watchdog resets
	/// the chip.
	SelfTestHang,
}

/// Things the supervisor has counted since boot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorStats {
	/// Lines that were sensor readings.
	pub lines_accepted: u32,
	/// Non-empty lines we didn't understand.
	pub lines_rejected: u32,
	/// Lines that were too long to keep.
	pub lines_overflowed: u32,
	/// Times we fed the watchdog.
	pub watchdog_pets: u32,
	/// Heartbeat checks that found the display core hadn't moved.
	pub stalled_checks: u32,
}

/// Owns the watchdog, the serial port and the frame buffer writer.
pub struct Supervisor<'a, B, W> {
	serial: B,
	watchdog: W,
	frame: FrameWriter<'a>,
	heartbeat: &'a Heartbeat,
	config: SupervisorConfig,
	line: LineAccumulator,
	readings: Readings,
	state: SupervisorState,
	last_check_ms: u32,
	last_heartbeat: u32,
	pulse_lit: bool,
	stats: SupervisorStats,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<'a, B, W> Supervisor<'a, B, W>
where
	B: ByteSource,
	W: WatchdogPet,
{
	/// Make a supervisor.
	///
	/// The first heartbeat check happens `config.check_interval_ms` after
	/// `now_ms`, against the heartbeat as it is right now.
	pub fn new(
		serial: B,
		watchdog: W,
		frame: FrameWriter<'a>,
		heartbeat: &'a Heartbeat,
		config: SupervisorConfig,
		now_ms: u32,
	) -> Supervisor<'a, B, W> {
		Supervisor {
			serial,
			watchdog,
			frame,
			heartbeat,
			config,
			line: LineAccumulator::new(),
			readings: Readings::default(),
			state: SupervisorState::Running,
			last_check_ms: now_ms,
			last_heartbeat: heartbeat.sample(),
			pulse_lit: false,
			stats: SupervisorStats::default(),
		}
	}

	/// Draw the parts of the screen that don't change.
	pub fn draw_layout(&mut self, boot: &BootRecord) {
		layout::draw_static(&mut self.frame, boot);
		layout::draw_pulse(&mut self.frame, self.pulse_lit);
		self.repaint_values();
	}

	/// Do one poll cycle.
	///
	/// Once this has returned [`SupervisorState::SelfTestHang`], it does
	/// nothing ever again.
	pub fn poll(&mut self, now_ms: u32) -> SupervisorState {
		if self.state == SupervisorState::SelfTestHang {
			return self.state;
		}
		self.drain_serial();
		if self.state == SupervisorState::SelfTestHang {
			return self.state;
		}
		self.repaint_values();
		self.check_heartbeat(now_ms);
		self.state
	}

	/// Get the latest sensor readings.
	pub fn readings(&self) -> Readings {
		self.readings
	}

	/// Get the statistics.
	pub fn stats(&self) -> SupervisorStats {
		self.stats
	}

	/// Get the current state.
	pub fn state(&self) -> SupervisorState {
		self.state
	}

	/// Get the timings we were built with.
	pub fn config(&self) -> &SupervisorConfig {
		&self.config
	}

	/// Get the watchdog.
	pub fn watchdog(&self) -> &W {
		&self.watchdog
	}

	/// Get the watchdog, for starting it.
	pub fn watchdog_mut(&mut self) -> &mut W {
		&mut self.watchdog
	}

	/// Get the serial port.
	pub fn serial_mut(&mut self) -> &mut B {
		&mut self.serial
	}

	fn drain_serial(&mut self) {
		while let Some(byte) = self.serial.read_byte() {
			let command = match self.line.push(byte) {
				None => continue,
				Some(Line::Overflowed) => {
					self.stats.lines_overflowed = self.stats.lines_overflowed.wrapping_add(1);
					continue;
				}
				Some(Line::Complete(bytes)) => {
					let text = core::str::from_utf8(bytes).map(str::trim);
					match text {
						Ok("") => continue,
						Ok(text) => telemetry::parse_line(text),
						Err(_) => None,
					}
				}
			};
			match command {
				Some(Command::Kill) => {
					self.state = SupervisorState::SelfTestHang;
					return;
				}
				Some(reading) => {
					self.readings.apply(&reading);
					self.stats.lines_accepted = self.stats.lines_accepted.wrapping_add(1);
				}
				None => {
					self.stats.lines_rejected = self.stats.lines_rejected.wrapping_add(1);
				}
			}
		}
	}

	fn repaint_values(&mut self) {
		let r = self.readings;
		layout::draw_value(&mut self.frame, layout::BMP_TEMP_ROW, r.bmp_temp, "C");
		layout::draw_value(&mut self.frame, layout::BMP_ALT_ROW, r.bmp_alt, "m");
		layout::draw_value(&mut self.frame, layout::AHT_TEMP_ROW, r.aht_temp, "C");
		layout::draw_value(&mut self.frame, layout::AHT_HUM_ROW, r.aht_hum, "%");
	}

	fn check_heartbeat(&mut self, now_ms: u32) {
		if now_ms.wrapping_sub(self.last_check_ms) < self.config.check_interval_ms {
			return;
		}
		self.last_check_ms = now_ms;
		let beat = self.heartbeat.sample();
		if beat != self.last_heartbeat {
			self.watchdog.pet();
			self.last_heartbeat = beat;
			self.pulse_lit = !self.pulse_lit;
			layout::draw_pulse(&mut self.frame, self.pulse_lit);
			self.stats.watchdog_pets = self.stats.watchdog_pets.wrapping_add(1);
		} else {
			self.stats.stalled_checks = self.stats.stalled_checks.wrapping_add(1);
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		colour::Colour,
		fault::FaultCounter,
		frame::{FrameBuffer, FrameReader},
		traits::{BootCause, ScratchStore},
	};
	use proptest::prelude::*;
	use std::collections::VecDeque;

	#[derive(Default)]
	struct SimSerial {
		rx: VecDeque<u8>,
	}

	impl SimSerial {
		fn send(&mut self, bytes: &[u8]) {
			self.rx.extend(bytes.iter().copied());
		}
	}

	impl ByteSource for SimSerial {
		fn read_byte(&mut self) -> Option<u8> {
			self.rx.pop_front()
		}
	}

	#[derive(Default)]
	struct SimWatchdog {
		pets: u32,
	}

	impl WatchdogPet for SimWatchdog {
		fn pet(&mut self) {
			self.pets += 1;
		}
	}

	type TestSupervisor<'a> = Supervisor<'a, SimSerial, SimWatchdog>;

	fn make<'a>(frame: &'a FrameBuffer, heartbeat: &'a Heartbeat) -> TestSupervisor<'a> {
		let mut supervisor = Supervisor::new(
			SimSerial::default(),
			SimWatchdog::default(),
			frame.writer().unwrap(),
			heartbeat,
			SupervisorConfig::default(),
			0,
		);
		supervisor.draw_layout(&BootRecord {
			cause: BootCause::PowerOn,
			resets: 0,
		});
		supervisor
	}

	fn read_cells(reader: &FrameReader, x: usize, y: usize, len: usize) -> String {
		(x..x + len)
			.map(|col| reader.get_char(col, y).unwrap_or(b'?') as char)
			.collect()
	}

	/// Poll every 10ms until `end_ms`, calling `each` first. Returns the time
	/// the watchdog would have reset the chip, if it did.
	fn run_until(
		supervisor: &mut TestSupervisor,
		start_ms: u32,
		end_ms: u32,
		mut each: impl FnMut(u32),
	) -> Option<u32> {
		let timeout = supervisor.config().watchdog_timeout_ms;
		let mut last_pet_ms = start_ms;
		let mut pets = supervisor.watchdog().pets;
		let mut now = start_ms;
		while now <= end_ms {
			if now - last_pet_ms >= timeout {
				return Some(now);
			}
			each(now);
			supervisor.poll(now);
			if supervisor.watchdog().pets != pets {
				pets = supervisor.watchdog().pets;
				last_pet_ms = now;
			}
			now += 10;
		}
		None
	}

	#[test]
	fn s1_bmp280_reading_is_drawn() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor.serial_mut().send(b"SENSOR:BMP280,TB:25.42,AL:812.35\n");
		supervisor.poll(10);
		let readings = supervisor.readings();
		assert_eq!(readings.bmp_temp, 25.42);
		assert_eq!(readings.bmp_alt, 812.35);
		let reader = frame.reader();
		assert_eq!(read_cells(&reader, 30, 8, 10), "25.42 C   ");
		assert_eq!(read_cells(&reader, 30, 9, 10), "812.35 m  ");
		assert_eq!(reader.get_attr(30, 8), Some((Colour::WHITE, Colour::BLACK)));
		assert_eq!(supervisor.stats().lines_accepted, 1);
	}

	#[test]
	fn s2_aht20_reading_is_drawn() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor.serial_mut().send(b"SENSOR:AHT20,TA:24.10,UM:61.70\r\n");
		supervisor.poll(10);
		let readings = supervisor.readings();
		assert_eq!(readings.aht_temp, 24.10);
		assert_eq!(readings.aht_hum, 61.70);
		assert_eq!(readings.bmp_temp, 0.0);
		let reader = frame.reader();
		assert_eq!(read_cells(&reader, 30, 14, 10), "24.10 C   ");
		assert_eq!(read_cells(&reader, 30, 15, 10), "61.70 %   ");
	}

	#[test]
	fn s3_unknown_sensor_is_ignored() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor.serial_mut().send(b"SENSOR:XYZ,FOO:1.0\n");
		supervisor.poll(10);
		assert_eq!(supervisor.readings(), Readings::default());
		assert_eq!(supervisor.stats().lines_rejected, 1);
		assert_eq!(read_cells(&frame.reader(), 30, 8, 10), "0.00 C    ");
	}

	#[test]
	fn s4_kill_hangs_and_the_next_boot_says_so() {
		struct SimScratch {
			cause: BootCause,
			registers: [u32; 8],
		}

		impl ScratchStore for SimScratch {
			fn boot_cause(&self) -> BootCause {
				self.cause
			}
			fn read(&self, index: usize) -> u32 {
				self.registers[index]
			}
			fn write(&mut self, index: usize, value: u32) {
				self.registers[index] = value;
			}
		}

		let mut scratch = SimScratch {
			cause: BootCause::PowerOn,
			registers: [0; 8],
		};
		let boot = FaultCounter::new(&mut scratch).read_and_classify_boot();
		assert_eq!(boot.resets, 0);

		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor
			.serial_mut()
			.send(b"KILL\nSENSOR:AHT20,TA:1.0,UM:2.0\n");
		assert_eq!(supervisor.poll(10), SupervisorState::SelfTestHang);
		// The display core is fine, but we never pet again.
		let reset_at = run_until(&mut supervisor, 10, 10_000, |_| heartbeat.bump());
		assert_eq!(reset_at, Some(5010));
		assert_eq!(supervisor.watchdog().pets, 0);
		assert_eq!(supervisor.readings(), Readings::default());

		scratch.cause = BootCause::Watchdog;
		let boot = FaultCounter::new(&mut scratch).read_and_classify_boot();
		let frame = FrameBuffer::new();
		let mut supervisor = Supervisor::new(
			SimSerial::default(),
			SimWatchdog::default(),
			frame.writer().unwrap(),
			&heartbeat,
			SupervisorConfig::default(),
			0,
		);
		supervisor.draw_layout(&boot);
		let reader = frame.reader();
		assert_eq!(read_cells(&reader, 2, 1, 30), "RECUPERADO DE FALHA (WATCHDOG)");
		assert_eq!(reader.get_attr(2, 1), Some((Colour::RED, Colour::BLACK)));
		assert_eq!(read_cells(&reader, 66, 1, 6), "RST: 1");
	}

	#[test]
	fn s5_stalled_display_core_gets_reset() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::starting_at(100);
		let mut supervisor = make(&frame, &heartbeat);
		let reset_at = run_until(&mut supervisor, 0, 10_000, |_| {});
		assert_eq!(reset_at, Some(5000));
		assert_eq!(supervisor.watchdog().pets, 0);
		assert_eq!(supervisor.stats().stalled_checks, 24);
	}

	#[test]
	fn s6_each_bump_earns_one_pet() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::starting_at(100);
		let mut supervisor = make(&frame, &heartbeat);
		let reader = frame.reader();
		let (px, py) = layout::PULSE_POS;
		let mut pulse = reader.get_char(px, py);
		let mut toggles = 0;
		let mut now = 0;
		while now <= 1000 {
			if now == 100 || now == 300 {
				heartbeat.bump();
			}
			supervisor.poll(now);
			let glyph = reader.get_char(px, py);
			if glyph != pulse {
				toggles += 1;
				pulse = glyph;
			}
			now += 10;
		}
		assert_eq!(heartbeat.sample(), 102);
		assert_eq!(supervisor.watchdog().pets, 2);
		assert_eq!(toggles, 2);
		assert_eq!(pulse, Some(b' '));
	}

	#[test]
	fn bumping_at_frame_rate_pets_once_per_check() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		let reset_at = run_until(&mut supervisor, 0, 2000, |now| {
			if now % 20 == 0 {
				heartbeat.bump();
			}
		});
		assert_eq!(reset_at, None);
		assert_eq!(supervisor.watchdog().pets, 10);
		assert_eq!(supervisor.stats().stalled_checks, 0);
	}

	#[test]
	fn partial_line_waits_for_its_terminator() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor.serial_mut().send(b"SENSOR:BMP280,TB:25.42,AL:81");
		supervisor.poll(10);
		assert_eq!(supervisor.readings(), Readings::default());
		supervisor.serial_mut().send(b"2.35\r");
		supervisor.poll(20);
		assert_eq!(supervisor.readings().bmp_alt, 812.35);
	}

	#[test]
	fn oversize_line_is_dropped() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		// The tail of this is a valid reading, which must not be parsed.
		let mut bytes = vec![b' '; 200 - 32];
		bytes.extend_from_slice(b"SENSOR:BMP280,TB:1.0,AL:2.0");
		bytes.resize(200, b' ');
		bytes.push(b'\n');
		supervisor.serial_mut().send(&bytes);
		supervisor.poll(10);
		assert_eq!(supervisor.readings(), Readings::default());
		assert_eq!(supervisor.stats().lines_overflowed, 1);
		supervisor.serial_mut().send(b"SENSOR:AHT20,TA:1.5,UM:2.5\n");
		supervisor.poll(20);
		assert_eq!(supervisor.readings().aht_hum, 2.5);
	}

	#[test]
	fn whitespace_and_blank_lines() {
		let frame = FrameBuffer::new();
		let heartbeat = Heartbeat::new();
		let mut supervisor = make(&frame, &heartbeat);
		supervisor
			.serial_mut()
			.send(b"\r\n\n  SENSOR:AHT20,TA:1.5,UM:2.5 \r\n \n\xff\xfe\n");
		supervisor.poll(10);
		let stats = supervisor.stats();
		assert_eq!(stats.lines_accepted, 1);
		assert_eq!(stats.lines_rejected, 1);
		assert_eq!(supervisor.readings().aht_temp, 1.5);
	}

	proptest! {
		#[test]
		fn readings_round_trip_byte_by_byte(t in -1.0e4f32..1.0e4, v in -1.0e4f32..1.0e4) {
			let frame = FrameBuffer::new();
			let heartbeat = Heartbeat::new();
			let mut supervisor = make(&frame, &heartbeat);
			let line = format!("SENSOR:BMP280,TB:{},AL:{}\n", t, v);
			for (idx, byte) in line.bytes().enumerate() {
				supervisor.serial_mut().send(&[byte]);
				supervisor.poll(idx as u32);
			}
			prop_assert_eq!(supervisor.stats().lines_accepted, 1);
			prop_assert_eq!(supervisor.readings().bmp_temp, t);
			prop_assert_eq!(supervisor.readings().bmp_alt, v);
		}

		#[test]
		fn six_decimal_readings_land_within_a_unit(t in -1.0e4f32..1.0e4, v in -1.0e4f32..1.0e4) {
			let frame = FrameBuffer::new();
			let heartbeat = Heartbeat::new();
			let mut supervisor = make(&frame, &heartbeat);
			// The sensor board sends `%f`, which rounds to six places
			let line = format!("SENSOR:BMP280,TB:{:.6},AL:{:.6}\n", t, v);
			for (idx, byte) in line.bytes().enumerate() {
				supervisor.serial_mut().send(&[byte]);
				supervisor.poll(idx as u32);
			}
			prop_assert_eq!(supervisor.stats().lines_accepted, 1);
			let readings = supervisor.readings();
			// Off by at most the last printed digit, or the last bit of an f32
			let tolerance = |x: f32| 1.0e-6 + f32::EPSILON * x.abs();
			prop_assert!((readings.bmp_temp - t).abs() <= tolerance(t));
			prop_assert!((readings.bmp_alt - v).abs() <= tolerance(v));
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
