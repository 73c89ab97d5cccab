//! Board adapters for the supervisor.
//!
//! These wrap the RP2040 peripherals in the traits the core crate asks for.

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

use defmt::*;
use embedded_hal::watchdog::{Watchdog as _, WatchdogEnable as _};
use fugit::MicrosDurationU32;
use rp_pico::hal::{
	gpio::{self, bank0},
	uart::{self, UartPeripheral},
	watchdog::Watchdog,
};
use sensor_dash_core::traits::{BootCause, ByteSource, ScratchStore, WatchdogPet};

use crate::pac;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The telemetry UART's pins: TX on GP0, RX on GP1.
pub type UartPins = (
	gpio::Pin<bank0::Gpio0, gpio::FunctionUart, gpio::PullDown>,
	gpio::Pin<bank0::Gpio1, gpio::FunctionUart, gpio::PullDown>,
);

/// The telemetry UART, once it's running.
pub type TelemetryUart = UartPeripheral<uart::Enabled, pac::UART0, UartPins>;

/// Received bytes from the telemetry UART.
pub struct UartSource {
	uart: TelemetryUart,
	errors: u32,
}

/// The RP2040 watchdog.
pub struct HwWatchdog {
	watchdog: Watchdog,
}

/// The watchdog's reset reason and scratch registers.
///
/// Borrows the registers before the HAL takes the watchdog over.
pub struct WatchdogScratch<'a> {
	regs: &'a pac::watchdog::RegisterBlock,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl UartSource {
	/// Wrap an enabled UART.
	pub fn new(uart: TelemetryUart) -> UartSource {
		UartSource { uart, errors: 0 }
	}

	/// How many bytes we dropped for framing, parity, break or overrun.
	pub fn errors(&self) -> u32 {
		self.errors
	}
}

impl ByteSource for UartSource {
	fn read_byte(&mut self) -> Option<u8> {
		if !self.uart.uart_is_readable() {
			return None;
		}
		// There's something in the FIFO, so any error here is a bad byte
		// rather than an empty FIFO.
		match embedded_hal::serial::Read::read(&mut self.uart) {
			Ok(byte) => Some(byte),
			Err(_) => {
				self.errors = self.errors.wrapping_add(1);
				warn!("UART receive error, byte dropped");
				None
			}
		}
	}
}

impl HwWatchdog {
	/// Wrap the watchdog. It doesn't start counting until `start` is called.
	pub fn new(watchdog: Watchdog) -> HwWatchdog {
		HwWatchdog { watchdog }
	}

	/// Start the countdown. The chip resets if we go `timeout_ms` without a
	/// pet.
	pub fn start(&mut self, timeout_ms: u32) {
		self.watchdog.start(MicrosDurationU32::millis(timeout_ms));
		debug!("Watchdog running, {} ms", timeout_ms);
	}
}

impl WatchdogPet for HwWatchdog {
	fn pet(&mut self) {
		self.watchdog.feed();
	}
}

impl<'a> WatchdogScratch<'a> {
	/// Borrow the watchdog registers.
	pub fn new(regs: &'a pac::watchdog::RegisterBlock) -> WatchdogScratch<'a> {
		WatchdogScratch { regs }
	}
}

impl<'a> ScratchStore for WatchdogScratch<'a> {
	fn boot_cause(&self) -> BootCause {
		BootCause::from_watchdog_reason(self.regs.reason.read().bits())
	}

	fn read(&self, index: usize) -> u32 {
		let regs = self.regs;
		match index {
			0 => regs.scratch0.read().bits(),
			1 => regs.scratch1.read().bits(),
			2 => regs.scratch2.read().bits(),
			3 => regs.scratch3.read().bits(),
			4 => regs.scratch4.read().bits(),
			5 => regs.scratch5.read().bits(),
			6 => regs.scratch6.read().bits(),
			7 => regs.scratch7.read().bits(),
			_ => 0,
		}
	}

	fn write(&mut self, index: usize, value: u32) {
		let regs = self.regs;
		match index {
			0 => regs.scratch0.write(|w| unsafe { w.bits(value) }),
			1 => regs.scratch1.write(|w| unsafe { w.bits(value) }),
			2 => regs.scratch2.write(|w| unsafe { w.bits(value) }),
			3 => regs.scratch3.write(|w| unsafe { w.bits(value) }),
			4 => regs.scratch4.write(|w| unsafe { w.bits(value) }),
			5 => regs.scratch5.write(|w| unsafe { w.bits(value) }),
			6 => regs.scratch6.write(|w| unsafe { w.bits(value) }),
			7 => regs.scratch7.write(|w| unsafe { w.bits(value) }),
			_ => {}
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
