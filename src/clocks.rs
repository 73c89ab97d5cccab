//! Clock tree set-up.
//!
//! DVI needs the system clock at ten times the pixel clock, which is 252 MHz.
//! That's above the RP2040's rated 133 MHz, so we raise the core voltage
//! first.

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
use fugit::{HertzU32, RateExtU32};
use rp_pico::hal::{
	clocks::ClocksManager,
	pll::{common_configs::PLL_USB_48MHZ, setup_pll_blocking, PLLConfig},
	watchdog::Watchdog,
	xosc::setup_xosc_blocking,
};

use crate::{pac, InitError};

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// 12 MHz x 126 = 1512 MHz VCO, divided by 6 and then 1.
const PLL_SYS_252MHZ: PLLConfig = PLLConfig {
	vco_freq: HertzU32::MHz(1512),
	refdiv: 1,
	post_div1: 6,
	post_div2: 1,
};

/// `VSEL` value for 1.20 V.
const VSEL_1V20: u8 = 0b1101;

/// Roughly 10 ms at the ring oscillator's speed.
const VREG_SETTLE_CYCLES: u32 = 120_000;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Raise the core voltage to 1.20 V and give it time to settle.
///
/// Call this before `init`.
pub fn set_core_voltage(vreg: &pac::VREG_AND_CHIP_RESET) {
	vreg.vreg.modify(|_, w| unsafe { w.vsel().bits(VSEL_1V20) });
	cortex_m::asm::delay(VREG_SETTLE_CYCLES);
}

/// Start the crystal and both PLLs, and run the system and peripheral clocks
/// at 252 MHz.
///
/// This is `init_clocks_and_plls` with a faster system PLL.
pub fn init(
	xosc_dev: pac::XOSC,
	clocks_dev: pac::CLOCKS,
	pll_sys_dev: pac::PLL_SYS,
	pll_usb_dev: pac::PLL_USB,
	resets: &mut pac::RESETS,
	watchdog: &mut Watchdog,
) -> Result<ClocksManager, InitError> {
	let xosc = setup_xosc_blocking(xosc_dev, rp_pico::XOSC_CRYSTAL_FREQ.Hz())
		.map_err(|_| InitError::Xosc)?;

	// The watchdog (and the timer) tick once a microsecond
	watchdog.enable_tick_generation((rp_pico::XOSC_CRYSTAL_FREQ / 1_000_000) as u8);

	let mut clocks = ClocksManager::new(clocks_dev);

	let pll_sys = setup_pll_blocking(
		pll_sys_dev,
		xosc.operating_frequency(),
		PLL_SYS_252MHZ,
		&mut clocks,
		resets,
	)
	.map_err(|_| InitError::PllSys)?;
	let pll_usb = setup_pll_blocking(
		pll_usb_dev,
		xosc.operating_frequency(),
		PLL_USB_48MHZ,
		&mut clocks,
		resets,
	)
	.map_err(|_| InitError::PllUsb)?;

	clocks
		.init_default(&xosc, &pll_sys, &pll_usb)
		.map_err(|_| InitError::ClockTree)?;

	debug!("PLLs locked");

	Ok(clocks)
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
