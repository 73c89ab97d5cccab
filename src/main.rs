//! # Sensor Dash
//!
//! Firmware for a Raspberry Pi Pico that shows sensor telemetry on a DVI
//! monitor. It:
//!
//! * drives 640x480 DVI from Core 1, encoding a text-mode frame buffer on the
//!   fly,
//! * reads BMP280 and AHT20 readings from UART0 on Core 0 and draws them,
//! * only feeds the watchdog while Core 1 is still producing frames, and
//! * counts watchdog resets across reboots.
//!
//! The program is started by having standard Cortex-M Interrupt Vector Table
//! at address `0x1000_0100`. This IVT is found and jumped to by the RP2040
//! boot block (`0x1000_0000` to `0x1000_00FF`).

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

#![no_std]
#![no_main]

// -----------------------------------------------------------------------------
// Sub-modules
// -----------------------------------------------------------------------------

mod clocks;
mod dvi;
mod platform;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

use core::{cell::RefCell, ptr::addr_of_mut};

use cortex_m_rt::entry;
use critical_section::Mutex;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::PwmPin;
use fugit::RateExtU32;
use panic_probe as _;
use rp_pico::hal::{
	self,
	gpio,
	multicore::{Multicore, Stack},
	pac::interrupt,
	uart::{DataBits, StopBits, UartConfig, UartPeripheral},
	Clock,
};
use sensor_dash_core::{
	fault::FaultCounter, font::FONT_8X8, tmds::FontEncoder, FrameBuffer, Heartbeat,
	ScanlineProducer, Supervisor, SupervisorConfig, SupervisorState,
};

pub use rp_pico::hal::pac;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Things that can go wrong while we bring the board up.
///
/// None of these are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum InitError {
	/// The crystal oscillator didn't start
	Xosc,
	/// The system PLL didn't lock
	PllSys,
	/// The USB PLL didn't lock
	PllUsb,
	/// The clock tree wouldn't take our settings
	ClockTree,
	/// The UART wouldn't take our settings
	Uart,
	/// The serialiser program didn't fit in PIO0
	PioInstall,
	/// The line buffers didn't fit in the free queue
	LineQueue,
	/// We were already handed the frame buffer writer
	FrameWriter,
	/// Core 1 didn't start
	Core1Launch,
}

/// The BOOTSEL button, as the GPIO interrupt sees it.
type BootButton = gpio::Pin<gpio::bank0::Gpio6, gpio::FunctionSioInput, gpio::PullUp>;

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// This is the standard RP2040 bootloader. It must be stored in the first 256
/// bytes of the external SPI Flash chip. It will map the external SPI flash
/// chip to address `0x1000_0000` and jump to an Interrupt Vector Table at
/// address `0x1000_0100` (i.e. immediately after the bootloader).
///
/// See `memory.x` for a definition of the `.boot2` section.
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

/// Firmware version, from `git describe` if we had it at build time.
static VERSION: &str = include_str!(concat!(env!("OUT_DIR"), "/version.txt"));

/// Telemetry arrives at this rate, 8N1.
const BAUD_RATE: u32 = 115_200;

/// How often we log the statistics.
const STATS_INTERVAL_MS: u32 = 5_000;

/// The text-mode screen. Core 0 writes it and Core 1 reads it.
static FRAME: FrameBuffer = FrameBuffer::new();

/// Bumped by Core 1 every frame.
static HEARTBEAT: Heartbeat = Heartbeat::new();

/// Core 1 runs the scan-line encoder and the DMA interrupt on this.
static mut CORE1_STACK: Stack<4096> = Stack::new();

/// Handed to the GPIO interrupt once it's configured.
static BOOT_BUTTON: Mutex<RefCell<Option<BootButton>>> = Mutex::new(RefCell::new(None));

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// This is the entry-point to the firmware. It is called by cortex-m-rt once
/// the `.bss` and `.data` sections have been initialised.
#[entry]
fn main() -> ! {
	info!("Sensor Dash {} starting...", VERSION);

	// Grab the singleton containing all the RP2040 peripherals
	let mut pac = pac::Peripherals::take().unwrap();
	// Grab the singleton containing all the generic Cortex-M peripherals
	let core = pac::CorePeripherals::take().unwrap();

	clocks::set_core_voltage(&pac.VREG_AND_CHIP_RESET);

	// Work out why we booted, before the HAL gets its hands on the watchdog
	let boot = FaultCounter::new(platform::WatchdogScratch::new(&pac.WATCHDOG))
		.read_and_classify_boot();
	info!("Boot: {}", boot);

	// Needed by the clock setup
	let mut watchdog = hal::watchdog::Watchdog::new(pac.WATCHDOG);

	// Get ourselves up to DVI speed.
	let clocks = unwrap!(clocks::init(
		pac.XOSC,
		pac.CLOCKS,
		pac.PLL_SYS,
		pac.PLL_USB,
		&mut pac.RESETS,
		&mut watchdog,
	));

	info!("Clocks OK: {} Hz", clocks.system_clock.freq().to_Hz());

	// Create an object we can use to busy-wait for specified numbers of
	// milliseconds. For this to work, it needs to know our clock speed.
	let mut delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());

	// A free-running microsecond counter
	let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

	// sio is the *Single-cycle Input/Output* peripheral. It has all our GPIO
	// pins, as well as some mailboxes and other useful things for inter-core
	// communications.
	let mut sio = hal::sio::Sio::new(pac.SIO);

	// Configure and grab all the RP2040 pins the Pico exposes.
	let pins = rp_pico::Pins::new(
		pac.IO_BANK0,
		pac.PADS_BANK0,
		sio.gpio_bank0,
		&mut pac.RESETS,
	);

	info!("Pins OK");

	// Telemetry comes in on GP1. We never send anything on GP0.
	let uart_pins = (
		pins.gpio0.into_function::<gpio::FunctionUart>(),
		pins.gpio1.into_function::<gpio::FunctionUart>(),
	);
	let uart = unwrap!(UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
		.enable(
			UartConfig::new(BAUD_RATE.Hz(), DataBits::Eight, None, StopBits::One),
			clocks.peripheral_clock.freq(),
		)
		.map_err(|_| InitError::Uart));

	// Pressing the button on GP6 drops us into the USB bootloader
	let mut button = pins.gpio6.into_pull_up_input();
	button.set_interrupt_enabled(gpio::Interrupt::EdgeLow, true);
	critical_section::with(|cs| BOOT_BUTTON.borrow(cs).replace(Some(button)));

	// Give the three TMDS lanes to PIO0. Lane 0 (blue) is GP10/11, lane 1
	// (green) is GP12/13 and lane 2 (red) is GP14/15.
	let _lane0 = (dvi_pin(pins.gpio10), dvi_pin(pins.gpio11));
	let _lane1 = (dvi_pin(pins.gpio12), dvi_pin(pins.gpio13));
	let _lane2 = (dvi_pin(pins.gpio14), dvi_pin(pins.gpio15));

	// The TMDS clock pair is GP8/GP9, which is PWM slice 4.
	let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
	let mut clock_slice = pwm_slices.pwm4;
	clock_slice.channel_a.set_inverted();
	clock_slice.channel_a.set_duty(5);
	clock_slice.channel_b.set_duty(5);
	let mut clock_p = clock_slice.channel_a.output_to(pins.gpio8);
	let mut clock_n = clock_slice.channel_b.output_to(pins.gpio9);
	configure_dvi_pad(&mut clock_p);
	configure_dvi_pad(&mut clock_n);

	let line_queue = unwrap!(dvi::init(
		pac.PIO0,
		pac.DMA,
		clock_slice,
		&mut pac.RESETS
	));

	info!("DVI OK");

	let config = SupervisorConfig::DEFAULT;
	let frame_writer = unwrap!(FRAME.writer().ok_or(InitError::FrameWriter));
	let mut supervisor = Supervisor::new(
		platform::UartSource::new(uart),
		platform::HwWatchdog::new(watchdog),
		frame_writer,
		&HEARTBEAT,
		config,
		now_ms(&timer),
	);
	supervisor.draw_layout(&boot);

	// Core 1 has to keep up with the DMA, so it wins any bus contention
	pac.BUSCTRL.bus_priority.modify(|_, w| w.proc1().set_bit());

	let mut mc = Multicore::new(&mut pac.PSM, &mut pac.PPB, &mut sio.fifo);
	let cores = mc.cores();
	let core1 = &mut cores[1];
	// Note (unsafe): Core 1 is the only user of this stack.
	let core1_stack = unsafe { &mut *addr_of_mut!(CORE1_STACK.mem) };
	unwrap!(core1
		.spawn(core1_stack, move || core1_main(line_queue))
		.map_err(|_| InitError::Core1Launch));

	info!("Core 1 running");

	// Note (unsafe): BOOT_BUTTON has been set, so the handler has a button.
	unsafe {
		pac::NVIC::unpend(pac::Interrupt::IO_IRQ_BANK0);
		pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
	}

	supervisor.watchdog_mut().start(config.watchdog_timeout_ms);

	let mut next_stats = now_ms(&timer).wrapping_add(STATS_INTERVAL_MS);
	loop {
		let now = now_ms(&timer);
		if supervisor.poll(now) == SupervisorState::SelfTestHang {
			warn!("KILL received, waiting for the watchdog");
			loop {
				cortex_m::asm::nop();
			}
		}

		if now.wrapping_sub(next_stats) < u32::MAX / 2 {
			next_stats = now.wrapping_add(STATS_INTERVAL_MS);
			let stats = supervisor.stats();
			info!(
				"{}, heartbeat={}, underruns={}, uart_errors={}",
				stats,
				HEARTBEAT.sample(),
				dvi::underruns(),
				supervisor.serial_mut().errors()
			);
		}

		delay.delay_ms(config.poll_interval_ms);
	}
}

/// This function runs the video encoder on Core 1.
///
/// It renders scan-lines from the frame buffer into line buffers forever. The
/// DMA interrupt, which also runs on this core, plays them out.
fn core1_main(line_queue: dvi::LineQueue) -> ! {
	let mut producer = ScanlineProducer::new(
		FRAME.reader(),
		&HEARTBEAT,
		FontEncoder,
		line_queue,
		&FONT_8X8,
	);

	// Note (unsafe): We're on Core 1 and `dvi::init` succeeded.
	unsafe {
		dvi::start();
	}

	producer.run()
}

/// Milliseconds since boot. Wraps after about 49 days.
fn now_ms(timer: &hal::Timer) -> u32 {
	(timer.get_counter().ticks() / 1_000) as u32
}

/// Give a pin to PIO0 as half of a TMDS pair.
fn dvi_pin<I, F, P>(pin: gpio::Pin<I, F, P>) -> gpio::Pin<I, gpio::FunctionPio0, P>
where
	I: gpio::PinId + gpio::ValidFunction<gpio::FunctionPio0>,
	F: gpio::Function,
	P: gpio::PullType,
{
	let mut pin = pin.into_function::<gpio::FunctionPio0>();
	configure_dvi_pad(&mut pin);
	pin
}

/// Set a TMDS pad to low drive and slow slew, with the output inverted.
///
/// The board wires each pair N-then-P, so inverting both pads swaps them.
fn configure_dvi_pad<I, F, P>(pin: &mut gpio::Pin<I, F, P>)
where
	I: gpio::PinId,
	F: gpio::Function,
	P: gpio::PullType,
{
	pin.set_drive_strength(gpio::OutputDriveStrength::TwoMilliAmps);
	pin.set_slew_rate(gpio::OutputSlewRate::Slow);
	pin.set_output_override(gpio::OutputOverride::Invert);
}

/// Called when lane 0 of the DVI link finishes a scan-line.
#[link_section = ".data"]
#[interrupt]
fn DMA_IRQ_0() {
	// Note (unsafe): This is the DMA IRQ handler.
	unsafe {
		dvi::irq();
	}
}

/// Called when the boot button is pressed.
#[interrupt]
fn IO_IRQ_BANK0() {
	critical_section::with(|cs| {
		if let Some(button) = BOOT_BUTTON.borrow(cs).borrow_mut().as_mut() {
			if button.interrupt_status(gpio::Interrupt::EdgeLow) {
				button.clear_interrupt(gpio::Interrupt::EdgeLow);
				info!("Boot button pressed, rebooting to USB");
				hal::rom_data::reset_to_usb_boot(0, 0);
			}
		}
	});
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
