//! # DVI Driver for the Sensor Dash
//!
//! DVI output uses eight GPIO pins: three TMDS lanes and the TMDS clock, each
//! a differential pair. It generates 640x480@60Hz with a 25.2 MHz pixel clock
//! (the standard is 25.175 MHz, so we are 0.1% off). The assumption is that the
//! CPU is clocked at 252 MHz, i.e. 10x the pixel clock, so each state machine
//! can shift out one TMDS bit per clock. All of the PIO code relies on this
//! assumption!
//!
//! Core 1 encodes visible scan-lines into line buffers and posts them on the
//! valid queue. The DMA runs continuously from chained control blocks. Its
//! interrupt (also on Core 1) fires as each line's active period starts, hands
//! back the buffer from the line before on the free queue, and points the
//! control channels at the next line's list.

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

use core::ptr::addr_of_mut;
use core::sync::atomic::{compiler_fence, Ordering};

use atomic_polyfill::AtomicU32;
use defmt::*;
use heapless::spsc::{Consumer, Producer, Queue};
use rp_pico::hal::{
	pio::{Buffers, PIOBuilder, PIOExt, PinDir, ShiftDirection},
	pwm,
};
use sensor_dash_core::{
	dma::{control_ctrl, LaneConfig, LaneLists},
	queue::{LineSymbols, SpscLineQueue},
	scanout::Scanout,
	timing::{LineKind, VideoTiming},
};

use crate::{pac, InitError};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The PWM slice that drives the TMDS clock pair.
pub type ClockSlice = pwm::Slice<pwm::Pwm4, pwm::FreeRunning>;

/// Core 1's ends of the line buffer queues.
pub type LineQueue = SpscLineQueue<'static, 'static, QUEUE_DEPTH>;

/// Everything the DMA interrupt needs.
///
/// Built on Core 0 by `init`, then only touched on Core 1.
struct DviLink {
	dma: pac::DMA,
	clock: ClockSlice,
	/// Where played-out buffers go
	free: Producer<'static, &'static mut LineSymbols, QUEUE_DEPTH>,
	/// Where rendered buffers come from
	valid: Consumer<'static, &'static mut LineSymbols, QUEUE_DEPTH>,
	/// Which line and which buffers the DMA is on
	scanout: Scanout<&'static mut LineSymbols>,
	lists: &'static mut [LaneLists; NUM_LANES],
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The only video mode we generate.
pub const MODE: VideoTiming = VideoTiming::MODE_640X480_60;

/// The number of TMDS data lanes.
pub const NUM_LANES: usize = 3;

/// The lowest GPIO of each lane's pair, from lane 0 (blue) to lane 2 (red).
pub const LANE_PINS: [u8; NUM_LANES] = [10, 12, 14];

/// How many line buffers Core 1 and the DMA pass between them.
pub const NUM_LINE_BUFFERS: usize = 4;

/// Queue size. A `heapless` queue holds one fewer than this.
pub const QUEUE_DEPTH: usize = 8;

/// Two 10-bit symbols per FIFO word.
const SERIALISER_PULL_BITS: u8 = 20;

/// The DMA channel feeding each lane's FIFO
const DATA_CHANNELS: [u8; NUM_LANES] = [0, 1, 2];

/// The DMA channel that reprograms each data channel
const CONTROL_CHANNELS: [u8; NUM_LANES] = [3, 4, 5];

/// How many visible lines we played as black because Core 1 was late.
static UNDERRUNS: AtomicU32 = AtomicU32::new(0);

/// Lane 0 blanking, indexed by `hsync_pulse | (vsync_pulse << 1)`.
#[link_section = ".data"]
static LANE0_BLANKING: [u32; 4] = [
	MODE.lane0_word(false, false),
	MODE.lane0_word(true, false),
	MODE.lane0_word(false, true),
	MODE.lane0_word(true, true),
];

/// Lanes 1 and 2 blanking.
#[link_section = ".data"]
static LANE12_BLANKING: u32 = MODE.lane12_word();

/// Played when Core 1 hasn't got a line ready.
#[link_section = ".data"]
static BLACK_LINE: LineSymbols = LineSymbols::blank();

static mut LINE_BUFFERS: [LineSymbols; NUM_LINE_BUFFERS] = [
	LineSymbols::blank(),
	LineSymbols::blank(),
	LineSymbols::blank(),
	LineSymbols::blank(),
];

static mut FREE_QUEUE: Queue<&'static mut LineSymbols, QUEUE_DEPTH> = Queue::new();

static mut VALID_QUEUE: Queue<&'static mut LineSymbols, QUEUE_DEPTH> = Queue::new();

static mut LANE_LISTS: [LaneLists; NUM_LANES] =
	[LaneLists::EMPTY, LaneLists::EMPTY, LaneLists::EMPTY];

/// Somewhere to stash the DMA controller and queues, so the IRQ can find them
static mut DVI_LINK: Option<DviLink> = None;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Set up the serialisers, the DMA lists and the line buffer queues.
///
/// Nothing moves until Core 1 calls `start`. The free queue is primed with
/// every line buffer, and Core 1's ends of the queues are returned.
pub fn init(
	pio: pac::PIO0,
	dma: pac::DMA,
	mut clock: ClockSlice,
	resets: &mut pac::RESETS,
) -> Result<LineQueue, InitError> {
	// Grab PIO0 and the state machines it contains
	let (mut pio, sm0, sm1, sm2, _sm3) = pio.split(resets);

	// This program is the serialiser. Each bit taken from the OSR is the
	// address of the next instruction, and each instruction drives the pair
	// to match (P high for a one, N high for a zero) as it runs. One bit per
	// clock.
	//
	// Note: autopull should be set to 20-bits (two symbols), OSR is set to
	// shift right.
	let program = pio_proc::pio_asm!(
		".side_set 2"
		".origin 0"
		// A zero jumps here, and drives P low and N high
		"out pc, 1 side 0b10"
		// A one jumps here, and drives P high and N low
		"out pc, 1 side 0b01"
	);
	let installed = pio
		.install(&program.program)
		.map_err(|_| InitError::PioInstall)?;

	// All three lanes run the same two instructions, so they share them. We
	// never uninstall the program.
	macro_rules! build_lane {
		($sm:expr, $pin:expr) => {{
			let (mut sm, _, tx) = PIOBuilder::from_program(unsafe { installed.share() })
				.side_set_pin_base($pin)
				.buffers(Buffers::OnlyTx)
				.autopull(true)
				.out_shift_direction(ShiftDirection::Right)
				.pull_threshold(SERIALISER_PULL_BITS)
				.build($sm);
			sm.set_pindirs([($pin, PinDir::Output), ($pin + 1, PinDir::Output)]);
			(tx.fifo_address() as usize as u32, tx.dreq_value())
		}};
	}

	// You must not set a clock_divider (other than 1.0) on these state
	// machines. The bit clock is the system clock.
	let fifos = [
		build_lane!(sm0, LANE_PINS[0]),
		build_lane!(sm1, LANE_PINS[1]),
		build_lane!(sm2, LANE_PINS[2]),
	];

	// The TMDS clock is one tenth of the bit clock, 50% duty.
	clock.set_top(9);
	clock.set_div_int(1);

	// Take the DMA controller out of reset
	resets.reset.modify(|_, w| w.dma().clear_bit());
	while resets.reset_done.read().dma().bit_is_clear() {
		cortex_m::asm::nop();
	}

	let period_words = MODE.period_words();
	let blanking_lane0 = |hsync: bool, vsync: bool| {
		let idx = usize::from(hsync) | (usize::from(vsync) << 1);
		&LANE0_BLANKING[idx] as *const u32 as usize as u32
	};
	let blanking_lane12 = |_hsync: bool, _vsync: bool| &LANE12_BLANKING as *const u32 as usize as u32;

	// Note (unsafe): The interrupt isn't running yet, so nothing else can be
	// looking at these statics.
	let lists = unsafe { &mut *addr_of_mut!(LANE_LISTS) };
	for (lane, (fifo_addr, dreq)) in fifos.iter().enumerate() {
		let config = LaneConfig {
			lane,
			data_channel: DATA_CHANNELS[lane],
			control_channel: CONTROL_CHANNELS[lane],
			fifo_addr: *fifo_addr,
			dreq: *dreq,
		};
		let blanking: &dyn Fn(bool, bool) -> u32 = if lane == 0 {
			&blanking_lane0
		} else {
			&blanking_lane12
		};
		lists[lane] = LaneLists::new(&config, &period_words, &BLACK_LINE, blanking);

		// The control channel writes into the data channel's first alias and
		// wraps every four words.
		let control = usize::from(CONTROL_CHANNELS[lane]);
		let data = usize::from(DATA_CHANNELS[lane]);
		let target = &dma.ch[data].ch_read_addr as *const _ as usize as u32;
		dma.ch[control]
			.ch_al1_ctrl
			.write(|w| unsafe { w.bits(control_ctrl(CONTROL_CHANNELS[lane])) });
		dma.ch[control]
			.ch_write_addr
			.write(|w| unsafe { w.bits(target) });
		dma.ch[control]
			.ch_trans_count
			.write(|w| unsafe { w.bits(4) });
	}

	// Only lane 0 raises an interrupt, as each active period starts
	dma.inte0
		.write(|w| unsafe { w.inte0().bits(1 << DATA_CHANNELS[0]) });

	debug!("DMA lists ready");

	// Note (unsafe): As above, we're the only one here.
	let (mut free_tx, free_rx) = unsafe { (*addr_of_mut!(FREE_QUEUE)).split() };
	let (valid_tx, valid_rx) = unsafe { (*addr_of_mut!(VALID_QUEUE)).split() };
	for line in unsafe { (*addr_of_mut!(LINE_BUFFERS)).iter_mut() } {
		if free_tx.enqueue(line).is_err() {
			return Err(InitError::LineQueue);
		}
	}

	unsafe {
		// Hand off the DMA peripheral to the interrupt
		DVI_LINK = Some(DviLink {
			dma,
			clock,
			free: free_tx,
			valid: valid_rx,
			// Start in the blanking so Core 1 can get ahead
			scanout: Scanout::new(MODE, MODE.visible_lines_ends_at() + 1),
			lists,
		});
	}

	Ok(SpscLineQueue::new(free_rx, valid_tx))
}

/// Start sending video, and take the DMA interrupt on this core.
///
/// # Safety
///
/// Call once, on Core 1, after `init` has succeeded.
pub unsafe fn start() {
	let link = match (*addr_of_mut!(DVI_LINK)).as_mut() {
		Some(link) => link,
		None => {
			error!("DVI not initialised");
			return;
		}
	};

	let kind = link.scanout.kind();
	link.start_lists(kind);

	// Let the DMA fill every FIFO before the serialisers start, so they
	// start in step.
	let pio = &*pac::PIO0::ptr();
	let lane_mask: u8 = (1 << NUM_LANES) - 1;
	while pio.fstat.read().txfull().bits() & lane_mask != lane_mask {
		cortex_m::asm::nop();
	}
	pio.ctrl.modify(|r, w| {
		w.sm_enable().bits(r.sm_enable().bits() | lane_mask);
		w.clkdiv_restart().bits(lane_mask)
	});
	link.clock.enable();

	// Enable the interrupt (DVI_LINK has to be set first). It must be running
	// before the first active period ends.
	pac::NVIC::unpend(pac::Interrupt::DMA_IRQ_0);
	pac::NVIC::unmask(pac::Interrupt::DMA_IRQ_0);

	debug!("DVI running");
}

/// How many visible lines went out black because no line was ready.
pub fn underruns() -> u32 {
	UNDERRUNS.load(Ordering::Relaxed)
}

/// Call this function whenever lane 0 starts the active period of a
/// scan-line.
///
/// We use this as a prompt to recycle the line before and to queue up the
/// next one. The DMA is busy with the active pixels for the next 320 words,
/// which is how long we've got.
///
/// # Safety
///
/// Only call this from the DMA IRQ handler.
#[link_section = ".data"]
#[inline(always)]
pub unsafe fn irq() {
	let link = match (*addr_of_mut!(DVI_LINK)).as_mut() {
		Some(link) => link,
		None => {
			return;
		}
	};
	link.dma
		.ints0
		.write(|w| w.bits(1 << DATA_CHANNELS[0]));
	link.active_started();
}

impl DviLink {
	/// Queue the next scan-line, now this one's pixels are going out.
	#[inline(always)]
	fn active_started(&mut self) {
		// Each control channel must have loaded this line's active block
		// before we move it. Lanes 1 and 2 are a few cycles behind lane 0.
		let kind = self.scanout.kind();
		for lane in 0..NUM_LANES {
			let end = self.lists[lane].for_kind(kind).end_addr();
			let control = CONTROL_CHANNELS[lane];
			while self.read_addr(control) != end || self.is_busy(control) {}
		}

		let valid = &mut self.valid;
		let step = self.scanout.advance(|| valid.dequeue());
		if let Some(line) = step.released {
			// There is always space in the free queue
			let _ = self.free.enqueue(line);
		}

		if step.next_kind == LineKind::Visible {
			if step.underrun {
				UNDERRUNS.fetch_add(1, Ordering::Relaxed);
			}
			let line: &LineSymbols = match self.scanout.queued() {
				Some(line) => &**line,
				None => &BLACK_LINE,
			};
			for (lane, lists) in self.lists.iter_mut().enumerate() {
				lists.set_active(lane, line);
			}
		}

		self.queue_lists(step.next_kind);
	}

	/// Start each control channel on the right list.
	fn start_lists(&mut self, kind: LineKind) {
		compiler_fence(Ordering::SeqCst);
		for (lane, lists) in self.lists.iter().enumerate() {
			let addr = lists.for_kind(kind).as_addr();
			self.dma.ch[usize::from(CONTROL_CHANNELS[lane])]
				.ch_al3_read_addr_trig
				.write(|w| unsafe { w.bits(addr) });
		}
	}

	/// Point each control channel at the right list, without starting it.
	///
	/// The data channel's active block chains to it when it finishes.
	#[inline(always)]
	fn queue_lists(&mut self, kind: LineKind) {
		// The list writes above must land before the DMA reads them
		compiler_fence(Ordering::SeqCst);
		for (lane, lists) in self.lists.iter().enumerate() {
			let addr = lists.for_kind(kind).as_addr();
			self.dma.ch[usize::from(CONTROL_CHANNELS[lane])]
				.ch_read_addr
				.write(|w| unsafe { w.bits(addr) });
		}
	}

	#[inline(always)]
	fn read_addr(&self, channel: u8) -> u32 {
		self.dma.ch[usize::from(channel)].ch_read_addr.read().bits()
	}

	#[inline(always)]
	fn is_busy(&self, channel: u8) -> bool {
		self.dma.ch[usize::from(channel)]
			.ch_ctrl_trig
			.read()
			.busy()
			.bit_is_set()
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
