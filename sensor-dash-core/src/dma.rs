//! DMA control-block lists for the DVI lanes.
//!
//! Each lane has a data channel that feeds its serialiser FIFO, and a control
//! channel that reprograms the data channel. The control channel copies one
//! four-word block at a time into the data channel's first register alias
//! (`READ_ADDR`, `WRITE_ADDR`, `TRANS_COUNT`, `CTRL_TRIG`), and the write to
//! `CTRL_TRIG` starts the data channel. Every block chains back to the control
//! channel, which then loads whatever its read address points at next.
//!
//! So the DMA never stops. When lane 0 finishes the back porch of a line, it
//! raises an interrupt, and the handler has the whole active period to point
//! each control channel at the next line's list before it gets there.
//!
//! These are plain words in memory, so the lists can be built and checked on
//! the host. The addresses are only meaningful on the RP2040.

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
	queue::LineSymbols,
	timing::{LineKind, PERIODS_PER_LINE},
};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The four registers of a data channel's first alias, in address order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBlock {
	read_addr: u32,
	write_addr: u32,
	trans_count: u32,
	ctrl: u32,
}

/// One scan-line's worth of blocks: front porch, sync, back porch, active.
#[repr(C, align(16))]
pub struct DmaList {
	blocks: [DmaBlock; PERIODS_PER_LINE],
}

/// Where a lane's DMA reads from and writes to.
#[derive(Clone, Copy)]
pub struct LaneConfig {
	/// Which TMDS lane this is. Lane 0 carries the syncs.
	pub lane: usize,
	/// The channel that feeds the serialiser
	pub data_channel: u8,
	/// The channel that reprograms `data_channel`
	pub control_channel: u8,
	/// The serialiser's TX FIFO
	pub fifo_addr: u32,
	/// The serialiser's TX DREQ
	pub dreq: u8,
}

/// Every list one lane needs.
pub struct LaneLists {
	/// Used on visible lines. The active block points at a line buffer.
	visible: DmaList,
	/// Used during the vertical front and back porch.
	vblank_porch: DmaList,
	/// Used during the vertical sync pulse.
	vblank_sync: DmaList,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Which block in a list carries the active pixels.
const ACTIVE_BLOCK: usize = PERIODS_PER_LINE - 1;

/// Lane 0 interrupts when this block finishes, which is when the active
/// block starts.
const IRQ_BLOCK: usize = ACTIVE_BLOCK - 1;

/// The sync pulse is the second block in every list.
const SYNC_BLOCK: usize = 1;

/// A DREQ number that means "go as fast as you can".
pub const TREQ_PERMANENT: u8 = 0x3F;

const CTRL_EN: u32 = 1 << 0;
const CTRL_DATA_SIZE_WORD: u32 = 2 << 2;
const CTRL_INCR_READ: u32 = 1 << 4;
const CTRL_INCR_WRITE: u32 = 1 << 5;
const CTRL_RING_SIZE_SHIFT: u32 = 6;
const CTRL_RING_SEL_WRITE: u32 = 1 << 10;
const CTRL_CHAIN_TO_SHIFT: u32 = 11;
const CTRL_TREQ_SEL_SHIFT: u32 = 15;
const CTRL_IRQ_QUIET: u32 = 1 << 21;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Build a DMA channel `CTRL` value for a word-sized transfer.
const fn make_ctrl(chain_to: u8, treq: u8, incr_read: bool, quiet: bool) -> u32 {
	let mut ctrl = CTRL_EN
		| CTRL_DATA_SIZE_WORD
		| ((chain_to as u32) << CTRL_CHAIN_TO_SHIFT)
		| ((treq as u32) << CTRL_TREQ_SEL_SHIFT);
	if incr_read {
		ctrl |= CTRL_INCR_READ;
	}
	if quiet {
		ctrl |= CTRL_IRQ_QUIET;
	}
	ctrl
}

/// The `CTRL` value for a control channel.
///
/// It copies four words into a 16-byte ring (the data channel's registers) as
/// fast as it can, and doesn't chain anywhere. A chain from the data channel
/// restarts it with the same count, carrying on from where it read up to.
pub const fn control_ctrl(control_channel: u8) -> u32 {
	make_ctrl(control_channel, TREQ_PERMANENT, true, true)
		| CTRL_INCR_WRITE
		| CTRL_RING_SEL_WRITE
		| (4 << CTRL_RING_SIZE_SHIFT)
}

impl DmaBlock {
	const EMPTY: DmaBlock = DmaBlock {
		read_addr: 0,
		write_addr: 0,
		trans_count: 0,
		ctrl: 0,
	};
}

impl DmaList {
	const EMPTY: DmaList = DmaList {
		blocks: [DmaBlock::EMPTY; PERIODS_PER_LINE],
	};

	/// Fill in the list for one kind of scan-line.
	///
	/// `blanking(hsync, vsync)` gives the address of the word to repeat
	/// during a blanking period. `active` is the address of the active
	/// pixels, if this line has any.
	fn build(
		config: &LaneConfig,
		period_words: &[u32; PERIODS_PER_LINE],
		vsync: bool,
		active: Option<u32>,
		blanking: &dyn Fn(bool, bool) -> u32,
	) -> DmaList {
		let mut list = DmaList::EMPTY;
		for (idx, block) in list.blocks.iter_mut().enumerate() {
			let quiet = !(idx == IRQ_BLOCK && config.lane == 0);
			let (read_addr, incr_read) = match active {
				Some(addr) if idx == ACTIVE_BLOCK => (addr, true),
				_ => (blanking(idx == SYNC_BLOCK, vsync), false),
			};
			*block = DmaBlock {
				read_addr,
				write_addr: config.fifo_addr,
				trans_count: period_words[idx],
				ctrl: make_ctrl(config.control_channel, config.dreq, incr_read, quiet),
			};
		}
		list
	}

	/// Convert the list to a 32-bit address that the DMA engine understands.
	pub fn as_addr(&self) -> u32 {
		self as *const _ as usize as u32
	}

	/// Where the control channel's read address ends up once it has loaded
	/// the last block.
	pub fn end_addr(&self) -> u32 {
		self.as_addr()
			.wrapping_add(core::mem::size_of::<DmaList>() as u32)
	}
}

impl LaneLists {
	/// Empty lists, for static initialisation.
	pub const EMPTY: LaneLists = LaneLists {
		visible: DmaList::EMPTY,
		vblank_porch: DmaList::EMPTY,
		vblank_sync: DmaList::EMPTY,
	};

	/// Build the lists for one lane.
	///
	/// The visible list starts out pointing at `first_line`.
	pub fn new(
		config: &LaneConfig,
		period_words: &[u32; PERIODS_PER_LINE],
		first_line: &LineSymbols,
		blanking: &dyn Fn(bool, bool) -> u32,
	) -> LaneLists {
		let active = first_line.plane_addr(config.lane) as usize as u32;
		LaneLists {
			visible: DmaList::build(config, period_words, false, Some(active), blanking),
			vblank_porch: DmaList::build(config, period_words, false, None, blanking),
			vblank_sync: DmaList::build(config, period_words, true, None, blanking),
		}
	}

	/// Point the visible list at this lane's plane of `line`.
	#[inline(always)]
	pub fn set_active(&mut self, lane: usize, line: &LineSymbols) {
		self.visible.blocks[ACTIVE_BLOCK].read_addr = line.plane_addr(lane) as usize as u32;
	}

	/// Get the list for a kind of scan-line.
	#[inline(always)]
	pub fn for_kind(&self, kind: LineKind) -> &DmaList {
		match kind {
			LineKind::Visible => &self.visible,
			LineKind::VblankPorch => &self.vblank_porch,
			LineKind::VblankSync => &self.vblank_sync,
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::timing::VideoTiming;

	const KINDS: [LineKind; 3] = [LineKind::Visible, LineKind::VblankPorch, LineKind::VblankSync];

	fn config(lane: usize) -> LaneConfig {
		LaneConfig {
			lane,
			data_channel: lane as u8,
			control_channel: lane as u8 + 3,
			fifo_addr: 0x5020_0010 + 4 * lane as u32,
			dreq: lane as u8,
		}
	}

	/// Blanking words live at made-up addresses: 0x100 + hsync + 2 * vsync.
	fn blanking(hsync: bool, vsync: bool) -> u32 {
		0x100 + u32::from(hsync) + 2 * u32::from(vsync)
	}

	fn build(lane: usize, line: &LineSymbols) -> LaneLists {
		let words = VideoTiming::MODE_640X480_60.period_words();
		LaneLists::new(&config(lane), &words, line, &blanking)
	}

	fn chain_to(ctrl: u32) -> u8 {
		((ctrl >> CTRL_CHAIN_TO_SHIFT) & 0xF) as u8
	}

	#[test]
	fn every_block_chains_to_the_control_channel() {
		let line = LineSymbols::blank();
		for lane in 0..3 {
			let lists = build(lane, &line);
			for kind in KINDS {
				for block in lists.for_kind(kind).blocks.iter() {
					assert_eq!(chain_to(block.ctrl), lane as u8 + 3, "{:?}", kind);
					assert_ne!(block.ctrl & CTRL_EN, 0);
				}
			}
		}
	}

	#[test]
	fn only_lane_0_interrupts_and_only_at_the_start_of_active() {
		let line = LineSymbols::blank();
		for lane in 0..3 {
			let lists = build(lane, &line);
			for kind in KINDS {
				for (idx, block) in lists.for_kind(kind).blocks.iter().enumerate() {
					let loud = block.ctrl & CTRL_IRQ_QUIET == 0;
					assert_eq!(loud, lane == 0 && idx == 2, "lane {} block {}", lane, idx);
				}
			}
		}
	}

	#[test]
	fn blocks_follow_the_timing() {
		let line = LineSymbols::blank();
		let lists = build(0, &line);
		let porch = lists.for_kind(LineKind::VblankPorch);
		let counts: Vec<u32> = porch.blocks.iter().map(|b| b.trans_count).collect();
		assert_eq!(counts, [8, 48, 24, 320]);
		assert!(porch.blocks.iter().all(|b| b.write_addr == 0x5020_0010));
		// Front porch, hsync, back porch, then blank where the pixels would be
		let reads: Vec<u32> = porch.blocks.iter().map(|b| b.read_addr).collect();
		assert_eq!(reads, [0x100, 0x101, 0x100, 0x100]);
		let sync = lists.for_kind(LineKind::VblankSync);
		let reads: Vec<u32> = sync.blocks.iter().map(|b| b.read_addr).collect();
		assert_eq!(reads, [0x102, 0x103, 0x102, 0x102]);
		assert!(sync.blocks.iter().all(|b| b.ctrl & CTRL_INCR_READ == 0));
	}

	#[test]
	fn active_block_walks_the_lane_plane() {
		let first = LineSymbols::blank();
		let second = LineSymbols::blank();
		let mut lists = build(2, &first);
		let active = &lists.for_kind(LineKind::Visible).blocks[ACTIVE_BLOCK];
		assert_eq!(active.read_addr, first.plane_addr(2) as usize as u32);
		assert_ne!(active.ctrl & CTRL_INCR_READ, 0);
		lists.set_active(2, &second);
		let active = &lists.for_kind(LineKind::Visible).blocks[ACTIVE_BLOCK];
		assert_eq!(active.read_addr, second.plane_addr(2) as usize as u32);
		// The blanking lists never look at line buffers
		let porch = &lists.for_kind(LineKind::VblankPorch).blocks[ACTIVE_BLOCK];
		assert_eq!(porch.read_addr, 0x100);
	}

	#[test]
	fn end_is_just_past_the_active_block() {
		let line = LineSymbols::blank();
		let lists = build(1, &line);
		for kind in KINDS {
			let list = lists.for_kind(kind);
			assert_eq!(list.end_addr().wrapping_sub(list.as_addr()), 64);
			assert_eq!(list.as_addr() % 16, 0);
		}
	}

	#[test]
	fn control_channel_copies_one_block_per_trigger() {
		let ctrl = control_ctrl(4);
		assert_eq!(chain_to(ctrl), 4);
		assert_eq!((ctrl >> CTRL_RING_SIZE_SHIFT) & 0xF, 4);
		assert_ne!(ctrl & CTRL_RING_SEL_WRITE, 0);
		assert_ne!(ctrl & CTRL_INCR_READ, 0);
		assert_ne!(ctrl & CTRL_INCR_WRITE, 0);
		assert_ne!(ctrl & CTRL_IRQ_QUIET, 0);
		assert_eq!((ctrl >> CTRL_TREQ_SEL_SHIFT) & 0x3F, u32::from(TREQ_PERMANENT));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
