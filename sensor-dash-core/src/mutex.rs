//! Our mutex implementation.
//!
//! Unlike the cortex-m mutex, this one does not disable interrupts while the
//! lock is held, and it works across both cores. A contended lock spins until
//! the holder lets go.

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

use atomic_polyfill::{AtomicBool, Ordering};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A simple no-std mutex.
///
/// Uses `atomic-polyfill` for the compare-and-swap, because the Cortex-M0+
/// doesn't have one.
pub struct SpinMutex<T> {
	locked: AtomicBool,
	value: core::cell::UnsafeCell<T>,
}

/// Represents a locked mutex.
///
/// Is unlocked on drop.
pub struct SpinMutexGuard<'a, T> {
	parent: &'a SpinMutex<T>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<T> SpinMutex<T> {
	/// Create a new Mutex.
	///
	/// Defaults to unlocked.
	pub const fn new(value: T) -> SpinMutex<T> {
		SpinMutex {
			locked: AtomicBool::new(false),
			value: core::cell::UnsafeCell::new(value),
		}
	}

	/// Lock the mutex, waiting for it if someone else has it.
	///
	/// Unlock it by dropping the returned object. Locking it again from the
	/// same core before then will never return.
	pub fn lock(&self) -> SpinMutexGuard<'_, T> {
		loop {
			if let Some(guard) = self.try_lock() {
				return guard;
			}
			while self.locked.load(Ordering::Relaxed) {
				core::hint::spin_loop();
			}
		}
	}

	/// Lock the mutex, if nobody else has it.
	pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
		self.locked
			.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
			.ok()
			.map(|_| SpinMutexGuard { parent: self })
	}
}

unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<'a, T> Drop for SpinMutexGuard<'a, T> {
	fn drop(&mut self) {
		self.parent.locked.store(false, Ordering::Release);
	}
}

impl<'a, T> core::ops::Deref for SpinMutexGuard<'a, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		unsafe { &*self.parent.value.get() }
	}
}

impl<'a, T> core::ops::DerefMut for SpinMutexGuard<'a, T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		unsafe { &mut *self.parent.value.get() }
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn try_lock_fails_while_held() {
		let mutex = SpinMutex::new(5u32);
		let guard = mutex.lock();
		assert!(mutex.try_lock().is_none());
		drop(guard);
		assert_eq!(*mutex.try_lock().unwrap(), 5);
	}

	#[test]
	fn two_threads_never_lose_an_update() {
		let mutex = SpinMutex::new(0u32);
		std::thread::scope(|s| {
			for _ in 0..2 {
				s.spawn(|| {
					for _ in 0..10_000 {
						*mutex.lock() += 1;
					}
				});
			}
		});
		assert_eq!(*mutex.lock(), 20_000);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
