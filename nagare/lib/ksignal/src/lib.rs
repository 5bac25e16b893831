#![cfg_attr(not(any(test, feature = "test")), no_std)]

//! One-shot completion flag with a release/acquire handoff.
//!
//! A single producer publishes exactly once; any number of consumers
//! poll until they observe the flag. The pairing only orders memory
//! accesses. It does not perform cache maintenance, so on a
//! non-coherent machine it is meaningful solely together with the
//! clean/invalidate discipline of the callers.

use core::{
    hint,
    sync::atomic::{AtomicBool, Ordering::*},
};

/// How a waiter burns time between polls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Busy spin. The only choice without an OS scheduler.
    #[default]
    Spin,
    /// Poll, yielding the thread between rounds.
    #[cfg(any(test, feature = "test"))]
    Yield,
}

pub struct Signal(AtomicBool);

impl Signal {
    pub const fn new() -> Self {
        Signal(AtomicBool::new(false))
    }

    /// Release-stores the flag. Every write the caller made before this
    /// call is visible to any hart whose [`wait`](Self::wait) observes
    /// it. Monotonic: there is no way back to the cleared state.
    pub fn publish(&self) {
        self.0.store(true, Release)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Acquire)
    }

    /// Polls until [`publish`](Self::publish) has happened. Never times
    /// out: a waiter whose producer died spins forever.
    pub fn wait(&self) {
        self.wait_mode(WaitMode::Spin)
    }

    pub fn wait_mode(&self, mode: WaitMode) {
        while !self.0.load(Acquire) {
            match mode {
                WaitMode::Spin => hint::spin_loop(),
                #[cfg(any(test, feature = "test"))]
                WaitMode::Yield => std::thread::yield_now(),
            }
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
