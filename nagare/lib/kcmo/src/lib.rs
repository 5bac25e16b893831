#![cfg_attr(not(any(test, feature = "test")), no_std)]

//! Explicit cache maintenance over byte address ranges.
//!
//! `clean` writes dirty lines back to memory before an external agent
//! reads them; `invalidate` discards lines so the next access refetches
//! what an external agent wrote. Both walk the range a cache line at a
//! time and end in a full fence, and both are idempotent.
//!
//! The implementation is picked when the crate is built, not per call:
//! the `zicbom` feature selects the RISC-V cache block operations, and
//! everything else gets the ordering-only fallback in `fence.rs`.

use core::ops::Range;

use config::CACHE_LINE_SIZE;
use static_assertions::const_assert;

const_assert!(CACHE_LINE_SIZE.is_power_of_two());

#[cfg_attr(
    all(
        feature = "zicbom",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ),
    path = "zicbom.rs"
)]
#[cfg_attr(
    not(all(
        feature = "zicbom",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )),
    path = "fence.rs"
)]
mod imp;

pub use imp::{clean, invalidate, CAPABILITY};

/// Full read/write memory barrier.
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst)
}

/// Applies `f` to the base address of every cache line overlapping
/// `range`.
pub fn for_each_line(range: Range<usize>, f: impl FnMut(usize)) {
    if range.is_empty() {
        return;
    }
    let range = (range.start & !(CACHE_LINE_SIZE - 1))..range.end;
    range.step_by(CACHE_LINE_SIZE).for_each(f)
}
