#![no_std]

//! Build-time constants for the transfer demo.

use core::ops::Range;

#[cfg_attr(feature = "qemu-virt", path = "qemu-virt.rs")]
mod imp;

pub use imp::*;

/// Bytes moved by one transfer.
pub const BUFFER_SIZE: usize = 1024;

/// Granularity of every cache maintenance operation; the transfer
/// buffers are aligned to it.
pub const CACHE_LINE_SIZE: usize = 64;

/// Execution contexts taking part in a run. Hart 0 produces, the rest
/// observe.
pub const MAX_HARTS: usize = 4;
pub const HART_RANGE: Range<usize> = 0..MAX_HARTS;

/// Leading destination bytes each observer reports.
pub const REPORT_BYTES: usize = 16;
