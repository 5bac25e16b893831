use core::time::Duration;

pub const RAM_START: usize = 0x8000_0000;

pub const KERNEL_OFFSET: usize = 0x200000;

/// Physical entry point of the image; secondary harts are pointed here
/// by `hart_start`. Keep in step with `BASE_ADDRESS` in the demo's
/// link.ld.
pub const KERNEL_START: usize = RAM_START + KERNEL_OFFSET;

/// Busy-loop iterations standing in for transfer latency on hardware.
pub const DMA_LATENCY_SPINS: usize = 1_000_000;

/// Sleep standing in for transfer latency under an OS.
pub const DMA_LATENCY: Duration = Duration::from_millis(100);
