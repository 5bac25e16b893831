//! Bare-metal rendition of the transfer demo.
//!
//! Each hart is a real execution context with its own private cache,
//! started through SBI and printing through the SBI console. Hart 0
//! produces, the others observe, and once every hart is done the image
//! idles in `wfi` forever, as firmware does.

#![cfg_attr(any(target_arch = "riscv32", target_arch = "riscv64"), no_std)]
#![cfg_attr(any(target_arch = "riscv32", target_arch = "riscv64"), no_main)]
#![cfg_attr(
    not(any(target_arch = "riscv32", target_arch = "riscv64")),
    allow(dead_code)
)]

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
mod rxx;

use kdma::TransferContext;
use ksignal::WaitMode;

static CTX: TransferContext = TransferContext::new();

/// One hart's whole life between boot and the final `wfi` loop.
fn drive(hart: usize) {
    let _ = kdma::drive(hart, &CTX, transfer_latency, WaitMode::Spin);
}

/// Stand-in for the time a real transfer takes.
fn transfer_latency() {
    for _ in 0..config::DMA_LATENCY_SPINS {
        core::hint::spin_loop()
    }
}

#[cfg(not(any(target_arch = "riscv32", target_arch = "riscv64")))]
fn main() {
    unimplemented!("firmware image; build for riscv64imac-unknown-none-elf")
}
