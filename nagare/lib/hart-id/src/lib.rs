#![cfg_attr(not(any(test, feature = "test")), no_std)]

//! Identity of the executing hart.
//!
//! On bare metal the boot shim parks the hart id in `tp` before any
//! Rust code runs and nothing touches the register afterwards, so
//! reading it back is all there is to it. Under the `test` feature an
//! OS thread stands in for a hart and carries its id in a
//! thread-local, set once by the harness that spawned it.

#[cfg(any(test, feature = "test"))]
mod imp {
    use std::cell::Cell;

    std::thread_local! {
        static HART_ID: Cell<usize> = const { Cell::new(0) };
    }

    pub fn hart_id() -> usize {
        HART_ID.with(|id| id.get())
    }

    /// Binds the calling thread to a hart id.
    pub fn set(id: usize) {
        HART_ID.with(|cell| cell.set(id))
    }
}

#[cfg(all(
    not(any(test, feature = "test")),
    any(target_arch = "riscv32", target_arch = "riscv64")
))]
mod imp {
    pub fn hart_id() -> usize {
        let id;
        unsafe { core::arch::asm!("mv {}, tp", out(reg) id) };
        id
    }
}

#[cfg(all(
    not(any(test, feature = "test")),
    not(any(target_arch = "riscv32", target_arch = "riscv64"))
))]
mod imp {
    pub fn hart_id() -> usize {
        0
    }
}

pub use imp::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_per_thread() {
        set(3);
        assert_eq!(hart_id(), 3);

        let other = std::thread::spawn(|| hart_id());
        assert_eq!(other.join().unwrap(), 0);
        assert_eq!(hart_id(), 3);
    }
}
