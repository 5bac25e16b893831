#![cfg_attr(not(any(test, feature = "test")), no_std)]

//! Producer/consumer handoff over a non-coherent memory model.
//!
//! One hart fills a source buffer, cleans it out to memory, lets a
//! transfer agent copy it to the destination behind every cache, drops
//! its own stale destination lines and publishes completion. Every
//! other hart waits on the flag, invalidates its own view of the
//! destination and only then reads. The flag orders memory accesses;
//! the clean/invalidate placement is what makes the ordering mean
//! anything on hardware whose caches are not kept coherent for free.
//!
//! All buffer traffic goes through the [`MemoryView`] seam, so the same
//! producer and observer code runs over real memory in the firmware and
//! over the software cache model in [`sim`] used by the tests.

mod ctx;
#[cfg(any(test, feature = "test"))]
pub mod sim;
mod view;
mod xfer;

use core::fmt;

use config::REPORT_BYTES;
use ksignal::WaitMode;

pub use self::{
    ctx::TransferContext,
    view::{DirectView, MemoryView},
    xfer::{Observer, TransferEngine},
};

/// Role a hart plays in the handoff. Hart 0 always produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Producer,
    Observer,
}

impl Role {
    pub fn of(hart: usize) -> Self {
        if hart == 0 {
            Role::Producer
        } else {
            Role::Observer
        }
    }
}

/// Byte the transfer writes at offset `i` of the source buffer.
pub fn pattern(i: usize) -> u8 {
    i as u8
}

struct HexDump<'a>(&'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, " {byte:02X}"))
    }
}

/// One hart's part in a run over `ctx`, shared by both environments:
/// hart 0 produces (`latency` stands in for the transfer time), every
/// other hart observes, logs the leading destination bytes and returns
/// them.
pub fn drive(
    hart: usize,
    ctx: &TransferContext,
    latency: impl FnOnce(),
    wait: WaitMode,
) -> Option<[u8; REPORT_BYTES]> {
    log::info!("starting");
    match Role::of(hart) {
        Role::Producer => {
            log::info!("filling source and starting transfer");
            ctx.engine().run(latency);
            log::info!("transfer done");
            None
        }
        Role::Observer => {
            log::info!("waiting for transfer");
            let head = ctx.observer().wait_mode(wait).run();
            log::info!("dst[0..{REPORT_BYTES}]:{}", HexDump(&head));
            Some(head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hart_zero_produces() {
        assert_eq!(Role::of(0), Role::Producer);
        assert!((1..config::MAX_HARTS).all(|id| Role::of(id) == Role::Observer));
    }

    #[test]
    fn pattern_wraps_at_256() {
        assert_eq!(pattern(0), 0);
        assert_eq!(pattern(255), 0xFF);
        assert_eq!(pattern(256), 0);
        assert_eq!(pattern(1000), 232);
    }
}
