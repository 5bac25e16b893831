use core::{cell::UnsafeCell, mem, ops::Range};

use config::{BUFFER_SIZE, CACHE_LINE_SIZE};
use ksignal::Signal;
use static_assertions::const_assert_eq;

use crate::{view::DirectView, Observer, TransferEngine};

#[repr(C, align(64))]
struct Aligned(UnsafeCell<[u8; BUFFER_SIZE]>);

const_assert_eq!(mem::align_of::<Aligned>(), CACHE_LINE_SIZE);

/// Shared state of one transfer run: the two cache-line-aligned buffers
/// and the completion flag.
///
/// Ownership follows the protocol phases. Until `done` publishes, hart
/// 0 is the only hart touching either buffer; afterwards both are
/// read-only and the destination is shared by every observer, each
/// through its own cache. The `Sync` impl is sound only under that
/// discipline, which the `TransferEngine`/`Observer` pair enforces:
/// the engine is consumed by `publish`, and observers get no write
/// path.
pub struct TransferContext {
    src: Aligned,
    dst: Aligned,
    done: Signal,
}

unsafe impl Sync for TransferContext {}

impl TransferContext {
    pub const fn new() -> Self {
        TransferContext {
            src: Aligned(UnsafeCell::new([0; BUFFER_SIZE])),
            dst: Aligned(UnsafeCell::new([0; BUFFER_SIZE])),
            done: Signal::new(),
        }
    }

    pub fn done(&self) -> &Signal {
        &self.done
    }

    fn src_range(&self) -> Range<usize> {
        let addr = self.src.0.get() as usize;
        addr..addr + BUFFER_SIZE
    }

    fn dst_range(&self) -> Range<usize> {
        let addr = self.dst.0.get() as usize;
        addr..addr + BUFFER_SIZE
    }

    /// Producer handle over this context's buffers. Call once, from
    /// hart 0.
    pub fn engine(&self) -> TransferEngine<'_, DirectView> {
        // SAFETY: the ranges come from this context's own live buffers.
        let view = unsafe { DirectView::attach() };
        TransferEngine::new(view, &self.done, self.src_range(), self.dst_range())
    }

    /// Consumer handle; one per observing hart.
    pub fn observer(&self) -> Observer<'_, DirectView> {
        // SAFETY: as in `engine`.
        let view = unsafe { DirectView::attach() };
        Observer::new(view, &self.done, self.dst_range())
    }
}

#[cfg(test)]
mod tests {
    use core::array;

    use super::*;
    use crate::pattern;

    #[test]
    fn end_to_end_over_real_memory() {
        // DirectView on a host: the maintenance calls are the fence
        // fallback and the host's caches are coherent, so running the
        // producer and an observer back to back on one thread
        // exercises the real volatile paths.
        let ctx = TransferContext::new();
        ctx.engine().run(|| {});
        assert!(ctx.done().is_set());

        let head = ctx.observer().run();
        assert_eq!(head, array::from_fn(pattern));
    }
}
