use core::ops::Range;

/// One hart's private window onto the demo's byte space.
///
/// The plain accessors model loads and stores that go through the
/// hart's own cache; the `*_bypass` pair models the transfer agent,
/// which reads and writes memory without consulting anybody's cache.
/// `clean` and `invalidate` are the maintenance operations from the
/// hart's point of view: they affect this view only, never another
/// hart's.
pub trait MemoryView {
    fn read(&mut self, addr: usize, out: &mut [u8]);
    fn write(&mut self, addr: usize, bytes: &[u8]);
    fn read_bypass(&mut self, addr: usize, out: &mut [u8]);
    fn write_bypass(&mut self, addr: usize, bytes: &[u8]);
    /// Writes dirty lines overlapping `range` back to memory.
    fn clean(&mut self, range: Range<usize>);
    /// Discards cached lines overlapping `range` without write-back.
    fn invalidate(&mut self, range: Range<usize>);
}

/// View over real memory: volatile accesses at real addresses plus the
/// maintenance operations from `kcmo`.
pub struct DirectView(());

impl DirectView {
    /// # Safety
    ///
    /// Every address range later driven through this view must stay
    /// within live, exclusively-disciplined buffers for as long as the
    /// view is used. `TransferContext` is the one place that upholds
    /// this.
    pub(crate) unsafe fn attach() -> Self {
        DirectView(())
    }
}

impl MemoryView for DirectView {
    fn read(&mut self, addr: usize, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = unsafe { ((addr + i) as *const u8).read_volatile() };
        }
    }

    fn write(&mut self, addr: usize, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            unsafe { ((addr + i) as *mut u8).write_volatile(byte) };
        }
    }

    // A CPU stands in for the transfer agent here, so "bypassing"
    // lands in the copier's cache after all; the producer's
    // destination invalidate keeps the model honest, the same way the
    // real agent's memory writes would require it.
    fn read_bypass(&mut self, addr: usize, out: &mut [u8]) {
        self.read(addr, out)
    }

    fn write_bypass(&mut self, addr: usize, bytes: &[u8]) {
        self.write(addr, bytes)
    }

    fn clean(&mut self, range: Range<usize>) {
        kcmo::clean(range)
    }

    fn invalidate(&mut self, range: Range<usize>) {
        kcmo::invalidate(range)
    }
}
