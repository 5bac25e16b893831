use core::ops::Range;

use config::{CACHE_LINE_SIZE, REPORT_BYTES};
use ksignal::{Signal, WaitMode};

use crate::{pattern, MemoryView};

/// Producer half of the handoff. Owns the whole transfer sequence;
/// every step is a precondition for the next one.
pub struct TransferEngine<'a, V> {
    view: V,
    done: &'a Signal,
    src: Range<usize>,
    dst: Range<usize>,
}

impl<'a, V: MemoryView> TransferEngine<'a, V> {
    pub fn new(view: V, done: &'a Signal, src: Range<usize>, dst: Range<usize>) -> Self {
        assert_eq!(src.len(), dst.len());
        TransferEngine { view, done, src, dst }
    }

    /// Runs the full producer sequence. `latency` stands in for the
    /// time a real transfer takes between the source clean and the
    /// first destination write.
    pub fn run(mut self, latency: impl FnOnce()) {
        self.fill();
        self.flush_source();
        latency();
        self.copy();
        self.drop_destination();
        self.publish();
    }

    /// Writes the deterministic pattern through the producer's own
    /// cache. The source is never touched again after this.
    pub fn fill(&mut self) {
        let mut chunk = [0; CACHE_LINE_SIZE];
        let base = self.src.start;
        let mut addr = base;
        while addr < self.src.end {
            let len = CACHE_LINE_SIZE.min(self.src.end - addr);
            for (i, byte) in chunk[..len].iter_mut().enumerate() {
                *byte = pattern(addr - base + i);
            }
            self.view.write(addr, &chunk[..len]);
            addr += len;
        }
    }

    /// Cleans the source range so the pattern is in memory before the
    /// transfer agent reads it from there.
    pub fn flush_source(&mut self) {
        log::debug!("clean {:#x}..{:#x}", self.src.start, self.src.end);
        self.view.clean(self.src.clone());
    }

    /// The transfer agent itself: moves the bytes memory-to-memory,
    /// past the producer's cache.
    pub fn copy(&mut self) {
        let mut chunk = [0; CACHE_LINE_SIZE];
        let (mut src, mut dst) = (self.src.start, self.dst.start);
        while src < self.src.end {
            let len = CACHE_LINE_SIZE.min(self.src.end - src);
            self.view.read_bypass(src, &mut chunk[..len]);
            self.view.write_bypass(dst, &chunk[..len]);
            src += len;
            dst += len;
        }
    }

    /// Drops the producer's own stale lines for the destination, so a
    /// later read on this hart refetches what the agent wrote.
    pub fn drop_destination(&mut self) {
        log::debug!("invalidate {:#x}..{:#x}", self.dst.start, self.dst.end);
        self.view.invalidate(self.dst.clone());
    }

    /// Release-publishes completion. Consumes the engine: there is no
    /// way to touch the buffers through it after the flag is up.
    pub fn publish(self) {
        self.done.publish()
    }
}

/// Consumer half, one per observing hart.
pub struct Observer<'a, V> {
    view: V,
    done: &'a Signal,
    dst: Range<usize>,
    wait: WaitMode,
}

impl<'a, V: MemoryView> Observer<'a, V> {
    pub fn new(view: V, done: &'a Signal, dst: Range<usize>) -> Self {
        debug_assert!(dst.len() >= REPORT_BYTES);
        Observer { view, done, dst, wait: WaitMode::Spin }
    }

    pub fn wait_mode(mut self, wait: WaitMode) -> Self {
        self.wait = wait;
        self
    }

    /// Full consumer sequence: wait, refresh, report.
    pub fn run(mut self) -> [u8; REPORT_BYTES] {
        self.wait();
        self.refresh();
        self.report()
    }

    /// Polls the completion flag. No timeout; see `ksignal`.
    pub fn wait(&self) {
        self.done.wait_mode(self.wait)
    }

    /// Invalidates this hart's own lines for the destination. Every
    /// observer must do this itself: the producer's invalidate touched
    /// only the producer's cache, and an observer that skips it may
    /// read a stale value even though the producer has completed.
    pub fn refresh(&mut self) {
        log::debug!("invalidate {:#x}..{:#x}", self.dst.start, self.dst.end);
        self.view.invalidate(self.dst.clone());
    }

    /// Reads the leading destination bytes through this hart's cache.
    pub fn report(&mut self) -> [u8; REPORT_BYTES] {
        let mut head = [0; REPORT_BYTES];
        self.view.read(self.dst.start, &mut head);
        head
    }
}

#[cfg(test)]
mod tests {
    use core::array;

    use super::*;
    use crate::sim::{layout, SharedRam, SimView};

    fn expected_head() -> [u8; REPORT_BYTES] {
        array::from_fn(pattern)
    }

    fn run_producer(ram: &SharedRam, done: &ksignal::Signal, size: usize) {
        let (src, dst) = layout(size);
        TransferEngine::new(SimView::non_coherent(ram), done, src, dst).run(|| {});
    }

    #[test]
    fn pattern_lands_in_memory() {
        for size in [64, 100, 256, 1024] {
            let (_, dst) = layout(size);
            let ram = SharedRam::new(dst.end);
            let done = ksignal::Signal::new();

            run_producer(&ram, &done, size);

            assert!(done.is_set());
            let bytes = ram.snapshot(dst);
            assert!(
                bytes.iter().enumerate().all(|(i, &byte)| byte == pattern(i)),
                "wrong destination contents for size {size}"
            );
        }
    }

    #[test]
    fn observer_sees_fresh_bytes_after_refresh() {
        let size = config::BUFFER_SIZE;
        let (_, dst) = layout(size);
        let ram = SharedRam::new(dst.end);
        let done = ksignal::Signal::new();

        // Warm the observer's cache with the pre-transfer contents.
        let mut view = SimView::non_coherent(&ram);
        let mut scratch = vec![0; size];
        view.read(dst.start, &mut scratch);

        run_producer(&ram, &done, size);

        let mut observer = Observer::new(view, &done, dst.clone());
        observer.wait();
        observer.refresh();
        assert_eq!(observer.report(), expected_head());

        // Not just the head: a second warmed view that follows the
        // protocol sees the whole destination fresh.
        let mut view = SimView::non_coherent(&ram);
        let mut all = vec![0; size];
        view.read(dst.start, &mut all);
        view.invalidate(dst.clone());
        view.read(dst.start, &mut all);
        assert!(all.iter().enumerate().all(|(i, &byte)| byte == pattern(i)));
    }

    #[test]
    fn skipping_refresh_reads_stale_lines() {
        let size = config::BUFFER_SIZE;
        let (_, dst) = layout(size);
        let ram = SharedRam::new(dst.end);
        let done = ksignal::Signal::new();

        let mut view = SimView::non_coherent(&ram);
        let mut scratch = [0; REPORT_BYTES];
        view.read(dst.start, &mut scratch);

        run_producer(&ram, &done, size);

        let mut observer = Observer::new(view, &done, dst);
        observer.wait();
        // refresh() deliberately omitted: the fault this demo is about.
        assert_eq!(
            observer.report(),
            [0; REPORT_BYTES],
            "stale cache must mask the transfer"
        );
    }

    #[test]
    fn coherent_model_hides_the_missing_refresh() {
        let size = config::BUFFER_SIZE;
        let (_, dst) = layout(size);
        let ram = SharedRam::new(dst.end);
        let done = ksignal::Signal::new();

        let mut view = SimView::coherent(&ram);
        let mut scratch = [0; REPORT_BYTES];
        view.read(dst.start, &mut scratch);

        run_producer(&ram, &done, size);

        let mut observer = Observer::new(view, &done, dst);
        observer.wait();
        // Same omission as above, but coherent hardware papers over it.
        assert_eq!(observer.report(), expected_head());
    }

    #[test]
    fn skipping_source_clean_ships_stale_bytes() {
        let size = 256;
        let (src, dst) = layout(size);
        let ram = SharedRam::new(dst.end);
        let done = ksignal::Signal::new();

        let mut engine =
            TransferEngine::new(SimView::non_coherent(&ram), &done, src, dst.clone());
        engine.fill();
        // flush_source() deliberately omitted: the pattern is stuck in
        // the producer's cache, so the agent copies stale memory.
        engine.copy();
        engine.drop_destination();
        engine.publish();

        assert!(ram.snapshot(dst).iter().all(|&byte| byte == 0));
    }

    #[test]
    fn maintenance_is_idempotent() {
        let size = 256;
        let (src, dst) = layout(size);
        let ram = SharedRam::new(dst.end);
        let done = ksignal::Signal::new();

        let mut engine =
            TransferEngine::new(SimView::non_coherent(&ram), &done, src.clone(), dst);
        engine.fill();
        engine.flush_source();
        let once = ram.snapshot(0..size);
        engine.flush_source();
        assert_eq!(ram.snapshot(0..size), once);
    }
}
