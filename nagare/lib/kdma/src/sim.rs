//! Software model of private write-back caches over shared memory.
//!
//! The host the tests run on keeps its caches coherent, which is
//! exactly the property that hides the bugs this demo is about. Each
//! simulated hart therefore gets its own line-granular cache in front
//! of a shared backing store, with nothing keeping the caches in step;
//! a `coherent` configuration reads and writes the store directly so
//! the same test can show which memory model exposes a missing
//! maintenance call and which one masks it.

use std::{collections::HashMap, ops::Range, sync::Arc};

use config::CACHE_LINE_SIZE;
use spin::Mutex;

use crate::MemoryView;

/// Backing memory shared by every simulated hart. Sized up to whole
/// cache lines so line fills never run off the end.
#[derive(Clone)]
pub struct SharedRam(Arc<Mutex<Vec<u8>>>);

impl SharedRam {
    pub fn new(size: usize) -> Self {
        let size = size.next_multiple_of(CACHE_LINE_SIZE);
        SharedRam(Arc::new(Mutex::new(vec![0; size])))
    }

    /// Copy of the store's current contents, caches not consulted.
    pub fn snapshot(&self, range: Range<usize>) -> Vec<u8> {
        self.0.lock()[range].to_vec()
    }

    fn load(&self, addr: usize, out: &mut [u8]) {
        out.copy_from_slice(&self.0.lock()[addr..addr + out.len()])
    }

    fn store(&self, addr: usize, bytes: &[u8]) {
        self.0.lock()[addr..addr + bytes.len()].copy_from_slice(bytes)
    }
}

struct Line {
    bytes: [u8; CACHE_LINE_SIZE],
    dirty: bool,
}

fn overlaps(base: usize, range: &Range<usize>) -> bool {
    base < range.end && base + CACHE_LINE_SIZE > range.start
}

/// One simulated hart's private view of a [`SharedRam`].
pub struct SimView {
    ram: SharedRam,
    lines: HashMap<usize, Line>,
    coherent: bool,
}

impl SimView {
    /// Private write-back cache; nothing keeps it in step with other
    /// views, exactly like a hart on non-coherent hardware.
    pub fn non_coherent(ram: &SharedRam) -> Self {
        SimView {
            ram: ram.clone(),
            lines: HashMap::new(),
            coherent: false,
        }
    }

    /// Pass-through view modeling a hardware-coherent hierarchy: every
    /// access goes straight to the store and maintenance is a no-op.
    pub fn coherent(ram: &SharedRam) -> Self {
        SimView {
            ram: ram.clone(),
            lines: HashMap::new(),
            coherent: true,
        }
    }

    fn line(&mut self, base: usize) -> &mut Line {
        let ram = &self.ram;
        self.lines.entry(base).or_insert_with(|| {
            let mut bytes = [0; CACHE_LINE_SIZE];
            ram.load(base, &mut bytes);
            Line { bytes, dirty: false }
        })
    }
}

impl MemoryView for SimView {
    fn read(&mut self, addr: usize, out: &mut [u8]) {
        if self.coherent {
            return self.ram.load(addr, out);
        }
        for (i, byte) in out.iter_mut().enumerate() {
            let addr = addr + i;
            let base = addr & !(CACHE_LINE_SIZE - 1);
            *byte = self.line(base).bytes[addr - base];
        }
    }

    fn write(&mut self, addr: usize, bytes: &[u8]) {
        if self.coherent {
            return self.ram.store(addr, bytes);
        }
        for (i, &byte) in bytes.iter().enumerate() {
            let addr = addr + i;
            let base = addr & !(CACHE_LINE_SIZE - 1);
            let line = self.line(base);
            line.bytes[addr - base] = byte;
            line.dirty = true;
        }
    }

    // The transfer agent touches the store directly; no view cache is
    // consulted or updated.
    fn read_bypass(&mut self, addr: usize, out: &mut [u8]) {
        self.ram.load(addr, out)
    }

    fn write_bypass(&mut self, addr: usize, bytes: &[u8]) {
        self.ram.store(addr, bytes)
    }

    fn clean(&mut self, range: Range<usize>) {
        if self.coherent {
            return;
        }
        let ram = &self.ram;
        for (&base, line) in self.lines.iter_mut() {
            if overlaps(base, &range) && line.dirty {
                ram.store(base, &line.bytes);
                line.dirty = false;
            }
        }
    }

    fn invalidate(&mut self, range: Range<usize>) {
        if self.coherent {
            return;
        }
        self.lines.retain(|&base, _| !overlaps(base, &range));
    }
}

/// Line-aligned source/destination layout for a simulated transfer of
/// `size` bytes, mirroring the firmware's aligned buffers.
pub fn layout(size: usize) -> (Range<usize>, Range<usize>) {
    let dst = size.next_multiple_of(CACHE_LINE_SIZE);
    (0..size, dst..dst + size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_fills_from_ram() {
        let ram = SharedRam::new(128);
        ram.store(0, &[7; 128]);

        let mut view = SimView::non_coherent(&ram);
        let mut byte = [0];
        view.read(100, &mut byte);
        assert_eq!(byte, [7]);
    }

    #[test]
    fn cached_read_masks_later_memory_writes() {
        let ram = SharedRam::new(128);
        let mut view = SimView::non_coherent(&ram);

        let mut byte = [0xFF];
        view.read(0, &mut byte);
        assert_eq!(byte, [0]);

        // Another agent rewrites memory behind the view's back.
        ram.store(0, &[9]);
        view.read(0, &mut byte);
        assert_eq!(byte, [0], "cached line must mask the memory write");

        view.invalidate(0..1);
        view.read(0, &mut byte);
        assert_eq!(byte, [9]);
    }

    #[test]
    fn clean_writes_back_dirty_lines() {
        let ram = SharedRam::new(128);
        let mut view = SimView::non_coherent(&ram);

        view.write(64, &[5; 8]);
        assert_eq!(ram.snapshot(64..72), [0; 8], "write-back, not write-through");

        view.clean(64..72);
        assert_eq!(ram.snapshot(64..72), [5; 8]);
    }

    #[test]
    fn invalidate_discards_dirty_data() {
        let ram = SharedRam::new(64);
        let mut view = SimView::non_coherent(&ram);

        view.write(0, &[3; 4]);
        view.invalidate(0..4);

        let mut bytes = [0xFF; 4];
        view.read(0, &mut bytes);
        assert_eq!(bytes, [0; 4], "dirty data is dropped, not written back");

        // A second invalidate over the same range changes nothing.
        view.invalidate(0..4);
        view.read(0, &mut bytes);
        assert_eq!(bytes, [0; 4]);
    }

    #[test]
    fn coherent_view_is_pass_through() {
        let ram = SharedRam::new(64);
        let mut view = SimView::coherent(&ram);

        view.write(0, &[1, 2, 3]);
        assert_eq!(ram.snapshot(0..3), [1, 2, 3]);

        ram.store(0, &[9, 9, 9]);
        let mut bytes = [0; 3];
        view.read(0, &mut bytes);
        assert_eq!(bytes, [9, 9, 9]);
    }

    #[test]
    fn layout_keeps_buffers_line_aligned() {
        let (src, dst) = layout(100);
        assert_eq!(src, 0..100);
        assert_eq!(dst, 128..228);
        assert_eq!(dst.start % CACHE_LINE_SIZE, 0);
    }
}
