use core::{arch::asm, ops::Range};

use crate::{fence, for_each_line};

pub const CAPABILITY: &str = "zicbom cache block operations";

/// Writes dirty lines in `range` back to memory. The lines stay valid
/// in the cache.
pub fn clean(range: Range<usize>) {
    for_each_line(range, |line| unsafe {
        asm!(
            ".option push",
            ".option arch, +zicbom",
            "cbo.clean ({0})",
            ".option pop",
            in(reg) line,
        )
    });
    fence()
}

/// Drops lines in `range` from the cache without writing them back;
/// the next access refetches from memory.
pub fn invalidate(range: Range<usize>) {
    for_each_line(range, |line| unsafe {
        asm!(
            ".option push",
            ".option arch, +zicbom",
            "cbo.inval ({0})",
            ".option pop",
            in(reg) line,
        )
    });
    fence()
}
