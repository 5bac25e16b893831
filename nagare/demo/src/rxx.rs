use core::{
    arch::{asm, global_asm},
    ptr::addr_of_mut,
};

use sbi_rt::{Shutdown, SystemFailure};

// Secondary harts are started with this marker as their payload. The
// boot hart's payload is the device-tree pointer handed over by the
// SBI firmware, which never has the top bit set.
const SECONDARY: usize = 1 << (usize::BITS - 1);

global_asm!(
    r#"
    .pushsection .init, "ax"
    .global _start
_start:
    csrw sie, zero
    csrw sip, zero

    // The hart id rides in tp from here on; see the hart-id crate.
    mv tp, a0

    .option push
    .option norelax
    la gp, __global_pointer$
    .option pop

    // Carve this hart's stack out of the .stack region.
    la sp, _sstack
    la t0, _stack_size
    addi t1, a0, 1
    mul t0, t1, t0
    add sp, sp, t0
    mv s0, sp

    la t0, __rt_init
    jr t0
    .popsection
    "#
);

#[no_mangle]
unsafe extern "C" fn __rt_init(hartid: usize, payload: usize) -> ! {
    extern "C" {
        static mut _sbss: u32;
        static mut _ebss: u32;
    }

    let boot_hart = payload & SECONDARY == 0;
    if boot_hart {
        r0::zero_bss(addr_of_mut!(_sbss), addr_of_mut!(_ebss));

        klog::init(log::Level::Info);
        log::info!("cache maintenance: {}", kcmo::CAPABILITY);

        for id in config::HART_RANGE.filter(|&id| id != hartid) {
            let ret = sbi_rt::hart_start(id, config::KERNEL_START, SECONDARY);
            if let Err(err) = ret.into_result() {
                panic!("failed to start hart {id}: {err:?}");
            }
        }
    }

    crate::drive(hartid);

    // A firmware image has nowhere to return to.
    loop {
        asm!("wfi")
    }
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("#{} {info}", hart_id::hart_id());

    sbi_rt::system_reset(Shutdown, SystemFailure);
    loop {
        unsafe { asm!("wfi") }
    }
}
