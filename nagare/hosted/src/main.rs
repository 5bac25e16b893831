//! Hosted rendition of the transfer demo.
//!
//! OS threads stand in for harts on a machine whose caches are kept
//! coherent by hardware, so the maintenance operations degrade to the
//! fence-only fallback (see `kcmo`); that is an environment limitation,
//! not a protocol difference. The harness runs the full handoff once,
//! deterministically, and exits, which also makes it the end-to-end
//! test vehicle.

use std::{sync::Arc, thread};

use config::REPORT_BYTES;
use kdma::TransferContext;
use ksignal::WaitMode;
use log::Level;

fn main() {
    klog::init(Level::Info);
    log::info!("cache maintenance: {}", kcmo::CAPABILITY);

    run(config::MAX_HARTS);

    log::info!("all observers reported; exiting");
}

/// Drives one full transfer with `harts` execution contexts (hart 0
/// produces, the rest observe) and returns the observers' reports in
/// hart order.
fn run(harts: usize) -> Vec<[u8; REPORT_BYTES]> {
    assert!(harts >= 1);
    let ctx = Arc::new(TransferContext::new());

    let observers: Vec<_> = (1..harts)
        .map(|id| {
            let ctx = ctx.clone();
            thread::Builder::new()
                .name(format!("hart{id}"))
                .spawn(move || {
                    hart_id::set(id);
                    kdma::drive(id, &ctx, || {}, WaitMode::Yield)
                        .expect("observer harts return a report")
                })
                .expect("failed to start hart")
        })
        .collect();

    hart_id::set(0);
    let _ = kdma::drive(0, &ctx, || thread::sleep(config::DMA_LATENCY), WaitMode::Spin);

    observers
        .into_iter()
        .map(|hart| hart.join().expect("hart panicked"))
        .collect()
}

#[cfg(test)]
mod tests {
    use core::array;

    use super::*;

    #[test]
    fn four_harts_report_the_pattern() {
        let reports = run(config::MAX_HARTS);
        assert_eq!(reports.len(), config::MAX_HARTS - 1);

        let want: [u8; REPORT_BYTES] = array::from_fn(|i| i as u8);
        for head in reports {
            assert_eq!(head, want);
        }
    }

    #[test]
    fn producer_alone_still_completes() {
        // Nobody ever polls; the producer sequence and the publish must
        // not depend on a consumer showing up.
        let ctx = TransferContext::new();
        ctx.engine().run(|| {});
        assert!(ctx.done().is_set());

        assert!(run(1).is_empty());
    }
}
