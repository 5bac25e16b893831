use log::Level;
use spin::Once;

use crate::println;

struct Logger(Level);

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.0
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let hart = hart_id::hart_id();
        if record.level() < Level::Debug {
            println!("[#{hart}] {:>5}: {}", record.level(), record.args())
        } else {
            let target = record.target();
            println!(
                "[#{hart}] {:>5}: [{target}] {}",
                record.level(),
                record.args()
            )
        }
    }

    fn flush(&self) {}
}

static LOGGER: Once<Logger> = Once::new();

/// Installs the console logger. Later calls are no-ops, so test
/// binaries may race through here freely.
pub fn init(max_level: Level) {
    let logger = LOGGER.call_once(|| Logger(max_level));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level.to_level_filter());
    }
}
