use core::fmt;

use spin::Mutex;

pub struct Output(());

impl Output {
    pub fn write_byte(&mut self, byte: u8) {
        #[cfg(any(test, feature = "test"))]
        {
            use std::io::Write;
            let _ = std::io::stdout().lock().write(&[byte]);
        }
        #[cfg(all(
            not(any(test, feature = "test")),
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        #[allow(deprecated)]
        let _ = sbi_rt::legacy::console_putchar(byte as usize);
        #[cfg(all(
            not(any(test, feature = "test")),
            not(any(target_arch = "riscv32", target_arch = "riscv64"))
        ))]
        let _ = byte;
    }
}

impl fmt::Write for Output {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes().for_each(|byte| self.write_byte(byte));
        Ok(())
    }
}

pub static OUTPUT: Mutex<Output> = Mutex::new(Output(()));

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        write!(*$crate::imp::OUTPUT.lock(), $($arg)*).unwrap()
    }};
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::imp::OUTPUT.lock().write_byte(b'\n')
    };
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        writeln!(*$crate::imp::OUTPUT.lock(), $($arg)*).unwrap()
    }};
}
