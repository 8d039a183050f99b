//! Serial console for the kernel
//!
//! Provides the UART character sink printk writes through, plus the
//! `kprint!`/`kprintln!` macros for `core::fmt` style output on the same
//! path.

use core::fmt;

use crate::printk::{self, Sink};

// QEMU virt machine UART base
const UART_BASE: usize = 0x0900_0000;

/// Memory-mapped UART transmit register
pub struct UartSink {
    base: usize,
    // In test mode, output lands here instead of on the hardware
    #[cfg(test)]
    buffer: spin::Mutex<heapless::String<1024>>,
}

impl UartSink {
    /// Create a sink for the UART at `base`
    pub const fn new(base: usize) -> Self {
        Self {
            base,
            #[cfg(test)]
            buffer: spin::Mutex::new(heapless::String::new()),
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    fn write_byte(&self, byte: u8) {
        #[cfg(test)]
        {
            if byte.is_ascii() {
                let _ = self.buffer.lock().push(byte as char);
            }
        }

        #[cfg(not(test))]
        {
            // SAFETY: base is the device's transmit register
            unsafe {
                (self.base as *mut u8).write_volatile(byte);
            }
        }
    }
}

impl Sink for UartSink {
    fn putc(&self, c: u8) -> u8 {
        if c == b'\n' {
            // Serial terminals expect CRLF
            self.write_byte(b'\r');
        }
        self.write_byte(c);
        c
    }
}

/// Board UART
static UART: UartSink = UartSink::new(UART_BASE);

/// Route kernel printk output to the board UART
pub fn init() {
    printk::hook_install(&UART);
}

/// Print formatted text to console
pub fn print(args: fmt::Arguments) {
    printk::kernel().print_fmt(args);
}

/// Print macro for kernel use
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::console::print(format_args!($($arg)*));
    };
}

/// Print with newline macro
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n");
    };
    ($($arg:tt)*) => {
        $crate::console::print(format_args!("{}\n", format_args!($($arg)*)))
    };
}
