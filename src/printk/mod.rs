//! Low-level kernel debug output
//!
//! printk is the diagnostic path of last resort: it allocates nothing,
//! never fails, and works before any driver is up. Until the platform
//! installs a character sink all output is discarded.
//!
//! # Formatting
//!
//! Templates use a small printf dialect, see [`format`]. Arguments are a
//! slice of typed [`Arg`] values; the [`printk!`](crate::printk!) and
//! [`snprintk!`](crate::snprintk!) macros build it with `Arg::from`.
//!
//! ```ignore
//! printk!("booting %s, %d cpus\n", "rtk", 2);
//! let mut buf = [0u8; 16];
//! let needed = snprintk!(&mut buf, "%08x", 0xbeefu32);
//! ```
//!
//! # Context object
//!
//! All state lives in a [`Printk`]: the hook holding the active sink, the
//! platform's [`Privilege`] view, and the [`Config`]. The kernel uses one
//! process-wide instance, reachable through [`kernel()`] and the free
//! functions below. Subsystems and tests can build their own.

pub mod arg;
pub mod format;
pub mod num;
pub mod out;
pub mod route;
pub mod sink;

use core::fmt;

use spin::RwLock;

pub use arg::Arg;
pub use out::CharOut;
pub use route::{Privilege, Supervisor};
pub use sink::{FnSink, Hook, NopSink, Sink};

use crate::config::{Config, LOG_PRINTK_MAX_LEN, PRINTK_BUFFER_SIZE};
use out::{BufferedOut, CountingOut, FmtWriter, StrOut};

/// printk state: active sink, privilege view, configuration
pub struct Printk<'a> {
    hook: Hook<'a>,
    privilege: RwLock<&'a dyn Privilege>,
    config: Config,
}

impl<'a> Printk<'a> {
    pub const fn new(sink: &'a dyn Sink, privilege: &'a dyn Privilege, config: Config) -> Self {
        Self {
            hook: Hook::new(sink),
            privilege: RwLock::new(privilege),
            config,
        }
    }

    /// Install the platform's character output routine
    ///
    /// Meant for single-threaded init; returns the sink it replaces.
    pub fn hook_install(&self, sink: &'a dyn Sink) -> &'a dyn Sink {
        let prev = self.hook.install(sink);
        log::debug!(target: "printk", "character output hook replaced");
        prev
    }

    /// Current character output routine
    pub fn hook_get(&self) -> &'a dyn Sink {
        self.hook.get()
    }

    /// Install the platform's privilege query and string-out syscall
    pub fn set_privilege(&self, privilege: &'a dyn Privilege) -> &'a dyn Privilege {
        core::mem::replace(&mut *self.privilege.write(), privilege)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn privilege(&self) -> &'a dyn Privilege {
        *self.privilege.read()
    }

    /// Console output, or a log record when delegation is configured
    pub fn printk(&self, fmt: &str, args: &[Arg<'_>]) -> usize {
        if self.config.log_printk {
            self.log_printk(fmt.as_bytes(), args)
        } else {
            self.vprintk(fmt.as_bytes(), args)
        }
    }

    /// Console output through the privilege-appropriate path
    pub fn vprintk(&self, fmt: &[u8], args: &[Arg<'_>]) -> usize {
        route::route(&self.hook, self.privilege(), &self.config, fmt, args)
    }

    /// Format into `buf`, keeping at most `buf.len() - 1` bytes plus a NUL
    ///
    /// Returns the length the output would have had without truncation, so
    /// a return value `>= buf.len()` means the text was cut short.
    pub fn snprintk(&self, buf: &mut [u8], fmt: &str, args: &[Arg<'_>]) -> usize {
        self.vsnprintk(buf, fmt.as_bytes(), args)
    }

    /// [`snprintk`](Self::snprintk) over a raw byte template
    pub fn vsnprintk(&self, buf: &mut [u8], fmt: &[u8], args: &[Arg<'_>]) -> usize {
        let mut out = StrOut::new(buf);
        format::format(&mut out, fmt, args, &self.config);
        out.finish()
    }

    /// Run the interpreter into any output context
    pub fn format_to<O: CharOut + ?Sized>(&self, out: &mut O, fmt: &[u8], args: &[Arg<'_>]) {
        format::format(out, fmt, args, &self.config);
    }

    /// Kernel side of the string-out syscall: every byte goes to the sink
    pub fn str_out(&self, bytes: &[u8]) {
        for &c in bytes {
            self.hook.emit(c);
        }
    }

    /// Write `core::fmt` output through the same routing as printk
    pub fn print_fmt(&self, args: fmt::Arguments<'_>) -> usize {
        use core::fmt::Write;

        let privilege = self.privilege();
        if privilege.is_user_context() {
            let mut w = FmtWriter(BufferedOut::<PRINTK_BUFFER_SIZE>::new(privilege));
            let _ = w.write_fmt(args);
            w.0.finish()
        } else {
            let mut w = FmtWriter(CountingOut::new(&self.hook));
            let _ = w.write_fmt(args);
            w.0.count()
        }
    }

    fn log_printk(&self, fmt: &[u8], args: &[Arg<'_>]) -> usize {
        let mut buf = [0u8; LOG_PRINTK_MAX_LEN];
        let count = self.vsnprintk(&mut buf, fmt, args);
        let mut text = &buf[..count.min(LOG_PRINTK_MAX_LEN - 1)];
        if let [head @ .., b'\n'] = text {
            text = head;
        }
        let text = match core::str::from_utf8(text) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
        };
        log::info!(target: "printk", "{}", text);
        count
    }
}

static KERNEL: Printk<'static> = Printk::new(&NopSink, &Supervisor, Config::DEFAULT);

/// The kernel's printk instance
pub fn kernel() -> &'static Printk<'static> {
    &KERNEL
}

/// See [`Printk::printk`]
pub fn printk(fmt: &str, args: &[Arg<'_>]) -> usize {
    KERNEL.printk(fmt, args)
}

/// See [`Printk::vprintk`]
pub fn vprintk(fmt: &[u8], args: &[Arg<'_>]) -> usize {
    KERNEL.vprintk(fmt, args)
}

/// See [`Printk::snprintk`]
pub fn snprintk(buf: &mut [u8], fmt: &str, args: &[Arg<'_>]) -> usize {
    KERNEL.snprintk(buf, fmt, args)
}

/// See [`Printk::vsnprintk`]
pub fn vsnprintk(buf: &mut [u8], fmt: &[u8], args: &[Arg<'_>]) -> usize {
    KERNEL.vsnprintk(buf, fmt, args)
}

/// See [`Printk::hook_install`]
pub fn hook_install(sink: &'static dyn Sink) -> &'static dyn Sink {
    KERNEL.hook_install(sink)
}

/// See [`Printk::hook_get`]
pub fn hook_get() -> &'static dyn Sink {
    KERNEL.hook_get()
}

/// Formatted kernel console output
#[macro_export]
macro_rules! printk {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::printk::printk($fmt, &[$($crate::printk::Arg::from($arg)),*])
    };
}

/// Formatted output into a byte buffer, returning the untruncated length
#[macro_export]
macro_rules! snprintk {
    ($buf:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::printk::snprintk($buf, $fmt, &[$($crate::printk::Arg::from($arg)),*])
    };
}
