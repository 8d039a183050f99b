//! Character output hook
//!
//! The platform console driver installs a [`Sink`] at init time. Until then
//! every byte goes to [`NopSink`], so printk is safe to call from the very
//! first instruction of the kernel.

use spin::RwLock;

/// Emits one byte to the platform's diagnostic output
pub trait Sink: Sync {
    /// Output `c`, returning it
    fn putc(&self, c: u8) -> u8;
}

/// Default sink that swallows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NopSink;

impl Sink for NopSink {
    fn putc(&self, c: u8) -> u8 {
        c
    }
}

/// Adapts a bare putc routine into a [`Sink`]
#[derive(Clone, Copy)]
pub struct FnSink(pub fn(u8) -> u8);

impl Sink for FnSink {
    fn putc(&self, c: u8) -> u8 {
        (self.0)(c)
    }
}

impl core::fmt::Debug for FnSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FnSink").finish()
    }
}

/// Slot holding the active sink
///
/// The lock is only held long enough to copy the reference out; bytes are
/// emitted with the lock released, so a sink may itself call printk.
pub struct Hook<'a> {
    sink: RwLock<&'a dyn Sink>,
}

impl<'a> Hook<'a> {
    /// Create a hook with `sink` installed
    pub const fn new(sink: &'a dyn Sink) -> Self {
        Self {
            sink: RwLock::new(sink),
        }
    }

    /// Replace the active sink, returning the previous one
    pub fn install(&self, sink: &'a dyn Sink) -> &'a dyn Sink {
        core::mem::replace(&mut *self.sink.write(), sink)
    }

    /// Currently installed sink, for later re-installation
    pub fn get(&self) -> &'a dyn Sink {
        *self.sink.read()
    }

    /// Send one byte through the active sink
    #[inline]
    pub fn emit(&self, c: u8) -> u8 {
        self.get().putc(c)
    }
}

impl Hook<'static> {
    /// Hook with the no-op sink installed
    pub const fn nop() -> Self {
        Self::new(&NopSink)
    }
}
