//! Privilege-aware output routing
//!
//! Kernel-mode callers write straight to the sink. User-mode callers cannot
//! touch the sink, so their output is staged in a small stack buffer and
//! handed to the kernel through the bulk string-out system call.

use super::arg::Arg;
use super::format;
use super::out::{BufferedOut, CountingOut};
use super::sink::Hook;
use crate::config::{Config, PRINTK_BUFFER_SIZE};

/// Platform view of the privilege boundary
pub trait Privilege: Sync {
    /// True when running in an unprivileged thread
    fn is_user_context(&self) -> bool;

    /// Hand a run of bytes to the kernel for output (the string-out syscall)
    fn str_out(&self, bytes: &[u8]);
}

/// Kernel without user mode: every caller is privileged
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor;

impl Privilege for Supervisor {
    fn is_user_context(&self) -> bool {
        false
    }

    fn str_out(&self, _bytes: &[u8]) {
        // Never reached: supervisor callers take the direct path
    }
}

/// Format one call's worth of output along the path the caller's privilege
/// allows, returning the byte count
pub fn route(
    hook: &Hook<'_>,
    privilege: &dyn Privilege,
    config: &Config,
    fmt: &[u8],
    args: &[Arg<'_>],
) -> usize {
    if privilege.is_user_context() {
        let mut out = BufferedOut::<PRINTK_BUFFER_SIZE>::new(privilege);
        format::format(&mut out, fmt, args, config);
        out.finish()
    } else {
        let mut out = CountingOut::new(hook);
        format::format(&mut out, fmt, args, config);
        out.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printk::sink::tests::CaptureSink;
    use spin::Mutex;

    struct Thread {
        user: bool,
        flushed: Mutex<Vec<Vec<u8>>>,
    }

    impl Thread {
        fn new(user: bool) -> Self {
            Self {
                user,
                flushed: Mutex::new(Vec::new()),
            }
        }
    }

    impl Privilege for Thread {
        fn is_user_context(&self) -> bool {
            self.user
        }

        fn str_out(&self, bytes: &[u8]) {
            self.flushed.lock().push(bytes.to_vec());
        }
    }

    #[test]
    fn test_privileged_goes_direct() {
        let sink = CaptureSink::new();
        let hook = Hook::new(&sink);
        let thread = Thread::new(false);

        let n = route(&hook, &thread, &Config::DEFAULT, b"irq %d\n", &[Arg::Int(7)]);
        assert_eq!(n, 6);
        assert_eq!(sink.take(), "irq 7\n");
        assert!(thread.flushed.lock().is_empty());
    }

    #[test]
    fn test_unprivileged_is_buffered_in_order() {
        let sink = CaptureSink::new();
        let hook = Hook::new(&sink);
        let thread = Thread::new(true);
        let long = [b'z'; 40];

        let n = route(
            &hook,
            &thread,
            &Config::DEFAULT,
            b"<%s>",
            &[Arg::Str(&long)],
        );
        assert_eq!(n, 42);
        assert_eq!(sink.take(), "");

        let flushed = thread.flushed.lock();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[0].len(), PRINTK_BUFFER_SIZE);
        let joined: Vec<u8> = flushed.iter().flatten().copied().collect();
        assert_eq!(joined.first(), Some(&b'<'));
        assert_eq!(joined.last(), Some(&b'>'));
        assert_eq!(joined.len(), 42);
    }

    #[test]
    fn test_supervisor_is_privileged() {
        assert!(!Supervisor.is_user_context());
    }
}
