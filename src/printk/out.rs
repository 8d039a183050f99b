//! Output contexts
//!
//! The interpreter writes through [`CharOut`] and never knows where bytes
//! end up. Each context is created for one call and dropped at its end.

use core::fmt;

use super::route::Privilege;
use super::sink::Hook;

/// Destination of formatted bytes
pub trait CharOut {
    /// Emit one byte
    fn out(&mut self, c: u8);

    /// Emit every byte of `bytes` in order
    fn out_all(&mut self, bytes: &[u8]) {
        for &c in bytes {
            self.out(c);
        }
    }
}

impl<T: CharOut + ?Sized> CharOut for &mut T {
    fn out(&mut self, c: u8) {
        (**self).out(c);
    }
}

/// Direct path: forwards every byte to the installed sink
pub struct CountingOut<'h, 'a> {
    hook: &'h Hook<'a>,
    count: usize,
}

impl<'h, 'a> CountingOut<'h, 'a> {
    pub fn new(hook: &'h Hook<'a>) -> Self {
        Self { hook, count: 0 }
    }

    /// Bytes emitted so far
    pub fn count(&self) -> usize {
        self.count
    }
}

impl CharOut for CountingOut<'_, '_> {
    fn out(&mut self, c: u8) {
        self.count += 1;
        self.hook.emit(c);
    }
}

/// Unprivileged path: stages bytes and hands them to the kernel in bulk
///
/// `N` must be non-zero.
pub struct BufferedOut<'p, const N: usize> {
    privilege: &'p dyn Privilege,
    buf: heapless::Vec<u8, N>,
    count: usize,
    flushes: usize,
}

impl<'p, const N: usize> BufferedOut<'p, N> {
    pub fn new(privilege: &'p dyn Privilege) -> Self {
        Self {
            privilege,
            buf: heapless::Vec::new(),
            count: 0,
            flushes: 0,
        }
    }

    /// Push staged bytes across the boundary and empty the buffer
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        self.privilege.str_out(&self.buf);
        self.buf.clear();
        self.flushes += 1;
    }

    /// Bytes produced so far, flushed or not
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of bulk writes issued
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Bytes currently staged
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Flush what is left and return the total byte count
    pub fn finish(mut self) -> usize {
        self.flush();
        self.count
    }
}

impl<const N: usize> CharOut for BufferedOut<'_, N> {
    fn out(&mut self, c: u8) {
        self.count += 1;
        if self.buf.push(c).is_err() {
            // Only reachable with N == 0
            self.privilege.str_out(&[c]);
            return;
        }
        if self.buf.is_full() {
            self.flush();
        }
    }
}

/// Bounded string target for snprintk
///
/// Keeps at most `len - 1` bytes followed by a NUL while still counting
/// every byte it is given.
pub struct StrOut<'b> {
    buf: &'b mut [u8],
    count: usize,
}

impl<'b> StrOut<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, count: 0 }
    }

    /// Terminate the string and return the untruncated length
    pub fn finish(self) -> usize {
        if self.count < self.buf.len() {
            self.buf[self.count] = 0;
        }
        self.count
    }
}

impl CharOut for StrOut<'_> {
    fn out(&mut self, c: u8) {
        let max = self.buf.len();
        if self.count < max {
            self.buf[self.count] = if self.count == max - 1 { 0 } else { c };
        }
        self.count += 1;
    }
}

/// `core::fmt::Write` bridge over any output context
pub struct FmtWriter<O: CharOut>(pub O);

impl<O: CharOut> fmt::Write for FmtWriter<O> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.out_all(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printk::sink::tests::CaptureSink;
    use core::fmt::Write;
    use spin::Mutex;

    struct UserSide {
        writes: Mutex<std::vec::Vec<std::vec::Vec<u8>>>,
    }

    impl Privilege for UserSide {
        fn is_user_context(&self) -> bool {
            true
        }

        fn str_out(&self, bytes: &[u8]) {
            self.writes.lock().push(bytes.to_vec());
        }
    }

    #[test]
    fn test_counting_out_forwards() {
        let sink = CaptureSink::new();
        let hook = Hook::new(&sink);
        let mut out = CountingOut::new(&hook);
        out.out_all(b"boot");
        assert_eq!(out.count(), 4);
        assert_eq!(sink.take(), "boot");
    }

    #[test]
    fn test_buffered_out_flushes_when_full() {
        let user = UserSide {
            writes: Mutex::new(Vec::new()),
        };
        let mut out = BufferedOut::<4>::new(&user);
        out.out_all(b"abcdefghij");
        assert_eq!(out.flushes(), 2);
        assert_eq!(out.pending(), 2);
        assert_eq!(out.finish(), 10);

        let writes = user.writes.lock();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0], b"abcd");
        assert_eq!(writes[1], b"efgh");
        assert_eq!(writes[2], b"ij");
    }

    #[test]
    fn test_buffered_out_empty_finish_writes_nothing() {
        let user = UserSide {
            writes: Mutex::new(Vec::new()),
        };
        let out = BufferedOut::<8>::new(&user);
        assert_eq!(out.finish(), 0);
        assert!(user.writes.lock().is_empty());
    }

    #[test]
    fn test_str_out_truncates() {
        let mut buf = [0xAAu8; 5];
        let mut out = StrOut::new(&mut buf);
        out.out_all(b"hello world");
        assert_eq!(out.finish(), 11);
        assert_eq!(&buf, b"hell\0");
    }

    #[test]
    fn test_str_out_short_output_terminated() {
        let mut buf = [0xAAu8; 8];
        let mut out = StrOut::new(&mut buf);
        out.out_all(b"hi");
        assert_eq!(out.finish(), 2);
        assert_eq!(&buf[..3], b"hi\0");
        assert_eq!(buf[3], 0xAA);
    }

    #[test]
    fn test_str_out_zero_capacity() {
        let mut buf = [0u8; 0];
        let mut out = StrOut::new(&mut buf);
        out.out_all(b"abc");
        assert_eq!(out.finish(), 3);
    }

    #[test]
    fn test_fmt_writer() {
        let sink = CaptureSink::new();
        let hook = Hook::new(&sink);
        let mut w = FmtWriter(CountingOut::new(&hook));
        write!(w, "pc={:#x}", 0x40u32).unwrap();
        assert_eq!(w.0.count(), 7);
        assert_eq!(sink.take(), "pc=0x40");
    }
}
