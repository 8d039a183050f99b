//! Kernel side of the printk string-out system call
//!
//! Unprivileged printk stages its output and hands whole runs of bytes to
//! the kernel. The kernel must not trust the pointer it is given: the range
//! is checked against the caller's readable memory before a single byte is
//! forwarded to the character sink. A rejected range is fatal to the
//! calling thread.

use thiserror::Error;

use crate::fatal::FatalReporter;
use crate::printk::Printk;

/// User space address range limits
#[cfg(target_arch = "x86_64")]
pub const USER_SPACE_START: usize = 0x0000_0000_0000_1000;
#[cfg(target_arch = "x86_64")]
pub const USER_SPACE_END: usize = 0x0000_7FFF_FFFF_FFFF;

#[cfg(target_arch = "aarch64")]
pub const USER_SPACE_START: usize = 0x0000_0000_0000_1000;
#[cfg(target_arch = "aarch64")]
pub const USER_SPACE_END: usize = 0x0000_FFFF_FFFF_FFFF;

// Cortex-M: SRAM region handed to threads
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const USER_SPACE_START: usize = 0x2000_0000;
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const USER_SPACE_END: usize = 0x3FFF_FFFF;

// ============================================================================
// Error Types
// ============================================================================

/// Why a user buffer was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CopyError {
    /// Null pointer
    #[error("null user pointer")]
    BadAddress,
    /// Range wraps around the address space
    #[error("user range of {len} bytes at {addr:#x} overflows")]
    Overflow { addr: usize, len: usize },
    /// Caller has no read access to the range
    #[error("user range of {len} bytes at {addr:#x} is not readable")]
    NotReadable { addr: usize, len: usize },
}

/// System call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyscallError {
    #[error("invalid user buffer: {0}")]
    Copy(#[from] CopyError),
}

// ============================================================================
// Address Validation
// ============================================================================

/// Memory the calling thread may read
pub trait UserMemory: Sync {
    /// True when every byte of `[addr, addr + len)` is readable by the caller
    fn can_read(&self, addr: usize, len: usize) -> bool;
}

/// A single contiguous user region, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    pub start: usize,
    pub end: usize,
}

impl UserRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.start && addr <= self.end
    }
}

impl UserMemory for UserRange {
    fn can_read(&self, addr: usize, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        match addr.checked_add(len - 1) {
            Some(end) => self.contains(addr) && self.contains(end),
            None => false,
        }
    }
}

/// Default user region of the target
pub const USER_SPACE: UserRange = UserRange::new(USER_SPACE_START, USER_SPACE_END);

/// Check a user buffer before the kernel reads it
pub fn validate_user_read(mem: &dyn UserMemory, ptr: *const u8, len: usize) -> Result<(), CopyError> {
    if len == 0 {
        return Ok(());
    }

    let addr = ptr as usize;
    if ptr.is_null() {
        return Err(CopyError::BadAddress);
    }
    if addr.checked_add(len - 1).is_none() {
        return Err(CopyError::Overflow { addr, len });
    }
    if !mem.can_read(addr, len) {
        return Err(CopyError::NotReadable { addr, len });
    }

    Ok(())
}

// ============================================================================
// String Out
// ============================================================================

/// Forward `len` bytes at `ptr` from the caller to the character sink
///
/// # Safety
///
/// `mem` must describe memory that is actually mapped: once a range passes
/// `mem.can_read` it is read directly.
pub unsafe fn k_str_out(
    printk: &Printk<'_>,
    mem: &dyn UserMemory,
    ptr: *const u8,
    len: usize,
) -> Result<(), SyscallError> {
    validate_user_read(mem, ptr, len)?;
    if len == 0 {
        return Ok(());
    }

    // SAFETY: range validated above; mapping guaranteed by the caller
    let bytes = unsafe { core::slice::from_raw_parts(ptr, len) };
    printk.str_out(bytes);
    Ok(())
}

/// Syscall entry: a rejected buffer oopses the calling thread
///
/// `ssf` is the caller's syscall stack frame, used to report where the
/// faulting call came from.
///
/// # Safety
///
/// Same contract as [`k_str_out`].
pub unsafe fn k_str_out_or_oops(
    reporter: &FatalReporter<'_, '_>,
    mem: &dyn UserMemory,
    ptr: *const u8,
    len: usize,
    ssf: &[u32],
) {
    // SAFETY: forwarded contract
    if let Err(e) = unsafe { k_str_out(reporter.printk(), mem, ptr, len) } {
        log::warn!(target: "printk", "string-out rejected: {}", e);
        reporter.syscall_oops(ssf);
    }
}

// ============================================================================
// Tests
// ============================================================================
