//! rtk_printk - kernel debug output and fatal error reporting
//!
//! This crate provides the lowest layer of kernel diagnostics: a
//! printf-style formatter that needs no heap and no device driver, routing
//! that respects the user/kernel privilege boundary, and the dispatcher
//! that reports hardware faults and software-detected fatal conditions.

#![cfg_attr(not(test), no_std)]

// Kernel-appropriate clippy configuration
// Many kernel types have specialized initialization that doesn't fit Default
#![allow(clippy::new_without_default)]
// Kernel code often needs explicit casts for memory-mapped I/O
#![allow(clippy::unnecessary_cast)]

pub mod config;
pub mod console;
pub mod fatal;
pub mod panic;
pub mod printk;
pub mod syscall;

pub use config::Config;
pub use fatal::{ExceptionFrame, FatalPolicy, FatalReason, FatalReporter};
pub use printk::{Arg, Printk, Sink};

/// Bring up kernel console output
pub fn init() {
    console::init();
    log::debug!(target: "printk", "console ready");
}
