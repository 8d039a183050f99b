//! Build and run-time configuration for printk
//!
//! Compile-time knobs are plain constants and cargo features; the few
//! settings a test or a board port may want to vary live in [`Config`].

/// Size of the staging buffer used on the unprivileged output path.
///
/// Bounds both the flush frequency across the privilege boundary and the
/// worst-case stack usage of a printk call from user mode.
pub const PRINTK_BUFFER_SIZE: usize = 32;

/// Longest message handed to the `log` facade when printk delegation is on.
pub const LOG_PRINTK_MAX_LEN: usize = 128;

/// Native `long` of the kernel's 32-bit targets
pub type Long = i32;
/// Native `unsigned long` of the kernel's 32-bit targets
pub type ULong = u32;

/// Number of hex digits printed for `%p`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerWidth {
    /// 8 hex digits
    Bits32,
    /// 16 hex digits
    Bits64,
}

impl PointerWidth {
    /// Pointer width selected by cargo features, else by the target
    pub const fn native() -> Self {
        if cfg!(feature = "ptr32") {
            PointerWidth::Bits32
        } else if cfg!(feature = "ptr64") || cfg!(target_pointer_width = "64") {
            PointerWidth::Bits64
        } else {
            PointerWidth::Bits32
        }
    }

    /// Hex digits needed to print a full pointer
    pub const fn hex_digits(self) -> u32 {
        match self {
            PointerWidth::Bits32 => 8,
            PointerWidth::Bits64 => 16,
        }
    }

    /// Mask a raw address down to the pointer width
    pub const fn mask(self, addr: u64) -> u64 {
        match self {
            PointerWidth::Bits32 => addr & 0xFFFF_FFFF,
            PointerWidth::Bits64 => addr,
        }
    }
}

/// Run-time printk configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Width used by `%p`
    pub pointer_width: PointerWidth,
    /// Send `printk()` output to the `log` facade instead of the sink
    pub log_printk: bool,
}

impl Config {
    /// Configuration derived from the enabled cargo features
    pub const DEFAULT: Config = Config {
        pointer_width: PointerWidth::native(),
        log_printk: cfg!(feature = "log-printk"),
    };

    /// Same configuration with a different `%p` width
    pub const fn with_pointer_width(self, pointer_width: PointerWidth) -> Self {
        Config {
            pointer_width,
            ..self
        }
    }

    /// Same configuration with logging delegation switched on or off
    pub const fn with_log_printk(self, log_printk: bool) -> Self {
        Config { log_printk, ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_width_digits() {
        assert_eq!(PointerWidth::Bits32.hex_digits(), 8);
        assert_eq!(PointerWidth::Bits64.hex_digits(), 16);
        assert_eq!(PointerWidth::Bits32.mask(0x1_2345_6789), 0x2345_6789);
        assert_eq!(PointerWidth::Bits64.mask(0x1_2345_6789), 0x1_2345_6789);
    }

    #[test]
    fn test_config_builders() {
        let cfg = Config::DEFAULT
            .with_pointer_width(PointerWidth::Bits32)
            .with_log_printk(true);
        assert_eq!(cfg.pointer_width, PointerWidth::Bits32);
        assert!(cfg.log_printk);
        assert_eq!(Config::default(), Config::DEFAULT);
    }
}
