//! Typed printk arguments
//!
//! Callers build a slice of [`Arg`] instead of passing untyped varargs. The
//! interpreter reinterprets each value at the width its directive reads,
//! the same way a `va_arg` read of that type would.

/// One printk argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    /// `int` / `long`
    Int(i32),
    /// `unsigned int` / `unsigned long`
    Uint(u32),
    /// `long long`
    LongLong(i64),
    /// `unsigned long long`
    ULongLong(u64),
    /// Pointer-sized address
    Ptr(usize),
    /// Byte string, ends at the slice end or the first NUL
    Str(&'a [u8]),
    /// Single character
    Char(u8),
    /// Floating point value for `%f`
    Double(f64),
}

impl<'a> Arg<'a> {
    /// Placeholder read when the template wants more arguments than given
    pub const MISSING: Arg<'static> = Arg::Int(0);

    /// Raw 64-bit pattern of the value, sign-extended for signed types
    pub fn bits(&self) -> u64 {
        match *self {
            Arg::Int(v) => v as i64 as u64,
            Arg::Uint(v) => v as u64,
            Arg::LongLong(v) => v as u64,
            Arg::ULongLong(v) => v,
            Arg::Ptr(p) => p as u64,
            Arg::Str(s) => s.as_ptr() as usize as u64,
            Arg::Char(c) => c as u64,
            Arg::Double(d) => d as i64 as u64,
        }
    }

    /// Value as read by `%f`
    pub fn double(&self) -> f64 {
        match *self {
            Arg::Double(d) => d,
            Arg::Int(v) => v as f64,
            Arg::Uint(v) => v as f64,
            Arg::LongLong(v) => v as f64,
            Arg::ULongLong(v) => v as f64,
            Arg::Char(c) => c as f64,
            Arg::Ptr(_) | Arg::Str(_) => 0.0,
        }
    }

    /// Bytes printed by `%s`; non-string arguments print nothing
    pub fn bytes(&self) -> &'a [u8] {
        match *self {
            Arg::Str(s) => {
                let end = s.iter().position(|&b| b == 0).unwrap_or(s.len());
                &s[..end]
            }
            _ => &[],
        }
    }
}

macro_rules! arg_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(v: $ty) -> Self {
                    Arg::$variant(v as $conv)
                }
            }
        )*
    };
}

arg_from! {
    i8 => Int as i32,
    i16 => Int as i32,
    i32 => Int as i32,
    u8 => Uint as u32,
    u16 => Uint as u32,
    u32 => Uint as u32,
    i64 => LongLong as i64,
    u64 => ULongLong as u64,
    isize => LongLong as i64,
    usize => ULongLong as u64,
    f32 => Double as f64,
    f64 => Double as f64,
}

impl From<char> for Arg<'_> {
    fn from(c: char) -> Self {
        // Non-ASCII characters are not representable in one output byte
        Arg::Char(if c.is_ascii() { c as u8 } else { b'?' })
    }
}

impl From<bool> for Arg<'_> {
    fn from(b: bool) -> Self {
        Arg::Int(b as i32)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(s: &'a [u8]) -> Self {
        Arg::Str(s)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(s: &'a [u8; N]) -> Self {
        Arg::Str(s)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(p: *mut T) -> Self {
        Arg::Ptr(p as usize)
    }
}
