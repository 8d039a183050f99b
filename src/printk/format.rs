//! printk format interpreter
//!
//! Directive grammar: `%[-][0][width][h|hh|l|ll|z][d|i|u|x|X|p|s|c|f|%]`.
//! There is no precision syntax. Anything the grammar does not accept is
//! echoed to the output as `%` plus the offending byte, and scanning
//! resumes in literal mode; formatting never fails.

use super::arg::Arg;
use super::num;
use super::out::CharOut;
use crate::config::{Config, Long, ULong};

/// How a directive pads to its minimum width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    #[default]
    None,
    /// `%05d`
    ZeroBefore,
    /// `%5d`
    SpaceBefore,
    /// `%-5d`
    SpaceAfter,
}

/// Length modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMod {
    #[default]
    None,
    /// `h`
    Half,
    /// `hh`
    HalfHalf,
    /// `l`
    Long,
    /// `ll`
    LongLong,
    /// `z`
    Size,
}

impl LengthMod {
    /// Extend the modifier run with `c`, or `None` if the combination is invalid
    fn push(self, c: u8) -> Option<Self> {
        match (self, c) {
            (LengthMod::Half, b'h') => Some(LengthMod::HalfHalf),
            (LengthMod::Long, b'l') => Some(LengthMod::LongLong),
            (LengthMod::None, b'h') => Some(LengthMod::Half),
            (LengthMod::None, b'l') => Some(LengthMod::Long),
            (LengthMod::None, b'z') => Some(LengthMod::Size),
            _ => None,
        }
    }
}

/// State accumulated between `%` and the conversion character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Directive {
    pub padding: Padding,
    pub width: Option<u32>,
    pub length: LengthMod,
}

impl Directive {
    fn push_digit(&mut self, digit: u8) {
        let d = (digit - b'0') as u32;
        self.width = Some(match self.width {
            None => d,
            Some(w) => w.saturating_mul(10).saturating_add(d),
        });
        if self.padding == Padding::None {
            self.padding = Padding::SpaceBefore;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    Directive(Directive),
}

/// Walks a template, pulling typed arguments as directives ask for them
pub struct Interpreter<'c, 'a, 'b> {
    config: &'c Config,
    args: core::slice::Iter<'b, Arg<'a>>,
}

impl<'c, 'a, 'b> Interpreter<'c, 'a, 'b> {
    pub fn new(config: &'c Config, args: &'b [Arg<'a>]) -> Self {
        Self {
            config,
            args: args.iter(),
        }
    }

    fn next_arg(&mut self) -> Arg<'a> {
        self.args.next().copied().unwrap_or(Arg::MISSING)
    }

    /// Format `fmt` into `out`
    ///
    /// The template ends at the end of the slice or at its first NUL byte.
    pub fn run<O: CharOut + ?Sized>(&mut self, out: &mut O, fmt: &[u8]) {
        let mut state = State::Literal;

        for &c in fmt.iter().take_while(|&&c| c != 0) {
            state = match state {
                State::Literal if c == b'%' => State::Directive(Directive::default()),
                State::Literal => {
                    out.out(c);
                    State::Literal
                }
                State::Directive(dir) => self.step(out, dir, c),
            };
        }
    }

    /// Consume one byte inside a directive
    fn step<O: CharOut + ?Sized>(&mut self, out: &mut O, mut dir: Directive, c: u8) -> State {
        match c {
            b'-' => {
                dir.padding = Padding::SpaceAfter;
                State::Directive(dir)
            }
            b'0' if dir.width.is_none() && dir.padding == Padding::None => {
                dir.padding = Padding::ZeroBefore;
                State::Directive(dir)
            }
            b'0'..=b'9' => {
                dir.push_digit(c);
                State::Directive(dir)
            }
            b'h' | b'l' | b'z' => match dir.length.push(c) {
                Some(length) => {
                    dir.length = length;
                    State::Directive(dir)
                }
                None => {
                    echo(out, c);
                    State::Literal
                }
            },
            _ => {
                self.convert(out, dir, c);
                State::Literal
            }
        }
    }

    fn convert<O: CharOut + ?Sized>(&mut self, out: &mut O, dir: Directive, conv: u8) {
        match conv {
            b'd' | b'i' => {
                let arg = self.next_arg();
                let value: Long = if dir.length == LengthMod::LongLong {
                    match Long::try_from(arg.bits() as i64) {
                        Ok(v) => v,
                        Err(_) => return num::err(out),
                    }
                } else {
                    arg.bits() as u32 as Long
                };
                signed_dec(out, value, dir);
            }
            b'u' => {
                let arg = self.next_arg();
                let value: ULong = if dir.length == LengthMod::LongLong {
                    match ULong::try_from(arg.bits()) {
                        Ok(v) => v,
                        Err(_) => return num::err(out),
                    }
                } else {
                    arg.bits() as ULong
                };
                num::dec(out, value, dir.padding, dir.width);
            }
            b'p' => {
                let arg = self.next_arg();
                let width = self.config.pointer_width;
                out.out_all(b"0x");
                num::hex(
                    out,
                    width.mask(arg.bits()),
                    Padding::ZeroBefore,
                    Some(width.hex_digits()),
                );
            }
            b'x' | b'X' => {
                let arg = self.next_arg();
                let value = if dir.length == LengthMod::LongLong {
                    arg.bits()
                } else {
                    arg.bits() as ULong as u64
                };
                num::hex(out, value, dir.padding, dir.width);
            }
            b's' => {
                let s = self.next_arg().bytes();
                out.out_all(s);
                if dir.padding == Padding::SpaceAfter {
                    let width = dir.width.unwrap_or(0) as usize;
                    for _ in s.len()..width {
                        out.out(b' ');
                    }
                }
            }
            b'c' => {
                let c = self.next_arg().bits() as u8;
                out.out(c);
            }
            b'f' => {
                let d = self.next_arg().double();
                fixed3(out, d, dir);
            }
            b'%' => out.out(b'%'),
            other => echo(out, other),
        }
    }
}

/// Echo an unsupported directive byte
fn echo<O: CharOut + ?Sized>(out: &mut O, c: u8) {
    out.out(b'%');
    out.out(c);
}

fn signed_dec<O: CharOut + ?Sized>(out: &mut O, value: Long, mut dir: Directive) {
    if value < 0 {
        out.out(b'-');
        dir.width = dir.width.map(|w| w.saturating_sub(1));
    }
    num::dec(out, value.unsigned_abs(), dir.padding, dir.width);
}

/// `%f`: integer part, '.', then three truncated fractional digits
fn fixed3<O: CharOut + ?Sized>(out: &mut O, d: f64, mut dir: Directive) {
    let magnitude = if d < 0.0 {
        out.out(b'-');
        dir.width = dir.width.map(|w| w.saturating_sub(1));
        -d
    } else {
        d
    };

    // Truncation toward zero; NaN reads as zero
    let int_part = magnitude as u64;
    let Ok(int_part) = ULong::try_from(int_part) else {
        return num::err(out);
    };
    num::dec(out, int_part, dir.padding, dir.width);
    out.out(b'.');

    let frac = ((magnitude - int_part as f64) * 1000.0) as u32;
    num::dec(out, frac.min(999), Padding::ZeroBefore, Some(3));
}

/// Format `fmt` with `args` into `out`
pub fn format<O: CharOut + ?Sized>(out: &mut O, fmt: &[u8], args: &[Arg<'_>], config: &Config) {
    Interpreter::new(config, args).run(out, fmt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointerWidth;

    struct Buf(Vec<u8>);

    impl CharOut for Buf {
        fn out(&mut self, c: u8) {
            self.0.push(c);
        }
    }

    fn fmt_with(config: &Config, template: &str, args: &[Arg<'_>]) -> String {
        let mut b = Buf(Vec::new());
        format(&mut b, template.as_bytes(), args, config);
        String::from_utf8(b.0).unwrap()
    }

    fn f(template: &str, args: &[Arg<'_>]) -> String {
        fmt_with(&Config::DEFAULT, template, args)
    }

    #[test]
    fn test_literals_pass_through() {
        assert_eq!(f("plain text\n", &[]), "plain text\n");
        assert_eq!(f("", &[]), "");
        assert_eq!(f("stop\0here", &[]), "stop");
    }

    #[test]
    fn test_signed_decimal() {
        assert_eq!(f("%d", &[Arg::Int(42)]), "42");
        assert_eq!(f("%i", &[Arg::Int(-42)]), "-42");
        assert_eq!(f("%d", &[Arg::Int(0)]), "0");
        assert_eq!(f("%d", &[Arg::Int(i32::MIN)]), "-2147483648");
        assert_eq!(f("%ld", &[Arg::Int(i32::MAX)]), "2147483647");
        assert_eq!(f("%hd %hhd %zd", &[Arg::Int(1), Arg::Int(2), Arg::Int(3)]), "1 2 3");
    }

    #[test]
    fn test_width_and_padding() {
        assert_eq!(f("%5d", &[Arg::Int(42)]), "   42");
        assert_eq!(f("%-5d|", &[Arg::Int(42)]), "42   |");
        assert_eq!(f("%05d", &[Arg::Int(42)]), "00042");
        assert_eq!(f("%05d", &[Arg::Int(-42)]), "-0042");
        assert_eq!(f("%5d", &[Arg::Int(-42)]), "-  42");
        assert_eq!(f("%-5d|", &[Arg::Int(-42)]), "-42  |");
        assert_eq!(f("%12d", &[Arg::Int(7)]), "         7");
    }

    #[test]
    fn test_long_long_range() {
        assert_eq!(f("%lld", &[Arg::LongLong(-5)]), "-5");
        assert_eq!(f("%lld", &[Arg::LongLong(i64::from(i32::MAX) + 1)]), "ERR");
        assert_eq!(f("%lld", &[Arg::LongLong(i64::from(i32::MIN) - 1)]), "ERR");
        assert_eq!(f("%llu", &[Arg::ULongLong(u64::from(u32::MAX))]), "4294967295");
        assert_eq!(f("%llu", &[Arg::ULongLong(1 << 32)]), "ERR");
        assert_eq!(f("[%lld]", &[Arg::LongLong(1 << 40)]), "[ERR]");
    }

    #[test]
    fn test_unsigned_reads_32_bits() {
        assert_eq!(f("%u", &[Arg::Uint(u32::MAX)]), "4294967295");
        assert_eq!(f("%u", &[Arg::Int(-1)]), "4294967295");
        assert_eq!(f("%lu", &[Arg::ULongLong(0x1_0000_0005)]), "5");
    }

    #[test]
    fn test_hex() {
        assert_eq!(f("%x", &[Arg::Uint(0xbeef)]), "beef");
        assert_eq!(f("%X", &[Arg::Uint(0xBEEF)]), "beef");
        assert_eq!(f("%08x", &[Arg::Uint(0xab)]), "000000ab");
        assert_eq!(f("%llx", &[Arg::ULongLong(0x1234_5678_9abc_def0)]), "123456789abcdef0");
        assert_eq!(f("%x", &[Arg::ULongLong(0x1234_5678_9abc_def0)]), "9abcdef0");
    }

    #[test]
    fn test_pointer_ignores_width() {
        let cfg32 = Config::DEFAULT.with_pointer_width(PointerWidth::Bits32);
        let cfg64 = Config::DEFAULT.with_pointer_width(PointerWidth::Bits64);
        assert_eq!(fmt_with(&cfg32, "%p", &[Arg::Ptr(0x2000_1f00)]), "0x20001f00");
        assert_eq!(fmt_with(&cfg32, "%20p", &[Arg::Ptr(0xab)]), "0x000000ab");
        assert_eq!(fmt_with(&cfg32, "%-3p", &[Arg::Ptr(0xAB)]), "0x000000ab");
        assert_eq!(fmt_with(&cfg64, "%p", &[Arg::Ptr(0xab)]), "0x00000000000000ab");
    }

    #[test]
    fn test_strings() {
        assert_eq!(f("%s!", &[Arg::from("hi")]), "hi!");
        assert_eq!(f("[%-6s]", &[Arg::from("hi")]), "[hi    ]");
        assert_eq!(f("[%6s]", &[Arg::from("hi")]), "[hi]");
        assert_eq!(f("[%-2s]", &[Arg::from("long")]), "[long]");
        assert_eq!(f("[%s]", &[Arg::Int(5)]), "[]");
    }

    #[test]
    fn test_chars_ignore_padding() {
        assert_eq!(f("%c%c", &[Arg::Char(b'o'), Arg::Int(b'k' as i32)]), "ok");
        assert_eq!(f("[%5c]", &[Arg::Char(b'x')]), "[x]");
    }

    #[test]
    fn test_fixed_point() {
        assert_eq!(f("%f", &[Arg::Double(3.25)]), "3.250");
        assert_eq!(f("%f", &[Arg::Double(1.5)]), "1.500");
        assert_eq!(f("%f", &[Arg::Double(0.0)]), "0.000");
        assert_eq!(f("%f", &[Arg::Double(2.0625)]), "2.062");
        assert_eq!(f("%f", &[Arg::Double(-1.5)]), "-1.500");
        assert_eq!(f("%5f", &[Arg::Double(1.5)]), "    1.500");
        assert_eq!(f("%f", &[Arg::Double(1e12)]), "ERR");
    }

    #[test]
    fn test_percent_and_unknown() {
        assert_eq!(f("100%%", &[]), "100%");
        assert_eq!(f("%q", &[]), "%q");
        assert_eq!(f("%5q", &[]), "%q");
        assert_eq!(f("a%", &[]), "a");
    }

    #[test]
    fn test_length_modifier_conflicts() {
        assert_eq!(f("%lhd", &[Arg::Int(1)]), "%hd");
        assert_eq!(f("%llld", &[Arg::Int(1)]), "%ld");
        assert_eq!(f("%zz", &[]), "%z");
        assert_eq!(f("%hhhd", &[]), "%hd");
    }

    #[test]
    fn test_missing_arguments_read_zero() {
        assert_eq!(f("%d %s|%x", &[]), "0 |0");
    }

    #[test]
    fn test_mixed_template() {
        let out = f(
            "thread %s: %d items at 0x%08x (%c)",
            &[Arg::from("idle"), Arg::Int(3), Arg::Uint(0x2000), Arg::Char(b'y')],
        );
        assert_eq!(out, "thread idle: 3 items at 0x00002000 (y)");
    }
}
