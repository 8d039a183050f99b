//! Panic handler

use core::fmt;
use core::panic::{Location, PanicInfo};

use crate::fatal::{ExceptionFrame, FatalPolicy, FatalReason, FatalReporter};
use crate::printk;

/// Print the panic details, then report a kernel panic
pub fn report_panic(
    reporter: &FatalReporter<'_, '_>,
    location: Option<&Location<'_>>,
    message: &dyn fmt::Display,
) {
    let pk = reporter.printk();
    pk.print_fmt(format_args!("\n!!! KERNEL PANIC !!!\n"));

    if let Some(location) = location {
        pk.print_fmt(format_args!("Location: {}:{}\n", location.file(), location.line()));
    }
    pk.print_fmt(format_args!("Message: {}\n", message));

    reporter.nano_fatal_error(FatalReason::KernelPanic as u32, &ExceptionFrame::default());
}

pub fn kernel_panic(info: &PanicInfo, policy: &dyn FatalPolicy) -> ! {
    let reporter = FatalReporter::new(printk::kernel(), policy);
    report_panic(&reporter, info.location(), &info.message());

    printk::printk("System halted.\n", &[]);

    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PointerWidth};
    use crate::fatal::tests::RecordingPolicy;
    use crate::printk::sink::tests::CaptureSink;
    use crate::printk::{Printk, Supervisor};

    #[test]
    fn test_panic_report() {
        let sink = CaptureSink::new();
        let cfg = Config::DEFAULT
            .with_pointer_width(PointerWidth::Bits32)
            .with_log_printk(false);
        let pk = Printk::new(&sink, &Supervisor, cfg);
        let policy = RecordingPolicy::new(0x10);
        let reporter = FatalReporter::new(&pk, &policy);

        report_panic(&reporter, None, &"out of frames");

        assert_eq!(
            sink.take(),
            "\n!!! KERNEL PANIC !!!\n\
             Message: out of frames\n\
             ***** Kernel Panic! *****\n\
             Current thread ID = 0x00000010, Faulting instruction address = 0x0\n"
        );
        assert_eq!(policy.calls.lock()[0].0, FatalReason::KernelPanic as u32);
    }

    #[test]
    fn test_panic_report_with_location() {
        let sink = CaptureSink::new();
        let pk = Printk::new(&sink, &Supervisor, Config::DEFAULT.with_log_printk(false));
        let policy = RecordingPolicy::new(0);
        let reporter = FatalReporter::new(&pk, &policy);

        report_panic(&reporter, Some(Location::caller()), &42);

        let out = sink.take();
        assert!(out.contains("Location: src/panic.rs:"));
        assert!(out.contains("Message: 42\n"));
    }
}
