//! Fatal error reporting
//!
//! When the kernel detects a fatal condition it reports it here. The
//! dispatcher only reports: it prints a banner for the fault family, the
//! faulting thread and instruction address, then hands the original reason
//! and frame to the platform's [`FatalPolicy`]. The policy alone decides
//! whether the current thread is aborted (and control comes back) or the
//! whole system stops.
//!
//! Reason codes follow the Cortex-M fault families:
//! - 0: generic hardware exception
//! - 2..=6: software-detected conditions (stack check, allocation, oops, panic)
//! - 10..=15: MPU (MemManage) faults
//! - 20..=25: bus faults
//! - 30..=37: usage faults
//! - 40: secure fault

use crate::printk::{self, Arg, Printk};

// ============================================================================
// Fault reasons
// ============================================================================

/// Why the fatal error handler was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FatalReason {
    /// MPU/Bus/Usage fault not further classified
    HwException = 0,
    /// Stack corruption detected
    StackChkFail = 2,
    /// Kernel allocation failure
    AllocationFail = 3,
    /// Kernel oops (fatal to thread)
    KernelOops = 4,
    /// Kernel panic (fatal to system)
    KernelPanic = 5,
    /// Recoverable error
    Recoverable = 6,

    /// MPU fault
    MpuFault = 10,
    /// MemManage fault on stacking for exception entry
    MpuStackingErr = 11,
    /// MemManage fault on unstacking for a return from exception
    MpuUnstackingErr = 12,
    /// Data access violation
    MpuDataAccessViol = 13,
    /// Instruction access violation
    MpuInstrAccessViol = 14,
    /// Floating-point lazy state preservation error
    MpuLazyStateErr = 15,

    /// Bus fault
    BusFault = 20,
    /// BusFault on stacking for exception entry
    BusStackingErr = 21,
    /// BusFault on unstacking for a return from exception
    BusUnstackingErr = 22,
    /// Precise data bus error
    BusPreciseErr = 23,
    /// Instruction bus error
    BusInstrErr = 24,
    /// Floating-point lazy state preservation error
    BusLazyStateErr = 25,

    /// Usage fault
    UsageFault = 30,
    /// Divide by zero
    UsageDivByZero = 31,
    /// Unaligned access
    UsageUnaligned = 32,
    /// Stack overflow
    UsageStackOverflow = 33,
    /// No coprocessor
    UsageNoCoprocessor = 34,
    /// Invalid PC load
    UsageInvalidPc = 35,
    /// Invalid state
    UsageInvalidState = 36,
    /// Undefined instruction
    UsageUndefInstr = 37,

    /// Secure fault
    SecureFault = 40,
}

impl FatalReason {
    pub fn from_u32(val: u32) -> Option<Self> {
        use FatalReason::*;
        Some(match val {
            0 => HwException,
            2 => StackChkFail,
            3 => AllocationFail,
            4 => KernelOops,
            5 => KernelPanic,
            6 => Recoverable,
            10 => MpuFault,
            11 => MpuStackingErr,
            12 => MpuUnstackingErr,
            13 => MpuDataAccessViol,
            14 => MpuInstrAccessViol,
            15 => MpuLazyStateErr,
            20 => BusFault,
            21 => BusStackingErr,
            22 => BusUnstackingErr,
            23 => BusPreciseErr,
            24 => BusInstrErr,
            25 => BusLazyStateErr,
            30 => UsageFault,
            31 => UsageDivByZero,
            32 => UsageUnaligned,
            33 => UsageStackOverflow,
            34 => UsageNoCoprocessor,
            35 => UsageInvalidPc,
            36 => UsageInvalidState,
            37 => UsageUndefInstr,
            40 => SecureFault,
            _ => return None,
        })
    }

    /// Get reason name for debugging
    pub fn name(&self) -> &'static str {
        use FatalReason::*;
        match self {
            HwException => "hw_exception",
            StackChkFail => "stack_chk_fail",
            AllocationFail => "allocation_fail",
            KernelOops => "kernel_oops",
            KernelPanic => "kernel_panic",
            Recoverable => "recoverable",
            MpuFault => "mpu_fault",
            MpuStackingErr => "mpu_mstkerr",
            MpuUnstackingErr => "mpu_munstkerr",
            MpuDataAccessViol => "mpu_daccviol",
            MpuInstrAccessViol => "mpu_iaccviol",
            MpuLazyStateErr => "mpu_mlsperr",
            BusFault => "bus_fault",
            BusStackingErr => "bus_stkerr",
            BusUnstackingErr => "bus_unstkerr",
            BusPreciseErr => "bus_preciserr",
            BusInstrErr => "bus_ibuserr",
            BusLazyStateErr => "bus_lsperr",
            UsageFault => "usage_fault",
            UsageDivByZero => "usage_divbyzero",
            UsageUnaligned => "usage_unaligned",
            UsageStackOverflow => "usage_stkof",
            UsageNoCoprocessor => "usage_nocp",
            UsageInvalidPc => "usage_invpc",
            UsageInvalidState => "usage_invstate",
            UsageUndefInstr => "usage_undefinstr",
            SecureFault => "secure_fault",
        }
    }

    /// Banner printed for this reason
    pub fn banner(&self) -> Banner {
        use FatalReason::*;
        match self {
            HwException => Banner::HwException,
            MpuFault | MpuStackingErr | MpuUnstackingErr | MpuDataAccessViol
            | MpuInstrAccessViol | MpuLazyStateErr => Banner::MpuFault,
            BusFault | BusStackingErr | BusUnstackingErr | BusPreciseErr | BusInstrErr
            | BusLazyStateErr => Banner::BusFault,
            UsageFault | UsageDivByZero | UsageUnaligned | UsageStackOverflow
            | UsageNoCoprocessor | UsageInvalidPc | UsageInvalidState | UsageUndefInstr => {
                Banner::UsageFault
            }
            SecureFault => Banner::SecureFault,
            StackChkFail => Banner::StackCheckFail,
            AllocationFail => Banner::AllocationFailure,
            KernelOops => Banner::KernelOops,
            KernelPanic => Banner::KernelPanic,
            Recoverable => Banner::Unknown,
        }
    }
}

// ============================================================================
// Banners
// ============================================================================

/// Headline printed before the fault details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    HwException,
    MpuFault,
    BusFault,
    UsageFault,
    SecureFault,
    StackCheckFail,
    AllocationFailure,
    KernelOops,
    KernelPanic,
    /// Carries the raw reason code through `%d`
    Unknown,
}

impl Banner {
    /// Banner for a raw reason code
    pub fn for_code(code: u32) -> Self {
        FatalReason::from_u32(code).map_or(Banner::Unknown, |r| r.banner())
    }

    /// printk template of the banner line
    pub fn template(&self) -> &'static str {
        match self {
            Banner::HwException => "***** Hardware exception *****\n",
            Banner::MpuFault => "***** Hardware exception MPU Fault *****\n",
            Banner::BusFault => "***** Hardware exception BUS Fault *****\n",
            Banner::UsageFault => "***** Hardware exception USAGE Fault *****\n",
            Banner::SecureFault => "***** Hardware exception SECURE Fault *****\n",
            Banner::StackCheckFail => "***** Stack Check Fail! *****\n",
            Banner::AllocationFailure => "**** Kernel Allocation Failure! ****\n",
            Banner::KernelOops => "***** Kernel OOPS! *****\n",
            Banner::KernelPanic => "***** Kernel Panic! *****\n",
            Banner::Unknown => "**** Unknown Fatal Error %d! ****\n",
        }
    }
}

// ============================================================================
// Exception frame and policy
// ============================================================================

/// Registers stacked by the hardware on exception entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ExceptionFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

/// Index of the stacked return address in a syscall stack frame
const SSF_PC: usize = 3;

/// Platform error-handling policy
pub trait FatalPolicy: Sync {
    /// Identity of the thread that was running when the fault hit
    fn current_thread(&self) -> usize;

    /// Respond to a reported fatal error
    ///
    /// Returning means only the faulting context was dealt with and
    /// execution may continue; a system-fatal policy does not return.
    fn sys_fatal_error(&self, reason: u32, esf: &ExceptionFrame);
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Reports fatal errors through a printk instance
pub struct FatalReporter<'r, 'p> {
    printk: &'r Printk<'p>,
    policy: &'r dyn FatalPolicy,
}

impl<'r, 'p> FatalReporter<'r, 'p> {
    pub fn new(printk: &'r Printk<'p>, policy: &'r dyn FatalPolicy) -> Self {
        Self { printk, policy }
    }

    /// printk instance the reports go to
    pub fn printk(&self) -> &'r Printk<'p> {
        self.printk
    }

    /// Report a fatal error and invoke the policy
    pub fn nano_fatal_error(&self, reason: u32, esf: &ExceptionFrame) {
        // Panic mode: get buffered log records out before anything else
        log::logger().flush();

        let banner = Banner::for_code(reason);
        self.printk.printk(banner.template(), &[Arg::Uint(reason)]);
        self.printk.printk(
            "Current thread ID = %p, Faulting instruction address = 0x%x\n",
            &[Arg::Ptr(self.policy.current_thread()), Arg::Uint(esf.pc)],
        );

        self.policy.sys_fatal_error(reason, esf);
    }

    /// Oops raised by software: the reason travels in r0
    pub fn do_kernel_oops(&self, esf: &ExceptionFrame) {
        self.nano_fatal_error(esf.r0, esf);
    }

    /// Oops raised while servicing a system call
    ///
    /// `ssf` is the caller's syscall stack frame; its fourth word holds the
    /// return address, reported as the faulting instruction.
    pub fn syscall_oops(&self, ssf: &[u32]) {
        let esf = ExceptionFrame {
            r0: FatalReason::KernelOops as u32,
            pc: ssf.get(SSF_PC).copied().unwrap_or(0),
            ..ExceptionFrame::default()
        };
        self.do_kernel_oops(&esf);
    }
}

/// Report a fatal error through the kernel's printk instance
pub fn nano_fatal_error(policy: &dyn FatalPolicy, reason: u32, esf: &ExceptionFrame) {
    FatalReporter::new(printk::kernel(), policy).nano_fatal_error(reason, esf);
}
