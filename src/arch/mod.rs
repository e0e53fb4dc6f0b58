// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · arch facade v0.3
// Date Modified: 2026-10-17
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// Cohesix thread helpers · initial register encoding
//
// Every supported calling convention is one variant of [`Arch`]:
//
//   • `Ia32`    – arguments pushed below the stack pointer
//   • `X86_64`  – rdi / rsi / rdx
//   • `Arm`     – r0 / r1 / r2
//   • `Aarch64` – x0 / x1 / x2
//
// In every case the entry function observes `(arg0, arg1)` and can
// find its IPC buffer address as a third argument. Call sites never
// branch on the architecture; they hand an [`Arch`] to
// [`Arch::init_context`] and get back a [`UserContext`].
// ─────────────────────────────────────────────────────────────

pub mod aarch64;
pub mod arm;
pub mod ia32;
pub mod x86_64;

use core::fmt;
use core::str::FromStr;

use crate::error::KernelError;
use crate::sel4::AddressSpace;
use crate::types::Word;

/// Register-encoding variant selected when a thread is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arch {
    Ia32,
    X86_64,
    Arm,
    Aarch64,
}

impl Arch {
    /// The variant matching the architecture this crate was built for.
    pub const fn host() -> Arch {
        if cfg!(target_arch = "x86") {
            Arch::Ia32
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else {
            Arch::X86_64
        }
    }

    /// Size of a machine word in bytes.
    pub const fn word_size(self) -> usize {
        match self {
            Arch::Ia32 | Arch::Arm => 4,
            Arch::X86_64 | Arch::Aarch64 => 8,
        }
    }

    /// Required stack pointer alignment at thread entry.
    pub const fn stack_alignment(self) -> Word {
        2 * self.word_size() as Word
    }

    /// Whether entry arguments travel on the stack rather than in registers.
    pub const fn passes_args_on_stack(self) -> bool {
        matches!(self, Arch::Ia32)
    }

    /// Message register layout of fault IPCs on this architecture.
    pub const fn fault_layout(self) -> FaultLayout {
        match self {
            Arch::Ia32 => ia32::FAULT_LAYOUT,
            Arch::X86_64 => x86_64::FAULT_LAYOUT,
            Arch::Arm => arm::FAULT_LAYOUT,
            Arch::Aarch64 => aarch64::FAULT_LAYOUT,
        }
    }

    /// Decode the fault status word of a VM fault.
    pub fn is_read_fault(self, fsr: Word) -> bool {
        match self {
            Arch::Ia32 | Arch::X86_64 => x86_64::is_read_fault(fsr),
            Arch::Arm => arm::is_read_fault(fsr),
            Arch::Aarch64 => aarch64::is_read_fault(fsr),
        }
    }

    /// Build the register file a thread needs to start at `entry` as if
    /// called with `(args.arg0, args.arg1)`.
    ///
    /// `stack` is the address space `sp` is expressed in. It is only
    /// written on architectures that pass arguments on the stack, and on
    /// ia32 every argument must fit in 32 bits.
    ///
    /// # Panics
    /// If the stack pointer is not aligned to [`Arch::stack_alignment`].
    pub fn init_context(
        self,
        entry: Word,
        sp: StackPointer,
        args: EntryArgs,
        stack: &dyn AddressSpace,
    ) -> Result<UserContext, KernelError> {
        let top = sp.addr();
        assert!(
            top % self.stack_alignment() == 0,
            "{} stack pointer 0x{top:x} is not {}-byte aligned",
            sp.kind(),
            self.stack_alignment(),
        );

        let context = match self {
            Arch::Ia32 => {
                let esp = ia32::push_entry_args(top, &args, stack)?;
                UserContext::Ia32(ia32::Context::initial(entry, esp, &args))
            }
            Arch::X86_64 => UserContext::X86_64(x86_64::Context::initial(entry, top, &args)),
            Arch::Arm => UserContext::Arm(arm::Context::initial(entry, top, &args)),
            Arch::Aarch64 => UserContext::Aarch64(aarch64::Context::initial(entry, top, &args)),
        };
        log::trace!(
            target: "cohesix_thread::arch",
            "[arch] {} context entry=0x{entry:x} sp=0x{:x} arg0=0x{:x} arg1=0x{:x} ipc=0x{:x}",
            self,
            context.sp(),
            args.arg0,
            args.arg1,
            args.ipc_buffer,
        );
        Ok(context)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arch::Ia32 => "ia32",
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
        })
    }
}

/// Returned when parsing an unknown architecture name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownArch(pub String);

impl FromStr for Arch {
    type Err = UnknownArch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ia32" | "x86" | "i386" => Ok(Arch::Ia32),
            "x86_64" | "x86-64" | "amd64" => Ok(Arch::X86_64),
            "arm" | "aarch32" | "arm32" => Ok(Arch::Arm),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            other => Err(UnknownArch(other.to_string())),
        }
    }
}

/// Stack pointer handed to [`Arch::init_context`]. Exactly one view is
/// supplied per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPointer {
    /// Address in the configuring caller's own address space.
    Local(Word),
    /// Address as seen by the thread being started.
    Destination(Word),
}

impl StackPointer {
    pub const fn addr(self) -> Word {
        match self {
            StackPointer::Local(addr) | StackPointer::Destination(addr) => addr,
        }
    }

    const fn kind(self) -> &'static str {
        match self {
            StackPointer::Local(_) => "local",
            StackPointer::Destination(_) => "destination",
        }
    }
}

/// The three values an entry function receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryArgs {
    pub arg0: Word,
    pub arg1: Word,
    pub ipc_buffer: Word,
}

/// Message register indices of the architecture-specific fault IPCs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultLayout {
    pub unknown_syscall_ip: usize,
    pub unknown_syscall_number: usize,
    pub unknown_syscall_length: usize,
    pub user_exception_ip: usize,
    pub user_exception_number: usize,
    pub user_exception_length: usize,
}

/// Per-architecture register file.
trait RegisterFile: Copy + Default {
    fn initial(entry: Word, sp: Word, args: &EntryArgs) -> Self;
    fn pc(&self) -> Word;
    fn sp(&self) -> Word;
    fn set_pc(&mut self, pc: Word);
    fn set_sp(&mut self, sp: Word);
}

/// A complete register file for one of the supported architectures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserContext {
    Ia32(ia32::Context),
    X86_64(x86_64::Context),
    Arm(arm::Context),
    Aarch64(aarch64::Context),
}

macro_rules! dispatch {
    ($ctx:expr, $regs:ident => $body:expr) => {
        match $ctx {
            UserContext::Ia32($regs) => $body,
            UserContext::X86_64($regs) => $body,
            UserContext::Arm($regs) => $body,
            UserContext::Aarch64($regs) => $body,
        }
    };
}

impl UserContext {
    /// An all-zero register file.
    pub fn zeroed(arch: Arch) -> Self {
        match arch {
            Arch::Ia32 => UserContext::Ia32(Default::default()),
            Arch::X86_64 => UserContext::X86_64(Default::default()),
            Arch::Arm => UserContext::Arm(Default::default()),
            Arch::Aarch64 => UserContext::Aarch64(Default::default()),
        }
    }

    pub fn arch(&self) -> Arch {
        match self {
            UserContext::Ia32(_) => Arch::Ia32,
            UserContext::X86_64(_) => Arch::X86_64,
            UserContext::Arm(_) => Arch::Arm,
            UserContext::Aarch64(_) => Arch::Aarch64,
        }
    }

    pub fn pc(&self) -> Word {
        dispatch!(self, regs => regs.pc())
    }

    pub fn sp(&self) -> Word {
        dispatch!(self, regs => regs.sp())
    }

    pub fn set_pc(&mut self, pc: Word) {
        dispatch!(self, regs => regs.set_pc(pc))
    }

    pub fn set_sp(&mut self, sp: Word) {
        dispatch!(self, regs => regs.set_sp(sp))
    }
}
