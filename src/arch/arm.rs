// CLASSIFICATION: COMMUNITY
// Filename: arm.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! 32-bit ARM: AAPCS entry, arguments in r0 / r1 / r2.

use bitflags::bitflags;

use super::{EntryArgs, FaultLayout, RegisterFile};
use crate::types::Word;

pub const FAULT_LAYOUT: FaultLayout = FaultLayout {
    unknown_syscall_ip: 8,
    unknown_syscall_number: 12,
    unknown_syscall_length: 13,
    user_exception_ip: 0,
    user_exception_number: 3,
    user_exception_length: 5,
};

bitflags! {
    /// Data fault status register bits the fault reporter cares about.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FaultStatus: Word {
        /// Set when the abort was caused by a write.
        const WNR = 1 << 11;
        const EXTERNAL = 1 << 12;
    }
}

pub(super) fn is_read_fault(fsr: Word) -> bool {
    !FaultStatus::from_bits_truncate(fsr).contains(FaultStatus::WNR)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub pc: Word,
    pub sp: Word,
    pub cpsr: Word,
    /// r0 through r12.
    pub r: [Word; 13],
    pub lr: Word,
    pub tpidrurw: Word,
}

impl RegisterFile for Context {
    fn initial(entry: Word, sp: Word, args: &EntryArgs) -> Self {
        let mut context = Context {
            pc: entry,
            sp,
            ..Context::default()
        };
        context.r[0] = args.arg0;
        context.r[1] = args.arg1;
        context.r[2] = args.ipc_buffer;
        context
    }

    fn pc(&self) -> Word {
        self.pc
    }

    fn sp(&self) -> Word {
        self.sp
    }

    fn set_pc(&mut self, pc: Word) {
        self.pc = pc;
    }

    fn set_sp(&mut self, sp: Word) {
        self.sp = sp;
    }
}
