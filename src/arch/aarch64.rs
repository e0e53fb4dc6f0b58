// CLASSIFICATION: COMMUNITY
// Filename: aarch64.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! AArch64: arguments in x0 / x1 / x2.

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
    /// Data-abort ISS bits of ESR_EL1.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DataAbortIss: Word {
        /// Write not Read.
        const WNR = 1 << 6;
        const CACHE_MAINTENANCE = 1 << 8;
    }
}

pub(super) fn is_read_fault(esr: Word) -> bool {
    !DataAbortIss::from_bits_truncate(esr).contains(DataAbortIss::WNR)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub pc: Word,
    pub sp: Word,
    pub spsr: Word,
    /// x0 through x30.
    pub x: [Word; 31],
    pub tpidr_el0: Word,
}

impl RegisterFile for Context {
    fn initial(entry: Word, sp: Word, args: &EntryArgs) -> Self {
        let mut context = Context {
            pc: entry,
            sp,
            ..Context::default()
        };
        context.x[0] = args.arg0;
        context.x[1] = args.arg1;
        context.x[2] = args.ipc_buffer;
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
