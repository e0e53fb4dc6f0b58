// CLASSIFICATION: COMMUNITY
// Filename: x86_64.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! x86-64: System V entry, arguments in rdi / rsi / rdx.

use bitflags::bitflags;

use super::{EntryArgs, FaultLayout, RegisterFile};
use crate::types::Word;

pub use super::ia32::IPCBUF_GDT_SELECTOR;

pub const FAULT_LAYOUT: FaultLayout = FaultLayout {
    unknown_syscall_ip: 15,
    unknown_syscall_number: 18,
    unknown_syscall_length: 19,
    user_exception_ip: 0,
    user_exception_number: 3,
    user_exception_length: 5,
};

bitflags! {
    /// Page-fault error code pushed by the CPU, shared by ia32 and x86-64.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PageFaultCode: Word {
        const PRESENT = 1 << 0;
        const WRITE = 1 << 1;
        const USER = 1 << 2;
        const RESERVED = 1 << 3;
        const INSTRUCTION = 1 << 4;
    }
}

pub(super) fn is_read_fault(fsr: Word) -> bool {
    !PageFaultCode::from_bits_truncate(fsr).contains(PageFaultCode::WRITE)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub rip: Word,
    pub rsp: Word,
    pub rflags: Word,
    pub rax: Word,
    pub rbx: Word,
    pub rcx: Word,
    pub rdx: Word,
    pub rsi: Word,
    pub rdi: Word,
    pub rbp: Word,
    pub r8: Word,
    pub r9: Word,
    pub r10: Word,
    pub r11: Word,
    pub r12: Word,
    pub r13: Word,
    pub r14: Word,
    pub r15: Word,
    pub fs_base: Word,
    pub gs: Word,
}

impl RegisterFile for Context {
    fn initial(entry: Word, sp: Word, args: &EntryArgs) -> Self {
        Context {
            rip: entry,
            rsp: sp,
            rdi: args.arg0,
            rsi: args.arg1,
            rdx: args.ipc_buffer,
            gs: IPCBUF_GDT_SELECTOR,
            ..Context::default()
        }
    }

    fn pc(&self) -> Word {
        self.rip
    }

    fn sp(&self) -> Word {
        self.rsp
    }

    fn set_pc(&mut self, pc: Word) {
        self.rip = pc;
    }

    fn set_sp(&mut self, sp: Word) {
        self.rsp = sp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_bit_marks_write_faults() {
        assert!(is_read_fault(PageFaultCode::PRESENT.bits()));
        assert!(!is_read_fault((PageFaultCode::WRITE | PageFaultCode::USER).bits()));
    }
}
