// CLASSIFICATION: COMMUNITY
// Filename: ia32.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! 32-bit x86: cdecl entry, arguments on the stack.
//!
//! The entry function expects to be `call`ed, so the frame below the
//! stack top looks like:
//!
//! ```text
//! top - 12  ipc buffer address
//! top - 16  arg1
//! top - 20  arg0
//! top - 24  (return address slot)  <- esp
//! ```

use super::{EntryArgs, FaultLayout, RegisterFile};
use crate::error::KernelError;
use crate::sel4::AddressSpace;
use crate::types::Word;

const WORD: Word = 4;

/// Bytes between the stack top and the entry stack pointer.
pub const ENTRY_FRAME_BYTES: Word = 6 * WORD;

/// GDT selector through which the thread addresses its IPC buffer.
pub const IPCBUF_GDT_SELECTOR: Word = (6 << 3) | 3;

pub const FAULT_LAYOUT: FaultLayout = FaultLayout {
    unknown_syscall_ip: 7,
    unknown_syscall_number: 10,
    unknown_syscall_length: 11,
    user_exception_ip: 0,
    user_exception_number: 3,
    user_exception_length: 5,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub eip: Word,
    pub esp: Word,
    pub eflags: Word,
    pub eax: Word,
    pub ebx: Word,
    pub ecx: Word,
    pub edx: Word,
    pub esi: Word,
    pub edi: Word,
    pub ebp: Word,
    pub tls_base: Word,
    pub fs: Word,
    pub gs: Word,
}

impl RegisterFile for Context {
    fn initial(entry: Word, esp: Word, _args: &EntryArgs) -> Self {
        Context {
            eip: entry,
            esp,
            gs: IPCBUF_GDT_SELECTOR,
            ..Context::default()
        }
    }

    fn pc(&self) -> Word {
        self.eip
    }

    fn sp(&self) -> Word {
        self.esp
    }

    fn set_pc(&mut self, pc: Word) {
        self.eip = pc;
    }

    fn set_sp(&mut self, sp: Word) {
        self.esp = sp;
    }
}

/// Write the entry frame below `top` and return the entry stack pointer.
///
/// Arguments wider than 32 bits are rejected, as is a `top` too low to
/// hold the frame.
pub(super) fn push_entry_args(
    top: Word,
    args: &EntryArgs,
    stack: &dyn AddressSpace,
) -> Result<Word, KernelError> {
    let esp = top.checked_sub(ENTRY_FRAME_BYTES).ok_or(KernelError::Unmapped(top))?;
    let slots = [args.arg0, args.arg1, args.ipc_buffer];
    let mut frame = [0u8; 3 * WORD as usize];
    for (chunk, value) in frame.chunks_exact_mut(WORD as usize).zip(slots) {
        let narrow = u32::try_from(value).map_err(|_| KernelError::WordOverflow(value))?;
        chunk.copy_from_slice(&narrow.to_le_bytes());
    }
    stack.write(esp + WORD, &frame)?;
    Ok(esp)
}
