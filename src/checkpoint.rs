// CLASSIFICATION: COMMUNITY
// Filename: checkpoint.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Snapshot and replay of a thread's execution state.
//!
//! A [`Checkpoint`] holds the full register file and every live stack byte
//! between the saved stack pointer and the stack top. It can only be
//! restored onto the [`Thread`] it was captured from.

use log::{debug, error};

use crate::arch::UserContext;
use crate::error::{ThreadError, ThreadResult};
use crate::sel4::ThreadEnv;
use crate::thread::{Thread, ThreadId};
use crate::types::Word;

/// Detached copy of one thread's registers and live stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    thread: ThreadId,
    registers: UserContext,
    stack: Option<Box<[u8]>>,
}

impl Checkpoint {
    /// Snapshot `thread`. The thread should be stopped by the caller;
    /// otherwise registers and stack may be observed at different times.
    pub fn capture(env: &ThreadEnv<'_>, thread: &Thread) -> ThreadResult<Checkpoint> {
        let tcb = thread.require_tcb("checkpoint")?;
        let stack = thread.stack().ok_or(ThreadError::InvalidState {
            operation: "checkpoint",
            state: thread.state(),
        })?;

        let registers = env
            .kernel
            .read_registers(tcb.cptr, thread.arch())
            .map_err(ThreadError::RegisterIoFailed)?;
        let span = live_span(registers.sp(), stack.top)?;
        if span > stack.size {
            error!(
                target: "cohesix_thread::checkpoint",
                "[checkpoint] thread {} live stack {span:#x} bytes exceeds capacity {:#x}",
                thread.id().get(),
                stack.size,
            );
            return Err(ThreadError::CheckpointOversized {
                span,
                capacity: stack.size,
            });
        }

        let mut bytes = vec![0u8; span].into_boxed_slice();
        env.vspace
            .read(registers.sp(), &mut bytes)
            .map_err(ThreadError::StackAccessFailed)?;

        debug!(
            target: "cohesix_thread::checkpoint",
            "[checkpoint] captured thread {} pc=0x{:x} sp=0x{:x} stack={span}",
            thread.id().get(),
            registers.pc(),
            registers.sp(),
        );
        Ok(Checkpoint {
            thread: thread.id(),
            registers,
            stack: Some(bytes),
        })
    }

    /// Write the saved stack back, then the saved registers, and resume the
    /// thread, which is left [`crate::ThreadState::Started`]. With
    /// `free_on_success` the saved stack is dropped once the registers are
    /// written. On any failure the checkpoint and the thread state stay as
    /// they were.
    pub fn restore(
        &mut self,
        env: &ThreadEnv<'_>,
        thread: &mut Thread,
        free_on_success: bool,
    ) -> ThreadResult<()> {
        if thread.id() != self.thread {
            error!(
                target: "cohesix_thread::checkpoint",
                "[checkpoint] captured from thread {} but restored onto {}",
                self.thread.get(),
                thread.id().get(),
            );
            return Err(ThreadError::CheckpointMismatch);
        }
        let bytes = self.stack.as_deref().ok_or(ThreadError::CheckpointReleased)?;
        let tcb = thread.require_tcb("restore")?;
        let stack_top = thread.stack_top().ok_or(ThreadError::InvalidState {
            operation: "restore",
            state: thread.state(),
        })?;
        let span = live_span(self.registers.sp(), stack_top)?;
        if span != bytes.len() {
            return Err(ThreadError::CheckpointMismatch);
        }

        env.vspace
            .write(self.registers.sp(), bytes)
            .map_err(ThreadError::StackAccessFailed)?;
        env.kernel
            .write_registers(tcb.cptr, true, &self.registers)
            .map_err(ThreadError::RegisterIoFailed)?;
        thread.mark_restored();

        if free_on_success {
            self.stack = None;
        }
        debug!(
            target: "cohesix_thread::checkpoint",
            "[checkpoint] restored thread {} pc=0x{:x}",
            self.thread.get(),
            self.registers.pc(),
        );
        Ok(())
    }

    /// Drop the saved stack bytes. The checkpoint can no longer be restored.
    pub fn release(&mut self) {
        self.stack = None;
    }

    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    pub fn registers(&self) -> &UserContext {
        &self.registers
    }

    /// Saved stack bytes, lowest address first.
    pub fn stack_bytes(&self) -> Option<&[u8]> {
        self.stack.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.stack.is_none()
    }
}

fn live_span(sp: Word, stack_top: Word) -> ThreadResult<usize> {
    stack_top
        .checked_sub(sp)
        .map(|span| span as usize)
        .ok_or(ThreadError::StackPointerOutOfRange { sp, stack_top })
}
