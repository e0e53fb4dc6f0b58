// CLASSIFICATION: COMMUNITY
// Filename: lifecycle.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

use core::mem;

use log::{debug, error};

use super::{SchedContextSlot, Stack, Thread, ThreadState};
use crate::arch::{EntryArgs, StackPointer};
use crate::error::{ThreadError, ThreadResult};
use crate::sel4::ThreadEnv;
use crate::types::{KernelObject, Word};

impl Thread {
    /// Write an initial register file that enters `entry(arg0, arg1)` on
    /// the thread's own stack, and make it runnable when `resume` is set.
    ///
    /// The IPC buffer address is passed as a third argument. On failure
    /// the thread keeps its previous state.
    pub fn start(
        &mut self,
        env: &ThreadEnv<'_>,
        entry: Word,
        arg0: Word,
        arg1: Word,
        resume: bool,
    ) -> ThreadResult<()> {
        let (tcb, stack, ipc_buffer) = self.started_resources("start")?;
        let args = EntryArgs {
            arg0,
            arg1,
            ipc_buffer,
        };
        let context = self
            .arch
            .init_context(entry, StackPointer::Destination(stack.top), args, env.vspace)
            .map_err(ThreadError::StackAccessFailed)?;

        env.kernel
            .write_registers(tcb.cptr, resume, &context)
            .map_err(|err| {
                error!(
                    target: "cohesix_thread::thread",
                    "[thread] write_registers failed id={} tcb=0x{:x}: {err}",
                    self.id.get(),
                    tcb.cptr,
                );
                ThreadError::RegisterIoFailed(err)
            })?;

        self.state = ThreadState::Started;
        debug!(
            target: "cohesix_thread::thread",
            "[thread] started id={} entry=0x{entry:x} sp=0x{:x} resume={resume}",
            self.id.get(),
            context.sp(),
        );
        Ok(())
    }

    /// Stop the thread without releasing anything.
    pub fn suspend(&mut self, env: &ThreadEnv<'_>) -> ThreadResult<()> {
        let tcb = self.require_tcb("suspend")?;
        env.kernel.suspend(tcb.cptr).map_err(ThreadError::SuspendFailed)?;
        self.state = ThreadState::Suspended;
        Ok(())
    }

    /// Make a started, suspended or faulted thread runnable again.
    pub fn resume(&mut self, env: &ThreadEnv<'_>) -> ThreadResult<()> {
        let tcb = self.require_tcb("resume")?;
        if self.state == ThreadState::Configured {
            return Err(ThreadError::InvalidState {
                operation: "resume",
                state: self.state,
            });
        }
        env.kernel.resume(tcb.cptr).map_err(ThreadError::ResumeFailed)?;
        self.state = ThreadState::Started;
        Ok(())
    }

    /// A checkpoint restore wrote the registers with resume set.
    pub(crate) fn mark_restored(&mut self) {
        self.state = ThreadState::Started;
    }

    /// Note that a fault was delivered for this thread.
    pub fn record_fault(&mut self) -> ThreadResult<()> {
        match self.state {
            ThreadState::Started | ThreadState::Suspended | ThreadState::Faulted => {
                self.state = ThreadState::Faulted;
                Ok(())
            }
            state => Err(ThreadError::InvalidState {
                operation: "record a fault on",
                state,
            }),
        }
    }

    /// Release every resource this thread holds and return it to
    /// [`ThreadState::Empty`].
    ///
    /// Each resource is checked on its own, so this is safe on a thread
    /// that failed part way through configuration, and calling it again is
    /// a no-op. A borrowed scheduling context is left alone.
    pub fn clean_up(&mut self, env: &ThreadEnv<'_>) {
        if let Some(tcb) = self.tcb.take() {
            env.vka.release(tcb);
        }
        if let Some(buffer) = self.ipc_buffer.take() {
            env.vspace.unmap(buffer.addr, buffer.frame);
        }
        if let Some(stack) = self.stack.take() {
            env.vspace.free_stack(stack.top);
        }
        if let SchedContextSlot::Owned(sc) = mem::replace(&mut self.sched_context, SchedContextSlot::None) {
            env.vka.release(sc);
        }
        if self.state != ThreadState::Empty {
            debug!(target: "cohesix_thread::thread", "[thread] cleaned up id={}", self.id.get());
        }
        self.state = ThreadState::Empty;
    }

    pub(crate) fn require_tcb(&self, operation: &'static str) -> ThreadResult<KernelObject> {
        self.tcb.ok_or(ThreadError::InvalidState {
            operation,
            state: self.state,
        })
    }

    pub(crate) fn started_resources(&self, operation: &'static str) -> ThreadResult<(KernelObject, Stack, Word)> {
        match (self.tcb, self.stack, self.ipc_buffer) {
            (Some(tcb), Some(stack), Some(buffer)) if self.state != ThreadState::Empty => {
                Ok((tcb, stack, buffer.addr))
            }
            _ => Err(ThreadError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }
}
