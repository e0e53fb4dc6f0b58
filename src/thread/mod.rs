// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Thread configuration, start-up and tear-down.
//!
//! A [`Thread`] owns a TCB, an IPC buffer page, a stack and optionally a
//! scheduling context. It is produced by [`configure_thread_config`] (or
//! one of its shorthands), started with [`Thread::start`] and torn down
//! with [`Thread::clean_up`]. Other TCB operations can be issued directly
//! on [`Thread::tcb`].

mod binder;
mod config;
mod lifecycle;

pub use binder::{configure_passive_thread, configure_thread, configure_thread_config};
pub use config::{SchedBinding, ThreadConfig};

use core::sync::atomic::{AtomicU64, Ordering};

use crate::arch::Arch;
use crate::types::{CPtr, KernelObject, Word};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Thread`] object. Never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    fn next() -> Self {
        ThreadId(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Lifecycle state tracked by the helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadState {
    /// No resources held.
    Empty,
    /// All resources acquired, registers not yet written.
    Configured,
    /// Registers written; runnable or held awaiting an external resume.
    Started,
    Suspended,
    Faulted,
}

/// The thread's IPC buffer mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpcBuffer {
    /// Address of the buffer as seen by the thread.
    pub addr: Word,
    /// Frame capability backing the buffer.
    pub frame: CPtr,
}

/// The thread's stack region. Grows down from `top`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stack {
    pub top: Word,
    pub size: usize,
}

/// Scheduling context the TCB was configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedContextSlot {
    /// Passive thread.
    None,
    /// Created for this thread and released by [`Thread::clean_up`].
    Owned(KernelObject),
    /// Supplied by the caller; never released here.
    Borrowed(CPtr),
}

/// A configured execution context and the resources backing it.
#[derive(Debug)]
pub struct Thread {
    id: ThreadId,
    arch: Arch,
    state: ThreadState,
    tcb: Option<KernelObject>,
    ipc_buffer: Option<IpcBuffer>,
    stack: Option<Stack>,
    sched_context: SchedContextSlot,
}

impl Thread {
    /// A thread holding no resources.
    pub(crate) fn empty(arch: Arch) -> Self {
        Thread {
            id: ThreadId::next(),
            arch,
            state: ThreadState::Empty,
            tcb: None,
            ipc_buffer: None,
            stack: None,
            sched_context: SchedContextSlot::None,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// TCB capability, for invocations the helpers do not wrap.
    pub fn tcb(&self) -> Option<CPtr> {
        self.tcb.map(|tcb| tcb.cptr)
    }

    pub fn ipc_buffer(&self) -> Option<IpcBuffer> {
        self.ipc_buffer
    }

    /// IPC buffer address in the thread's own address space.
    pub fn ipc_buffer_addr(&self) -> Option<Word> {
        self.ipc_buffer.map(|buffer| buffer.addr)
    }

    pub fn stack(&self) -> Option<Stack> {
        self.stack
    }

    pub fn stack_top(&self) -> Option<Word> {
        self.stack.map(|stack| stack.top)
    }

    pub fn stack_size(&self) -> Option<usize> {
        self.stack.map(|stack| stack.size)
    }

    pub fn sched_context(&self) -> SchedContextSlot {
        self.sched_context
    }

    pub fn owns_sched_context(&self) -> bool {
        matches!(self.sched_context, SchedContextSlot::Owned(_))
    }

    /// True when no resource field is populated.
    pub fn is_empty(&self) -> bool {
        self.tcb.is_none()
            && self.ipc_buffer.is_none()
            && self.stack.is_none()
            && self.sched_context == SchedContextSlot::None
    }
}
