// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Error types for thread configuration, start-up and checkpointing.

use core::fmt;

use thiserror::Error;

use crate::thread::ThreadState;
use crate::types::{ObjectKind, Word};

/// Failure reported by one of the collaborators (allocator, vspace, kernel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("kernel rejected invocation (error {0})")]
    Syscall(u32),
    #[error("out of {0:?} objects")]
    OutOfObjects(ObjectKind),
    #[error("out of virtual address space")]
    OutOfVirtualMemory,
    #[error("address 0x{0:x} is not mapped")]
    Unmapped(Word),
    #[error("capability 0x{0:x} is invalid")]
    InvalidCapability(Word),
    #[error("value 0x{0:x} does not fit a 32-bit word")]
    WordOverflow(Word),
}

/// The acquisition steps performed while configuring a thread, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigureStep {
    AllocateTcb,
    MapIpcBuffer,
    SchedContext,
    ConfigureTcb,
    AllocateStack,
}

impl ConfigureStep {
    pub const ALL: [ConfigureStep; 5] = [
        ConfigureStep::AllocateTcb,
        ConfigureStep::MapIpcBuffer,
        ConfigureStep::SchedContext,
        ConfigureStep::ConfigureTcb,
        ConfigureStep::AllocateStack,
    ];
}

impl fmt::Display for ConfigureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigureStep::AllocateTcb => "allocate-tcb",
            ConfigureStep::MapIpcBuffer => "map-ipc-buffer",
            ConfigureStep::SchedContext => "sched-context",
            ConfigureStep::ConfigureTcb => "configure-tcb",
            ConfigureStep::AllocateStack => "allocate-stack",
        };
        f.write_str(name)
    }
}

/// Errors returned by thread, checkpoint and fault-handler operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("allocation failed: {0}")]
    AllocationFailed(KernelError),
    #[error("ipc buffer mapping failed: {0}")]
    MappingFailed(KernelError),
    #[error("scheduling context setup failed: {0}")]
    SchedulingSetupFailed(KernelError),
    #[error("tcb configuration rejected: {0}")]
    ConfigurationRejected(KernelError),
    #[error("stack allocation failed: {0}")]
    StackAllocationFailed(KernelError),
    #[error("register transfer failed: {0}")]
    RegisterIoFailed(KernelError),
    #[error("stack access failed: {0}")]
    StackAccessFailed(KernelError),
    #[error("suspend failed: {0}")]
    SuspendFailed(KernelError),
    #[error("resume failed: {0}")]
    ResumeFailed(KernelError),
    #[error("live stack span {span:#x} exceeds stack capacity {capacity:#x}")]
    CheckpointOversized { span: usize, capacity: usize },
    #[error("stack pointer 0x{sp:x} lies above stack top 0x{stack_top:x}")]
    StackPointerOutOfRange { sp: Word, stack_top: Word },
    #[error("checkpoint was captured from a different thread")]
    CheckpointMismatch,
    #[error("checkpoint storage already released")]
    CheckpointReleased,
    #[error("cannot {operation} a thread in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ThreadState,
    },
}

impl ThreadError {
    /// Logic errors that no retry can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ThreadError::CheckpointOversized { .. } | ThreadError::CheckpointMismatch
        )
    }

    /// The configuration step a binder failure originated from.
    pub fn step(&self) -> Option<ConfigureStep> {
        match self {
            ThreadError::AllocationFailed(_) => Some(ConfigureStep::AllocateTcb),
            ThreadError::MappingFailed(_) => Some(ConfigureStep::MapIpcBuffer),
            ThreadError::SchedulingSetupFailed(_) => Some(ConfigureStep::SchedContext),
            ThreadError::ConfigurationRejected(_) => Some(ConfigureStep::ConfigureTcb),
            ThreadError::StackAllocationFailed(_) => Some(ConfigureStep::AllocateStack),
            _ => None,
        }
    }
}

pub type ThreadResult<T> = Result<T, ThreadError>;
