// CLASSIFICATION: COMMUNITY
// Filename: syscall.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Kernel invocations used by the thread helpers.

use crate::arch::{Arch, UserContext};
use crate::error::KernelError;
use crate::types::{CPtr, CapData, MessageInfo, SchedParams, Word};

/// Arguments of a single TCB configure invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TcbConfiguration {
    pub fault_endpoint: Option<CPtr>,
    pub temporal_fault_endpoint: Option<CPtr>,
    pub priority: u8,
    pub max_priority: u8,
    pub criticality: u32,
    pub max_criticality: u32,
    /// Owned or borrowed scheduling context; `None` leaves the thread passive.
    pub sched_context: Option<CPtr>,
    pub cspace_root: CPtr,
    pub cspace_root_data: CapData,
    pub vspace_root: CPtr,
    pub vspace_root_data: CapData,
    pub ipc_buffer_addr: Word,
    pub ipc_buffer_frame: CPtr,
}

/// Kernel invocations on TCBs and scheduling contexts.
pub trait Kernel {
    fn tcb_configure(&self, tcb: CPtr, config: &TcbConfiguration) -> Result<(), KernelError>;

    /// Replace the register file of `tcb`, optionally making it runnable.
    fn write_registers(&self, tcb: CPtr, resume: bool, context: &UserContext) -> Result<(), KernelError>;

    /// Read the full register file of `tcb` in the encoding of `arch`.
    fn read_registers(&self, tcb: CPtr, arch: Arch) -> Result<UserContext, KernelError>;

    fn suspend(&self, tcb: CPtr) -> Result<(), KernelError>;

    fn resume(&self, tcb: CPtr) -> Result<(), KernelError>;

    /// Populate `sched_context` through the scheduling control capability.
    fn sched_control_configure(
        &self,
        sched_control: CPtr,
        sched_context: CPtr,
        params: &SchedParams,
    ) -> Result<(), KernelError>;
}

/// A received IPC: tag, sender badge and the message registers it carried.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpcMessage {
    pub info: MessageInfo,
    pub badge: Word,
    pub mrs: Vec<Word>,
}

impl IpcMessage {
    /// Message register `index`, zero when the sender did not supply it.
    pub fn mr(&self, index: usize) -> Word {
        self.mrs.get(index).copied().unwrap_or_default()
    }
}

/// Blocking receive on an endpoint.
pub trait FaultReceiver: Sync {
    /// Block until a message arrives on `endpoint`. Never times out.
    fn recv(&self, endpoint: CPtr) -> IpcMessage;
}
