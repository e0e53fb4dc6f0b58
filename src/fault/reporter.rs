// CLASSIFICATION: COMMUNITY
// Filename: reporter.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

use core::ffi::{c_char, CStr};
use std::borrow::Cow;

use log::{error, info};
use once_cell::sync::OnceCell;

use super::{print_fault_message, Fault};
use crate::arch::Arch;
use crate::diagnostics::DiagnosticSink;
use crate::error::ThreadResult;
use crate::sel4::{FaultReceiver, ThreadEnv};
use crate::thread::{configure_passive_thread, configure_thread, Thread};
use crate::types::{CPtr, CapData, Word};

/// Reports the first fault delivered on one endpoint.
pub struct FaultReporter<'a> {
    receiver: &'a dyn FaultReceiver,
    sink: &'a dyn DiagnosticSink,
    arch: Arch,
    endpoint: CPtr,
    name: &'a str,
}

impl<'a> FaultReporter<'a> {
    pub fn new(
        receiver: &'a dyn FaultReceiver,
        sink: &'a dyn DiagnosticSink,
        arch: Arch,
        endpoint: CPtr,
        name: &'a str,
    ) -> Self {
        Self {
            receiver,
            sink,
            arch,
            endpoint,
            name,
        }
    }

    /// Wait for one fault and report it, then wait once more and ignore
    /// whatever arrives. A reporter handles exactly one fault.
    pub fn run(&self) -> Fault {
        let message = self.receiver.recv(self.endpoint);
        let fault = print_fault_message(self.sink, self.arch, &message, self.name);
        let _ = self.receiver.recv(self.endpoint);
        fault
    }
}

/// Receiver and sink used by threads entered at [`fault_reporter_entry`].
pub struct FaultRuntime {
    pub receiver: &'static dyn FaultReceiver,
    pub sink: &'static dyn DiagnosticSink,
    pub arch: Arch,
}

static FAULT_RUNTIME: OnceCell<FaultRuntime> = OnceCell::new();

/// Install the process-wide fault runtime. Returns `false` when one was
/// already installed; the first installation stays in effect.
pub fn install_fault_runtime(runtime: FaultRuntime) -> bool {
    FAULT_RUNTIME.set(runtime).is_ok()
}

/// Entry point of a fault handler thread.
///
/// `name` is the address of a NUL-terminated thread name and `endpoint`
/// the fault endpoint to wait on.
///
/// # Safety
/// `name` must be zero or point to a NUL-terminated string that outlives
/// the call.
pub unsafe extern "C" fn fault_reporter_entry(name: Word, endpoint: Word, _ipc_buffer: Word) {
    let Some(runtime) = FAULT_RUNTIME.get() else {
        error!(
            target: "cohesix_thread::fault",
            "[fault] reporter on endpoint 0x{endpoint:x} started without a fault runtime"
        );
        return;
    };
    let name: Cow<'_, str> = if name == 0 {
        Cow::Borrowed("unknown")
    } else {
        // SAFETY: the caller guarantees `name` addresses a NUL-terminated string.
        unsafe { CStr::from_ptr(name as usize as *const c_char) }.to_string_lossy()
    };
    FaultReporter::new(runtime.receiver, runtime.sink, runtime.arch, endpoint, &name).run();
}

/// Configure a thread that reports the first fault delivered on
/// `fault_endpoint`, and start it.
///
/// Without a scheduling control capability the thread is passive. The
/// thread has no fault endpoint of its own.
pub fn start_fault_handler(
    env: &ThreadEnv<'_>,
    fault_endpoint: CPtr,
    priority: u8,
    cspace: CPtr,
    cspace_root_data: CapData,
    name: &'static CStr,
    sched_control: Option<CPtr>,
) -> ThreadResult<Thread> {
    let configured = match sched_control {
        Some(sched_control) => configure_thread(env, None, priority, cspace, cspace_root_data, sched_control),
        None => configure_passive_thread(env, None, priority, cspace, cspace_root_data),
    };
    let mut thread = configured.map_err(|err| {
        error!(target: "cohesix_thread::fault", "[fault] failed to configure fault handling thread: {err}");
        err
    })?;

    let entry = fault_reporter_entry as usize as Word;
    let name_addr = name.as_ptr() as usize as Word;
    if let Err(err) = thread.start(env, entry, name_addr, fault_endpoint, true) {
        error!(target: "cohesix_thread::fault", "[fault] failed to start fault handling thread: {err}");
        thread.clean_up(env);
        return Err(err);
    }
    info!(
        target: "cohesix_thread::fault",
        "[fault] handler {:?} waiting on endpoint 0x{fault_endpoint:x}",
        name,
    );
    Ok(thread)
}
