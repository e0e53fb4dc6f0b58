// CLASSIFICATION: COMMUNITY
// Filename: binder.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Resource acquisition for new threads.
//!
//! Resources are acquired in a fixed order (TCB, IPC buffer, scheduling
//! context, TCB configure, stack) because later steps need identities
//! established by earlier ones. Any failure releases whatever was already
//! acquired before the error is returned.

use log::info;

use super::{IpcBuffer, SchedBinding, SchedContextSlot, Stack, Thread, ThreadConfig, ThreadState};
use crate::diagnostics::{capture, DiagnosticLevel};
use crate::error::{ThreadError, ThreadResult};
use crate::sel4::{TcbConfiguration, ThreadEnv};
use crate::types::{CPtr, CapData, ObjectKind, SchedParams, Word};

/// Word index of the user-data slot in the IPC buffer layout
/// (message tag, 120 message registers, then user data).
const IPC_BUFFER_USER_DATA_WORD: Word = 121;

/// Configure a thread as described by `config`.
///
/// On failure no resource remains allocated and the precise cause is
/// emitted on the environment's diagnostics sink.
pub fn configure_thread_config(env: &ThreadEnv<'_>, config: &ThreadConfig) -> ThreadResult<Thread> {
    let mut thread = Thread::empty(env.settings.arch);
    match acquire(env, config, &mut thread) {
        Ok(()) => {
            thread.state = ThreadState::Configured;
            info!(
                target: "cohesix_thread::thread",
                "[thread] configured id={} tcb=0x{:x} ipc=0x{:x} stack_top=0x{:x} sc={:?}",
                thread.id.get(),
                thread.tcb().unwrap_or_default(),
                thread.ipc_buffer_addr().unwrap_or_default(),
                thread.stack_top().unwrap_or_default(),
                thread.sched_context,
            );
            Ok(thread)
        }
        Err(err) => {
            let step = err
                .step()
                .map(|step| step.to_string())
                .unwrap_or_else(|| "configure".into());
            capture(
                env.sink,
                "thread",
                format!("configure failed at {step}: {err}"),
                DiagnosticLevel::Error,
            );
            thread.clean_up(env);
            Err(err)
        }
    }
}

/// Configure a thread with its own scheduling context, populated with
/// one time slice of budget per time slice of period.
pub fn configure_thread(
    env: &ThreadEnv<'_>,
    fault_endpoint: Option<CPtr>,
    priority: u8,
    cspace: CPtr,
    cspace_root_data: CapData,
    sched_control: CPtr,
) -> ThreadResult<Thread> {
    let config = base_config(fault_endpoint, priority, cspace, cspace_root_data)
        .create_sched_context(sched_control, SchedParams::timeslice(env.settings.timeslice_us()));
    configure_thread_config(env, &config)
}

/// Configure a thread without a scheduling context. It only runs on
/// contexts donated to it.
pub fn configure_passive_thread(
    env: &ThreadEnv<'_>,
    fault_endpoint: Option<CPtr>,
    priority: u8,
    cspace: CPtr,
    cspace_root_data: CapData,
) -> ThreadResult<Thread> {
    let config = base_config(fault_endpoint, priority, cspace, cspace_root_data);
    configure_thread_config(env, &config)
}

fn base_config(fault_endpoint: Option<CPtr>, priority: u8, cspace: CPtr, data: CapData) -> ThreadConfig {
    let mut config = ThreadConfig::new(cspace, data)
        .priority(priority)
        .max_priority(priority);
    config.fault_endpoint = fault_endpoint;
    config
}

fn acquire(env: &ThreadEnv<'_>, config: &ThreadConfig, thread: &mut Thread) -> ThreadResult<()> {
    let tcb = env
        .vka
        .allocate(ObjectKind::Tcb)
        .map_err(ThreadError::AllocationFailed)?;
    thread.tcb = Some(tcb);

    let (addr, frame) = env
        .vspace
        .map_new(ObjectKind::Frame)
        .map_err(ThreadError::MappingFailed)?;
    thread.ipc_buffer = Some(IpcBuffer { addr, frame });
    write_ipc_user_data(env, thread, addr, frame)?;

    let sched_context = match config.sched {
        SchedBinding::Create {
            sched_control,
            params,
        } => {
            let sc = env
                .vka
                .allocate(ObjectKind::SchedContext)
                .map_err(ThreadError::SchedulingSetupFailed)?;
            thread.sched_context = SchedContextSlot::Owned(sc);
            env.kernel
                .sched_control_configure(sched_control, sc.cptr, &params)
                .map_err(ThreadError::SchedulingSetupFailed)?;
            Some(sc.cptr)
        }
        SchedBinding::Borrow(Some(sc)) => {
            thread.sched_context = SchedContextSlot::Borrowed(sc);
            Some(sc)
        }
        SchedBinding::Borrow(None) => None,
    };

    let tcb_config = TcbConfiguration {
        fault_endpoint: config.fault_endpoint,
        temporal_fault_endpoint: config.temporal_fault_endpoint,
        priority: config.priority,
        max_priority: config.max_priority,
        criticality: config.criticality,
        max_criticality: config.max_criticality,
        sched_context,
        cspace_root: config.cspace,
        cspace_root_data: config.cspace_root_data,
        vspace_root: env.vspace.root(),
        vspace_root_data: CapData::NULL,
        ipc_buffer_addr: addr,
        ipc_buffer_frame: frame,
    };
    env.kernel
        .tcb_configure(tcb.cptr, &tcb_config)
        .map_err(ThreadError::ConfigurationRejected)?;

    let top = env
        .vspace
        .new_stack()
        .map_err(ThreadError::StackAllocationFailed)?;
    thread.stack = Some(Stack {
        top,
        size: env.vspace.stack_size(),
    });
    Ok(())
}

/// Store the buffer's own address in its user-data word so the thread can
/// find it. A thread in another address space is reached through a
/// temporary view of the frame in the parent.
fn write_ipc_user_data(env: &ThreadEnv<'_>, thread: &Thread, addr: Word, frame: CPtr) -> ThreadResult<()> {
    let word_size = thread.arch.word_size();
    let offset = IPC_BUFFER_USER_DATA_WORD * word_size as Word;
    let bytes = addr.to_le_bytes();
    let bytes = &bytes[..word_size];

    match env.parent {
        Some(parent) => {
            let local = parent.map_elsewhere(frame).map_err(ThreadError::MappingFailed)?;
            let written = parent.write(local + offset, bytes);
            parent.unmap_elsewhere(local);
            written.map_err(ThreadError::MappingFailed)
        }
        None => env
            .vspace
            .write(addr + offset, bytes)
            .map_err(ThreadError::MappingFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_data_word_fits_in_a_page() {
        assert!((IPC_BUFFER_USER_DATA_WORD + 1) * 8 <= 4096);
    }

    #[test]
    fn passive_base_config_borrows_nothing() {
        let config = base_config(Some(7), 200, 2, CapData::NULL);
        assert_eq!(config.sched, SchedBinding::Borrow(None));
        assert_eq!(config.max_priority, 200);
        assert_eq!(config.fault_endpoint, Some(7));
    }
}
