// CLASSIFICATION: COMMUNITY
// Filename: kernel.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};

use log::{trace, warn};

use super::{FailPoint, PAGE_SIZE};
use crate::arch::{Arch, UserContext};
use crate::error::KernelError;
use crate::sel4::{FaultReceiver, IpcMessage, Kernel, ObjectAllocator, TcbConfiguration};
use crate::types::{CPtr, KernelObject, ObjectKind, SchedParams};

const SEL4_INVALID_ARGUMENT: u32 = 1;
const SEL4_ILLEGAL_OPERATION: u32 = 3;

/// Everything the simulated kernel knows about one TCB.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TcbRecord {
    pub config: Option<TcbConfiguration>,
    pub registers: Option<UserContext>,
    pub runnable: bool,
}

#[derive(Default)]
struct KernelState {
    next_cptr: CPtr,
    objects: BTreeMap<CPtr, ObjectKind>,
    tcbs: BTreeMap<CPtr, TcbRecord>,
    sched_contexts: BTreeMap<CPtr, Option<SchedParams>>,
    frames: BTreeMap<CPtr, Box<[u8]>>,
    armed: Vec<FailPoint>,
    stray_releases: usize,
}

impl KernelState {
    fn mint(&mut self) -> CPtr {
        self.next_cptr += 1;
        self.next_cptr
    }

    fn take_failure(&mut self, point: FailPoint) -> bool {
        match self.armed.iter().position(|armed| *armed == point) {
            Some(index) => {
                self.armed.remove(index);
                trace!(target: "cohesix_thread::sim", "[sim] injected failure at {point:?}");
                true
            }
            None => false,
        }
    }

    fn live(&self, cptr: CPtr, kind: ObjectKind) -> Result<(), KernelError> {
        match self.objects.get(&cptr) {
            Some(live) if *live == kind => Ok(()),
            _ => Err(KernelError::InvalidCapability(cptr)),
        }
    }
}

/// Simulated kernel: object allocator, TCB and scheduling invocations and
/// fault endpoints in one.
#[derive(Default)]
pub struct SimKernel {
    state: Mutex<KernelState>,
    endpoints: Mutex<BTreeMap<CPtr, VecDeque<IpcMessage>>>,
    delivered: Condvar,
}

impl SimKernel {
    pub fn new() -> Self {
        SimKernel {
            state: Mutex::new(KernelState {
                next_cptr: 0x100,
                ..KernelState::default()
            }),
            ..SimKernel::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, KernelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next call matching `point` fail. Arming the same point
    /// twice fails the next two calls.
    pub fn fail_next(&self, point: FailPoint) {
        self.state().armed.push(point);
    }

    pub(crate) fn take_failure(&self, point: FailPoint) -> bool {
        self.state().take_failure(point)
    }

    /// A fresh capability slot not backed by any object.
    pub fn mint_cap(&self) -> CPtr {
        self.state().mint()
    }

    /// Number of objects currently allocated.
    pub fn live_objects(&self) -> usize {
        self.state().objects.len()
    }

    pub fn live_objects_of(&self, kind: ObjectKind) -> usize {
        self.state().objects.values().filter(|live| **live == kind).count()
    }

    pub fn is_live(&self, cptr: CPtr) -> bool {
        self.state().objects.contains_key(&cptr)
    }

    /// Releases of objects that were not allocated, or already released.
    pub fn stray_releases(&self) -> usize {
        self.state().stray_releases
    }

    pub fn tcb(&self, tcb: CPtr) -> Option<TcbRecord> {
        self.state().tcbs.get(&tcb).cloned()
    }

    /// Parameters a scheduling context was last configured with.
    pub fn sched_params(&self, sched_context: CPtr) -> Option<SchedParams> {
        self.state().sched_contexts.get(&sched_context).copied().flatten()
    }

    /// Queue `message` on `endpoint` and wake any receiver.
    pub fn send_fault(&self, endpoint: CPtr, message: IpcMessage) {
        let mut endpoints = self.endpoints.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        endpoints.entry(endpoint).or_default().push_back(message);
        self.delivered.notify_all();
    }

    pub fn pending_faults(&self, endpoint: CPtr) -> usize {
        self.endpoints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&endpoint)
            .map_or(0, VecDeque::len)
    }

    pub(crate) fn frame_read(&self, frame: CPtr, offset: usize, buf: &mut [u8]) -> Result<(), KernelError> {
        let state = self.state();
        let memory = state.frames.get(&frame).ok_or(KernelError::InvalidCapability(frame))?;
        let end = offset + buf.len();
        if end > PAGE_SIZE {
            return Err(KernelError::Syscall(SEL4_INVALID_ARGUMENT));
        }
        buf.copy_from_slice(&memory[offset..end]);
        Ok(())
    }

    pub(crate) fn frame_write(&self, frame: CPtr, offset: usize, bytes: &[u8]) -> Result<(), KernelError> {
        let mut state = self.state();
        let memory = state
            .frames
            .get_mut(&frame)
            .ok_or(KernelError::InvalidCapability(frame))?;
        let end = offset + bytes.len();
        if end > PAGE_SIZE {
            return Err(KernelError::Syscall(SEL4_INVALID_ARGUMENT));
        }
        memory[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

impl ObjectAllocator for SimKernel {
    fn allocate(&self, kind: ObjectKind) -> Result<KernelObject, KernelError> {
        let mut state = self.state();
        let point = match kind {
            ObjectKind::Tcb => Some(FailPoint::AllocateTcb),
            ObjectKind::SchedContext => Some(FailPoint::AllocateSchedContext),
            ObjectKind::Endpoint | ObjectKind::Frame => None,
        };
        if point.map_or(false, |point| state.take_failure(point)) {
            return Err(KernelError::OutOfObjects(kind));
        }

        let cptr = state.mint();
        state.objects.insert(cptr, kind);
        match kind {
            ObjectKind::Tcb => {
                state.tcbs.insert(cptr, TcbRecord::default());
            }
            ObjectKind::SchedContext => {
                state.sched_contexts.insert(cptr, None);
            }
            ObjectKind::Frame => {
                state.frames.insert(cptr, vec![0u8; PAGE_SIZE].into_boxed_slice());
            }
            ObjectKind::Endpoint => {}
        }
        trace!(target: "cohesix_thread::sim", "[sim] allocated {} 0x{cptr:x}", kind.name());
        Ok(KernelObject { cptr, kind })
    }

    fn release(&self, object: KernelObject) {
        let mut state = self.state();
        if state.live(object.cptr, object.kind).is_err() {
            warn!(
                target: "cohesix_thread::sim",
                "[sim] release of dead {} 0x{:x}",
                object.kind.name(),
                object.cptr
            );
            state.stray_releases += 1;
            return;
        }
        state.objects.remove(&object.cptr);
        state.tcbs.remove(&object.cptr);
        state.sched_contexts.remove(&object.cptr);
        state.frames.remove(&object.cptr);
    }
}

impl Kernel for SimKernel {
    fn tcb_configure(&self, tcb: CPtr, config: &TcbConfiguration) -> Result<(), KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::ConfigureTcb) {
            return Err(KernelError::Syscall(SEL4_ILLEGAL_OPERATION));
        }
        state.live(tcb, ObjectKind::Tcb)?;
        if let Some(sc) = config.sched_context {
            state.live(sc, ObjectKind::SchedContext)?;
        }
        state.live(config.ipc_buffer_frame, ObjectKind::Frame)?;
        if let Some(record) = state.tcbs.get_mut(&tcb) {
            record.config = Some(*config);
        }
        Ok(())
    }

    fn write_registers(&self, tcb: CPtr, resume: bool, context: &UserContext) -> Result<(), KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::WriteRegisters) {
            return Err(KernelError::Syscall(SEL4_ILLEGAL_OPERATION));
        }
        let record = state.tcbs.get_mut(&tcb).ok_or(KernelError::InvalidCapability(tcb))?;
        record.registers = Some(*context);
        record.runnable |= resume;
        Ok(())
    }

    fn read_registers(&self, tcb: CPtr, arch: Arch) -> Result<UserContext, KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::ReadRegisters) {
            return Err(KernelError::Syscall(SEL4_ILLEGAL_OPERATION));
        }
        let record = state.tcbs.get(&tcb).ok_or(KernelError::InvalidCapability(tcb))?;
        Ok(record.registers.unwrap_or_else(|| UserContext::zeroed(arch)))
    }

    fn suspend(&self, tcb: CPtr) -> Result<(), KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::Suspend) {
            return Err(KernelError::Syscall(SEL4_ILLEGAL_OPERATION));
        }
        let record = state.tcbs.get_mut(&tcb).ok_or(KernelError::InvalidCapability(tcb))?;
        record.runnable = false;
        Ok(())
    }

    fn resume(&self, tcb: CPtr) -> Result<(), KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::Resume) {
            return Err(KernelError::Syscall(SEL4_ILLEGAL_OPERATION));
        }
        let record = state.tcbs.get_mut(&tcb).ok_or(KernelError::InvalidCapability(tcb))?;
        record.runnable = true;
        Ok(())
    }

    fn sched_control_configure(
        &self,
        _sched_control: CPtr,
        sched_context: CPtr,
        params: &SchedParams,
    ) -> Result<(), KernelError> {
        let mut state = self.state();
        if state.take_failure(FailPoint::ConfigureSchedContext) {
            return Err(KernelError::Syscall(SEL4_INVALID_ARGUMENT));
        }
        state.live(sched_context, ObjectKind::SchedContext)?;
        state.sched_contexts.insert(sched_context, Some(*params));
        Ok(())
    }
}

impl FaultReceiver for SimKernel {
    fn recv(&self, endpoint: CPtr) -> IpcMessage {
        let mut endpoints = self.endpoints.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            if let Some(message) = endpoints.get_mut(&endpoint).and_then(VecDeque::pop_front) {
                return message;
            }
            endpoints = self
                .delivered
                .wait(endpoints)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Word;

    fn word_from_le(bytes: &[u8]) -> Word {
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        Word::from_le_bytes(raw)
    }

    #[test]
    fn armed_failure_fires_once() {
        let kernel = SimKernel::new();
        kernel.fail_next(FailPoint::AllocateTcb);
        assert_eq!(
            kernel.allocate(ObjectKind::Tcb),
            Err(KernelError::OutOfObjects(ObjectKind::Tcb))
        );
        let tcb = kernel.allocate(ObjectKind::Tcb).unwrap();
        assert_eq!(kernel.live_objects_of(ObjectKind::Tcb), 1);
        kernel.release(tcb);
        kernel.release(tcb);
        assert_eq!(kernel.live_objects(), 0);
        assert_eq!(kernel.stray_releases(), 1);
    }

    #[test]
    fn queued_fault_is_received_in_order() {
        let kernel = SimKernel::new();
        let first = IpcMessage {
            badge: 1,
            ..IpcMessage::default()
        };
        let second = IpcMessage {
            badge: 2,
            ..IpcMessage::default()
        };
        kernel.send_fault(7, first.clone());
        kernel.send_fault(7, second.clone());
        assert_eq!(kernel.pending_faults(7), 2);
        assert_eq!(kernel.recv(7), first);
        assert_eq!(kernel.recv(7), second);
        assert_eq!(kernel.pending_faults(7), 0);
    }

    #[test]
    fn frame_io_is_bounded_by_page() {
        let kernel = SimKernel::new();
        let frame = kernel.allocate(ObjectKind::Frame).unwrap();
        kernel.frame_write(frame.cptr, 8, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        kernel.frame_read(frame.cptr, 8, &mut buf).unwrap();
        assert_eq!(word_from_le(&buf), 0x0403_0201);
        assert!(kernel.frame_write(frame.cptr, PAGE_SIZE - 2, &[0; 4]).is_err());
    }
}
