// CLASSIFICATION: COMMUNITY
// Filename: checkpoint_restore.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::sync::Arc;

use cohesix_thread::sel4::{AddressSpace, Kernel};
use cohesix_thread::sim::{FailPoint, SimKernel, SimVSpace};
use cohesix_thread::types::{CapData, Word};
use cohesix_thread::{
    configure_passive_thread, Arch, Checkpoint, Thread, ThreadEnv, ThreadError, ThreadSettings,
    ThreadState, UserContext,
};

const ENTRY: Word = 0x40_0000;

struct Rig {
    kernel: Arc<SimKernel>,
    vspace: SimVSpace,
}

impl Rig {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let kernel = Arc::new(SimKernel::new());
        let vspace = SimVSpace::with_stack_pages(kernel.clone(), 2);
        Rig { kernel, vspace }
    }

    fn env(&self) -> ThreadEnv<'_> {
        ThreadEnv::new(&*self.kernel, &self.vspace, &*self.kernel)
            .with_settings(ThreadSettings::new(Arch::Aarch64))
    }

    fn started(&self) -> Thread {
        let env = self.env();
        let mut thread = configure_passive_thread(&env, None, 10, self.kernel.mint_cap(), CapData::NULL).unwrap();
        thread.start(&env, ENTRY, 0xa, 0xb, true).unwrap();
        thread
    }

    fn registers(&self, thread: &Thread) -> UserContext {
        self.kernel
            .tcb(thread.tcb().unwrap())
            .and_then(|record| record.registers)
            .unwrap()
    }

    /// Pretend the thread ran: move its stack pointer down by `depth` and
    /// fill the live stack with `fill`.
    fn run(&self, thread: &Thread, depth: Word, fill: u8) {
        let top = thread.stack_top().unwrap();
        let mut regs = self.registers(thread);
        regs.set_sp(top - depth);
        regs.set_pc(ENTRY + depth);
        self.kernel.write_registers(thread.tcb().unwrap(), true, &regs).unwrap();
        self.vspace.write(top - depth, &vec![fill; depth as usize]).unwrap();
    }

    fn stack(&self, thread: &Thread, depth: Word) -> Vec<u8> {
        let mut bytes = vec![0u8; depth as usize];
        self.vspace.read(thread.stack_top().unwrap() - depth, &mut bytes).unwrap();
        bytes
    }
}

#[test]
fn restore_replays_registers_and_stack() {
    let rig = Rig::new();
    let env = rig.env();
    let mut thread = rig.started();
    rig.run(&thread, 0x80, 0x5a);
    let saved_regs = rig.registers(&thread);

    let mut checkpoint = Checkpoint::capture(&env, &thread).unwrap();
    assert_eq!(checkpoint.thread(), thread.id());
    assert_eq!(checkpoint.registers(), &saved_regs);
    assert_eq!(checkpoint.stack_bytes().map(<[u8]>::len), Some(0x80));

    for round in 0..2 {
        rig.run(&thread, 0x40, 0xee);
        rig.vspace
            .write(thread.stack_top().unwrap() - 0x80, &[round; 0x40])
            .unwrap();

        checkpoint.restore(&env, &mut thread, false).unwrap();
        assert_eq!(rig.registers(&thread), saved_regs, "round {round}");
        assert_eq!(rig.stack(&thread, 0x80), vec![0x5a; 0x80], "round {round}");
        assert!(rig.kernel.tcb(thread.tcb().unwrap()).unwrap().runnable);
        assert!(!checkpoint.is_released());
    }

    thread.clean_up(&env);
    assert_eq!(rig.kernel.live_objects(), 0);
}

#[test]
fn free_on_success_releases_storage() {
    let rig = Rig::new();
    let env = rig.env();
    let mut thread = rig.started();
    rig.run(&thread, 0x20, 1);

    let mut checkpoint = Checkpoint::capture(&env, &thread).unwrap();
    checkpoint.restore(&env, &mut thread, true).unwrap();
    assert!(checkpoint.is_released());
    assert_eq!(
        checkpoint.restore(&env, &mut thread, false),
        Err(ThreadError::CheckpointReleased)
    );
}

#[test]
fn failed_restore_keeps_checkpoint_usable() {
    let rig = Rig::new();
    let env = rig.env();
    let mut thread = rig.started();
    rig.run(&thread, 0x30, 7);
    let saved = rig.registers(&thread);
    let mut checkpoint = Checkpoint::capture(&env, &thread).unwrap();

    rig.run(&thread, 0x10, 9);
    rig.kernel.fail_next(FailPoint::WriteRegisters);
    let err = checkpoint.restore(&env, &mut thread, true).unwrap_err();
    assert!(matches!(err, ThreadError::RegisterIoFailed(_)));
    assert!(!checkpoint.is_released());

    checkpoint.restore(&env, &mut thread, true).unwrap();
    assert_eq!(rig.registers(&thread), saved);
    assert!(checkpoint.is_released());
}

#[test]
fn restore_marks_a_suspended_thread_started() {
    let rig = Rig::new();
    let env = rig.env();
    let mut thread = rig.started();
    rig.run(&thread, 0x40, 0x21);
    let mut checkpoint = Checkpoint::capture(&env, &thread).unwrap();

    thread.suspend(&env).unwrap();
    rig.kernel.fail_next(FailPoint::WriteRegisters);
    assert!(checkpoint.restore(&env, &mut thread, false).is_err());
    assert_eq!(thread.state(), ThreadState::Suspended);
    assert!(!rig.kernel.tcb(thread.tcb().unwrap()).unwrap().runnable);

    checkpoint.restore(&env, &mut thread, false).unwrap();
    assert_eq!(thread.state(), ThreadState::Started);
    assert!(rig.kernel.tcb(thread.tcb().unwrap()).unwrap().runnable);

    thread.record_fault().unwrap();
    checkpoint.restore(&env, &mut thread, true).unwrap();
    assert_eq!(thread.state(), ThreadState::Started);
}

#[test]
fn span_equal_to_capacity_is_captured() {
    let rig = Rig::new();
    let env = rig.env();
    let thread = rig.started();
    let capacity = thread.stack_size().unwrap() as Word;
    rig.run(&thread, capacity, 0x11);

    let checkpoint = Checkpoint::capture(&env, &thread).unwrap();
    assert_eq!(checkpoint.stack_bytes().map(<[u8]>::len), Some(capacity as usize));
}

#[test]
fn span_beyond_capacity_is_oversized() {
    let rig = Rig::new();
    let env = rig.env();
    let thread = rig.started();
    let capacity = thread.stack_size().unwrap();
    let top = thread.stack_top().unwrap();

    let mut regs = rig.registers(&thread);
    regs.set_sp(top - capacity as Word - 1);
    rig.kernel.write_registers(thread.tcb().unwrap(), false, &regs).unwrap();

    let err = Checkpoint::capture(&env, &thread).unwrap_err();
    assert_eq!(
        err,
        ThreadError::CheckpointOversized {
            span: capacity + 1,
            capacity
        }
    );
    assert!(err.is_fatal());
}

#[test]
fn stack_pointer_above_top_is_rejected() {
    let rig = Rig::new();
    let env = rig.env();
    let thread = rig.started();
    let top = thread.stack_top().unwrap();
    let mut regs = rig.registers(&thread);
    regs.set_sp(top + 16);
    rig.kernel.write_registers(thread.tcb().unwrap(), false, &regs).unwrap();

    assert!(matches!(
        Checkpoint::capture(&env, &thread),
        Err(ThreadError::StackPointerOutOfRange { .. })
    ));
}

#[test]
fn restore_onto_another_thread_is_refused() {
    let rig = Rig::new();
    let env = rig.env();
    let original = rig.started();
    let mut twin = rig.started();
    rig.run(&original, 0x20, 3);

    let mut checkpoint = Checkpoint::capture(&env, &original).unwrap();
    let err = checkpoint.restore(&env, &mut twin, false).unwrap_err();
    assert_eq!(err, ThreadError::CheckpointMismatch);
    assert!(err.is_fatal());
    assert!(!checkpoint.is_released());
}

#[test]
fn register_read_failure_is_surfaced() {
    let rig = Rig::new();
    let env = rig.env();
    let thread = rig.started();
    rig.kernel.fail_next(FailPoint::ReadRegisters);
    assert!(matches!(
        Checkpoint::capture(&env, &thread),
        Err(ThreadError::RegisterIoFailed(_))
    ));
}
