// CLASSIFICATION: COMMUNITY
// Filename: register_encoding.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::sync::{Arc, Mutex};

use cohesix_thread::arch::{ia32, x86_64, EntryArgs, StackPointer};
use cohesix_thread::error::KernelError;
use cohesix_thread::sel4::AddressSpace;
use cohesix_thread::sim::{SimKernel, SimVSpace};
use cohesix_thread::types::{CPtr, CapData, ObjectKind, Word};
use cohesix_thread::{configure_passive_thread, Arch, ThreadEnv, ThreadSettings, UserContext};

const ENTRY: Word = 0x0804_8000;
const ARG0: Word = 0x1000;
const ARG1: Word = 0x2000;
const IPC: Word = 0x3000;
const TOP: Word = 0x9000;

/// One page of stack memory ending at `TOP`.
struct FlatStack {
    memory: Mutex<Vec<u8>>,
}

impl FlatStack {
    const BASE: Word = TOP - 0x1000;

    fn new() -> Self {
        FlatStack {
            memory: Mutex::new(vec![0; 0x1000]),
        }
    }

    fn u32_at(&self, addr: Word) -> u32 {
        let mut raw = [0u8; 4];
        self.read(addr, &mut raw).unwrap();
        u32::from_le_bytes(raw)
    }

    fn range(addr: Word, len: usize) -> Result<std::ops::Range<usize>, KernelError> {
        if addr < Self::BASE || addr + len as Word > TOP {
            return Err(KernelError::Unmapped(addr));
        }
        let start = (addr - Self::BASE) as usize;
        Ok(start..start + len)
    }
}

impl AddressSpace for FlatStack {
    fn root(&self) -> CPtr {
        1
    }

    fn map_new(&self, _kind: ObjectKind) -> Result<(Word, CPtr), KernelError> {
        Err(KernelError::OutOfVirtualMemory)
    }

    fn unmap(&self, _addr: Word, _cap: CPtr) {}

    fn new_stack(&self) -> Result<Word, KernelError> {
        Err(KernelError::OutOfVirtualMemory)
    }

    fn free_stack(&self, _stack_top: Word) {}

    fn stack_size(&self) -> usize {
        0x1000
    }

    fn map_elsewhere(&self, _frame: CPtr) -> Result<Word, KernelError> {
        Err(KernelError::OutOfVirtualMemory)
    }

    fn unmap_elsewhere(&self, _addr: Word) {}

    fn read(&self, addr: Word, buf: &mut [u8]) -> Result<(), KernelError> {
        let range = Self::range(addr, buf.len())?;
        buf.copy_from_slice(&self.memory.lock().unwrap()[range]);
        Ok(())
    }

    fn write(&self, addr: Word, bytes: &[u8]) -> Result<(), KernelError> {
        let range = Self::range(addr, bytes.len())?;
        self.memory.lock().unwrap()[range].copy_from_slice(bytes);
        Ok(())
    }
}

fn encode(arch: Arch, stack: &FlatStack) -> UserContext {
    let args = EntryArgs {
        arg0: ARG0,
        arg1: ARG1,
        ipc_buffer: IPC,
    };
    arch.init_context(ENTRY, StackPointer::Destination(TOP), args, stack)
        .unwrap()
}

#[test]
fn x86_64_passes_arguments_in_registers() {
    let stack = FlatStack::new();
    let UserContext::X86_64(regs) = encode(Arch::X86_64, &stack) else {
        panic!("wrong register file");
    };
    assert_eq!((regs.rip, regs.rsp), (ENTRY, TOP));
    assert_eq!((regs.rdi, regs.rsi, regs.rdx), (ARG0, ARG1, IPC));
    assert_eq!(regs.gs, x86_64::IPCBUF_GDT_SELECTOR);
    assert_eq!(stack.u32_at(TOP - 4), 0, "register convention must not touch the stack");
}

#[test]
fn arm_passes_arguments_in_registers() {
    let stack = FlatStack::new();
    let UserContext::Arm(regs) = encode(Arch::Arm, &stack) else {
        panic!("wrong register file");
    };
    assert_eq!((regs.pc, regs.sp), (ENTRY, TOP));
    assert_eq!(&regs.r[..3], &[ARG0, ARG1, IPC]);
}

#[test]
fn aarch64_passes_arguments_in_registers() {
    let stack = FlatStack::new();
    let UserContext::Aarch64(regs) = encode(Arch::Aarch64, &stack) else {
        panic!("wrong register file");
    };
    assert_eq!((regs.pc, regs.sp), (ENTRY, TOP));
    assert_eq!(&regs.x[..3], &[ARG0, ARG1, IPC]);
}

#[test]
fn ia32_pushes_arguments_below_stack_top() {
    let stack = FlatStack::new();
    let UserContext::Ia32(regs) = encode(Arch::Ia32, &stack) else {
        panic!("wrong register file");
    };
    assert_eq!(regs.eip, ENTRY);
    assert_eq!(regs.esp, TOP - ia32::ENTRY_FRAME_BYTES);
    assert_eq!(regs.esp, 0x9000 - 24);
    assert_eq!(regs.gs, ia32::IPCBUF_GDT_SELECTOR);
    assert_eq!(stack.u32_at(TOP - 20), ARG0 as u32);
    assert_eq!(stack.u32_at(TOP - 16), ARG1 as u32);
    assert_eq!(stack.u32_at(TOP - 12), IPC as u32);
}

#[test]
fn ia32_reports_unmapped_stack() {
    let stack = FlatStack::new();
    let args = EntryArgs::default();
    let err = Arch::Ia32
        .init_context(ENTRY, StackPointer::Local(0x20_0000), args, &stack)
        .unwrap_err();
    assert!(matches!(err, KernelError::Unmapped(_)));
}

#[test]
fn ia32_rejects_stack_top_below_its_frame() {
    let stack = FlatStack::new();
    let err = Arch::Ia32
        .init_context(ENTRY, StackPointer::Local(0x10), EntryArgs::default(), &stack)
        .unwrap_err();
    assert_eq!(err, KernelError::Unmapped(0x10));
}

#[test]
fn ia32_rejects_arguments_wider_than_a_word() {
    let stack = FlatStack::new();
    let args = EntryArgs {
        arg0: ARG0,
        arg1: ARG1,
        ipc_buffer: 0x1_0000_3000,
    };
    let err = Arch::Ia32
        .init_context(ENTRY, StackPointer::Destination(TOP), args, &stack)
        .unwrap_err();
    assert_eq!(err, KernelError::WordOverflow(0x1_0000_3000));
    assert_eq!(stack.u32_at(TOP - 20), 0, "nothing written on rejection");
}

#[test]
#[should_panic(expected = "not 16-byte aligned")]
fn misaligned_stack_pointer_is_rejected() {
    let stack = FlatStack::new();
    let _ = Arch::Aarch64.init_context(ENTRY, StackPointer::Destination(TOP - 8), EntryArgs::default(), &stack);
}

#[test]
#[should_panic(expected = "local stack pointer")]
fn misalignment_names_the_stack_view() {
    let stack = FlatStack::new();
    let _ = Arch::Ia32.init_context(ENTRY, StackPointer::Local(TOP - 4), EntryArgs::default(), &stack);
}

#[test]
fn started_ia32_thread_finds_its_frame_in_its_own_stack() {
    let kernel = Arc::new(SimKernel::new());
    let vspace = SimVSpace::new(kernel.clone());
    let env = ThreadEnv::new(&*kernel, &vspace, &*kernel).with_settings(ThreadSettings::new(Arch::Ia32));
    let mut thread = configure_passive_thread(&env, None, 1, kernel.mint_cap(), CapData::NULL).unwrap();
    thread.start(&env, ENTRY, ARG0, ARG1, true).unwrap();

    let top = thread.stack_top().unwrap();
    let ipc = thread.ipc_buffer_addr().unwrap();
    let regs = kernel.tcb(thread.tcb().unwrap()).and_then(|record| record.registers).unwrap();
    assert_eq!(regs.sp(), top - 24);

    let mut frame = [0u8; 12];
    vspace.read(top - 20, &mut frame).unwrap();
    let words: Vec<u32> = frame
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    assert_eq!(words, vec![ARG0 as u32, ARG1 as u32, ipc as u32]);

    thread.clean_up(&env);
    assert_eq!(kernel.live_objects(), 0);
}
