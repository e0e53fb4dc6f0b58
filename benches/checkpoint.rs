use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use cohesix_thread::sel4::{AddressSpace, Kernel};
use cohesix_thread::sim::{SimKernel, SimVSpace};
use cohesix_thread::types::{CapData, Word};
use cohesix_thread::{configure_passive_thread, Arch, Checkpoint, Thread, ThreadEnv, ThreadSettings};

const LIVE_STACK: Word = 0x1000;

fn started_thread(kernel: &SimKernel, vspace: &SimVSpace) -> Thread {
    let env = ThreadEnv::new(kernel, vspace, kernel).with_settings(ThreadSettings::new(Arch::Aarch64));
    let mut thread = configure_passive_thread(&env, None, 10, kernel.mint_cap(), CapData::NULL).unwrap();
    thread.start(&env, 0x40_0000, 0, 0, true).unwrap();

    let top = thread.stack_top().unwrap();
    let tcb = thread.tcb().unwrap();
    let mut regs = kernel.read_registers(tcb, Arch::Aarch64).unwrap();
    regs.set_sp(top - LIVE_STACK);
    kernel.write_registers(tcb, true, &regs).unwrap();
    vspace.write(top - LIVE_STACK, &vec![0x5a; LIVE_STACK as usize]).unwrap();
    thread
}

fn bench_checkpoint(c: &mut Criterion) {
    let kernel = Arc::new(SimKernel::new());
    let vspace = SimVSpace::new(kernel.clone());
    let env = ThreadEnv::new(&*kernel, &vspace, &*kernel).with_settings(ThreadSettings::new(Arch::Aarch64));
    let mut thread = started_thread(&kernel, &vspace);

    c.bench_function("checkpoint_capture", |b| {
        b.iter(|| Checkpoint::capture(&env, &thread).unwrap());
    });

    let mut checkpoint = Checkpoint::capture(&env, &thread).unwrap();
    c.bench_function("checkpoint_restore", |b| {
        b.iter(|| checkpoint.restore(&env, &mut thread, false).unwrap());
    });
}

criterion_group!(benches, bench_checkpoint);
criterion_main!(benches);
