// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Date Modified: 2026-10-17
// Author: Lukas Bower

//! Thread helpers for capability-based microkernels.
//!
//! A thread is built from a TCB, an IPC buffer page, a stack and an
//! optional scheduling context. This crate acquires those resources with
//! rollback on partial failure, encodes the initial register file for each
//! supported architecture, snapshots and restores running threads, and
//! starts one-shot fault reporter threads.

/// Kernel primitives (words, capabilities, message tags, scheduling parameters)
pub mod types;

/// Error taxonomy
pub mod error;

/// Runtime settings
pub mod config;

/// Diagnostics sink
pub mod diagnostics;

/// Collaborator interfaces: allocator, address space, kernel, fault delivery
pub mod sel4;

/// Per-architecture register encoding
pub mod arch;

/// Thread configuration and lifecycle
pub mod thread;

/// Checkpoint and restore
pub mod checkpoint;

/// Fault decoding and the fault reporter
pub mod fault;

/// Simulated kernel used by tests and benchmarks
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use arch::{Arch, UserContext};
pub use checkpoint::Checkpoint;
pub use config::ThreadSettings;
pub use error::{ConfigureStep, KernelError, ThreadError, ThreadResult};
pub use fault::{start_fault_handler, Fault};
pub use sel4::ThreadEnv;
pub use thread::{
    configure_passive_thread, configure_thread, configure_thread_config, Thread, ThreadConfig,
    ThreadState,
};
