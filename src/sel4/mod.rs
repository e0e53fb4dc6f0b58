// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Collaborator interfaces consumed by the thread helpers.
//!
//! The helpers never touch the kernel directly. Object allocation goes
//! through [`ObjectAllocator`], virtual memory through [`AddressSpace`],
//! invocations through [`Kernel`] and fault delivery through
//! [`FaultReceiver`]. All methods take `&self`: collaborators are shared
//! between many threads and keep whatever interior state they need.

pub mod syscall;
pub mod vka;
pub mod vspace;

pub use syscall::{FaultReceiver, IpcMessage, Kernel, TcbConfiguration};
pub use vka::ObjectAllocator;
pub use vspace::AddressSpace;

use crate::config::ThreadSettings;
use crate::diagnostics::{DiagnosticSink, LogSink};

/// Everything a thread operation needs: the allocator and vspace the
/// thread's resources come from, the kernel, an optional parent vspace
/// and a diagnostics sink.
#[derive(Clone, Copy)]
pub struct ThreadEnv<'a> {
    pub vka: &'a dyn ObjectAllocator,
    /// Address space the thread runs in; stacks and IPC buffers live here.
    pub vspace: &'a dyn AddressSpace,
    /// Address space of the configuring caller, when it differs from
    /// `vspace`. Used for temporary mappings of the thread's IPC buffer.
    pub parent: Option<&'a dyn AddressSpace>,
    pub kernel: &'a dyn Kernel,
    pub sink: &'a dyn DiagnosticSink,
    pub settings: ThreadSettings,
}

impl<'a> ThreadEnv<'a> {
    /// Environment for threads that share the caller's address space,
    /// reporting through the `log` facade.
    pub fn new(
        vka: &'a dyn ObjectAllocator,
        vspace: &'a dyn AddressSpace,
        kernel: &'a dyn Kernel,
    ) -> Self {
        Self {
            vka,
            vspace,
            parent: None,
            kernel,
            sink: &LogSink,
            settings: ThreadSettings::default(),
        }
    }

    pub fn with_parent(mut self, parent: &'a dyn AddressSpace) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_settings(mut self, settings: ThreadSettings) -> Self {
        self.settings = settings;
        self
    }
}
