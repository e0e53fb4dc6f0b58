// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Host-side simulation of the kernel collaborators.
//!
//! [`SimKernel`] stands in for the object allocator, the kernel
//! invocations and fault endpoints; [`SimVSpace`] provides address spaces
//! whose pages are backed by the kernel's frames. Failures can be armed at
//! every point the thread helpers call out, and both types expose counts
//! of what is still allocated so tests can check for leaks.

mod kernel;
mod vspace;

pub use kernel::{SimKernel, TcbRecord};
pub use vspace::{SimVSpace, DEFAULT_STACK_PAGES};

use crate::error::ConfigureStep;

/// Size of every simulated page and frame.
pub const PAGE_SIZE: usize = 4096;

/// A call that can be made to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailPoint {
    AllocateTcb,
    MapIpcBuffer,
    AllocateSchedContext,
    ConfigureSchedContext,
    ConfigureTcb,
    AllocateStack,
    MapElsewhere,
    ReadRegisters,
    WriteRegisters,
    Suspend,
    Resume,
}

impl FailPoint {
    /// The fail point that makes configuration stop at `step`.
    pub fn for_step(step: ConfigureStep) -> FailPoint {
        match step {
            ConfigureStep::AllocateTcb => FailPoint::AllocateTcb,
            ConfigureStep::MapIpcBuffer => FailPoint::MapIpcBuffer,
            ConfigureStep::SchedContext => FailPoint::ConfigureSchedContext,
            ConfigureStep::ConfigureTcb => FailPoint::ConfigureTcb,
            ConfigureStep::AllocateStack => FailPoint::AllocateStack,
        }
    }
}
