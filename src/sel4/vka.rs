// CLASSIFICATION: COMMUNITY
// Filename: vka.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use crate::error::KernelError;
use crate::types::{KernelObject, ObjectKind};

/// Kernel object allocator.
pub trait ObjectAllocator {
    /// Retype a fresh object of `kind` and return a capability to it.
    fn allocate(&self, kind: ObjectKind) -> Result<KernelObject, KernelError>;

    /// Revoke and delete `object`, returning its memory.
    fn release(&self, object: KernelObject);
}
