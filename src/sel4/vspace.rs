// CLASSIFICATION: COMMUNITY
// Filename: vspace.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use crate::error::KernelError;
use crate::types::{CPtr, ObjectKind, Word};

/// Virtual address space manager.
///
/// Addresses passed to and returned from these methods are in this
/// address space's own view.
pub trait AddressSpace {
    /// Root paging-structure capability of this address space.
    fn root(&self) -> CPtr;

    /// Allocate a page-sized object of `kind` and map it. Returns the
    /// virtual address and the capability backing the mapping.
    fn map_new(&self, kind: ObjectKind) -> Result<(Word, CPtr), KernelError>;

    /// Undo [`AddressSpace::map_new`] and free the backing object.
    fn unmap(&self, addr: Word, cap: CPtr);

    /// Reserve and map a stack. Returns the (exclusive) top address.
    fn new_stack(&self) -> Result<Word, KernelError>;

    /// Unmap a stack previously returned by [`AddressSpace::new_stack`].
    fn free_stack(&self, stack_top: Word);

    /// Usable bytes in every stack this address space hands out.
    fn stack_size(&self) -> usize;

    /// Map a frame that already backs a mapping elsewhere into this
    /// address space. Returns the local address of the new view.
    fn map_elsewhere(&self, frame: CPtr) -> Result<Word, KernelError>;

    /// Remove a view created by [`AddressSpace::map_elsewhere`].
    fn unmap_elsewhere(&self, addr: Word);

    /// Copy `buf.len()` bytes starting at `addr` out of this address space.
    fn read(&self, addr: Word, buf: &mut [u8]) -> Result<(), KernelError>;

    /// Copy `bytes` into this address space starting at `addr`.
    fn write(&self, addr: Word, bytes: &[u8]) -> Result<(), KernelError>;
}
