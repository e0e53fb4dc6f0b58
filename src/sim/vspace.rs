// CLASSIFICATION: COMMUNITY
// Filename: vspace.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{trace, warn};

use super::{FailPoint, SimKernel, PAGE_SIZE};
use crate::error::KernelError;
use crate::sel4::{AddressSpace, ObjectAllocator};
use crate::types::{CPtr, KernelObject, ObjectKind, Word};

const PAGE: Word = PAGE_SIZE as Word;

/// First virtual address handed out. Below 4 GiB so 32-bit encodings can
/// be exercised.
const VADDR_BASE: Word = 0x1000_0000;

/// Default stack size in pages.
pub const DEFAULT_STACK_PAGES: usize = 4;

struct VSpaceState {
    next_vaddr: Word,
    /// Page base address to backing frame.
    pages: BTreeMap<Word, CPtr>,
    /// Stack top to the page bases it covers.
    stacks: BTreeMap<Word, Vec<Word>>,
    /// Pages mapped through `map_elsewhere`; their frames belong elsewhere.
    borrowed: BTreeSet<Word>,
}

impl VSpaceState {
    /// Reserve `pages` pages of address space preceded by one guard page.
    fn reserve(&mut self, pages: usize) -> Word {
        let base = self.next_vaddr + PAGE;
        self.next_vaddr = base + pages as Word * PAGE;
        base
    }
}

/// An address space whose pages are frames of a [`SimKernel`].
pub struct SimVSpace {
    kernel: Arc<SimKernel>,
    root: CPtr,
    stack_pages: usize,
    state: Mutex<VSpaceState>,
}

impl SimVSpace {
    pub fn new(kernel: Arc<SimKernel>) -> Self {
        Self::with_stack_pages(kernel, DEFAULT_STACK_PAGES)
    }

    pub fn with_stack_pages(kernel: Arc<SimKernel>, stack_pages: usize) -> Self {
        let root = kernel.mint_cap();
        SimVSpace {
            kernel,
            root,
            stack_pages,
            state: Mutex::new(VSpaceState {
                next_vaddr: VADDR_BASE,
                pages: BTreeMap::new(),
                stacks: BTreeMap::new(),
                borrowed: BTreeSet::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, VSpaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kernel(&self) -> &Arc<SimKernel> {
        &self.kernel
    }

    /// Number of pages currently mapped, stacks and borrowed views included.
    pub fn mapped_pages(&self) -> usize {
        self.state().pages.len()
    }

    pub fn live_stacks(&self) -> usize {
        self.state().stacks.len()
    }

    pub fn is_mapped(&self, addr: Word) -> bool {
        self.state().pages.contains_key(&(addr & !(PAGE - 1)))
    }

    fn release_frame(&self, frame: CPtr) {
        self.kernel.release(KernelObject {
            cptr: frame,
            kind: ObjectKind::Frame,
        });
    }

    /// Split `[addr, addr + len)` into per-page chunks and resolve each
    /// to a frame and offset.
    fn chunks(&self, addr: Word, len: usize) -> Result<Vec<(CPtr, usize, usize)>, KernelError> {
        let state = self.state();
        let mut chunks = Vec::new();
        let mut cursor = addr;
        let mut remaining = len;
        while remaining > 0 {
            let base = cursor & !(PAGE - 1);
            let offset = (cursor - base) as usize;
            let take = remaining.min(PAGE_SIZE - offset);
            let frame = *state.pages.get(&base).ok_or(KernelError::Unmapped(cursor))?;
            chunks.push((frame, offset, take));
            cursor += take as Word;
            remaining -= take;
        }
        Ok(chunks)
    }
}

impl AddressSpace for SimVSpace {
    fn root(&self) -> CPtr {
        self.root
    }

    fn map_new(&self, kind: ObjectKind) -> Result<(Word, CPtr), KernelError> {
        if self.kernel.take_failure(FailPoint::MapIpcBuffer) {
            return Err(KernelError::OutOfVirtualMemory);
        }
        let frame = self.kernel.allocate(kind)?;
        let mut state = self.state();
        let addr = state.reserve(1);
        state.pages.insert(addr, frame.cptr);
        trace!(target: "cohesix_thread::sim", "[sim] mapped {} 0x{:x} at 0x{addr:x}", kind.name(), frame.cptr);
        Ok((addr, frame.cptr))
    }

    fn unmap(&self, addr: Word, cap: CPtr) {
        let removed = self.state().pages.remove(&addr);
        if removed != Some(cap) {
            warn!(target: "cohesix_thread::sim", "[sim] unmap of 0x{addr:x} does not match cap 0x{cap:x}");
        }
        self.release_frame(cap);
    }

    fn new_stack(&self) -> Result<Word, KernelError> {
        if self.kernel.take_failure(FailPoint::AllocateStack) {
            return Err(KernelError::OutOfObjects(ObjectKind::Frame));
        }
        let mut frames = Vec::with_capacity(self.stack_pages);
        for _ in 0..self.stack_pages {
            match self.kernel.allocate(ObjectKind::Frame) {
                Ok(frame) => frames.push(frame.cptr),
                Err(err) => {
                    frames.into_iter().for_each(|frame| self.release_frame(frame));
                    return Err(err);
                }
            }
        }

        let mut state = self.state();
        let bottom = state.reserve(self.stack_pages);
        let mut bases = Vec::with_capacity(frames.len());
        for (index, frame) in frames.into_iter().enumerate() {
            let base = bottom + index as Word * PAGE;
            state.pages.insert(base, frame);
            bases.push(base);
        }
        let top = bottom + self.stack_pages as Word * PAGE;
        state.stacks.insert(top, bases);
        Ok(top)
    }

    fn free_stack(&self, stack_top: Word) {
        let frames: Vec<CPtr> = {
            let mut state = self.state();
            let Some(bases) = state.stacks.remove(&stack_top) else {
                warn!(target: "cohesix_thread::sim", "[sim] free of unknown stack 0x{stack_top:x}");
                return;
            };
            bases
                .iter()
                .filter_map(|base| state.pages.remove(base))
                .collect()
        };
        frames.into_iter().for_each(|frame| self.release_frame(frame));
    }

    fn stack_size(&self) -> usize {
        self.stack_pages * PAGE_SIZE
    }

    fn map_elsewhere(&self, frame: CPtr) -> Result<Word, KernelError> {
        if self.kernel.take_failure(FailPoint::MapElsewhere) {
            return Err(KernelError::OutOfVirtualMemory);
        }
        if !self.kernel.is_live(frame) {
            return Err(KernelError::InvalidCapability(frame));
        }
        let mut state = self.state();
        let addr = state.reserve(1);
        state.pages.insert(addr, frame);
        state.borrowed.insert(addr);
        Ok(addr)
    }

    fn unmap_elsewhere(&self, addr: Word) {
        let mut state = self.state();
        if state.borrowed.remove(&addr) {
            state.pages.remove(&addr);
        } else {
            warn!(target: "cohesix_thread::sim", "[sim] 0x{addr:x} is not a borrowed mapping");
        }
    }

    fn read(&self, addr: Word, buf: &mut [u8]) -> Result<(), KernelError> {
        let mut done = 0;
        for (frame, offset, len) in self.chunks(addr, buf.len())? {
            self.kernel.frame_read(frame, offset, &mut buf[done..done + len])?;
            done += len;
        }
        Ok(())
    }

    fn write(&self, addr: Word, bytes: &[u8]) -> Result<(), KernelError> {
        let mut done = 0;
        for (frame, offset, len) in self.chunks(addr, bytes.len())? {
            self.kernel.frame_write(frame, offset, &bytes[done..done + len])?;
            done += len;
        }
        Ok(())
    }
}
