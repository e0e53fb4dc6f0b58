// CLASSIFICATION: COMMUNITY
// Filename: types.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Kernel primitives shared by every thread helper: machine words,
//! capability pointers, object descriptors, message tags and
//! scheduling parameters.

use bitflags::bitflags;

/// Native kernel word. Wide enough for every supported architecture;
/// 32-bit targets only use the low half.
pub type Word = u64;

/// Capability pointer into a CSpace.
pub type CPtr = Word;

/// The null capability slot.
pub const NULL_CPTR: CPtr = 0;

/// Guard/badge data attached to a CNode capability when it is installed
/// as a thread's CSpace root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapData(pub Word);

impl CapData {
    /// Cap data carrying no guard.
    pub const NULL: CapData = CapData(0);

    /// Build guard data from a guard value and guard size in bits.
    pub const fn guard(guard: Word, guard_bits: u8) -> Self {
        CapData((guard << 6) | (guard_bits as Word & 0x3f))
    }
}

/// Kinds of kernel object the thread helpers allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Tcb,
    SchedContext,
    Endpoint,
    Frame,
}

impl ObjectKind {
    /// Short lowercase name used in log lines.
    pub const fn name(self) -> &'static str {
        match self {
            ObjectKind::Tcb => "tcb",
            ObjectKind::SchedContext => "sched-context",
            ObjectKind::Endpoint => "endpoint",
            ObjectKind::Frame => "frame",
        }
    }
}

/// A kernel object handed out by an [`crate::sel4::ObjectAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelObject {
    /// Capability referencing the object.
    pub cptr: CPtr,
    /// What kind of object the capability names.
    pub kind: ObjectKind,
}

/// Message tag delivered with every IPC, including fault messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageInfo {
    word: Word,
}

impl MessageInfo {
    #[inline(always)]
    pub const fn new(label: Word, caps_unwrapped: Word, extra_caps: Word, length: Word) -> Self {
        let mut value: Word = 0;
        value |= (label & 0x000f_ffff_ffff_ffff) << 12;
        value |= (caps_unwrapped & 0x7) << 9;
        value |= (extra_caps & 0x3) << 7;
        value |= length & 0x7f;
        Self { word: value }
    }

    /// Rebuild a tag from its raw word.
    #[inline(always)]
    pub const fn from_word(word: Word) -> Self {
        Self { word }
    }

    #[inline(always)]
    pub const fn word(self) -> Word {
        self.word
    }

    #[inline(always)]
    pub const fn label(self) -> Word {
        (self.word >> 12) & 0x000f_ffff_ffff_ffff
    }

    #[inline(always)]
    pub const fn caps_unwrapped(self) -> Word {
        (self.word >> 9) & 0x7
    }

    #[inline(always)]
    pub const fn extra_caps(self) -> Word {
        (self.word >> 7) & 0x3
    }

    #[inline(always)]
    pub const fn length(self) -> Word {
        self.word & 0x7f
    }
}

bitflags! {
    /// Scheduling-context mode bits applied through the scheduling control.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SchedMode: u32 {
        /// Budget is replenished on period boundaries rather than on use.
        const TIME_TRIGGERED = 1 << 0;
        /// Budget overruns raise a temporal fault instead of being absorbed.
        const HARD_BUDGET = 1 << 1;
    }
}

/// Real-time parameters used to populate a scheduling context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedParams {
    /// Replenishment period in microseconds.
    pub period: u64,
    /// Relative deadline in microseconds.
    pub deadline: u64,
    /// Budget per period in microseconds.
    pub budget: u64,
    pub mode: SchedMode,
}

impl SchedParams {
    /// Parameters where period, deadline and budget all equal `timeslice`,
    /// with hard, time-triggered budget enforcement.
    pub const fn timeslice(timeslice: u64) -> Self {
        Self {
            period: timeslice,
            deadline: timeslice,
            budget: timeslice,
            mode: SchedMode::TIME_TRIGGERED.union(SchedMode::HARD_BUDGET),
        }
    }
}
