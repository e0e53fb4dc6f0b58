// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

use crate::types::{CPtr, CapData, SchedParams};

/// Where a thread's scheduling context comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedBinding {
    /// Create a scheduling context owned by the thread and populate it
    /// with `params` through `sched_control`.
    Create {
        sched_control: CPtr,
        params: SchedParams,
    },
    /// Use a caller-supplied scheduling context, or none for a passive thread.
    Borrow(Option<CPtr>),
}

/// Requested properties of a thread. Consumed by
/// [`crate::thread::configure_thread_config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadConfig {
    pub fault_endpoint: Option<CPtr>,
    pub temporal_fault_endpoint: Option<CPtr>,
    pub priority: u8,
    /// Highest priority this thread may assign to itself or others.
    pub max_priority: u8,
    pub criticality: u32,
    /// Highest criticality this thread may assign to itself or others.
    pub max_criticality: u32,
    /// Root CNode of the thread's CSpace.
    pub cspace: CPtr,
    pub cspace_root_data: CapData,
    pub sched: SchedBinding,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            fault_endpoint: None,
            temporal_fault_endpoint: None,
            priority: 0,
            max_priority: 0,
            criticality: 0,
            max_criticality: 0,
            cspace: 0,
            cspace_root_data: CapData::NULL,
            sched: SchedBinding::Borrow(None),
        }
    }
}

impl ThreadConfig {
    pub fn new(cspace: CPtr, cspace_root_data: CapData) -> Self {
        Self {
            cspace,
            cspace_root_data,
            ..Self::default()
        }
    }

    pub fn fault_endpoint(mut self, endpoint: CPtr) -> Self {
        self.fault_endpoint = Some(endpoint);
        self
    }

    pub fn temporal_fault_endpoint(mut self, endpoint: CPtr) -> Self {
        self.temporal_fault_endpoint = Some(endpoint);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn max_priority(mut self, max_priority: u8) -> Self {
        self.max_priority = max_priority;
        self
    }

    pub fn criticality(mut self, criticality: u32) -> Self {
        self.criticality = criticality;
        self
    }

    pub fn max_criticality(mut self, max_criticality: u32) -> Self {
        self.max_criticality = max_criticality;
        self
    }

    pub fn create_sched_context(mut self, sched_control: CPtr, params: SchedParams) -> Self {
        self.sched = SchedBinding::Create {
            sched_control,
            params,
        };
        self
    }

    pub fn borrow_sched_context(mut self, sched_context: Option<CPtr>) -> Self {
        self.sched = SchedBinding::Borrow(sched_context);
        self
    }

    /// Whether configuring will create a scheduling context.
    pub fn creates_sched_context(&self) -> bool {
        matches!(self.sched, SchedBinding::Create { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchedMode;

    #[test]
    fn defaults_are_passive_and_unprivileged() {
        let config = ThreadConfig::default();
        assert_eq!(config.sched, SchedBinding::Borrow(None));
        assert!(!config.creates_sched_context());
        assert_eq!(config.fault_endpoint, None);
        assert_eq!((config.priority, config.max_priority), (0, 0));
    }

    #[test]
    fn builder_sets_fields() {
        let config = ThreadConfig::new(0x2, CapData::guard(0, 52))
            .fault_endpoint(0x10)
            .temporal_fault_endpoint(0x11)
            .priority(100)
            .max_priority(120)
            .criticality(1)
            .max_criticality(2)
            .create_sched_context(0x20, SchedParams::timeslice(500));
        assert_eq!(config.fault_endpoint, Some(0x10));
        assert_eq!(config.temporal_fault_endpoint, Some(0x11));
        assert_eq!(config.max_priority, 120);
        assert!(config.creates_sched_context());
        match config.sched {
            SchedBinding::Create { params, .. } => {
                assert_eq!(params.mode, SchedMode::TIME_TRIGGERED | SchedMode::HARD_BUDGET)
            }
            other => panic!("unexpected binding {other:?}"),
        }
    }
}
