// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Build-time style settings for the thread helpers.
//!
//! Defaults follow the host architecture and the stock kernel timer
//! configuration; `from_env` lets test rigs and simulators override them.

use std::env;

use log::warn;

use crate::arch::Arch;

const US_IN_MS: u64 = 1_000;

/// Settings shared by every thread configured through a [`crate::ThreadEnv`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadSettings {
    /// Register encoding used for initial contexts and fault layouts.
    pub arch: Arch,
    /// Kernel timer tick in milliseconds.
    pub timer_tick_ms: u64,
    /// Ticks per time slice.
    pub time_slice: u64,
}

impl Default for ThreadSettings {
    fn default() -> Self {
        Self {
            arch: Arch::host(),
            timer_tick_ms: 2,
            time_slice: 5,
        }
    }
}

impl ThreadSettings {
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            ..Self::default()
        }
    }

    /// Length of one time slice in microseconds, saturating at `u64::MAX`.
    pub fn timeslice_us(&self) -> u64 {
        self.checked_timeslice_us().unwrap_or(u64::MAX)
    }

    fn checked_timeslice_us(&self) -> Option<u64> {
        self.timer_tick_ms
            .checked_mul(self.time_slice)?
            .checked_mul(US_IN_MS)
    }

    /// Defaults overridden by `COHESIX_THREAD_ARCH`, `COHESIX_TIMER_TICK_MS`
    /// and `COHESIX_TIME_SLICE`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(raw) = lookup("COHESIX_THREAD_ARCH") {
            match raw.parse::<Arch>() {
                Ok(arch) => settings.arch = arch,
                Err(_) => warn!(target: "cohesix_thread::config", "ignoring COHESIX_THREAD_ARCH={raw:?}: unknown architecture"),
            }
        }
        if let Some(tick) = parse_u64(&lookup, "COHESIX_TIMER_TICK_MS") {
            settings.timer_tick_ms = tick;
        }
        if let Some(slice) = parse_u64(&lookup, "COHESIX_TIME_SLICE") {
            settings.time_slice = slice;
        }
        if settings.checked_timeslice_us().is_none() {
            warn!(
                target: "cohesix_thread::config",
                "ignoring timer overrides: {}ms x {} ticks overflows the time slice",
                settings.timer_tick_ms,
                settings.time_slice,
            );
            let defaults = Self::default();
            settings.timer_tick_ms = defaults.timer_tick_ms;
            settings.time_slice = defaults.time_slice;
        }
        settings
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(target: "cohesix_thread::config", "ignoring {key}={raw:?}: expected a positive integer");
            None
        }
    }
}
