// crates/provisioner-core/src/runtime/backoff.rs
// ============================================================================
// Module: Provisioner Poll Backoff
// Description: Capped exponential backoff for job status polling.
// Purpose: Bound the polling cost of blocking waits.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Waiting on a job polls its record with delays that start at
//! [`PollPolicy::initial`], grow by [`PollPolicy::multiplier`], and never
//! exceed [`PollPolicy::max`]. The caller's context bounds the total wait.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Default first polling delay.
pub const DEFAULT_POLL_INITIAL: Duration = Duration::from_millis(500);
/// Default maximum polling delay.
pub const DEFAULT_POLL_MAX: Duration = Duration::from_secs(10);
/// Default growth factor between polls.
pub const DEFAULT_POLL_MULTIPLIER: u32 = 2;

/// Polling delays used while waiting on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// First delay.
    pub initial: Duration,
    /// Delay cap.
    pub max: Duration,
    /// Growth factor applied after each poll.
    pub multiplier: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_POLL_INITIAL,
            max: DEFAULT_POLL_MAX,
            multiplier: DEFAULT_POLL_MULTIPLIER,
        }
    }
}

impl PollPolicy {
    /// Returns a fresh delay sequence.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial,
            max: self.max,
            multiplier: self.multiplier,
        }
    }
}

// ============================================================================
// SECTION: Backoff
// ============================================================================

/// Infinite iterator of polling delays.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Delay returned next.
    next: Duration,
    /// Delay cap.
    max: Duration,
    /// Growth factor.
    multiplier: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.min(self.max);
        self.next = current.saturating_mul(self.multiplier.max(1)).min(self.max);
        Some(current)
    }
}
