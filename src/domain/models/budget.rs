//! Immutable step and round-trip budget for the investigation loop.

use serde::{Deserialize, Serialize};

/// Remaining allowance of reasoning steps and tool round-trips before the
/// loop is forced to terminate.
///
/// The budget is a value, not a shared counter: each loop iteration spends
/// from its copy and threads the decremented value forward, so there is no
/// mutable counter mixed into the loop's business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub steps_remaining: u32,
    pub roundtrips_remaining: u32,
}

impl Budget {
    pub fn new(max_steps: u32, max_roundtrips: u32) -> Self {
        Self {
            steps_remaining: max_steps,
            roundtrips_remaining: max_roundtrips,
        }
    }

    /// Spend one reasoning step. Returns `None` when no steps remain.
    pub fn spend_step(self) -> Option<Self> {
        self.steps_remaining.checked_sub(1).map(|left| Self {
            steps_remaining: left,
            ..self
        })
    }

    /// Spend one tool round-trip. Returns `None` when no round-trips remain.
    pub fn spend_roundtrip(self) -> Option<Self> {
        self.roundtrips_remaining.checked_sub(1).map(|left| Self {
            roundtrips_remaining: left,
            ..self
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.steps_remaining == 0 || self.roundtrips_remaining == 0
    }
}
