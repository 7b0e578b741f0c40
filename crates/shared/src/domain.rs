use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::steps::{FIRST_STEP, LAST_STEP};

/// A visitor's progress through the funnel.
///
/// This struct is serialized verbatim as the persisted payload, so the
/// camelCase field names below are part of the on-disk layout. There is no
/// version field; a payload that no longer matches the shape is discarded in
/// favor of defaults during hydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelState {
    /// Last step the visitor was on. Advisory only, never enforced.
    pub current_step: u32,
    pub points: u32,
    pub selected_goal: Option<String>,
    pub selected_investment: Option<String>,
    pub completed_steps: BTreeSet<u32>,
}

impl Default for FunnelState {
    fn default() -> Self {
        Self {
            current_step: FIRST_STEP,
            points: 0,
            selected_goal: None,
            selected_investment: None,
            completed_steps: BTreeSet::new(),
        }
    }
}

impl FunnelState {
    pub fn is_step_completed(&self, step: u32) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Linear progression rule: step 1 is always reachable, any later step
    /// requires its predecessor to be completed.
    pub fn can_access_step(&self, step: u32) -> bool {
        match step {
            0 => false,
            FIRST_STEP => true,
            later => self.completed_steps.contains(&(later - 1)),
        }
    }

    pub fn highest_completed_step(&self) -> Option<u32> {
        self.completed_steps.iter().next_back().copied()
    }

    /// First step the visitor has not finished yet, capped at the last step.
    pub fn resume_step(&self) -> u32 {
        (FIRST_STEP..=LAST_STEP)
            .find(|step| !self.completed_steps.contains(step))
            .unwrap_or(LAST_STEP)
    }
}
