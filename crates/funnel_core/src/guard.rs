use std::sync::Arc;

use shared::steps::FIRST_STEP;

use crate::FunnelStore;

/// Outcome of a guard evaluation. The guard only decides; acting on the
/// verdict is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAccess {
    /// Saved progress has not loaded yet. Deciding now could bounce a
    /// returning visitor whose completed steps are still on disk.
    Pending,
    Allowed,
    Denied { redirect_to: u32 },
}

/// Enforces the linear-progression rule at the presentation boundary.
pub struct StepGuard {
    store: Arc<FunnelStore>,
}

impl StepGuard {
    pub fn new(store: Arc<FunnelStore>) -> Self {
        Self { store }
    }

    /// Re-evaluated from scratch on every navigation; verdicts are never
    /// cached across steps. Never mutates the store.
    pub async fn evaluate(&self, step: u32) -> StepAccess {
        let (hydrated, allowed) = self.store.access_view(step).await;
        if !hydrated {
            return StepAccess::Pending;
        }
        if allowed {
            StepAccess::Allowed
        } else {
            StepAccess::Denied {
                redirect_to: FIRST_STEP,
            }
        }
    }
}
