use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{domain::FunnelState, error::FunnelError, steps::is_valid_step};
use storage::Storage;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

mod guard;
pub use guard::{StepAccess, StepGuard};

/// Durable backend the store persists through. `load` distinguishes "nothing
/// saved yet" (`Ok(None)`) from "saved but unreadable" (`Err`); the store
/// treats both as acceptable loss.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    async fn load(&self) -> Result<Option<FunnelState>>;
    async fn save(&self, state: &FunnelState) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl StatePersistence for Storage {
    async fn load(&self) -> Result<Option<FunnelState>> {
        self.load_funnel_state().await
    }

    async fn save(&self, state: &FunnelState) -> Result<()> {
        self.save_funnel_state(state).await
    }

    async fn clear(&self) -> Result<()> {
        self.clear_funnel_state().await
    }
}

#[derive(Debug, Clone)]
pub enum FunnelEvent {
    /// Full snapshot, broadcast after hydration and after every mutation.
    StateChanged(FunnelState),
}

struct StoreInner {
    state: FunnelState,
    hydrated: bool,
}

/// Single source of truth for visitor progress.
///
/// Constructed once at application start and passed around explicitly
/// (`Arc`); there is no ambient global instance. The store starts out with
/// default state and an un-hydrated flag. Callers run
/// [`FunnelStore::hydrate`] before trusting the snapshot, and the guard
/// reports [`StepAccess::Pending`] until that has happened.
pub struct FunnelStore {
    persistence: Arc<dyn StatePersistence>,
    inner: Mutex<StoreInner>,
    events: broadcast::Sender<FunnelEvent>,
}

impl FunnelStore {
    pub fn new(persistence: Arc<dyn StatePersistence>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            persistence,
            inner: Mutex::new(StoreInner {
                state: FunnelState::default(),
                hydrated: false,
            }),
            events,
        })
    }

    /// Builds a store backed by the SQLite database at `database_url`.
    pub async fn open(database_url: &str) -> Result<Arc<Self>> {
        let storage = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to open funnel storage at '{database_url}'"))?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// Loads the persisted snapshot into the store. A missing or unreadable
    /// payload leaves the defaults in place; the visitor restarts at step 1
    /// instead of seeing an error. Calling this again after the first load
    /// is a no-op that returns the current snapshot.
    pub async fn hydrate(&self) -> FunnelState {
        let mut inner = self.inner.lock().await;
        if inner.hydrated {
            return inner.state.clone();
        }
        match self.persistence.load().await {
            Ok(Some(state)) => {
                info!(
                    current_step = state.current_step,
                    points = state.points,
                    "restored saved funnel progress"
                );
                inner.state = state;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("discarding unreadable funnel state: {err:#}");
            }
        }
        inner.hydrated = true;
        let snapshot = inner.state.clone();
        drop(inner);
        let _ = self.events.send(FunnelEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    pub async fn is_hydrated(&self) -> bool {
        self.inner.lock().await.hydrated
    }

    pub async fn state(&self) -> FunnelState {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FunnelEvent> {
        self.events.subscribe()
    }

    /// Overwrites `current_step` without checking it against completed steps;
    /// only the funnel range itself is validated.
    pub async fn set_current_step(&self, step: u32) -> Result<FunnelState, FunnelError> {
        if !is_valid_step(step) {
            return Err(FunnelError::step_out_of_range(step));
        }
        Ok(self.mutate(|state| state.current_step = step).await)
    }

    /// Points only ever grow; the addition saturates rather than wrapping.
    pub async fn add_points(&self, amount: u32) -> FunnelState {
        self.mutate(|state| state.points = state.points.saturating_add(amount))
            .await
    }

    pub async fn set_selected_goal(&self, goal: impl Into<String>) -> FunnelState {
        let goal = goal.into();
        self.mutate(move |state| state.selected_goal = Some(goal))
            .await
    }

    pub async fn set_selected_investment(&self, investment: impl Into<String>) -> FunnelState {
        let investment = investment.into();
        self.mutate(move |state| state.selected_investment = Some(investment))
            .await
    }

    /// Idempotent: completing an already-completed step changes nothing.
    pub async fn complete_step(&self, step: u32) -> Result<FunnelState, FunnelError> {
        if !is_valid_step(step) {
            return Err(FunnelError::step_out_of_range(step));
        }
        Ok(self
            .mutate(move |state| {
                state.completed_steps.insert(step);
            })
            .await)
    }

    pub async fn can_access_step(&self, step: u32) -> bool {
        self.inner.lock().await.state.can_access_step(step)
    }

    /// Restores defaults and deletes the persisted copy. Used after a
    /// successful checkout.
    pub async fn reset(&self) -> FunnelState {
        let mut inner = self.inner.lock().await;
        inner.state = FunnelState::default();
        inner.hydrated = true;
        let snapshot = inner.state.clone();
        if let Err(err) = self.persistence.clear().await {
            warn!("failed to clear persisted funnel state: {err:#}");
        }
        drop(inner);
        let _ = self.events.send(FunnelEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    pub(crate) async fn access_view(&self, step: u32) -> (bool, bool) {
        let inner = self.inner.lock().await;
        (inner.hydrated, inner.state.can_access_step(step))
    }

    /// Applies the mutation and persists the result before notifying
    /// subscribers. The lock is held across the persist so a
    /// mutation-then-persist sequence always runs to completion before the
    /// next one starts. A failed write is logged and swallowed; the
    /// in-memory state stays authoritative for this session.
    async fn mutate(&self, apply: impl FnOnce(&mut FunnelState)) -> FunnelState {
        let mut inner = self.inner.lock().await;
        apply(&mut inner.state);
        let snapshot = inner.state.clone();
        if let Err(err) = self.persistence.save(&snapshot).await {
            warn!("failed to persist funnel state: {err:#}");
        }
        drop(inner);
        let _ = self.events.send(FunnelEvent::StateChanged(snapshot.clone()));
        snapshot
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
