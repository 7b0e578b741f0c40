use super::*;

use anyhow::anyhow;
use std::sync::atomic::{AtomicUsize, Ordering};
use storage::Storage;

/// In-memory persistence double that records what the store writes.
#[derive(Default)]
pub(crate) struct MemoryPersistence {
    saved: Mutex<Option<FunnelState>>,
    clear_calls: AtomicUsize,
}

impl MemoryPersistence {
    pub(crate) fn with_saved(state: FunnelState) -> Self {
        Self {
            saved: Mutex::new(Some(state)),
            clear_calls: AtomicUsize::new(0),
        }
    }

    async fn saved_state(&self) -> Option<FunnelState> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl StatePersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<FunnelState>> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, state: &FunnelState) -> Result<()> {
        *self.saved.lock().await = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        *self.saved.lock().await = None;
        Ok(())
    }
}

/// Persistence double whose every operation fails, simulating an
/// unavailable backend.
struct FailingPersistence;

#[async_trait]
impl StatePersistence for FailingPersistence {
    async fn load(&self) -> Result<Option<FunnelState>> {
        Err(anyhow!("storage unavailable"))
    }

    async fn save(&self, _state: &FunnelState) -> Result<()> {
        Err(anyhow!("storage unavailable"))
    }

    async fn clear(&self) -> Result<()> {
        Err(anyhow!("storage unavailable"))
    }
}

#[tokio::test]
async fn step_one_is_accessible_from_default_state() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;
    assert!(store.can_access_step(1).await);
    assert!(!store.can_access_step(2).await);
}

#[tokio::test]
async fn gating_requires_the_predecessor_step() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;
    store.complete_step(1).await.expect("complete 1");
    store.complete_step(2).await.expect("complete 2");

    assert!(store.can_access_step(3).await);
    assert!(!store.can_access_step(4).await);
    assert!(!store.can_access_step(0).await);
}

#[tokio::test]
async fn complete_step_is_idempotent() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;
    store.complete_step(3).await.expect("first");
    let state = store.complete_step(3).await.expect("second");

    assert_eq!(state.completed_steps.iter().filter(|s| **s == 3).count(), 1);
    assert_eq!(state.completed_steps.len(), 1);
}

#[tokio::test]
async fn points_accumulate_and_never_wrap() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;

    store.add_points(50).await;
    let state = store.add_points(115).await;
    assert_eq!(state.points, 165);

    let state = store.add_points(u32::MAX).await;
    assert_eq!(state.points, u32::MAX);
}

#[tokio::test]
async fn selections_overwrite_previous_values() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;

    store.set_selected_goal("extra").await;
    let state = store.set_selected_goal("business").await;
    assert_eq!(state.selected_goal.as_deref(), Some("business"));

    let state = store.set_selected_investment("medium").await;
    assert_eq!(state.selected_investment.as_deref(), Some("medium"));
}

#[tokio::test]
async fn out_of_range_steps_are_rejected_and_leave_state_untouched() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    store.hydrate().await;
    let before = store.state().await;

    assert!(matches!(
        store.complete_step(0).await,
        Err(FunnelError::StepOutOfRange { step: 0, .. })
    ));
    assert!(matches!(
        store.complete_step(18).await,
        Err(FunnelError::StepOutOfRange { step: 18, .. })
    ));
    assert!(matches!(
        store.set_current_step(0).await,
        Err(FunnelError::StepOutOfRange { step: 0, .. })
    ));

    assert_eq!(store.state().await, before);
}

#[tokio::test]
async fn every_mutation_persists_the_full_snapshot() {
    let persistence = Arc::new(MemoryPersistence::default());
    let store = FunnelStore::new(persistence.clone());
    store.hydrate().await;

    store.complete_step(1).await.expect("complete");
    store.add_points(50).await;
    store.set_current_step(2).await.expect("current step");

    let saved = persistence.saved_state().await.expect("persisted copy");
    assert_eq!(saved, store.state().await);
    assert_eq!(saved.points, 50);
    assert_eq!(saved.current_step, 2);
    assert!(saved.is_step_completed(1));
}

#[tokio::test]
async fn hydrate_restores_the_saved_snapshot_once() {
    let mut saved = FunnelState::default();
    saved.current_step = 5;
    saved.points = 165;
    saved.completed_steps.extend([1, 2, 3, 4]);

    let store = FunnelStore::new(Arc::new(MemoryPersistence::with_saved(saved.clone())));
    assert!(!store.is_hydrated().await);

    let state = store.hydrate().await;
    assert!(store.is_hydrated().await);
    assert_eq!(state, saved);

    // A second hydrate must not clobber progress made since the first.
    store.add_points(50).await;
    let state = store.hydrate().await;
    assert_eq!(state.points, 215);
}

#[tokio::test]
async fn round_trips_through_sqlite_across_store_instances() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let persistence: Arc<dyn StatePersistence> = Arc::new(storage.clone());

    let store = FunnelStore::new(persistence.clone());
    store.hydrate().await;
    store.set_current_step(5).await.expect("current step");
    store.add_points(165).await;
    store.set_selected_goal("business").await;
    store.set_selected_investment("medium").await;
    for step in 1..=4 {
        store.complete_step(step).await.expect("complete");
    }
    let written = store.state().await;

    let reloaded = FunnelStore::new(Arc::new(storage));
    let state = reloaded.hydrate().await;
    assert_eq!(state, written);
    assert!(reloaded.can_access_step(5).await);
    assert!(!reloaded.can_access_step(6).await);
}

#[tokio::test]
async fn corrupt_persisted_payload_falls_back_to_defaults() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.save_raw_payload("{broken").await.expect("raw save");

    let store = FunnelStore::new(Arc::new(storage));
    let state = store.hydrate().await;

    assert_eq!(state, FunnelState::default());
    assert_eq!(state.points, 0);
    assert!(state.completed_steps.is_empty());
}

#[tokio::test]
async fn unavailable_storage_still_yields_a_working_store() {
    let store = FunnelStore::new(Arc::new(FailingPersistence));
    let state = store.hydrate().await;
    assert_eq!(state, FunnelState::default());

    // Mutations keep working against the in-memory state.
    store.complete_step(1).await.expect("complete");
    let state = store.add_points(50).await;
    assert_eq!(state.points, 50);
    assert!(store.can_access_step(2).await);
}

#[tokio::test]
async fn reset_restores_defaults_and_clears_the_persisted_copy() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let store = FunnelStore::new(Arc::new(storage.clone()));
    store.hydrate().await;
    for step in 1..=5 {
        store.complete_step(step).await.expect("complete");
    }
    store.add_points(200).await;
    store.set_selected_goal("x").await;

    let state = store.reset().await;
    assert_eq!(state, FunnelState::default());

    // A fresh store over the same database must also come up empty.
    let fresh = FunnelStore::new(Arc::new(storage));
    assert_eq!(fresh.hydrate().await, FunnelState::default());
}

#[tokio::test]
async fn reset_clears_through_the_persistence_seam() {
    let persistence = Arc::new(MemoryPersistence::default());
    let store = FunnelStore::new(persistence.clone());
    store.hydrate().await;
    store.complete_step(1).await.expect("complete");

    store.reset().await;

    assert_eq!(persistence.clear_calls.load(Ordering::SeqCst), 1);
    assert!(persistence.saved_state().await.is_none());
}

#[tokio::test]
async fn subscribers_receive_the_full_snapshot_on_every_change() {
    let store = FunnelStore::new(Arc::new(MemoryPersistence::default()));
    let mut events = store.subscribe();

    store.hydrate().await;
    let FunnelEvent::StateChanged(snapshot) = events.recv().await.expect("hydration event");
    assert_eq!(snapshot, FunnelState::default());

    store.add_points(50).await;
    let FunnelEvent::StateChanged(snapshot) = events.recv().await.expect("mutation event");
    assert_eq!(snapshot.points, 50);
}
