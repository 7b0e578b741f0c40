use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use funnel_core::{FunnelEvent, FunnelStore, StepAccess, StepGuard};
use shared::steps::LAST_STEP;
use tracing::info;

mod config;
mod screens;

#[derive(Parser, Debug)]
struct Args {
    /// SQLite database holding saved funnel progress.
    #[arg(long)]
    database_url: Option<String>,
    /// Wipe saved progress and start from step 1.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let settings = config::load_settings();
    let database_url = config::normalize_database_url(
        args.database_url.as_deref().unwrap_or(&settings.database_url),
    );

    let store = FunnelStore::open(&database_url).await?;
    spawn_points_badge(&store);

    println!("Carregando seu progresso...");
    let mut state = store.hydrate().await;
    if args.reset {
        state = store.reset().await;
    }

    let guard = StepGuard::new(store.clone());
    let mut target = state.resume_step();
    if target > 1 {
        info!(step = target, "resuming saved progress");
    }

    loop {
        match guard.evaluate(target).await {
            StepAccess::Pending => {
                // Saved progress still loading; keep the gate up.
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            StepAccess::Denied { redirect_to } => {
                info!(requested = target, "step locked, redirecting");
                target = redirect_to;
            }
            StepAccess::Allowed => {
                store.set_current_step(target).await?;
                screens::play_step(&store, target).await?;
                if target == LAST_STEP {
                    break;
                }
                target += 1;
            }
        }
    }

    // The checkout stage is gated by the same rule as the last step.
    if let StepAccess::Allowed = guard.evaluate(LAST_STEP).await {
        screens::play_checkout(&store).await?;
        println!();
        println!("Até a próxima!");
    }

    Ok(())
}

/// Points-badge analog: watches the store and announces every gain.
fn spawn_points_badge(store: &Arc<FunnelStore>) {
    let mut events = store.subscribe();
    let mut last_points = 0u32;
    tokio::spawn(async move {
        while let Ok(FunnelEvent::StateChanged(state)) = events.recv().await {
            if state.points > last_points {
                println!("✨ +{} pontos (total: {})", state.points - last_points, state.points);
            }
            last_points = state.points;
        }
    });
}
