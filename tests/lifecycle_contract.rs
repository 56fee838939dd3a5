//! Architectural contract test: plugin activation lifecycle.
//!
//! Constraints verified:
//! - Listing manifests never triggers a load
//! - Loader and on_load run at most once per sport for the process lifetime
//! - The outgoing plugin deactivates to completion before the incoming
//!   plugin loads or activates
//! - Re-activating the active sport re-runs no hooks
//! - A superseded activation resolves without taking the active slot
//! - Shutdown deactivates the active plugin, then unloads every loaded one
//!
//! If this file fails, someone has reordered the lifecycle, started
//! aborting in-flight activations, or let stale activations write state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::FutureExt;
use semver::{Version, VersionReq};
use tokio::sync::Semaphore;

use scorehub::models::{
    CelebrationType, Game, GameDetails, PluginManifest, ScoreChange, SportId,
};
use scorehub::{FetchError, SportAdapter, SportPlugin, SportRegistry};

struct NullAdapter;

#[async_trait]
impl SportAdapter for NullAdapter {
    async fn fetch_scoreboard(&self) -> Result<Vec<Game>, FetchError> {
        Ok(Vec::new())
    }

    async fn fetch_game_details(&self, game_id: &str) -> Result<GameDetails, FetchError> {
        Err(FetchError::UnknownGame(game_id.to_string()))
    }

    fn detect_score_change(
        &self,
        _prev_home: u32,
        _prev_away: u32,
        _new_home: u32,
        _new_away: u32,
        _game: &Game,
    ) -> Option<ScoreChange> {
        None
    }

    fn period_name(&self, period: u8) -> String {
        format!("Period {}", period)
    }

    fn competition_name(&self, _game: &Game) -> String {
        "Test".into()
    }

    fn celebration_types(&self) -> &[CelebrationType] {
        &[]
    }
}

struct RecordingPlugin {
    manifest: PluginManifest,
    adapter: NullAdapter,
    log: Arc<Mutex<Vec<String>>>,
    activate_gate: Option<Arc<Semaphore>>,
}

impl RecordingPlugin {
    fn push(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.manifest.id, event));
    }
}

#[async_trait]
impl SportPlugin for RecordingPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn adapter(&self) -> &dyn SportAdapter {
        &self.adapter
    }

    async fn on_load(&self) -> anyhow::Result<()> {
        self.push("load");
        Ok(())
    }

    async fn on_activate(&self) -> anyhow::Result<()> {
        if let Some(gate) = &self.activate_gate {
            gate.acquire().await?.forget();
        }
        self.push("activate");
        Ok(())
    }

    async fn on_deactivate(&self) -> anyhow::Result<()> {
        self.push("deactivate");
        Ok(())
    }

    async fn on_unload(&self) -> anyhow::Result<()> {
        self.push("unload");
        Ok(())
    }
}

fn manifest(id: SportId) -> PluginManifest {
    PluginManifest {
        id,
        version: Version::new(1, 0, 0),
        display_name: id.to_string(),
        description: String::new(),
        icon: id.to_string(),
        has_stats: false,
        celebration_types: Vec::new(),
        competitions: Vec::new(),
        core_version: VersionReq::STAR,
    }
}

struct Harness {
    registry: Arc<SportRegistry>,
    log: Arc<Mutex<Vec<String>>>,
    loader_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn harness(gated: Option<(SportId, Arc<Semaphore>)>) -> Harness {
    let log = Arc::new(Mutex::new(Vec::new()));
    let loader_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = SportRegistry::new();

    for id in [SportId::Nfl, SportId::Bundesliga] {
        let log = log.clone();
        let loader_calls = loader_calls.clone();
        let gate = gated
            .as_ref()
            .filter(|(gated_id, _)| *gated_id == id)
            .map(|(_, gate)| gate.clone());
        registry
            .register(
                manifest(id),
                Box::new(move || {
                    loader_calls.fetch_add(1, Ordering::SeqCst);
                    let log = log.clone();
                    let gate = gate.clone();
                    async move {
                        let plugin = RecordingPlugin {
                            manifest: manifest(id),
                            adapter: NullAdapter,
                            log,
                            activate_gate: gate,
                        };
                        Ok(Arc::new(plugin) as Arc<dyn SportPlugin>)
                    }
                    .boxed()
                }),
            )
            .expect("registration succeeds");
    }

    Harness {
        registry: Arc::new(registry),
        log,
        loader_calls,
    }
}

#[tokio::test]
async fn listing_manifests_never_loads() {
    let h = harness(None);

    let ids: Vec<SportId> = h.registry.manifests().map(|m| m.id).collect();
    assert_eq!(ids, vec![SportId::Nfl, SportId::Bundesliga]);

    let filtered = h.registry.manifests_for(&[SportId::Bundesliga]);
    assert_eq!(filtered.len(), 1);

    assert_eq!(h.loader_calls.load(Ordering::SeqCst), 0);
    assert!(h.events().is_empty());
}

#[tokio::test]
async fn switching_sports_runs_hooks_in_order_and_loads_once() {
    let h = harness(None);

    h.registry.activate(SportId::Nfl).await.unwrap();
    h.registry.activate(SportId::Bundesliga).await.unwrap();
    // Switch back: NFL is already loaded, so only hooks run.
    h.registry.activate(SportId::Nfl).await.unwrap();

    assert_eq!(
        h.events(),
        vec![
            "nfl:load",
            "nfl:activate",
            "nfl:deactivate",
            "bundesliga:load",
            "bundesliga:activate",
            "bundesliga:deactivate",
            "nfl:activate",
        ]
    );
    assert_eq!(h.loader_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.registry.active_id(), Some(SportId::Nfl));
}

#[tokio::test]
async fn reactivating_the_active_sport_is_a_no_op() {
    let h = harness(None);

    let first = h.registry.activate(SportId::Nfl).await.unwrap();
    let second = h.registry.activate(SportId::Nfl).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.events(), vec!["nfl:load", "nfl:activate"]);
}

#[tokio::test]
async fn a_superseded_activation_never_takes_the_slot() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness(Some((SportId::Nfl, gate.clone())));

    let registry = h.registry.clone();
    let parked = tokio::spawn(async move { registry.activate(SportId::Nfl).await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    h.registry.activate(SportId::Bundesliga).await.unwrap();
    assert_eq!(h.registry.active_id(), Some(SportId::Bundesliga));

    gate.add_permits(1);
    parked
        .await
        .expect("task completes")
        .expect("stale activation still resolves");

    // The slot belongs to the winner; the stale result changed nothing.
    assert_eq!(h.registry.active_id(), Some(SportId::Bundesliga));
}

#[tokio::test]
async fn shutdown_deactivates_then_unloads_every_loaded_plugin() {
    let h = harness(None);

    h.registry.activate(SportId::Nfl).await.unwrap();
    h.registry.activate(SportId::Bundesliga).await.unwrap();
    h.registry.shutdown().await;

    let events = h.events();
    // Active plugin deactivates first, then every loaded plugin unloads.
    assert_eq!(
        &events[events.len() - 3..],
        &["bundesliga:deactivate", "nfl:unload", "bundesliga:unload"]
    );
    assert_eq!(h.registry.active_id(), None);
}
