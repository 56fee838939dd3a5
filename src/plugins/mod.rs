//! Sport plugin contract and the statically known plugin set.
//!
//! Every sport ships as a [`SportPlugin`]: a manifest describing what it is,
//! an adapter implementing the data-fetching contract against the sport's
//! external provider, and optional lifecycle hooks the registry runs around
//! activation. [`default_registry`] wires the plugins this build knows about.

pub mod bundesliga;
pub mod nfl;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{CelebrationType, Game, GameDetails, ScoreChange, TableRow};
use crate::registry::SportRegistry;

/// Data-fetching/transformation boundary to one sport's external provider.
///
/// Implementations own the mapping from the provider's native schema to the
/// canonical [`Game`] shape, including its status strings.
#[async_trait]
pub trait SportAdapter: Send + Sync {
    /// Snapshot of the sport's current scoreboard.
    ///
    /// Returns an empty vec when the provider has no games; provider or
    /// network failures propagate as [`FetchError`] so the caller can apply
    /// its own retry policy, never masked as an empty result.
    async fn fetch_scoreboard(&self) -> Result<Vec<Game>, FetchError>;

    /// Full detail for one game; `stats` is `None` when the provider has
    /// none for this sport or game.
    async fn fetch_game_details(&self, game_id: &str) -> Result<GameDetails, FetchError>;

    /// Classify the scoring play between two score snapshots of `game`.
    /// Pure with respect to registry and adapter state; `None` when the
    /// scoreline did not move.
    fn detect_score_change(
        &self,
        prev_home: u32,
        prev_away: u32,
        new_home: u32,
        new_away: u32,
        game: &Game,
    ) -> Option<ScoreChange>;

    /// Display name for a period number ("1st Quarter", "2nd Half", ...)
    fn period_name(&self, period: u8) -> String;

    /// Display name of the competition a game belongs to
    fn competition_name(&self, game: &Game) -> String;

    /// Celebrations this sport can trigger; a subset of what the manifest
    /// declares
    fn celebration_types(&self) -> &[CelebrationType];
}

/// Official league table access, for sports that have one
#[async_trait]
pub trait StandingsSource: Send + Sync {
    async fn fetch_table(&self) -> Result<Vec<TableRow>, FetchError>;
}

/// One sport's plugin: manifest, adapter and lifecycle hooks.
///
/// The registry holds at most one instance per id for the process lifetime
/// and is the only caller of the hooks. All hooks default to no-ops.
#[async_trait]
pub trait SportPlugin: Send + Sync {
    fn manifest(&self) -> &crate::models::PluginManifest;

    fn adapter(&self) -> &dyn SportAdapter;

    /// League-table capability, for sports that publish standings
    fn standings(&self) -> Option<&dyn StandingsSource> {
        None
    }

    /// Runs once, right after the loader built this instance
    async fn on_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs every time this plugin takes the active slot
    async fn on_activate(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs when another plugin takes the slot, before its activation
    async fn on_deactivate(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs at registry shutdown for every loaded plugin
    async fn on_unload(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn SportPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportPlugin")
            .field("manifest", self.manifest())
            .finish()
    }
}

/// Registry with every plugin this build ships, wired from config.
///
/// Registration stores only the manifest and an async constructor; nothing
/// touches the network until a sport is first activated.
pub fn default_registry(config: &Config) -> anyhow::Result<SportRegistry> {
    let mut registry = SportRegistry::new();

    {
        let base = config.nfl_api_url.clone();
        registry.register(
            nfl::manifest(),
            Box::new(move || {
                let base = base.clone();
                async move {
                    let plugin = nfl::NflPlugin::new(&base)?;
                    Ok(Arc::new(plugin) as Arc<dyn SportPlugin>)
                }
                .boxed()
            }),
        )?;
    }

    {
        let base = config.openligadb_api_url.clone();
        let league = config.bundesliga_league.clone();
        let season = config.season.clone();
        registry.register(
            bundesliga::manifest(),
            Box::new(move || {
                let base = base.clone();
                let league = league.clone();
                let season = season.clone();
                async move {
                    let plugin = bundesliga::BundesligaPlugin::new(&base, &league, &season)?;
                    Ok(Arc::new(plugin) as Arc<dyn SportPlugin>)
                }
                .boxed()
            }),
        )?;
    }

    Ok(registry)
}
