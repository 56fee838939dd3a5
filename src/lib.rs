//! Core of a multi-sport live scoreboard.
//!
//! Aggregates live scores from heterogeneous per-sport providers behind one
//! contract, so a display surface can show scores, clocks and highlight
//! events without knowing which sport is active.
//!
//! ```text
//!  display layer ──activate(id)──▶ SportRegistry ──lazy load──▶ SportPlugin
//!       │                              │                          │
//!       │◀── manifests() listings ─────┘                 SportAdapter (per sport)
//!       │                                                         │
//!       └──── poll: fetch_scoreboard / detect_score_change ───────┘
//! ```
//!
//! The registry is the only stateful piece; adapters, the score-change
//! detectors and the standings projection are stateless against it.

pub mod config;
pub mod detect;
pub mod error;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod registry;
pub mod standings;

pub use error::{FetchError, RegistryError};
pub use models::{
    CelebrationType, Game, GameDetails, GameStatus, LiveTableRow, PluginManifest, ScoreChange,
    ScoreKind, Side, SportId, TableRow,
};
pub use plugins::{SportAdapter, SportPlugin, StandingsSource};
pub use registry::{PluginState, SportRegistry};
