//! Background score monitor.
//!
//! Polls whatever plugin currently holds the registry's active slot and
//! diffs per-game score snapshots through that sport's own detector,
//! sending a [`ScoreUpdate`] through the returned channel for every
//! detected scoring play. The display layer owns the channel's consuming
//! end and its own retry/presentation policy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::models::{Game, GameStatus, ScoreChange, SportId};
use crate::registry::SportRegistry;

/// A scoring play detected between two polls of the active sport
#[derive(Debug, Clone)]
pub struct ScoreUpdate {
    pub game: Game,
    pub change: ScoreChange,
    pub detected_at: DateTime<Utc>,
}

struct Snapshot {
    home: u32,
    away: u32,
    status: GameStatus,
}

/// Spawn the polling task and hand back the update channel.
///
/// Fetch failures are logged and retried on the next tick; they never kill
/// the task. The task exits once the receiver is dropped.
pub fn start_score_monitor(
    registry: Arc<SportRegistry>,
    poll_interval: Duration,
) -> mpsc::Receiver<ScoreUpdate> {
    let (tx, rx) = mpsc::channel(256);

    tokio::spawn(async move {
        info!("Score monitor started (interval={:?})", poll_interval);

        // Previous snapshot per game id, valid for the current sport only
        let mut prev: HashMap<String, Snapshot> = HashMap::new();
        let mut last_sport: Option<SportId> = None;
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if tx.is_closed() {
                break;
            }

            let Some(plugin) = registry.active() else {
                continue;
            };
            let sport = plugin.manifest().id;
            if last_sport != Some(sport) {
                // Snapshots never carry across a sport switch
                prev.clear();
                last_sport = Some(sport);
            }

            let games = match plugin.adapter().fetch_scoreboard().await {
                Ok(games) => games,
                Err(e) => {
                    // Retry policy is simply the next tick
                    warn!(sport = %sport, error = %e, "scoreboard fetch failed");
                    continue;
                }
            };

            for game in &games {
                if let Some(snap) = prev.get(&game.id) {
                    if let Some(change) = plugin.adapter().detect_score_change(
                        snap.home,
                        snap.away,
                        game.home.score,
                        game.away.score,
                        game,
                    ) {
                        info!(
                            game = %game.id,
                            kind = %change.kind,
                            points = change.points,
                            "{} {}-{} {}",
                            game.home.name,
                            game.home.score,
                            game.away.score,
                            game.away.name,
                        );
                        let update = ScoreUpdate {
                            game: game.clone(),
                            change,
                            detected_at: Utc::now(),
                        };
                        // Log when updates are dropped instead of silently ignoring
                        if let Err(e) = tx.try_send(update) {
                            error!("Score update channel full, update DROPPED: {}", e);
                        }
                    }
                }
            }

            // Merge new data into the snapshot instead of clearing; a
            // partial provider response must not forget games
            for game in games {
                prev.insert(
                    game.id.clone(),
                    Snapshot {
                        home: game.home.score,
                        away: game.away.score,
                        status: game.status,
                    },
                );
            }
            // Prune finished games to keep the snapshot bounded
            prev.retain(|_, s| s.status != GameStatus::Final);
        }
    });

    rx
}
