use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use scorehub::config::Config;
use scorehub::models::Side;
use scorehub::monitor;
use scorehub::plugins;
use scorehub::standings::project_live_table;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let registry = Arc::new(plugins::default_registry(&config)?);

    // Listing is manifest-only; nothing loads until a sport is activated
    let enabled = config.enabled()?;
    let listed: Vec<_> = match &enabled {
        Some(ids) => registry.manifests_for(ids),
        None => registry.manifests().collect(),
    };
    for m in &listed {
        info!(
            "Available: {} v{} ({}, competitions: {})",
            m.display_name,
            m.version,
            m.id,
            m.competitions.join(", ")
        );
    }

    let sport = config.initial_sport()?;
    let plugin = registry.activate(sport).await?;
    info!(
        "Activated {} (stats: {}, celebrations: {})",
        plugin.manifest().display_name,
        plugin.manifest().has_stats,
        plugin
            .manifest()
            .celebration_types
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("/")
    );

    let mut rx = monitor::start_score_monitor(
        registry.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );

    // Live-table ticker for sports that publish standings
    {
        let registry = registry.clone();
        let refresh = Duration::from_secs(config.table_refresh_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(plugin) = registry.active() else {
                    continue;
                };
                let Some(source) = plugin.standings() else {
                    continue;
                };
                let official = match source.fetch_table().await {
                    Ok(table) => table,
                    Err(e) => {
                        warn!("Table fetch failed: {}", e);
                        continue;
                    }
                };
                let games = match plugin.adapter().fetch_scoreboard().await {
                    Ok(games) => games,
                    Err(e) => {
                        warn!("Scoreboard fetch for table projection failed: {}", e);
                        continue;
                    }
                };
                let live = project_live_table(&official, &games);
                for row in live.iter().take(6) {
                    info!(
                        "{:>2}. {} {} pts (GD {:+}{})",
                        row.position,
                        row.team_name,
                        row.live_points,
                        row.live_goal_difference,
                        if row.playing { ", playing" } else { "" }
                    );
                }
            }
        });
    }

    // Main event loop: surface score updates until shutdown
    loop {
        tokio::select! {
            maybe_update = rx.recv() => match maybe_update {
                Some(update) => {
                    let Some(plugin) = registry.active() else { continue };
                    let adapter = plugin.adapter();
                    let period = update
                        .game
                        .clock
                        .as_ref()
                        .map(|c| adapter.period_name(c.period))
                        .unwrap_or_else(|| "-".into());
                    let scorer = match update.change.side {
                        Side::Home => &update.game.home.name,
                        Side::Away => &update.game.away.name,
                    };
                    let video = update
                        .change
                        .video
                        .map(|v| format!(", video: {}", v))
                        .unwrap_or_default();
                    info!(
                        "{} | {} | {} by {} (+{} → {}-{}){}",
                        adapter.competition_name(&update.game),
                        period,
                        update.change.kind,
                        scorer,
                        update.change.points,
                        update.game.home.score,
                        update.game.away.score,
                        video
                    );
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                registry.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}
