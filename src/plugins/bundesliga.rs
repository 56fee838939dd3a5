use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use semver::{Version, VersionReq};
use tracing::{debug, info, warn};

use super::{SportAdapter, SportPlugin, StandingsSource};
use crate::detect;
use crate::error::FetchError;
use crate::models::{
    CelebrationType, Game, GameDetails, GameStatus, PluginManifest, ScoreChange, SportId, TableRow,
    TeamScore,
};

const CELEBRATIONS: &[CelebrationType] = &[CelebrationType::Goal];

pub fn manifest() -> PluginManifest {
    PluginManifest {
        id: SportId::Bundesliga,
        version: Version::new(1, 4, 1),
        display_name: "Bundesliga".into(),
        description: "German football scores and league table via OpenLigaDB".into(),
        icon: "soccer".into(),
        has_stats: false,
        celebration_types: CELEBRATIONS.to_vec(),
        competitions: vec!["bl1".into(), "bl2".into()],
        core_version: VersionReq::parse("^0.2").expect("valid version requirement"),
    }
}

pub struct BundesligaPlugin {
    manifest: PluginManifest,
    adapter: BundesligaAdapter,
}

impl BundesligaPlugin {
    pub fn new(base_url: &str, league: &str, season: &str) -> anyhow::Result<Self> {
        Ok(Self {
            manifest: manifest(),
            adapter: BundesligaAdapter::new(base_url, league, season)?,
        })
    }
}

#[async_trait]
impl SportPlugin for BundesligaPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn adapter(&self) -> &dyn SportAdapter {
        &self.adapter
    }

    fn standings(&self) -> Option<&dyn StandingsSource> {
        Some(&self.adapter)
    }

    async fn on_activate(&self) -> anyhow::Result<()> {
        info!(
            league = %self.adapter.league,
            season = %self.adapter.season,
            "serving OpenLigaDB matchdays"
        );
        Ok(())
    }
}

/// Adapter backed by OpenLigaDB.
/// Docs: <https://api.openligadb.de/index.html>
pub struct BundesligaAdapter {
    http: Client,
    /// Base URL, overridable for tests
    base_url: String,
    league: String,
    season: String,
}

impl BundesligaAdapter {
    pub fn new(base_url: &str, league: &str, season: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            league: league.to_string(),
            season: season.to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        debug!("Fetching {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.json()
            .await
            .map_err(|e| FetchError::malformed(format!("invalid JSON from {}: {}", url, e)))
    }
}

#[async_trait]
impl SportAdapter for BundesligaAdapter {
    async fn fetch_scoreboard(&self) -> Result<Vec<Game>, FetchError> {
        // Current matchday of the configured league
        let url = format!("{}/getmatchdata/{}", self.base_url, self.league);
        let raw = self.get_json(&url).await?;
        parse_matches(&raw, Utc::now())
    }

    async fn fetch_game_details(&self, game_id: &str) -> Result<GameDetails, FetchError> {
        let url = format!("{}/getmatchdata/{}", self.base_url, game_id);
        let raw = self.get_json(&url).await?;
        let game = parse_match(&raw, Utc::now())
            .ok_or_else(|| FetchError::UnknownGame(game_id.to_string()))?;
        // OpenLigaDB has no per-game stats feed
        Ok(GameDetails { game, stats: None })
    }

    fn detect_score_change(
        &self,
        prev_home: u32,
        prev_away: u32,
        new_home: u32,
        new_away: u32,
        game: &Game,
    ) -> Option<ScoreChange> {
        let change = detect::soccer_score_change(prev_home, prev_away, new_home, new_away)?;
        if change.ambiguous {
            warn!(
                game = %game.id,
                "both sides scored within one poll; classified the larger swing"
            );
        }
        Some(change)
    }

    fn period_name(&self, period: u8) -> String {
        match period {
            1 => "1st Half".into(),
            2 => "2nd Half".into(),
            3 | 4 => "Extra Time".into(),
            p => format!("Period {}", p),
        }
    }

    fn competition_name(&self, game: &Game) -> String {
        match game.competition.as_str() {
            "bl1" => "Bundesliga".into(),
            "bl2" => "2. Bundesliga".into(),
            "bl3" => "3. Liga".into(),
            "dfb" => "DFB-Pokal".into(),
            other => other.to_uppercase(),
        }
    }

    fn celebration_types(&self) -> &[CelebrationType] {
        CELEBRATIONS
    }
}

#[async_trait]
impl StandingsSource for BundesligaAdapter {
    async fn fetch_table(&self) -> Result<Vec<TableRow>, FetchError> {
        let url = format!(
            "{}/getbltable/{}/{}",
            self.base_url, self.league, self.season
        );
        let raw = self.get_json(&url).await?;
        parse_table(&raw)
    }
}

/// Current scoreline: the final result once the provider publishes one,
/// otherwise the running score from the goal list.
fn current_score(m: &serde_json::Value) -> (u32, u32) {
    if let Some(result) = m["matchResults"]
        .as_array()
        .and_then(|rs| rs.iter().find(|r| r["resultTypeID"].as_i64() == Some(2)))
    {
        return (
            result["pointsTeam1"].as_u64().unwrap_or(0) as u32,
            result["pointsTeam2"].as_u64().unwrap_or(0) as u32,
        );
    }
    m["goals"]
        .as_array()
        .and_then(|goals| goals.last())
        .map(|g| {
            (
                g["scoreTeam1"].as_u64().unwrap_or(0) as u32,
                g["scoreTeam2"].as_u64().unwrap_or(0) as u32,
            )
        })
        .unwrap_or((0, 0))
}

/// OpenLigaDB exposes no halftime flag, so running games map to InProgress.
fn status_of(finished: bool, kickoff: Option<DateTime<Utc>>, now: DateTime<Utc>) -> GameStatus {
    if finished {
        return GameStatus::Final;
    }
    match kickoff {
        Some(k) if k <= now => GameStatus::InProgress,
        _ => GameStatus::Scheduled,
    }
}

fn parse_team(t: &serde_json::Value) -> Option<(String, String)> {
    let id = t["teamId"].as_i64()?.to_string();
    let name = t["teamName"].as_str()?.to_string();
    Some((id, name))
}

fn parse_match(m: &serde_json::Value, now: DateTime<Utc>) -> Option<Game> {
    let id = m["matchID"].as_i64().filter(|&id| id > 0)?.to_string();
    let (home_id, home_name) = parse_team(&m["team1"])?;
    let (away_id, away_name) = parse_team(&m["team2"])?;
    let (home_score, away_score) = current_score(m);

    let kickoff = m["matchDateTimeUTC"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(Game {
        id,
        sport: SportId::Bundesliga,
        competition: m["leagueShortcut"].as_str().unwrap_or("bl1").to_string(),
        home: TeamScore {
            id: home_id,
            name: home_name,
            score: home_score,
        },
        away: TeamScore {
            id: away_id,
            name: away_name,
            score: away_score,
        },
        status: status_of(m["matchIsFinished"].as_bool().unwrap_or(false), kickoff, now),
        start_time: kickoff,
        clock: None,
    })
}

fn parse_matches(raw: &serde_json::Value, now: DateTime<Utc>) -> Result<Vec<Game>, FetchError> {
    let matches = match raw.as_array() {
        Some(a) => a,
        None => return Ok(Vec::new()),
    };
    Ok(matches.iter().filter_map(|m| parse_match(m, now)).collect())
}

fn parse_table(raw: &serde_json::Value) -> Result<Vec<TableRow>, FetchError> {
    let rows = raw
        .as_array()
        .ok_or_else(|| FetchError::malformed("table payload is not an array"))?;
    Ok(rows
        .iter()
        .filter_map(|r| {
            Some(TableRow {
                team_id: r["teamInfoId"].as_i64()?.to_string(),
                team_name: r["teamName"].as_str()?.to_string(),
                points: r["points"].as_u64()? as u32,
                goals: r["goals"].as_u64().unwrap_or(0) as u32,
                opponent_goals: r["opponentGoals"].as_u64().unwrap_or(0) as u32,
                matches: r["matches"].as_u64().unwrap_or(0) as u32,
                won: r["won"].as_u64().unwrap_or(0) as u32,
                draw: r["draw"].as_u64().unwrap_or(0) as u32,
                lost: r["lost"].as_u64().unwrap_or(0) as u32,
            })
        })
        .collect())
}
