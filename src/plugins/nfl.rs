use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use semver::{Version, VersionReq};
use tracing::{debug, warn};

use super::{SportAdapter, SportPlugin};
use crate::detect;
use crate::error::FetchError;
use crate::models::{
    CelebrationType, Game, GameClock, GameDetails, GameStats, PluginManifest, ScoreChange, SportId,
    StatLine, TeamScore, TeamStats,
};

const CELEBRATIONS: &[CelebrationType] = &[
    CelebrationType::Touchdown,
    CelebrationType::Fieldgoal,
    CelebrationType::Safety,
];

pub fn manifest() -> PluginManifest {
    PluginManifest {
        id: SportId::Nfl,
        version: Version::new(1, 2, 0),
        display_name: "NFL".into(),
        description: "American football scores and box scores via the ESPN site API".into(),
        icon: "football".into(),
        has_stats: true,
        celebration_types: CELEBRATIONS.to_vec(),
        competitions: vec!["nfl".into()],
        core_version: VersionReq::parse("^0.2").expect("valid version requirement"),
    }
}

pub struct NflPlugin {
    manifest: PluginManifest,
    adapter: NflAdapter,
}

impl NflPlugin {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            manifest: manifest(),
            adapter: NflAdapter::new(base_url)?,
        })
    }
}

#[async_trait]
impl SportPlugin for NflPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn adapter(&self) -> &dyn SportAdapter {
        &self.adapter
    }
}

/// Scoreboard adapter backed by the ESPN site API.
/// Docs: <https://site.api.espn.com/apis/site/v2/sports/football/nfl/>
pub struct NflAdapter {
    http: Client,
    /// Base URL, overridable for tests
    base_url: String,
}

impl NflAdapter {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
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
impl SportAdapter for NflAdapter {
    async fn fetch_scoreboard(&self) -> Result<Vec<Game>, FetchError> {
        let url = format!("{}/scoreboard", self.base_url);
        let raw = self.get_json(&url).await?;
        parse_scoreboard(&raw)
    }

    async fn fetch_game_details(&self, game_id: &str) -> Result<GameDetails, FetchError> {
        let url = format!("{}/summary?event={}", self.base_url, game_id);
        let raw = match self.get_json(&url).await {
            Ok(raw) => raw,
            // ESPN answers 400 for event ids it has never heard of
            Err(FetchError::Status { status, .. })
                if status == reqwest::StatusCode::BAD_REQUEST
                    || status == reqwest::StatusCode::NOT_FOUND =>
            {
                return Err(FetchError::UnknownGame(game_id.to_string()));
            }
            Err(e) => return Err(e),
        };
        parse_summary(&raw, game_id)
    }

    fn detect_score_change(
        &self,
        prev_home: u32,
        prev_away: u32,
        new_home: u32,
        new_away: u32,
        game: &Game,
    ) -> Option<ScoreChange> {
        let change = detect::football_score_change(prev_home, prev_away, new_home, new_away)?;
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
            1 => "1st Quarter".into(),
            2 => "2nd Quarter".into(),
            3 => "3rd Quarter".into(),
            4 => "4th Quarter".into(),
            5 => "Overtime".into(),
            p => format!("Overtime {}", p.saturating_sub(4)),
        }
    }

    fn competition_name(&self, _game: &Game) -> String {
        "NFL".into()
    }

    fn celebration_types(&self) -> &[CelebrationType] {
        CELEBRATIONS
    }
}

fn status_from_espn(state: &str, type_name: &str) -> crate::models::GameStatus {
    use crate::models::GameStatus;
    match state {
        "pre" => GameStatus::Scheduled,
        "post" => GameStatus::Final,
        "in" if type_name == "STATUS_HALFTIME" => GameStatus::Halftime,
        _ => GameStatus::InProgress,
    }
}

/// ESPN dates come as RFC 3339 with or without seconds ("...T17:00Z")
fn parse_espn_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_score(v: &serde_json::Value) -> u32 {
    v.as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| v.as_u64().map(|n| n as u32))
        .unwrap_or(0)
}

fn parse_competitor(c: &serde_json::Value) -> Option<TeamScore> {
    Some(TeamScore {
        id: c["team"]["id"].as_str().unwrap_or_default().to_string(),
        name: c["team"]["displayName"].as_str()?.to_string(),
        score: parse_score(&c["score"]),
    })
}

fn parse_event(ev: &serde_json::Value) -> Option<Game> {
    let id = ev["id"].as_str()?.to_string();
    let competitors = ev["competitions"][0]["competitors"].as_array()?;

    let home = competitors
        .iter()
        .find(|c| c["homeAway"].as_str() == Some("home"))
        .and_then(parse_competitor)?;
    let away = competitors
        .iter()
        .find(|c| c["homeAway"].as_str() == Some("away"))
        .and_then(parse_competitor)?;

    let status_obj = &ev["status"];
    let status = status_from_espn(
        status_obj["type"]["state"].as_str().unwrap_or("in"),
        status_obj["type"]["name"].as_str().unwrap_or_default(),
    );

    let clock = status_obj["period"].as_u64().map(|period| GameClock {
        period: period as u8,
        display: status_obj["displayClock"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    });

    Some(Game {
        id,
        sport: SportId::Nfl,
        competition: "nfl".into(),
        home,
        away,
        status,
        start_time: ev["date"].as_str().and_then(parse_espn_date),
        clock,
    })
}

fn parse_scoreboard(raw: &serde_json::Value) -> Result<Vec<Game>, FetchError> {
    // No events key means no games today, not a provider failure.
    let events = match raw["events"].as_array() {
        Some(a) => a,
        None => return Ok(Vec::new()),
    };
    Ok(events.iter().filter_map(parse_event).collect())
}

fn parse_team_stats(t: &serde_json::Value) -> Option<TeamStats> {
    let lines = t["statistics"]
        .as_array()?
        .iter()
        .filter_map(|s| {
            Some(StatLine {
                name: s["label"]
                    .as_str()
                    .or_else(|| s["name"].as_str())?
                    .to_string(),
                value: s["displayValue"].as_str()?.to_string(),
            })
        })
        .collect();
    Some(TeamStats {
        team: t["team"]["displayName"].as_str()?.to_string(),
        lines,
    })
}

fn parse_summary(raw: &serde_json::Value, game_id: &str) -> Result<GameDetails, FetchError> {
    let header = &raw["header"]["competitions"][0];
    let mut game = parse_event(&serde_json::json!({
        "id": raw["header"]["id"].as_str().unwrap_or(game_id),
        "date": header["date"],
        "status": header["status"],
        "competitions": [header],
    }))
    .ok_or_else(|| FetchError::malformed(format!("summary for {} missing header", game_id)))?;
    game.id = game_id.to_string();

    let teams = raw["boxscore"]["teams"].as_array();
    let stats = teams.and_then(|teams| {
        let home = teams
            .iter()
            .find(|t| t["homeAway"].as_str() == Some("home"))
            .or_else(|| teams.get(1))
            .and_then(parse_team_stats)?;
        let away = teams
            .iter()
            .find(|t| t["homeAway"].as_str() == Some("away"))
            .or_else(|| teams.first())
            .and_then(parse_team_stats)?;
        Some(GameStats { home, away })
    });

    Ok(GameDetails { game, stats })
}
