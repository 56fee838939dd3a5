use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// Closed set of sports this build knows how to drive.
///
/// Keeping the set enumerated (rather than stringly-typed) keeps the
/// per-sport classifiers exhaustive and checkable at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportId {
    Nfl,
    Bundesliga,
}

impl fmt::Display for SportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SportId::Nfl => write!(f, "nfl"),
            SportId::Bundesliga => write!(f, "bundesliga"),
        }
    }
}

impl FromStr for SportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nfl" => Ok(SportId::Nfl),
            "bundesliga" => Ok(SportId::Bundesliga),
            other => Err(format!("unknown sport '{}'", other)),
        }
    }
}

/// Static, versioned description of a sport plugin's identity and
/// capabilities. Immutable once registered; identity key is `id`.
#[derive(Debug, Clone, Serialize)]
pub struct PluginManifest {
    pub id: SportId,
    pub version: Version,
    pub display_name: String,
    pub description: String,
    /// Icon slug consumed by whatever listing surface renders the manifest
    pub icon: String,
    /// Whether `fetch_game_details` can ever return stats for this sport
    pub has_stats: bool,
    /// Superset of every celebration the sport's detector can produce
    pub celebration_types: Vec<CelebrationType>,
    /// Competition codes this plugin can serve, in display order
    pub competitions: Vec<String>,
    /// Core versions this plugin is compatible with
    #[serde(skip)]
    pub core_version: VersionReq,
}

/// Canonical game state as fetched from a sport's provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    /// External game/event ID from the provider
    pub id: String,
    pub sport: SportId,
    /// Competition code, e.g. "nfl" or "bl1"
    pub competition: String,
    pub home: TeamScore,
    pub away: TeamScore,
    pub status: GameStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub clock: Option<GameClock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScore {
    pub id: String,
    pub name: String,
    pub score: u32,
}

/// Game clock; `display` is whatever the provider shows ("12:34", "45'+2")
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameClock {
    pub period: u8,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Halftime,
    Final,
}

/// Which side of a game scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Category of scoring play inferred from a score diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// Soccer family: one goal (points still carries the raw diff)
    Goal,
    ExtraPoint,
    /// Two-point conversions land here as well; a 2-point diff alone
    /// cannot tell them apart
    Safety,
    FieldGoal,
    Touchdown,
    TouchdownExtraPoint,
    TouchdownTwoPoint,
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreKind::Goal => "goal",
            ScoreKind::ExtraPoint => "extra_point",
            ScoreKind::Safety => "safety",
            ScoreKind::FieldGoal => "field_goal",
            ScoreKind::Touchdown => "touchdown",
            ScoreKind::TouchdownExtraPoint => "touchdown_extra_point",
            ScoreKind::TouchdownTwoPoint => "touchdown_two_point",
        };
        write!(f, "{}", s)
    }
}

/// Sport-defined category of in-game event eligible for a highlight trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CelebrationType {
    Touchdown,
    Fieldgoal,
    Safety,
    Goal,
}

impl fmt::Display for CelebrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CelebrationType::Touchdown => "touchdown",
            CelebrationType::Fieldgoal => "fieldgoal",
            CelebrationType::Safety => "safety",
            CelebrationType::Goal => "goal",
        };
        write!(f, "{}", s)
    }
}

/// Result of classifying one poll-to-poll score diff.
///
/// Transient: produced and consumed within one poll cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreChange {
    pub kind: ScoreKind,
    pub side: Side,
    /// Points gained by the scoring side; always `new - prev` for that side
    pub points: u32,
    /// Celebration clip to trigger, if this play rates one
    pub video: Option<CelebrationType>,
    /// True when both sides moved within one poll; the classification is
    /// then a larger-diff heuristic, not a reconstruction
    pub ambiguous: bool,
}

/// Full detail for a single game, with stats when the provider has them
#[derive(Debug, Clone, Serialize)]
pub struct GameDetails {
    pub game: Game,
    pub stats: Option<GameStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStats {
    pub home: TeamStats,
    pub away: TeamStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub team: String,
    pub lines: Vec<StatLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatLine {
    pub name: String,
    pub value: String,
}

/// One row of an official league table snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub team_id: String,
    pub team_name: String,
    pub points: u32,
    pub goals: u32,
    pub opponent_goals: u32,
    pub matches: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
}

impl TableRow {
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals) - i64::from(self.opponent_goals)
    }
}

/// One row of a projected table: official values untouched, with `live_*`
/// counterparts folding in games that are running or not yet official.
/// Derived data, recomputed on every projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveTableRow {
    /// 1-based rank after re-sorting by projected values
    pub position: u32,
    /// 1-based rank in the official snapshot, for movement indicators
    pub previous_position: u32,
    pub team_id: String,
    pub team_name: String,
    pub points: u32,
    pub goal_difference: i64,
    pub live_points: u32,
    pub live_goals: u32,
    pub live_opponent_goals: u32,
    pub live_goal_difference: i64,
    pub live_matches: u32,
    /// Whether an unresolved game contributed to this row's projection
    pub playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sport_id_round_trips_through_strings() {
        assert_eq!("nfl".parse::<SportId>().unwrap(), SportId::Nfl);
        assert_eq!("Bundesliga".parse::<SportId>().unwrap(), SportId::Bundesliga);
        assert!("curling".parse::<SportId>().is_err());
        assert_eq!(SportId::Nfl.to_string(), "nfl");
    }

    #[test]
    fn celebration_serializes_lowercase() {
        let v = serde_json::to_string(&CelebrationType::Fieldgoal).unwrap();
        assert_eq!(v, "\"fieldgoal\"");
        assert_eq!(CelebrationType::Touchdown.to_string(), "touchdown");
    }

    #[test]
    fn goal_difference_can_go_negative() {
        let row = TableRow {
            team_id: "1".into(),
            team_name: "VfL".into(),
            points: 4,
            goals: 5,
            opponent_goals: 11,
            matches: 6,
            won: 1,
            draw: 1,
            lost: 4,
        };
        assert_eq!(row.goal_difference(), -6);
    }
}
