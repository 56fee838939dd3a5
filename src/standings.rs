//! Live league-table projection.
//!
//! Takes an official table snapshot plus the currently known games and
//! re-ranks the table as if every running or just-finished game already
//! counted. Official values are kept alongside the projected ones so a
//! display can show both.

use std::collections::HashMap;

use crate::models::{Game, GameStatus, LiveTableRow, TableRow};

#[derive(Debug, Default, Clone, Copy)]
struct Delta {
    points: u32,
    goals: u32,
    opponent_goals: u32,
    matches: u32,
}

/// Standard 3-1-0 points for the given side of a scoreline
fn points_for(own: u32, other: u32) -> u32 {
    match own.cmp(&other) {
        std::cmp::Ordering::Greater => 3,
        std::cmp::Ordering::Equal => 1,
        std::cmp::Ordering::Less => 0,
    }
}

/// Project an official table forward using in-progress or finished games
/// that are not yet folded into the snapshot.
///
/// `Scheduled` games contribute nothing. A team appearing in a game but
/// missing from the official table is skipped; the projection never
/// fabricates a row. Entries are re-sorted by projected points, then
/// projected goal difference, then projected goals for; the sort is stable,
/// so full ties keep the official order.
pub fn project_live_table(official: &[TableRow], games: &[Game]) -> Vec<LiveTableRow> {
    // A team plays at most one concurrent game per matchday, so the deltas
    // are additive without double counting.
    let mut deltas: HashMap<&str, Delta> = HashMap::new();
    for game in games {
        if game.status == GameStatus::Scheduled {
            continue;
        }
        let (hs, as_) = (game.home.score, game.away.score);

        let home = deltas.entry(game.home.id.as_str()).or_default();
        home.points += points_for(hs, as_);
        home.goals += hs;
        home.opponent_goals += as_;
        home.matches += 1;

        let away = deltas.entry(game.away.id.as_str()).or_default();
        away.points += points_for(as_, hs);
        away.goals += as_;
        away.opponent_goals += hs;
        away.matches += 1;
    }

    let mut rows: Vec<LiveTableRow> = official
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let delta = deltas
                .get(row.team_id.as_str())
                .copied()
                .unwrap_or_default();
            let live_goals = row.goals + delta.goals;
            let live_opponent_goals = row.opponent_goals + delta.opponent_goals;
            LiveTableRow {
                position: 0,
                previous_position: (idx + 1) as u32,
                team_id: row.team_id.clone(),
                team_name: row.team_name.clone(),
                points: row.points,
                goal_difference: row.goal_difference(),
                live_points: row.points + delta.points,
                live_goals,
                live_opponent_goals,
                live_goal_difference: i64::from(live_goals) - i64::from(live_opponent_goals),
                live_matches: row.matches + delta.matches,
                playing: delta.matches > 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.live_points
            .cmp(&a.live_points)
            .then(b.live_goal_difference.cmp(&a.live_goal_difference))
            .then(b.live_goals.cmp(&a.live_goals))
    });

    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = (idx + 1) as u32;
    }

    rows
}
