//! Pure score-change classification, one function per sport family.
//!
//! Inputs are two poll snapshots of a game's scoreline. Scores are assumed
//! non-decreasing within one contest; a negative diff (provider correction)
//! yields no event.

use crate::models::{CelebrationType, ScoreChange, ScoreKind, Side};

/// Pick the scoring side from the two diffs.
///
/// When both sides moved within one poll the update stream missed an
/// intermediate snapshot; we classify the larger swing (ties go home) and
/// flag the result ambiguous, since two polls alone cannot reconstruct a
/// genuinely simultaneous or interleaved pair of scoring plays.
fn scoring_side(
    prev_home: u32,
    prev_away: u32,
    new_home: u32,
    new_away: u32,
) -> Option<(Side, u32, bool)> {
    let home_diff = i64::from(new_home) - i64::from(prev_home);
    let away_diff = i64::from(new_away) - i64::from(prev_away);

    match (home_diff > 0, away_diff > 0) {
        (false, false) => None,
        (true, false) => Some((Side::Home, home_diff as u32, false)),
        (false, true) => Some((Side::Away, away_diff as u32, false)),
        (true, true) => {
            if away_diff > home_diff {
                Some((Side::Away, away_diff as u32, true))
            } else {
                Some((Side::Home, home_diff as u32, true))
            }
        }
    }
}

/// Classify an American-football scoreline diff.
///
/// Exact buckets: 1 extra point, 2 safety (two-point conversions share the
/// bucket), 3 field goal, 6 touchdown with no try resolved yet, 7
/// touchdown+PAT, 8 touchdown+two-point. Any other value of 6 or more is
/// treated as touchdown-inclusive; the leftovers (4, 5) as field-goal-class.
pub fn football_score_change(
    prev_home: u32,
    prev_away: u32,
    new_home: u32,
    new_away: u32,
) -> Option<ScoreChange> {
    let (side, points, ambiguous) = scoring_side(prev_home, prev_away, new_home, new_away)?;

    let kind = match points {
        1 => ScoreKind::ExtraPoint,
        2 => ScoreKind::Safety,
        3 => ScoreKind::FieldGoal,
        6 => ScoreKind::Touchdown,
        7 => ScoreKind::TouchdownExtraPoint,
        8 => ScoreKind::TouchdownTwoPoint,
        p if p >= 6 => ScoreKind::Touchdown,
        _ => ScoreKind::FieldGoal,
    };

    let video = match points {
        p if p >= 6 => Some(CelebrationType::Touchdown),
        3 => Some(CelebrationType::Fieldgoal),
        2 => Some(CelebrationType::Safety),
        _ => None,
    };

    Some(ScoreChange {
        kind,
        side,
        points,
        video,
        ambiguous,
    })
}

/// Classify an association-football scoreline diff.
///
/// Any positive diff is a goal event. `points` carries the raw diff, so a
/// multi-goal jump (missed poll) still satisfies `points == new - prev`.
/// Penalties, own goals and cards are flagged from richer event feeds at
/// the adapter level, not from the scoreline.
pub fn soccer_score_change(
    prev_home: u32,
    prev_away: u32,
    new_home: u32,
    new_away: u32,
) -> Option<ScoreChange> {
    let (side, points, ambiguous) = scoring_side(prev_home, prev_away, new_home, new_away)?;

    Some(ScoreChange {
        kind: ScoreKind::Goal,
        side,
        points,
        video: Some(CelebrationType::Goal),
        ambiguous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_change_yields_no_event() {
        assert!(football_score_change(0, 0, 0, 0).is_none());
        assert!(football_score_change(14, 7, 14, 7).is_none());
        assert!(soccer_score_change(2, 2, 2, 2).is_none());
    }

    #[test]
    fn score_correction_yields_no_event() {
        // Providers occasionally walk a score back; that is not a play.
        assert!(football_score_change(7, 0, 6, 0).is_none());
        assert!(soccer_score_change(1, 1, 1, 0).is_none());
    }

    #[test]
    fn football_diff_table_is_exact() {
        let cases: &[(u32, ScoreKind, Option<CelebrationType>)] = &[
            (1, ScoreKind::ExtraPoint, None),
            (2, ScoreKind::Safety, Some(CelebrationType::Safety)),
            (3, ScoreKind::FieldGoal, Some(CelebrationType::Fieldgoal)),
            (6, ScoreKind::Touchdown, Some(CelebrationType::Touchdown)),
            (
                7,
                ScoreKind::TouchdownExtraPoint,
                Some(CelebrationType::Touchdown),
            ),
            (
                8,
                ScoreKind::TouchdownTwoPoint,
                Some(CelebrationType::Touchdown),
            ),
        ];
        for &(diff, kind, video) in cases {
            let change = football_score_change(0, 0, diff, 0).unwrap();
            assert_eq!(change.kind, kind, "diff {}", diff);
            assert_eq!(change.video, video, "diff {}", diff);
            assert_eq!(change.side, Side::Home);
            assert_eq!(change.points, diff);
            assert!(!change.ambiguous);
        }
    }

    #[test]
    fn football_large_diffs_are_touchdown_class() {
        for diff in [9, 10, 12, 14] {
            let change = football_score_change(0, 0, 0, diff).unwrap();
            assert_eq!(change.kind, ScoreKind::Touchdown, "diff {}", diff);
            assert_eq!(change.video, Some(CelebrationType::Touchdown));
            assert_eq!(change.side, Side::Away);
        }
    }

    #[test]
    fn football_odd_small_diffs_are_field_goal_class_without_video() {
        for diff in [4, 5] {
            let change = football_score_change(10, 3, 10 + diff, 3).unwrap();
            assert_eq!(change.kind, ScoreKind::FieldGoal, "diff {}", diff);
            assert_eq!(change.video, None);
        }
    }

    #[test]
    fn football_away_field_goal() {
        let change = football_score_change(0, 0, 0, 3).unwrap();
        assert_eq!(change.kind, ScoreKind::FieldGoal);
        assert_eq!(change.side, Side::Away);
        assert_eq!(change.video, Some(CelebrationType::Fieldgoal));
    }

    #[test]
    fn football_extra_point_has_no_video() {
        let change = football_score_change(6, 0, 7, 0).unwrap();
        assert_eq!(change.kind, ScoreKind::ExtraPoint);
        assert_eq!(change.video, None);
    }

    #[test]
    fn simultaneous_diffs_classify_larger_swing() {
        // Home touchdown+PAT and away field goal in one poll window.
        let change = football_score_change(0, 0, 7, 3).unwrap();
        assert_eq!(change.side, Side::Home);
        assert_eq!(change.kind, ScoreKind::TouchdownExtraPoint);
        assert_eq!(change.points, 7);
        assert!(change.ambiguous);

        let change = football_score_change(0, 0, 3, 7).unwrap();
        assert_eq!(change.side, Side::Away);
        assert!(change.ambiguous);
    }

    #[test]
    fn simultaneous_equal_diffs_go_home() {
        let change = football_score_change(0, 0, 3, 3).unwrap();
        assert_eq!(change.side, Side::Home);
        assert!(change.ambiguous);
    }

    #[test]
    fn soccer_goal_per_side() {
        let change = soccer_score_change(1, 0, 2, 0).unwrap();
        assert_eq!(change.kind, ScoreKind::Goal);
        assert_eq!(change.side, Side::Home);
        assert_eq!(change.points, 1);
        assert_eq!(change.video, Some(CelebrationType::Goal));

        let change = soccer_score_change(0, 0, 0, 1).unwrap();
        assert_eq!(change.side, Side::Away);
    }

    #[test]
    fn soccer_multi_goal_jump_keeps_raw_diff() {
        let change = soccer_score_change(0, 0, 2, 0).unwrap();
        assert_eq!(change.kind, ScoreKind::Goal);
        assert_eq!(change.points, 2);
    }
}
