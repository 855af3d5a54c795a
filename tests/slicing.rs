mod common;

use common::{GameBuilder, log_of};
use halftime_lead::LeadError;
use halftime_lead::play_log::PlayType;
use halftime_lead::slicer::{
    does_team_start_with_ball, first_quarter_rows, game_rows, halftime_score, is_team_leading,
    rows_for_quarter,
};
use halftime_lead::team::{TeamKey, canonical_key};

const GAME: u64 = 2012091600;

fn det_gb() -> GameBuilder {
    GameBuilder::new(GAME, 2012, "DET", "GB")
}

#[test]
fn det_leads_gb_at_halftime() {
    let log = log_of(vec![
        det_gb()
            .scored(1, "GB", (0.0, 0.0))
            .scored(2, "DET", (7.0, 3.0))
            .build(),
    ]);
    assert!(is_team_leading(&log, GAME, &TeamKey::single("DET"), 2).expect("DET in game"));
    assert!(!is_team_leading(&log, GAME, &TeamKey::single("GB"), 2).expect("GB in game"));
}

#[test]
fn tie_is_not_a_lead_for_either_side() {
    let log = log_of(vec![det_gb().scored(2, "GB", (10.0, 10.0)).build()]);
    assert!(!is_team_leading(&log, GAME, &TeamKey::single("DET"), 2).expect("in game"));
    assert!(!is_team_leading(&log, GAME, &TeamKey::single("GB"), 2).expect("in game"));
}

#[test]
fn sentinel_rows_widen_the_window() {
    let log = log_of(vec![
        det_gb()
            .scored(2, "GB", (3.0, 14.0))
            .sentinel(2, PlayType::TwoMinuteWarning)
            .sentinel(2, PlayType::HalfEnd)
            .build(),
    ]);
    assert!(is_team_leading(&log, GAME, &TeamKey::single("DET"), 2).expect("widened"));
}

#[test]
fn window_exhausted_without_any_scores() {
    let log = log_of(vec![
        det_gb()
            .scored(1, "DET", (0.0, 0.0))
            .sentinel(2, PlayType::HalfEnd)
            .build(),
    ]);
    let err = is_team_leading(&log, GAME, &TeamKey::single("DET"), 2).unwrap_err();
    assert!(matches!(
        err,
        LeadError::UndefinedScoreWindowExhausted { game_id: GAME, qtr: 2 }
    ));
}

#[test]
fn outsider_team_is_rejected() {
    let log = log_of(vec![det_gb().scored(2, "DET", (7.0, 0.0)).build()]);
    let err = is_team_leading(&log, GAME, &TeamKey::single("CHI"), 2).unwrap_err();
    assert!(matches!(err, LeadError::TeamNotInGame { .. }));
}

#[test]
fn dual_identity_resolves_against_either_code() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2016, "LA", "SF")
            .scored(2, "SF", (0.0, 3.0))
            .build(),
    ]);
    assert!(is_team_leading(&log, GAME, &canonical_key("STL"), 2).expect("LA resolves"));
}

#[test]
fn quarter_subsets_filter_by_game_and_quarter() {
    let log = log_of(vec![
        det_gb()
            .scored(1, "DET", (0.0, 0.0))
            .scored(1, "GB", (0.0, 0.0))
            .scored(2, "GB", (0.0, 3.0))
            .build(),
        GameBuilder::new(GAME + 1, 2012, "CHI", "MIN")
            .scored(1, "CHI", (0.0, 0.0))
            .build(),
    ]);
    assert_eq!(game_rows(&log, GAME).len(), 3);
    assert!(log.contains_game(GAME + 1));
    assert!(!log.contains_game(GAME + 2));
    assert_eq!(first_quarter_rows(&log, GAME).len(), 2);
    assert_eq!(rows_for_quarter(&log, GAME, 2).len(), 1);
    assert!(rows_for_quarter(&log, GAME, 3).is_empty());
}

#[test]
fn halftime_snapshot_names_the_leader() {
    let log = log_of(vec![det_gb().scored(2, "DET", (7.0, 3.0)).build()]);
    let snap = halftime_score(&log, GAME).expect("quarter two present");
    assert_eq!(snap.leader(), Some("DET"));
}

#[test]
fn start_with_ball_is_negated_initial_possession() {
    let log = log_of(vec![
        det_gb()
            .sentinel(1, PlayType::Timeout)
            .scored(1, "GB", (0.0, 0.0))
            .scored(1, "DET", (0.0, 0.0))
            .build(),
    ]);
    assert!(!does_team_start_with_ball(&log, GAME, &TeamKey::single("GB")).expect("GB"));
    assert!(does_team_start_with_ball(&log, GAME, &TeamKey::single("DET")).expect("DET"));
    assert!(matches!(
        does_team_start_with_ball(&log, GAME, &TeamKey::single("NE")),
        Err(LeadError::TeamNotInGame { .. })
    ));
    assert!(matches!(
        does_team_start_with_ball(&log, 1, &TeamKey::single("DET")),
        Err(LeadError::GameNotFound(1))
    ));
}

#[test]
fn start_with_ball_needs_a_possession() {
    let log = log_of(vec![det_gb().sentinel(1, PlayType::QuarterEnd).build()]);
    assert!(matches!(
        does_team_start_with_ball(&log, GAME, &TeamKey::single("DET")),
        Err(LeadError::NoPossessionRecorded { .. })
    ));
}
