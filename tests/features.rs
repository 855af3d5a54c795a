mod common;

use common::{GameBuilder, league_season, log_of};
use halftime_lead::LeadError;
use halftime_lead::features::{PartitionOrder, Strategy, TeamSides, extract};
use halftime_lead::play_log::{
    ExPointResult, FieldGoalResult, PassOutcome, PlayRow, PlayType, TwoPointConv,
};
use halftime_lead::team::{TeamKey, canonical_key};

const GAME: u64 = 2013092200;

fn run(yards: f64) -> impl FnOnce(&mut PlayRow) {
    move |r| {
        r.play_type = Some(PlayType::Run);
        r.yards_gained = Some(yards);
    }
}

#[test]
fn offense_mean_and_run_count() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "DET", "GB")
            .play(1, "DET", (0.0, 0.0), run(5.0))
            .play(1, "DET", (0.0, 0.0), |r| {
                r.play_type = Some(PlayType::Pass);
                r.pass_outcome = Some(PassOutcome::Incomplete);
                r.yards_gained = Some(-2.0);
            })
            .play(1, "DET", (0.0, 0.0), run(10.0))
            .play(1, "GB", (0.0, 0.0), run(40.0))
            .build(),
    ]);
    let v = extract(&log, GAME, &TeamKey::single("DET"), Strategy::Offense).expect("extract");
    let mean = v.get("mean_yards_gained").expect("field present");
    assert!((mean - 13.0 / 3.0).abs() < 1e-12);
    assert_eq!(v.get("count_run_plays"), Some(2.0));
    assert_eq!(v.get("count_pass_plays"), Some(1.0));
    assert_eq!(v.get("count_pass_complete"), Some(0.0));
}

#[test]
fn empty_subset_yields_all_zero_vectors() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "DET", "GB")
            .scored(2, "DET", (0.0, 0.0))
            .build(),
    ]);
    for strategy in Strategy::ALL {
        let v = extract(&log, GAME, &TeamKey::single("GB"), strategy).expect("extract");
        assert_eq!(v.len(), strategy.feature_len());
        assert!(v.values().iter().all(|x| *x == 0.0), "{strategy}: {v:?}");
    }
}

#[test]
fn schema_is_stable_across_games() {
    let log = log_of(league_season(2012, 16));
    let team = TeamKey::single("CHI");
    let games: Vec<u64> = log
        .game_ids()
        .into_iter()
        .filter(|g| {
            log.game_rows(*g)
                .first()
                .is_some_and(|r| team.matches(&r.home_team) || team.matches(&r.away_team))
        })
        .collect();
    assert_eq!(games.len(), 16);
    for strategy in Strategy::ALL {
        for game in &games {
            let v = extract(&log, *game, &team, strategy).expect("extract");
            assert_eq!(v.names(), strategy.feature_names());
            assert_eq!(v.len(), strategy.feature_len());
            assert!(v.values().iter().all(|x| x.is_finite()));
        }
    }
}

#[test]
fn defense_reads_the_opponents_rows() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "DET", "GB")
            .play(1, "GB", (0.0, 0.0), |r| {
                r.qb_hit = Some(1.0);
                r.sack = Some(1.0);
                r.play_type = Some(PlayType::Sack);
            })
            .play(1, "GB", (0.0, 0.0), |r| {
                r.play_type = Some(PlayType::Pass);
                r.pass_outcome = Some(PassOutcome::Incomplete);
                r.interception_thrown = Some(1.0);
            })
            .play(1, "DET", (0.0, 0.0), |r| r.fumble = Some(1.0))
            .build(),
    ]);
    let det = extract(&log, GAME, &TeamKey::single("DET"), Strategy::Defense).expect("DET");
    assert_eq!(det.values(), &[1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    let gb = extract(&log, GAME, &TeamKey::single("GB"), Strategy::Defense).expect("GB");
    assert_eq!(gb.get("fumbles_forced"), Some(1.0));
    assert_eq!(gb.get("sacks_forced"), Some(0.0));
}

#[test]
fn special_teams_splits_for_and_against() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "JAX", "TEN")
            .play(1, "JAX", (0.0, 0.0), |r| {
                r.play_type = Some(PlayType::FieldGoal);
                r.field_goal_result = Some(FieldGoalResult::Good);
                r.field_goal_distance = Some(40.0);
            })
            .play(1, "JAX", (3.0, 0.0), |r| {
                r.play_type = Some(PlayType::FieldGoal);
                r.field_goal_result = Some(FieldGoalResult::NoGood);
                r.field_goal_distance = Some(50.0);
            })
            .play(1, "TEN", (0.0, 3.0), |r| {
                r.play_type = Some(PlayType::ExtraPoint);
                r.ex_point_result = Some(ExPointResult::Blocked);
            })
            .play(1, "TEN", (6.0, 3.0), |r| {
                r.two_point_conv = Some(TwoPointConv::Failure);
            })
            .play(1, "TEN", (6.0, 3.0), |r| {
                r.field_goal_result = Some(FieldGoalResult::NoGood);
            })
            .build(),
    ]);
    let jax = canonical_key("JAC");
    let v = extract(&log, GAME, &jax, Strategy::SpecialTeams).expect("special");
    assert_eq!(v.get("count_fg_good"), Some(1.0));
    assert_eq!(v.get("opp_xp_blocked"), Some(1.0));
    assert_eq!(v.get("opp_two_point_failure"), Some(1.0));
    assert_eq!(v.get("mean_fg_distance"), Some(45.0));

    let detailed = extract(&log, GAME, &jax, Strategy::SpecialTeamsDetailed).expect("detailed");
    assert_eq!(detailed.get("opp_fg_no_good"), Some(1.0));
    assert_eq!(detailed.len(), v.len() + 1);
}

#[test]
fn general_performance_mixes_own_and_opponent() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "DET", "GB")
            .play(1, "DET", (0.0, 0.0), |r| {
                r.first_down = Some(1.0);
                r.touchdown = Some(1.0);
            })
            .play(1, "GB", (0.0, 7.0), |r| {
                r.interception_thrown = Some(1.0);
                r.first_down = Some(1.0);
            })
            .build(),
    ]);
    let v = extract(&log, GAME, &TeamKey::single("DET"), Strategy::GeneralPerformance)
        .expect("general");
    assert_eq!(v.values(), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn sides_only_cover_the_first_quarter() {
    let log = log_of(vec![
        GameBuilder::new(GAME, 2013, "DET", "GB")
            .play(1, "DET", (0.0, 0.0), run(3.0))
            .play(2, "DET", (0.0, 0.0), run(30.0))
            .build(),
    ]);
    let sides = TeamSides::split(&log, GAME, &TeamKey::single("GB"), 1).expect("split");
    assert_eq!((sides.own.len(), sides.opp.len()), (0, 1));
    assert_eq!(sides.opponent_code, "DET");
    assert!(matches!(
        extract(&log, GAME, &TeamKey::single("NE"), Strategy::Offense),
        Err(LeadError::TeamNotInGame { .. })
    ));
}

#[test]
fn strategies_wire_the_documented_partition_order() {
    assert_eq!(Strategy::Offense.partition_order(), PartitionOrder::Forward);
    assert_eq!(Strategy::Defense.partition_order(), PartitionOrder::Reverse);
    assert_eq!(Strategy::SpecialTeams.partition_order(), PartitionOrder::Paired);
    assert_eq!(
        Strategy::GeneralPerformance.partition_order(),
        PartitionOrder::Paired
    );
}
