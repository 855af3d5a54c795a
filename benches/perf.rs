use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use halftime_lead::features::{Strategy, extract};
use halftime_lead::partition::{Partitioner, SeasonRange, WeekOrdinalPolicy, WeekSet};
use halftime_lead::play_log::{PassOutcome, PlayLog, PlayRow, PlayType};
use halftime_lead::team::TeamKey;

const TEAMS: [&str; 8] = ["DET", "GB", "CHI", "MIN", "LA", "SF", "SEA", "ARI"];

/// Eight teams, sixteen weeks a season, a few dozen rows per game.
fn synthetic_log(seasons: std::ops::RangeInclusive<u16>) -> PlayLog {
    let mut rows = Vec::new();
    for season in seasons {
        for week in 1..=16u64 {
            for k in 0..TEAMS.len() / 2 {
                let home = TEAMS[(k + week as usize) % TEAMS.len()];
                let away = TEAMS[(k + week as usize + TEAMS.len() / 2) % TEAMS.len()];
                let game_id = u64::from(season) * 1_000_000 + week * 10 + k as u64;
                for play in 0..40u32 {
                    let qtr = (play / 10 + 1) as u8;
                    let (pos, def) = if play % 2 == 0 { (home, away) } else { (away, home) };
                    let pass = play % 3 == 0;
                    rows.push(PlayRow {
                        game_id,
                        season,
                        qtr,
                        home_team: home.to_string(),
                        away_team: away.to_string(),
                        posteam: Some(pos.to_string()),
                        defensive_team: Some(def.to_string()),
                        pos_team_score: Some(f64::from(play / 4)),
                        def_team_score: Some(f64::from(play / 5)),
                        yds_to_go: Some(10.0),
                        yards_gained: Some(f64::from(play % 9)),
                        first_down: Some(f64::from(play % 4 == 0)),
                        touchdown: Some(0.0),
                        play_type: Some(if pass { PlayType::Pass } else { PlayType::Run }),
                        pass_outcome: pass.then_some(PassOutcome::Complete),
                        ..Default::default()
                    });
                }
            }
        }
    }
    PlayLog::from_rows(rows)
}

fn bench_feature_extraction(c: &mut Criterion) {
    let log = synthetic_log(2012..=2012);
    let games = log.game_ids();
    let team = TeamKey::single("DET");
    let det_games: Vec<u64> = games
        .into_iter()
        .filter(|g| {
            log.game_rows(*g)
                .first()
                .is_some_and(|r| r.home_team == "DET" || r.away_team == "DET")
        })
        .collect();

    c.bench_function("extract_all_strategies", |b| {
        b.iter(|| {
            for game in &det_games {
                for strategy in Strategy::ALL {
                    let v = extract(&log, *game, &team, strategy).unwrap();
                    black_box(v.len());
                }
            }
        })
    });
}

fn bench_partitioning(c: &mut Criterion) {
    let log = synthetic_log(2009..=2016);
    let partitioner = Partitioner::new(
        &log,
        SeasonRange::default(),
        WeekOrdinalPolicy::Skip,
    );

    c.bench_function("games_by_week_slot_training", |b| {
        b.iter(|| {
            let index = partitioner
                .games_by_week_slot(black_box(&WeekSet::training()))
                .unwrap();
            black_box(index.total_games());
        })
    });

    c.bench_function("partitioner_build", |b| {
        b.iter(|| {
            let p = Partitioner::new(
                black_box(&log),
                SeasonRange::default(),
                WeekOrdinalPolicy::Skip,
            );
            black_box(p.seasons());
        })
    });
}

criterion_group!(benches, bench_feature_extraction, bench_partitioning);
criterion_main!(benches);
