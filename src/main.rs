use anyhow::{Context, Result};

use halftime_lead::config::{self, RunConfig};
use halftime_lead::features::Strategy;
use halftime_lead::model_store::{self, ModelArtifact};
use halftime_lead::partition::{Partitioner, WeekSet};
use halftime_lead::play_log::PlayLog;
use halftime_lead::play_store;
use halftime_lead::training::{self, EvaluationSummary, SplitReport};

fn main() -> Result<()> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = RunConfig::from_env_and_args().context("invalid configuration")?;
    let log = play_store::load_from_sources(cfg.csv_path.as_deref(), cfg.db_path.as_deref())
        .context("unable to load play-by-play log")?;
    let partitioner = Partitioner::new(&log, cfg.seasons, cfg.week_policy);

    println!("Halftime lead prediction");
    println!("Plays: {} ({} games)", log.len(), log.game_ids().len());
    println!(
        "Seasons: {}-{}  Params: {}",
        cfg.seasons.first, cfg.seasons.last, cfg.params
    );

    let strategies = cfg.strategy.strategies();
    for strategy in &strategies {
        let report = training::run_split(&log, &partitioner, *strategy, cfg.params)
            .with_context(|| format!("{strategy} run failed"))?;
        print_report(&report);

        if let Some(path) = model_path(&cfg, *strategy, strategies.len()) {
            let artifact = ModelArtifact::new(*strategy, cfg.params, report.models);
            model_store::save_models(&path, &artifact)
                .with_context(|| format!("unable to save models to {}", path.display()))?;
            println!("  saved models: {}", path.display());
        }
    }

    print_missing_summary(&log, &partitioner)?;
    Ok(())
}

/// With several strategies in one run, `--out` names a directory-like stem.
fn model_path(cfg: &RunConfig, strategy: Strategy, runs: usize) -> Option<std::path::PathBuf> {
    let out = cfg.model_out.as_ref()?;
    if runs == 1 {
        return Some(out.clone());
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "models".to_string());
    Some(out.with_file_name(format!("{stem}_{}.json", strategy.name())))
}

fn print_report(report: &SplitReport) {
    let validation = EvaluationSummary::from_results(&report.validation);
    let test = EvaluationSummary::from_results(&report.test);
    let val_pooled = validation.pooled();
    let test_pooled = test.pooled();

    println!();
    println!(
        "[{}] models={} validation={:.3} ({}/{}) test={:.3} ({}/{})",
        report.strategy,
        report.models.len(),
        val_pooled.rate(),
        val_pooled.correct,
        val_pooled.games,
        test_pooled.rate(),
        test_pooled.correct,
        test_pooled.games
    );
    for (team, val) in &validation.per_team {
        let test_rate = test
            .per_team
            .get(team)
            .map(|t| format!("{:.3}", t.rate()))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {team:<8} validation={:.3} ({} games) test={test_rate}",
            val.rate(),
            val.games
        );
    }
}

fn print_missing_summary(log: &PlayLog, partitioner: &Partitioner) -> Result<()> {
    let training_weeks = WeekSet::training();
    let index = partitioner
        .games_by_week_slot(&training_weeks)
        .context("unable to index training weeks")?;
    if !index.missing().is_empty() {
        println!();
        println!(
            "Skipped {} training week slots across {} rows of input",
            index.missing().len(),
            log.len()
        );
        for slot in index.missing().iter().take(6) {
            println!(
                "   - {} {} ordinal {} (played {})",
                slot.team, slot.season, slot.ordinal, slot.games_played
            );
        }
    }
    Ok(())
}
