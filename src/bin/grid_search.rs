use anyhow::{Context, Result};

use halftime_lead::config::{self, RunConfig};
use halftime_lead::partition::Partitioner;
use halftime_lead::play_store;
use halftime_lead::team::{TeamKey, all_teams};
use halftime_lead::training::{self, ParamGrid};

fn main() -> Result<()> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = RunConfig::from_env_and_args().context("invalid configuration")?;
    let log = play_store::load_from_sources(cfg.csv_path.as_deref(), cfg.db_path.as_deref())
        .context("unable to load play-by-play log")?;
    let partitioner = Partitioner::new(&log, cfg.seasons, cfg.week_policy);
    let grid = ParamGrid {
        kernel: cfg.params.kernel,
        ..ParamGrid::default()
    };
    let teams: Vec<TeamKey> = match &cfg.team {
        Some(team) => vec![team.clone()],
        None => all_teams(),
    };

    println!(
        "Grid search: {} candidates, {} teams",
        grid.candidates().len(),
        teams.len()
    );
    for strategy in cfg.strategy.strategies() {
        println!();
        println!("[{strategy}]");
        for team in &teams {
            let key = team.index_key();
            match training::grid_search(&log, &partitioner, strategy, team, &grid) {
                Ok(outcome) => println!(
                    "  {key:<8} best {} validation={:.3} ({} evaluated)",
                    outcome.params, outcome.score, outcome.evaluated
                ),
                Err(err) => println!("  {key:<8} skipped: {err}"),
            }
        }
    }

    Ok(())
}
