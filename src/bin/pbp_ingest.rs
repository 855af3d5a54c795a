use anyhow::{Context, Result, anyhow};

use halftime_lead::config::{self, RunConfig};
use halftime_lead::play_log::PlayLog;
use halftime_lead::play_store;

fn main() -> Result<()> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = RunConfig::from_env_and_args().context("invalid configuration")?;
    let csv_path = cfg
        .csv_path
        .clone()
        .ok_or_else(|| anyhow!("no CSV given (use --csv=PATH or PBP_CSV_PATH)"))?;
    let db_path = cfg
        .db_path
        .clone()
        .or_else(play_store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let log = PlayLog::from_csv_path(&csv_path)
        .with_context(|| format!("unable to read {}", csv_path.display()))?;
    let mut conn = play_store::open_db(&db_path)?;
    let summary = play_store::ingest_play_log(
        &mut conn,
        db_path.clone(),
        &csv_path.display().to_string(),
        &log,
    )?;

    println!("Play-by-play ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!("Source: {}", csv_path.display());
    println!("Seasons: {:?}", summary.seasons);
    println!("Games: {}", summary.games);
    println!("Rows upserted: {}", summary.rows_upserted);

    Ok(())
}
