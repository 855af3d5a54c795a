use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, Row, params};

use crate::config::app_cache_dir;
use crate::error::{LeadError, Result};
use crate::play_log::{
    ExPointResult, FieldGoalResult, PassOutcome, PlayLog, PlayRow, PlayType, TwoPointConv,
};

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub rows_upserted: usize,
    pub games: usize,
    pub seasons: Vec<u16>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("play_by_play.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS plays (
            game_id INTEGER NOT NULL,
            play_idx INTEGER NOT NULL,
            season INTEGER NOT NULL,
            qtr INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            posteam TEXT NULL,
            defensive_team TEXT NULL,
            pos_team_score REAL NULL,
            def_team_score REAL NULL,
            yds_to_go REAL NULL,
            yards_after_catch REAL NULL,
            yrdline100 REAL NULL,
            goal_to_go REAL NULL,
            first_down REAL NULL,
            yards_gained REAL NULL,
            touchdown REAL NULL,
            play_type TEXT NULL,
            pass_outcome TEXT NULL,
            interception_thrown REAL NULL,
            reception REAL NULL,
            qb_hit REAL NULL,
            safety REAL NULL,
            fumble REAL NULL,
            sack REAL NULL,
            ex_point_result TEXT NULL,
            two_point_conv TEXT NULL,
            field_goal_result TEXT NULL,
            field_goal_distance REAL NULL,
            PRIMARY KEY (game_id, play_idx)
        );
        CREATE INDEX IF NOT EXISTS idx_plays_season ON plays(season);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source TEXT NOT NULL,
            rows_upserted INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Upserts every row keyed by (game, position within the game) in one transaction.
/// Stored rows past a game's new length are dropped.
pub fn ingest_play_log(
    conn: &mut Connection,
    db_path: PathBuf,
    source: &str,
    log: &PlayLog,
) -> Result<IngestSummary> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, source, rows_upserted)
         VALUES (?1, NULL, ?2, 0)",
        params![Utc::now().to_rfc3339(), source],
    )?;
    let run_id = tx.last_insert_rowid();

    let mut rows_upserted = 0usize;
    for game_id in log.game_ids() {
        let rows = log.game_rows(game_id);
        for (play_idx, row) in rows.iter().enumerate() {
            upsert_play(&tx, play_idx, row)?;
            rows_upserted += 1;
        }
        let stale = tx.execute(
            "DELETE FROM plays WHERE game_id = ?1 AND play_idx >= ?2",
            params![game_id as i64, rows.len() as i64],
        )?;
        if stale > 0 {
            log::debug!("game {game_id}: dropped {stale} stale stored rows");
        }
    }

    tx.execute(
        "UPDATE ingest_runs SET finished_at = ?1, rows_upserted = ?2 WHERE run_id = ?3",
        params![Utc::now().to_rfc3339(), rows_upserted as i64, run_id],
    )?;
    tx.commit()?;

    let seasons: BTreeSet<u16> = log.seasons();
    log::info!("ingested {rows_upserted} rows from {source}");
    Ok(IngestSummary {
        db_path,
        rows_upserted,
        games: log.game_ids().len(),
        seasons: seasons.into_iter().collect(),
    })
}

/// A CSV path wins over the SQLite store; the store falls back to [`default_db_path`].
pub fn load_from_sources(csv_path: Option<&Path>, db_path: Option<&Path>) -> Result<PlayLog> {
    if let Some(path) = csv_path {
        return PlayLog::from_csv_path(path);
    }
    let db_path = db_path
        .map(Path::to_path_buf)
        .or_else(default_db_path)
        .ok_or_else(|| LeadError::InvalidConfig("no play log source configured".to_string()))?;
    if !db_path.exists() {
        return Err(LeadError::InvalidConfig(format!(
            "play store {} does not exist; run pbp_ingest first",
            db_path.display()
        )));
    }
    let conn = open_db(&db_path)?;
    load_play_log(&conn)
}

/// Loads every stored play ordered by game id, then position within the game.
pub fn load_play_log(conn: &Connection) -> Result<PlayLog> {
    let mut stmt = conn.prepare(
        r#"
        SELECT
            game_id, season, qtr, home_team, away_team, posteam, defensive_team,
            pos_team_score, def_team_score, yds_to_go, yards_after_catch, yrdline100,
            goal_to_go, first_down, yards_gained, touchdown, play_type, pass_outcome,
            interception_thrown, reception, qb_hit, safety, fumble, sack,
            ex_point_result, two_point_conv, field_goal_result, field_goal_distance
        FROM plays
        ORDER BY game_id ASC, play_idx ASC
        "#,
    )?;
    let rows = stmt.query_map([], decode_play)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    log::info!("loaded {} play rows from sqlite", out.len());
    Ok(PlayLog::from_rows(out))
}

fn decode_play(row: &Row<'_>) -> rusqlite::Result<PlayRow> {
    let label = |idx: usize| row.get::<_, Option<String>>(idx);
    Ok(PlayRow {
        game_id: row.get::<_, u64>(0)?,
        season: row.get(1)?,
        qtr: row.get(2)?,
        home_team: row.get(3)?,
        away_team: row.get(4)?,
        posteam: row.get(5)?,
        defensive_team: row.get(6)?,
        pos_team_score: row.get(7)?,
        def_team_score: row.get(8)?,
        yds_to_go: row.get(9)?,
        yards_after_catch: row.get(10)?,
        yrdline100: row.get(11)?,
        goal_to_go: row.get(12)?,
        first_down: row.get(13)?,
        yards_gained: row.get(14)?,
        touchdown: row.get(15)?,
        play_type: label(16)?.as_deref().map(PlayType::from),
        pass_outcome: label(17)?.as_deref().map(PassOutcome::from),
        interception_thrown: row.get(18)?,
        reception: row.get(19)?,
        qb_hit: row.get(20)?,
        safety: row.get(21)?,
        fumble: row.get(22)?,
        sack: row.get(23)?,
        ex_point_result: label(24)?.as_deref().map(ExPointResult::from),
        two_point_conv: label(25)?.as_deref().map(TwoPointConv::from),
        field_goal_result: label(26)?.as_deref().map(FieldGoalResult::from),
        field_goal_distance: row.get(27)?,
    })
}

fn upsert_play(tx: &rusqlite::Transaction<'_>, play_idx: usize, p: &PlayRow) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO plays (
            game_id, play_idx, season, qtr, home_team, away_team, posteam, defensive_team,
            pos_team_score, def_team_score, yds_to_go, yards_after_catch, yrdline100,
            goal_to_go, first_down, yards_gained, touchdown, play_type, pass_outcome,
            interception_thrown, reception, qb_hit, safety, fumble, sack,
            ex_point_result, two_point_conv, field_goal_result, field_goal_distance
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23, ?24, ?25,
            ?26, ?27, ?28, ?29
        )
        ON CONFLICT(game_id, play_idx) DO UPDATE SET
            season = excluded.season,
            qtr = excluded.qtr,
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            posteam = excluded.posteam,
            defensive_team = excluded.defensive_team,
            pos_team_score = excluded.pos_team_score,
            def_team_score = excluded.def_team_score,
            yds_to_go = excluded.yds_to_go,
            yards_after_catch = excluded.yards_after_catch,
            yrdline100 = excluded.yrdline100,
            goal_to_go = excluded.goal_to_go,
            first_down = excluded.first_down,
            yards_gained = excluded.yards_gained,
            touchdown = excluded.touchdown,
            play_type = excluded.play_type,
            pass_outcome = excluded.pass_outcome,
            interception_thrown = excluded.interception_thrown,
            reception = excluded.reception,
            qb_hit = excluded.qb_hit,
            safety = excluded.safety,
            fumble = excluded.fumble,
            sack = excluded.sack,
            ex_point_result = excluded.ex_point_result,
            two_point_conv = excluded.two_point_conv,
            field_goal_result = excluded.field_goal_result,
            field_goal_distance = excluded.field_goal_distance
        "#,
        params![
            p.game_id as i64,
            play_idx as i64,
            p.season,
            p.qtr,
            p.home_team,
            p.away_team,
            p.posteam,
            p.defensive_team,
            p.pos_team_score,
            p.def_team_score,
            p.yds_to_go,
            p.yards_after_catch,
            p.yrdline100,
            p.goal_to_go,
            p.first_down,
            p.yards_gained,
            p.touchdown,
            p.play_type.map(|v| v.label()),
            p.pass_outcome.map(|v| v.label()),
            p.interception_thrown,
            p.reception,
            p.qb_hit,
            p.safety,
            p.fumble,
            p.sack,
            p.ex_point_result.map(|v| v.label()),
            p.two_point_conv.map(|v| v.label()),
            p.field_goal_result.map(|v| v.label()),
            p.field_goal_distance,
        ],
    )?;
    Ok(())
}
