use crate::error::{LeadError, Result};
use crate::play_log::{GameId, PlayLog, PlayRow};
use crate::team::TeamKey;

pub const FIRST_QUARTER: u8 = 1;
pub const HALFTIME_QUARTER: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSnapshot {
    pub posteam: Option<String>,
    pub defensive_team: Option<String>,
    pub pos_team_score: Option<f64>,
    pub def_team_score: Option<f64>,
}

impl ScoreSnapshot {
    fn from_row(row: &PlayRow) -> Self {
        Self {
            posteam: row.posteam.clone(),
            defensive_team: row.defensive_team.clone(),
            pos_team_score: row.pos_team_score,
            def_team_score: row.def_team_score,
        }
    }

    /// The strictly leading side's code; `None` when tied or undefined.
    pub fn leader(&self) -> Option<&str> {
        let (pos, def) = (self.pos_team_score?, self.def_team_score?);
        if pos > def {
            self.posteam.as_deref()
        } else if def > pos {
            self.defensive_team.as_deref()
        } else {
            None
        }
    }
}

pub fn game_rows(log: &PlayLog, game_id: GameId) -> Vec<&PlayRow> {
    log.game_rows(game_id)
}

pub fn rows_for_quarter(log: &PlayLog, game_id: GameId, qtr: u8) -> Vec<&PlayRow> {
    log.game_rows(game_id)
        .into_iter()
        .filter(|row| row.qtr == qtr)
        .collect()
}

pub fn first_quarter_rows(log: &PlayLog, game_id: GameId) -> Vec<&PlayRow> {
    rows_for_quarter(log, game_id, FIRST_QUARTER)
}

/// Last row of the second quarter, as recorded (no scanning past sentinel rows).
pub fn halftime_score(log: &PlayLog, game_id: GameId) -> Option<ScoreSnapshot> {
    rows_for_quarter(log, game_id, HALFTIME_QUARTER)
        .last()
        .map(|row| ScoreSnapshot::from_row(row))
}

/// Whether `team` strictly leads at the last scored row of `qtr`. Ties are not a lead.
pub fn is_team_leading(log: &PlayLog, game_id: GameId, team: &TeamKey, qtr: u8) -> Result<bool> {
    let rows = rows_for_quarter(log, game_id, qtr);

    // Quarter-end sentinels carry no scores; walk back until a row does.
    let (row, (pos_score, def_score)) = rows
        .iter()
        .rev()
        .find_map(|row| row.scores().map(|s| (*row, s)))
        .ok_or(LeadError::UndefinedScoreWindowExhausted { game_id, qtr })?;

    if team.matches_opt(row.posteam.as_deref()) {
        Ok(pos_score > def_score)
    } else if team.matches_opt(row.defensive_team.as_deref()) {
        Ok(def_score > pos_score)
    } else {
        Err(LeadError::TeamNotInGame {
            game_id,
            team: team.index_key(),
        })
    }
}

/// `true` when `team` is NOT the first recorded possessor of the game.
pub fn does_team_start_with_ball(log: &PlayLog, game_id: GameId, team: &TeamKey) -> Result<bool> {
    let rows = log.game_rows(game_id);
    if rows.is_empty() {
        return Err(LeadError::GameNotFound(game_id));
    }
    let opener = rows
        .iter()
        .find_map(|row| row.posteam.as_deref())
        .ok_or(LeadError::NoPossessionRecorded { game_id })?;

    let first = rows[0];
    if !team.matches(&first.home_team) && !team.matches(&first.away_team) {
        return Err(LeadError::TeamNotInGame {
            game_id,
            team: team.index_key(),
        });
    }
    Ok(!team.matches(opener))
}
