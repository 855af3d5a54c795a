use std::path::PathBuf;

use thiserror::Error;

use crate::play_log::GameId;

pub type Result<T> = std::result::Result<T, LeadError>;

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("team {team} did not play in game {game_id}")]
    TeamNotInGame { game_id: GameId, team: String },

    #[error("no row with defined scores in game {game_id} quarter {qtr}")]
    UndefinedScoreWindowExhausted { game_id: GameId, qtr: u8 },

    #[error("no row with a possessing team in game {game_id}")]
    NoPossessionRecorded { game_id: GameId },

    #[error("unknown partition order {0:?} (expected forward, reverse or paired)")]
    UnknownPartitionOrder(String),

    #[error(
        "team {team} played {games_played} games in season {season}, week ordinal {ordinal} requested"
    )]
    WeekOrdinalOutOfRange {
        team: String,
        season: u16,
        ordinal: u8,
        games_played: usize,
    },

    #[error("game {0} not present in play log")]
    GameNotFound(GameId),

    #[error("no training samples for team {0}")]
    EmptyTrainingSet(String),

    #[error("feature length mismatch: model expects {expected}, got {actual}")]
    FeatureLengthMismatch { expected: usize, actual: usize },

    #[error("classifier used before fit")]
    ModelNotFitted,

    #[error("no fitted model for team {0}")]
    MissingModel(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("read play log {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
