use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{LeadError, Result};

pub type GameId = u64;

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other,
        }

        impl $name {
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Other => "Other",
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw.trim() {
                    $($label => $name::$variant,)+
                    _ => $name::Other,
                }
            }
        }
    };
}

labelled_enum!(
    PlayType {
        Kickoff => "Kickoff",
        Punt => "Punt",
        Pass => "Pass",
        Sack => "Sack",
        Run => "Run",
        FieldGoal => "Field Goal",
        ExtraPoint => "Extra Point",
        QuarterEnd => "Quarter End",
        TwoMinuteWarning => "Two Minute Warning",
        HalfEnd => "Half End",
        EndOfGame => "End of Game",
        NoPlay => "No Play",
        QbKneel => "QB Kneel",
        Spike => "Spike",
        Timeout => "Timeout",
    }
);

labelled_enum!(PassOutcome {
    Complete => "Complete",
    Incomplete => "Incomplete Pass",
});

labelled_enum!(ExPointResult {
    Made => "Made",
    Missed => "Missed",
    Blocked => "Blocked",
    Aborted => "Aborted",
});

labelled_enum!(TwoPointConv {
    Success => "Success",
    Failure => "Failure",
});

labelled_enum!(FieldGoalResult {
    Good => "Good",
    NoGood => "No Good",
    Blocked => "Blocked",
});

/// One play-by-play row. Columns absent from a CSV, or holding `NA`, load as `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayRow {
    #[serde(rename = "GameID")]
    pub game_id: GameId,
    #[serde(rename = "Season")]
    pub season: u16,
    #[serde(rename = "qtr")]
    pub qtr: u8,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "posteam", default, deserialize_with = "na_string")]
    pub posteam: Option<String>,
    #[serde(rename = "DefensiveTeam", default, deserialize_with = "na_string")]
    pub defensive_team: Option<String>,
    #[serde(rename = "PosTeamScore", default, deserialize_with = "na_f64")]
    pub pos_team_score: Option<f64>,
    #[serde(rename = "DefTeamScore", default, deserialize_with = "na_f64")]
    pub def_team_score: Option<f64>,
    #[serde(rename = "ydstogo", default, deserialize_with = "na_f64")]
    pub yds_to_go: Option<f64>,
    #[serde(rename = "YardsAfterCatch", default, deserialize_with = "na_f64")]
    pub yards_after_catch: Option<f64>,
    #[serde(rename = "yrdline100", default, deserialize_with = "na_f64")]
    pub yrdline100: Option<f64>,
    #[serde(rename = "GoalToGo", default, deserialize_with = "na_f64")]
    pub goal_to_go: Option<f64>,
    #[serde(rename = "FirstDown", default, deserialize_with = "na_f64")]
    pub first_down: Option<f64>,
    #[serde(rename = "Yards.Gained", default, deserialize_with = "na_f64")]
    pub yards_gained: Option<f64>,
    #[serde(rename = "Touchdown", default, deserialize_with = "na_f64")]
    pub touchdown: Option<f64>,
    #[serde(rename = "PlayType", default, deserialize_with = "na_label")]
    pub play_type: Option<PlayType>,
    #[serde(rename = "PassOutcome", default, deserialize_with = "na_label")]
    pub pass_outcome: Option<PassOutcome>,
    #[serde(rename = "InterceptionThrown", default, deserialize_with = "na_f64")]
    pub interception_thrown: Option<f64>,
    #[serde(rename = "Reception", default, deserialize_with = "na_f64")]
    pub reception: Option<f64>,
    #[serde(rename = "QBHit", default, deserialize_with = "na_f64")]
    pub qb_hit: Option<f64>,
    #[serde(rename = "Safety", default, deserialize_with = "na_f64")]
    pub safety: Option<f64>,
    #[serde(rename = "Fumble", default, deserialize_with = "na_f64")]
    pub fumble: Option<f64>,
    #[serde(rename = "Sack", default, deserialize_with = "na_f64")]
    pub sack: Option<f64>,
    #[serde(rename = "ExPointResult", default, deserialize_with = "na_label")]
    pub ex_point_result: Option<ExPointResult>,
    #[serde(rename = "TwoPointConv", default, deserialize_with = "na_label")]
    pub two_point_conv: Option<TwoPointConv>,
    #[serde(rename = "FieldGoalResult", default, deserialize_with = "na_label")]
    pub field_goal_result: Option<FieldGoalResult>,
    #[serde(rename = "FieldGoalDistance", default, deserialize_with = "na_f64")]
    pub field_goal_distance: Option<f64>,
}

impl PlayRow {
    pub fn scores(&self) -> Option<(f64, f64)> {
        match (self.pos_team_score, self.def_team_score) {
            (Some(pos), Some(def)) => Some((pos, def)),
            _ => None,
        }
    }
}

/// Immutable, ordered play-by-play table with a per-game row index.
#[derive(Debug, Clone, Default)]
pub struct PlayLog {
    rows: Vec<PlayRow>,
    by_game: HashMap<GameId, Vec<usize>>,
}

impl PlayLog {
    pub fn from_rows(rows: Vec<PlayRow>) -> Self {
        let mut by_game: HashMap<GameId, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            by_game.entry(row.game_id).or_default().push(idx);
        }
        Self { rows, by_game }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file).map_err(|source| LeadError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut rows = Vec::new();
        for record in rdr.deserialize::<PlayRow>() {
            rows.push(record?);
        }
        log::info!("loaded {} play rows", rows.len());
        Ok(Self::from_rows(rows))
    }

    pub fn rows(&self) -> &[PlayRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one game in log order; empty if the game is unknown.
    pub fn game_rows(&self, game_id: GameId) -> Vec<&PlayRow> {
        self.by_game
            .get(&game_id)
            .map(|idxs| idxs.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }

    pub fn contains_game(&self, game_id: GameId) -> bool {
        self.by_game.contains_key(&game_id)
    }

    pub fn seasons(&self) -> BTreeSet<u16> {
        self.rows.iter().map(|r| r.season).collect()
    }

    pub fn game_ids(&self) -> Vec<GameId> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.game_id))
            .map(|r| r.game_id)
            .collect()
    }
}

fn is_na(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "NA"
}

fn na_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !is_na(s)).map(|s| s.trim().to_string()))
}

fn na_f64<'de, D>(de: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw {
        Some(s) if !is_na(&s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn na_label<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> From<&'a str>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !is_na(s)).map(|s| T::from(s.as_str())))
}
