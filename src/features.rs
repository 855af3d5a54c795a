use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LeadError, Result};
use crate::play_log::{
    ExPointResult, FieldGoalResult, GameId, PassOutcome, PlayLog, PlayRow, PlayType, TwoPointConv,
};
use crate::slicer::FIRST_QUARTER;
use crate::team::TeamKey;

/// Increment this whenever any strategy's layout changes.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

const OFFENSE_FIELDS: [&str; 8] = [
    "mean_yds_to_go",
    "sum_goal_to_go",
    "sum_first_down",
    "mean_yards_gained",
    "sum_touchdown",
    "count_pass_plays",
    "count_run_plays",
    "count_pass_complete",
];

const DEFENSE_FIELDS: [&str; 6] = [
    "qb_hits_forced",
    "safeties_forced",
    "opp_pass_incomplete",
    "interceptions_forced",
    "fumbles_forced",
    "sacks_forced",
];

const SPECIAL_TEAMS_FIELDS: [&str; 8] = [
    "count_xp_made",
    "opp_xp_missed",
    "opp_xp_blocked",
    "count_two_point_success",
    "opp_two_point_failure",
    "count_fg_good",
    "opp_fg_blocked",
    "mean_fg_distance",
];

const GENERAL_FIELDS: [&str; 6] = [
    "sum_first_down",
    "sum_touchdown",
    "opp_interceptions_thrown",
    "opp_fumbles",
    "opp_sacks_taken",
    "count_fg_good",
];

const OFFENSE_DETAILED_FIELDS: [&str; 11] = [
    "mean_yds_to_go",
    "mean_yards_after_catch",
    "mean_yrdline100",
    "sum_goal_to_go",
    "sum_first_down",
    "mean_yards_gained",
    "sum_touchdown",
    "count_pass_plays",
    "count_run_plays",
    "count_pass_complete",
    "sum_reception",
];

const SPECIAL_TEAMS_DETAILED_FIELDS: [&str; 9] = [
    "count_xp_made",
    "opp_xp_missed",
    "opp_xp_blocked",
    "count_two_point_success",
    "opp_two_point_failure",
    "opp_fg_no_good",
    "count_fg_good",
    "opp_fg_blocked",
    "mean_fg_distance",
];

/// How a team's own and opponent row subsets are handed to an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionOrder {
    Forward,
    Reverse,
    Paired,
}

impl PartitionOrder {
    pub fn arrange<T>(self, own: T, opp: T) -> (T, T) {
        match self {
            PartitionOrder::Forward | PartitionOrder::Paired => (own, opp),
            PartitionOrder::Reverse => (opp, own),
        }
    }
}

impl FromStr for PartitionOrder {
    type Err = LeadError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(PartitionOrder::Forward),
            "reverse" => Ok(PartitionOrder::Reverse),
            "paired" | "forward-permute" => Ok(PartitionOrder::Paired),
            _ => Err(LeadError::UnknownPartitionOrder(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Offense,
    Defense,
    SpecialTeams,
    GeneralPerformance,
    OffenseDetailed,
    SpecialTeamsDetailed,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Offense,
        Strategy::Defense,
        Strategy::SpecialTeams,
        Strategy::GeneralPerformance,
        Strategy::OffenseDetailed,
        Strategy::SpecialTeamsDetailed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Offense => "offense",
            Strategy::Defense => "defense",
            Strategy::SpecialTeams => "special-teams",
            Strategy::GeneralPerformance => "general",
            Strategy::OffenseDetailed => "offense-detailed",
            Strategy::SpecialTeamsDetailed => "special-teams-detailed",
        }
    }

    pub fn partition_order(&self) -> PartitionOrder {
        match self {
            Strategy::Offense | Strategy::OffenseDetailed => PartitionOrder::Forward,
            Strategy::Defense => PartitionOrder::Reverse,
            Strategy::SpecialTeams
            | Strategy::GeneralPerformance
            | Strategy::SpecialTeamsDetailed => PartitionOrder::Paired,
        }
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            Strategy::Offense => &OFFENSE_FIELDS,
            Strategy::Defense => &DEFENSE_FIELDS,
            Strategy::SpecialTeams => &SPECIAL_TEAMS_FIELDS,
            Strategy::GeneralPerformance => &GENERAL_FIELDS,
            Strategy::OffenseDetailed => &OFFENSE_DETAILED_FIELDS,
            Strategy::SpecialTeamsDetailed => &SPECIAL_TEAMS_DETAILED_FIELDS,
        }
    }

    pub fn feature_len(&self) -> usize {
        self.feature_names().len()
    }

    /// Reduce one team's quarter rows (`own`) and its opponent's (`opp`) to a vector.
    pub fn extract_sides(&self, own: &[&PlayRow], opp: &[&PlayRow]) -> FeatureVector {
        let (primary, secondary) = self.partition_order().arrange(own, opp);
        let values = match self {
            Strategy::Offense => offense(primary),
            Strategy::Defense => defense(primary),
            Strategy::SpecialTeams => special_teams(primary, secondary),
            Strategy::GeneralPerformance => general_performance(primary, secondary),
            Strategy::OffenseDetailed => offense_detailed(primary),
            Strategy::SpecialTeamsDetailed => special_teams_detailed(primary, secondary),
        };
        debug_assert_eq!(values.len(), self.feature_len());
        FeatureVector::new(self.feature_names(), values)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = LeadError;

    fn from_str(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        let wanted = match wanted.as_str() {
            "general-performance" => "general",
            "special" => "special-teams",
            other => other,
        };
        Strategy::ALL
            .into_iter()
            .find(|s| s.name() == wanted)
            .ok_or_else(|| LeadError::InvalidConfig(format!("unknown strategy {raw:?}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: &'static [&'static str],
    values: Vec<f64>,
}

impl FeatureVector {
    fn new(names: &'static [&'static str], values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        Self { names, values }
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }
}

/// One team's and its opponent's rows for a single quarter, split on possession.
#[derive(Debug, Clone)]
pub struct TeamSides<'a> {
    pub game_id: GameId,
    pub team_code: String,
    pub opponent_code: String,
    pub own: Vec<&'a PlayRow>,
    pub opp: Vec<&'a PlayRow>,
}

impl<'a> TeamSides<'a> {
    pub fn split(log: &'a PlayLog, game_id: GameId, team: &TeamKey, qtr: u8) -> Result<Self> {
        let rows = log.game_rows(game_id);
        let first = rows.first().ok_or(LeadError::GameNotFound(game_id))?;
        let (team_code, opponent_code) = if team.matches(&first.home_team) {
            (first.home_team.clone(), first.away_team.clone())
        } else if team.matches(&first.away_team) {
            (first.away_team.clone(), first.home_team.clone())
        } else {
            return Err(LeadError::TeamNotInGame {
                game_id,
                team: team.index_key(),
            });
        };

        let mut own = Vec::new();
        let mut opp = Vec::new();
        for row in rows.into_iter().filter(|r| r.qtr == qtr) {
            match row.posteam.as_deref() {
                Some(code) if code == team_code => own.push(row),
                Some(code) if code == opponent_code => opp.push(row),
                _ => {}
            }
        }

        Ok(Self {
            game_id,
            team_code,
            opponent_code,
            own,
            opp,
        })
    }
}

/// First-quarter features of `team` in `game_id`.
pub fn extract(
    log: &PlayLog,
    game_id: GameId,
    team: &TeamKey,
    strategy: Strategy,
) -> Result<FeatureVector> {
    let sides = TeamSides::split(log, game_id, team, FIRST_QUARTER)?;
    log::debug!(
        "game {game_id}: {} own / {} opp rows for {}",
        sides.own.len(),
        sides.opp.len(),
        sides.team_code
    );
    Ok(strategy.extract_sides(&sides.own, &sides.opp))
}

fn sum(rows: &[&PlayRow], field: impl Fn(&PlayRow) -> Option<f64>) -> f64 {
    rows.iter().filter_map(|r| field(r)).sum()
}

/// NaN for an empty or all-undefined subset; zeroed by [`FeatureVector::new`].
fn mean(rows: &[&PlayRow], field: impl Fn(&PlayRow) -> Option<f64>) -> f64 {
    let (total, n) = rows
        .iter()
        .filter_map(|r| field(r))
        .fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    if n == 0 { f64::NAN } else { total / n as f64 }
}

fn count(rows: &[&PlayRow], pred: impl Fn(&PlayRow) -> bool) -> f64 {
    rows.iter().filter(|r| pred(r)).count() as f64
}

fn is_play(kind: PlayType) -> impl Fn(&PlayRow) -> bool {
    move |r| r.play_type == Some(kind)
}

fn is_pass(outcome: PassOutcome) -> impl Fn(&PlayRow) -> bool {
    move |r| r.pass_outcome == Some(outcome)
}

fn is_xp(result: ExPointResult) -> impl Fn(&PlayRow) -> bool {
    move |r| r.ex_point_result == Some(result)
}

fn is_two_point(result: TwoPointConv) -> impl Fn(&PlayRow) -> bool {
    move |r| r.two_point_conv == Some(result)
}

fn is_fg(result: FieldGoalResult) -> impl Fn(&PlayRow) -> bool {
    move |r| r.field_goal_result == Some(result)
}

fn offense(rows: &[&PlayRow]) -> Vec<f64> {
    vec![
        mean(rows, |r| r.yds_to_go),
        sum(rows, |r| r.goal_to_go),
        sum(rows, |r| r.first_down),
        mean(rows, |r| r.yards_gained),
        sum(rows, |r| r.touchdown),
        count(rows, is_play(PlayType::Pass)),
        count(rows, is_play(PlayType::Run)),
        count(rows, is_pass(PassOutcome::Complete)),
    ]
}

// Fed the opponent's rows: what they suffered is what this defense forced.
fn defense(rows: &[&PlayRow]) -> Vec<f64> {
    vec![
        sum(rows, |r| r.qb_hit),
        sum(rows, |r| r.safety),
        count(rows, is_pass(PassOutcome::Incomplete)),
        sum(rows, |r| r.interception_thrown),
        sum(rows, |r| r.fumble),
        sum(rows, |r| r.sack),
    ]
}

fn special_teams(own: &[&PlayRow], opp: &[&PlayRow]) -> Vec<f64> {
    vec![
        count(own, is_xp(ExPointResult::Made)),
        count(opp, is_xp(ExPointResult::Missed)),
        count(opp, is_xp(ExPointResult::Blocked)),
        count(own, is_two_point(TwoPointConv::Success)),
        count(opp, is_two_point(TwoPointConv::Failure)),
        count(own, is_fg(FieldGoalResult::Good)),
        count(opp, is_fg(FieldGoalResult::Blocked)),
        mean(own, |r| r.field_goal_distance),
    ]
}

fn general_performance(own: &[&PlayRow], opp: &[&PlayRow]) -> Vec<f64> {
    vec![
        sum(own, |r| r.first_down),
        sum(own, |r| r.touchdown),
        sum(opp, |r| r.interception_thrown),
        sum(opp, |r| r.fumble),
        sum(opp, |r| r.sack),
        count(own, is_fg(FieldGoalResult::Good)),
    ]
}

fn offense_detailed(rows: &[&PlayRow]) -> Vec<f64> {
    vec![
        mean(rows, |r| r.yds_to_go),
        mean(rows, |r| r.yards_after_catch),
        mean(rows, |r| r.yrdline100),
        sum(rows, |r| r.goal_to_go),
        sum(rows, |r| r.first_down),
        mean(rows, |r| r.yards_gained),
        sum(rows, |r| r.touchdown),
        count(rows, is_play(PlayType::Pass)),
        count(rows, is_play(PlayType::Run)),
        count(rows, is_pass(PassOutcome::Complete)),
        sum(rows, |r| r.reception),
    ]
}

fn special_teams_detailed(own: &[&PlayRow], opp: &[&PlayRow]) -> Vec<f64> {
    vec![
        count(own, is_xp(ExPointResult::Made)),
        count(opp, is_xp(ExPointResult::Missed)),
        count(opp, is_xp(ExPointResult::Blocked)),
        count(own, is_two_point(TwoPointConv::Success)),
        count(opp, is_two_point(TwoPointConv::Failure)),
        count(opp, is_fg(FieldGoalResult::NoGood)),
        count(own, is_fg(FieldGoalResult::Good)),
        count(opp, is_fg(FieldGoalResult::Blocked)),
        mean(own, |r| r.field_goal_distance),
    ]
}
