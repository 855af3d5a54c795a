use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{LeadError, Result};
use crate::play_log::{GameId, PlayLog};
use crate::team::{TeamKey, all_teams};

pub const TRAINING_WEEKS: [u8; 8] = [1, 3, 5, 7, 9, 11, 13, 15];
pub const VALIDATION_WEEKS: [u8; 4] = [2, 6, 10, 14];
pub const TEST_WEEKS: [u8; 4] = [4, 8, 12, 16];

const DEFAULT_FIRST_SEASON: u16 = 2009;
const DEFAULT_LAST_SEASON: u16 = 2016;

/// 1-indexed game ordinals within a team's season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSet(Vec<u8>);

impl WeekSet {
    pub fn new(ordinals: &[u8]) -> Result<Self> {
        let mut seen = HashSet::new();
        for ordinal in ordinals {
            if *ordinal == 0 {
                return Err(LeadError::InvalidConfig(
                    "week ordinals are 1-indexed".to_string(),
                ));
            }
            if !seen.insert(*ordinal) {
                return Err(LeadError::InvalidConfig(format!(
                    "week ordinal {ordinal} listed twice"
                )));
            }
        }
        Ok(Self(ordinals.to_vec()))
    }

    pub fn training() -> Self {
        Self(TRAINING_WEEKS.to_vec())
    }

    pub fn validation() -> Self {
        Self(VALIDATION_WEEKS.to_vec())
    }

    pub fn test() -> Self {
        Self(TEST_WEEKS.to_vec())
    }

    pub fn ordinals(&self) -> &[u8] {
        &self.0
    }

    pub fn is_disjoint(&self, other: &WeekSet) -> bool {
        self.0.iter().all(|w| !other.0.contains(w))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    pub first: u16,
    pub last: u16,
}

impl Default for SeasonRange {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_SEASON,
            last: DEFAULT_LAST_SEASON,
        }
    }
}

impl SeasonRange {
    pub fn new(first: u16, last: u16) -> Result<Self> {
        if first > last {
            return Err(LeadError::InvalidConfig(format!(
                "season range {first}-{last} is empty"
            )));
        }
        Ok(Self { first, last })
    }

    pub fn seasons(&self) -> RangeInclusive<u16> {
        self.first..=self.last
    }
}

impl FromStr for SeasonRange {
    type Err = LeadError;

    /// `2009-2016` or a single season `2012`.
    fn from_str(raw: &str) -> Result<Self> {
        let parse = |s: &str| {
            s.trim()
                .parse::<u16>()
                .map_err(|_| LeadError::InvalidConfig(format!("bad season {s:?}")))
        };
        match raw.split_once('-') {
            Some((a, b)) => Self::new(parse(a)?, parse(b)?),
            None => {
                let season = parse(raw)?;
                Self::new(season, season)
            }
        }
    }
}

/// What to do when a team has fewer games in a season than a requested ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekOrdinalPolicy {
    #[default]
    Skip,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexedGame {
    pub game_id: GameId,
    pub season: u16,
    pub home_team: String,
    pub away_team: String,
}

impl IndexedGame {
    pub fn involves(&self, team: &TeamKey) -> bool {
        team.matches(&self.home_team) || team.matches(&self.away_team)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameIndex {
    games: Vec<IndexedGame>,
}

impl GameIndex {
    pub fn build(log: &PlayLog) -> Self {
        let mut seen = HashSet::new();
        let mut games = Vec::new();
        for row in log.rows() {
            let game = IndexedGame {
                game_id: row.game_id,
                season: row.season,
                home_team: row.home_team.clone(),
                away_team: row.away_team.clone(),
            };
            if !seen.contains(&game) {
                seen.insert(game.clone());
                games.push(game);
            }
        }
        Self { games }
    }

    pub fn games(&self) -> &[IndexedGame] {
        &self.games
    }

    pub fn season_games(&self, team: &TeamKey, season: u16) -> Vec<&IndexedGame> {
        self.games
            .iter()
            .filter(|g| g.season == season && g.involves(team))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSlot {
    pub team: String,
    pub season: u16,
    pub ordinal: u8,
    pub games_played: usize,
}

/// Team index key to game ids, one per (season, ordinal) slot, seasons ascending.
#[derive(Debug, Clone, Default)]
pub struct GameWeekIndex {
    teams: BTreeMap<String, Vec<GameId>>,
    missing: Vec<MissingSlot>,
}

impl GameWeekIndex {
    pub fn get(&self, team_key: &str) -> Option<&[GameId]> {
        self.teams.get(team_key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<GameId>)> {
        self.teams.iter()
    }

    pub fn team_keys(&self) -> impl Iterator<Item = &String> {
        self.teams.keys()
    }

    pub fn missing(&self) -> &[MissingSlot] {
        &self.missing
    }

    pub fn total_games(&self) -> usize {
        self.teams.values().map(Vec::len).sum()
    }

    /// Per team, game ids present in both indexes. Empty when the partitions are disjoint.
    pub fn overlap_with(&self, other: &GameWeekIndex) -> BTreeMap<String, Vec<GameId>> {
        let mut out = BTreeMap::new();
        for (team, games) in &self.teams {
            let Some(theirs) = other.teams.get(team) else {
                continue;
            };
            let theirs: BTreeSet<GameId> = theirs.iter().copied().collect();
            let shared: Vec<GameId> = games
                .iter()
                .copied()
                .filter(|g| theirs.contains(g))
                .collect();
            if !shared.is_empty() {
                out.insert(team.clone(), shared);
            }
        }
        out
    }
}

/// Maps week-sets to per-team game ids over a fixed season span.
#[derive(Debug, Clone)]
pub struct Partitioner {
    index: GameIndex,
    seasons: SeasonRange,
    policy: WeekOrdinalPolicy,
}

impl Partitioner {
    pub fn new(log: &PlayLog, seasons: SeasonRange, policy: WeekOrdinalPolicy) -> Self {
        Self {
            index: GameIndex::build(log),
            seasons,
            policy,
        }
    }

    pub fn seasons(&self) -> SeasonRange {
        self.seasons
    }

    pub fn games_by_week_slot(&self, weeks: &WeekSet) -> Result<GameWeekIndex> {
        let mut out = GameWeekIndex::default();
        for team in all_teams() {
            let key = team.index_key();
            let mut ids = Vec::new();
            for season in self.seasons.seasons() {
                let games = self.index.season_games(&team, season);
                for &ordinal in weeks.ordinals() {
                    match games.get(usize::from(ordinal) - 1) {
                        Some(game) => ids.push(game.game_id),
                        None => {
                            let slot = MissingSlot {
                                team: key.clone(),
                                season,
                                ordinal,
                                games_played: games.len(),
                            };
                            if self.policy == WeekOrdinalPolicy::Fail {
                                return Err(LeadError::WeekOrdinalOutOfRange {
                                    team: slot.team,
                                    season,
                                    ordinal,
                                    games_played: slot.games_played,
                                });
                            }
                            out.missing.push(slot);
                        }
                    }
                }
            }
            out.teams.insert(key, ids);
        }
        if !out.missing.is_empty() {
            log::warn!(
                "{} week slots skipped (team had fewer games than the ordinal)",
                out.missing.len()
            );
        }
        log::info!(
            "indexed {} games for week ordinals {:?}",
            out.total_games(),
            weeks.ordinals()
        );
        Ok(out)
    }
}

/// Convenience over [`Partitioner`] with the default season span and skip policy.
pub fn games_by_week_slot(log: &PlayLog, weeks: &WeekSet) -> Result<GameWeekIndex> {
    Partitioner::new(log, SeasonRange::default(), WeekOrdinalPolicy::default())
        .games_by_week_slot(weeks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_week_sets_are_disjoint() {
        let sets = [WeekSet::training(), WeekSet::validation(), WeekSet::test()];
        for (i, a) in sets.iter().enumerate() {
            for b in sets.iter().skip(i + 1) {
                assert!(a.is_disjoint(b));
            }
        }
    }

    #[test]
    fn week_set_rejects_zero_and_duplicates() {
        assert!(WeekSet::new(&[0, 1]).is_err());
        assert!(WeekSet::new(&[3, 3]).is_err());
        assert!(WeekSet::new(&[1, 2]).is_ok());
    }

    #[test]
    fn season_range_parses() {
        let r: SeasonRange = "2010-2012".parse().expect("valid range");
        assert_eq!(r.seasons().count(), 3);
        let single: SeasonRange = "2014".parse().expect("single season");
        assert_eq!((single.first, single.last), (2014, 2014));
        assert!("2016-2009".parse::<SeasonRange>().is_err());
    }
}
