#![allow(dead_code)]

use halftime_lead::play_log::{GameId, PassOutcome, PlayLog, PlayRow, PlayType};

/// Builds the rows of one game in order.
pub struct GameBuilder {
    game_id: GameId,
    season: u16,
    home: String,
    away: String,
    rows: Vec<PlayRow>,
}

impl GameBuilder {
    pub fn new(game_id: GameId, season: u16, home: &str, away: &str) -> Self {
        Self {
            game_id,
            season,
            home: home.to_string(),
            away: away.to_string(),
            rows: Vec::new(),
        }
    }

    fn base(&self, qtr: u8) -> PlayRow {
        PlayRow {
            game_id: self.game_id,
            season: self.season,
            qtr,
            home_team: self.home.clone(),
            away_team: self.away.clone(),
            ..Default::default()
        }
    }

    fn opponent_of(&self, posteam: &str) -> String {
        if posteam == self.home {
            self.away.clone()
        } else {
            self.home.clone()
        }
    }

    /// A play by `posteam` with the running score from its perspective.
    pub fn play(
        mut self,
        qtr: u8,
        posteam: &str,
        score: (f64, f64),
        edit: impl FnOnce(&mut PlayRow),
    ) -> Self {
        let mut row = self.base(qtr);
        row.posteam = Some(posteam.to_string());
        row.defensive_team = Some(self.opponent_of(posteam));
        row.pos_team_score = Some(score.0);
        row.def_team_score = Some(score.1);
        edit(&mut row);
        self.rows.push(row);
        self
    }

    pub fn scored(self, qtr: u8, posteam: &str, score: (f64, f64)) -> Self {
        self.play(qtr, posteam, score, |_| {})
    }

    /// Quarter/half end marker with no possession and no scores.
    pub fn sentinel(mut self, qtr: u8, kind: PlayType) -> Self {
        let mut row = self.base(qtr);
        row.play_type = Some(kind);
        self.rows.push(row);
        self
    }

    pub fn build(self) -> Vec<PlayRow> {
        self.rows
    }
}

pub fn log_of(games: Vec<Vec<PlayRow>>) -> PlayLog {
    PlayLog::from_rows(games.into_iter().flatten().collect())
}

pub const LEAGUE: [&str; 4] = ["DET", "GB", "CHI", "MIN"];

/// Week `w` pairings over [`LEAGUE`]; every team plays exactly once per week.
fn pairings(week: u8) -> [(usize, usize); 2] {
    match week % 3 {
        0 => [(0, 1), (2, 3)],
        1 => [(0, 2), (1, 3)],
        _ => [(0, 3), (1, 2)],
    }
}

/// Team that leads at halftime in game `k` of `week`.
pub fn league_leader_is_home(week: u8, k: usize) -> bool {
    (usize::from(week / 2) + k) % 2 == 0
}

/// Sixteen weeks of a four-team league. The halftime leader also dominates the
/// first quarter (long gains, a touchdown), so first-quarter offense separates it.
pub fn league_season(season: u16, weeks: u8) -> Vec<Vec<PlayRow>> {
    let mut games = Vec::new();
    for week in 1..=weeks {
        for (k, (h, a)) in pairings(week).into_iter().enumerate() {
            let game_id = u64::from(season) * 1_000_000 + u64::from(week) * 10 + k as u64;
            let (home, away) = (LEAGUE[h], LEAGUE[a]);
            let (leader, trailer) = if league_leader_is_home(week, k) {
                (home, away)
            } else {
                (away, home)
            };
            let game = GameBuilder::new(game_id, season, home, away)
                .play(1, leader, (0.0, 0.0), |r| {
                    r.play_type = Some(PlayType::Pass);
                    r.pass_outcome = Some(PassOutcome::Complete);
                    r.yds_to_go = Some(10.0);
                    r.yards_gained = Some(15.0);
                    r.first_down = Some(1.0);
                    r.touchdown = Some(1.0);
                })
                .play(1, trailer, (0.0, 7.0), |r| {
                    r.play_type = Some(PlayType::Run);
                    r.yds_to_go = Some(10.0);
                    r.yards_gained = Some(1.0);
                    r.first_down = Some(0.0);
                    r.touchdown = Some(0.0);
                })
                .sentinel(1, PlayType::QuarterEnd)
                .scored(2, trailer, (3.0, 7.0))
                .sentinel(2, PlayType::HalfEnd)
                .build();
            games.push(game);
        }
    }
    games
}
