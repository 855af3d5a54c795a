use std::collections::HashMap;
use std::fmt;

use once_cell::sync::OnceCell;

/// Franchises with a single abbreviation across the supported seasons.
pub const SINGLE_IDENTITY_TEAMS: [&str; 30] = [
    "ARI", "ATL", "BAL", "BUF", "CAR", "CHI", "CIN", "CLE", "DAL", "DEN", "DET", "GB", "HOU",
    "IND", "KC", "MIA", "MIN", "NE", "NO", "NYG", "NYJ", "OAK", "PHI", "PIT", "SD", "SEA", "SF",
    "TB", "TEN", "WAS",
];

/// A franchise recorded under two abbreviations (relocation or a renamed code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualIdentity {
    pub key: &'static str,
    pub codes: [&'static str; 2],
}

pub const DUAL_IDENTITY_TEAMS: [DualIdentity; 2] = [
    DualIdentity {
        key: "STL-LA",
        codes: ["LA", "STL"],
    },
    DualIdentity {
        key: "JAC-JAX",
        codes: ["JAC", "JAX"],
    },
];

static DUAL_BY_CODE: OnceCell<HashMap<&'static str, &'static DualIdentity>> = OnceCell::new();

fn dual_by_code() -> &'static HashMap<&'static str, &'static DualIdentity> {
    DUAL_BY_CODE.get_or_init(|| {
        let mut out = HashMap::new();
        for dual in &DUAL_IDENTITY_TEAMS {
            for code in dual.codes {
                out.insert(code, dual);
            }
        }
        out
    })
}

/// A team as queried against play rows: one literal code, or both codes of a dual franchise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamKey {
    Single(String),
    Dual(String, String),
}

impl TeamKey {
    pub fn single(code: &str) -> Self {
        TeamKey::Single(code.trim().to_string())
    }

    pub fn matches(&self, literal: &str) -> bool {
        match self {
            TeamKey::Single(code) => code == literal,
            TeamKey::Dual(a, b) => a == literal || b == literal,
        }
    }

    pub fn matches_opt(&self, literal: Option<&str>) -> bool {
        literal.is_some_and(|code| self.matches(code))
    }

    pub fn expand(&self) -> Vec<&str> {
        match self {
            TeamKey::Single(code) => vec![code.as_str()],
            TeamKey::Dual(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    /// Stable string key used by game-week indexes and model sets.
    pub fn index_key(&self) -> String {
        match self {
            TeamKey::Single(code) => code.clone(),
            TeamKey::Dual(a, b) => DUAL_IDENTITY_TEAMS
                .iter()
                .find(|d| d.codes.contains(&a.as_str()) && d.codes.contains(&b.as_str()))
                .map(|d| d.key.to_string())
                .unwrap_or_else(|| format!("{a}-{b}")),
        }
    }

    /// Inverse of [`TeamKey::index_key`]; also accepts a bare literal code.
    pub fn from_index_key(key: &str) -> Self {
        let key = key.trim();
        if let Some(dual) = DUAL_IDENTITY_TEAMS.iter().find(|d| d.key == key) {
            return dual.into();
        }
        canonical_key(key)
    }
}

impl From<&DualIdentity> for TeamKey {
    fn from(dual: &DualIdentity) -> Self {
        TeamKey::Dual(dual.codes[0].to_string(), dual.codes[1].to_string())
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index_key())
    }
}

/// Resolve a literal code to its franchise key. Unknown codes resolve to themselves.
pub fn canonical_key(code: &str) -> TeamKey {
    let code = code.trim();
    match dual_by_code().get(code) {
        Some(dual) => (*dual).into(),
        None => TeamKey::single(code),
    }
}

pub fn is_dual_identity(code: &str) -> bool {
    dual_by_code().contains_key(code.trim())
}

/// Every team the partitioner indexes: single-identity teams first, then dual franchises.
pub fn all_teams() -> Vec<TeamKey> {
    SINGLE_IDENTITY_TEAMS
        .iter()
        .map(|code| TeamKey::single(code))
        .chain(DUAL_IDENTITY_TEAMS.iter().map(TeamKey::from))
        .collect()
}
