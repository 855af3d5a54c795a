use std::env;
use std::path::PathBuf;

use crate::classifier::{Gamma, Kernel, SvmParams};
use crate::error::{LeadError, Result};
use crate::features::Strategy;
use crate::partition::{SeasonRange, WeekOrdinalPolicy};
use crate::team::{TeamKey, canonical_key};

const CACHE_DIR: &str = "halftime_lead";
const MIN_C: f64 = 1e-4;
const MAX_C: f64 = 1e4;

/// `$XDG_CACHE_HOME/halftime_lead`, falling back to `~/.cache/halftime_lead`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// Loads `.env.local` then `.env`; missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySelection {
    One(Strategy),
    All,
}

impl StrategySelection {
    pub fn strategies(&self) -> Vec<Strategy> {
        match self {
            StrategySelection::One(s) => vec![*s],
            StrategySelection::All => Strategy::ALL.to_vec(),
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            Ok(StrategySelection::All)
        } else {
            Ok(StrategySelection::One(raw.parse()?))
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub seasons: SeasonRange,
    pub strategy: StrategySelection,
    pub params: SvmParams,
    pub week_policy: WeekOrdinalPolicy,
    pub model_out: Option<PathBuf>,
    pub team: Option<TeamKey>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            db_path: None,
            seasons: SeasonRange::default(),
            strategy: StrategySelection::One(Strategy::Offense),
            params: SvmParams::default(),
            week_policy: WeekOrdinalPolicy::default(),
            model_out: None,
            team: None,
        }
    }
}

impl RunConfig {
    pub fn from_env_and_args() -> Result<Self> {
        let args = env::args().skip(1).collect::<Vec<_>>();
        Self::resolve(&args, opt_env)
    }

    /// Environment values first, then flags in `args` override them.
    pub fn resolve(args: &[String], lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = RunConfig::default();

        if let Some(v) = lookup("PBP_CSV_PATH") {
            cfg.csv_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PBP_DB_PATH") {
            cfg.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PBP_SEASONS") {
            cfg.seasons = v.parse()?;
        }
        if let Some(v) = lookup("LEAD_STRATEGY") {
            cfg.strategy = StrategySelection::parse(&v)?;
        }
        if let Some(v) = lookup("SVM_KERNEL") {
            cfg.params.kernel = v.parse::<Kernel>()?;
        }
        if let Some(v) = lookup("SVM_C") {
            cfg.params.c = parse_c(&v)?;
        }
        if let Some(v) = lookup("SVM_GAMMA") {
            cfg.params.gamma = v.parse::<Gamma>()?;
        }
        if let Some(v) = lookup("WEEK_ORDINAL_POLICY") {
            cfg.week_policy = parse_policy(&v)?;
        }
        if let Some(v) = lookup("MODEL_OUT") {
            cfg.model_out = Some(PathBuf::from(v));
        }

        if let Some(v) = parse_arg(args, "csv") {
            cfg.csv_path = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_arg(args, "db") {
            cfg.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_arg(args, "seasons") {
            cfg.seasons = v.parse()?;
        }
        if let Some(v) = parse_arg(args, "strategy") {
            cfg.strategy = StrategySelection::parse(&v)?;
        }
        if let Some(v) = parse_arg(args, "kernel") {
            cfg.params.kernel = v.parse::<Kernel>()?;
        }
        if let Some(v) = parse_arg(args, "c") {
            cfg.params.c = parse_c(&v)?;
        }
        if let Some(v) = parse_arg(args, "gamma") {
            cfg.params.gamma = v.parse::<Gamma>()?;
        }
        if let Some(v) = parse_arg(args, "out") {
            cfg.model_out = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_arg(args, "team") {
            cfg.team = Some(canonical_key(&v.to_uppercase()));
        }
        if has_flag(args, "strict-weeks") {
            cfg.week_policy = WeekOrdinalPolicy::Fail;
        }

        Ok(cfg)
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn has_flag(args: &[String], name: &str) -> bool {
    let flag = format!("--{name}");
    args.iter().any(|arg| arg == &flag)
}

/// `--name=value` or `--name value`.
fn parse_arg(args: &[String], name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_c(raw: &str) -> Result<f64> {
    let c = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| LeadError::InvalidConfig(format!("bad C value {raw:?}")))?;
    if !c.is_finite() {
        return Err(LeadError::InvalidConfig(format!("bad C value {raw:?}")));
    }
    Ok(c.clamp(MIN_C, MAX_C))
}

fn parse_policy(raw: &str) -> Result<WeekOrdinalPolicy> {
    match raw.trim().to_lowercase().as_str() {
        "skip" => Ok(WeekOrdinalPolicy::Skip),
        "fail" | "strict" => Ok(WeekOrdinalPolicy::Fail),
        other => Err(LeadError::InvalidConfig(format!(
            "unknown week ordinal policy {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_override_environment() {
        let env = HashMap::from([
            ("LEAD_STRATEGY", "defense"),
            ("SVM_C", "5"),
            ("PBP_SEASONS", "2010-2011"),
        ]);
        let cfg = RunConfig::resolve(&args(&["--c=2.5", "--team", "stl"]), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .expect("valid config");

        assert_eq!(cfg.strategy, StrategySelection::One(Strategy::Defense));
        assert_eq!(cfg.params.c, 2.5);
        assert_eq!(cfg.seasons, SeasonRange::new(2010, 2011).expect("range"));
        assert_eq!(
            cfg.team.map(|t| t.index_key()),
            Some("STL-LA".to_string())
        );
    }

    #[test]
    fn c_is_clamped_and_strict_weeks_sets_fail() {
        let cfg = RunConfig::resolve(&args(&["--c=1e9", "--strict-weeks"]), |_| None)
            .expect("valid config");
        assert_eq!(cfg.params.c, MAX_C);
        assert_eq!(cfg.week_policy, WeekOrdinalPolicy::Fail);
    }

    #[test]
    fn strategy_all_expands() {
        let cfg = RunConfig::resolve(&args(&["--strategy=all"]), |_| None).expect("valid");
        assert_eq!(cfg.strategy.strategies().len(), Strategy::ALL.len());
        assert!(RunConfig::resolve(&args(&["--strategy=bogus"]), |_| None).is_err());
    }
}
