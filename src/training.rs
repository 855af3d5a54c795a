use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::classifier::{Classifier, Gamma, Kernel, SupportVectorClassifier, SvmParams};
use crate::error::{LeadError, Result};
use crate::features::{self, Strategy};
use crate::partition::{Partitioner, WeekSet};
use crate::play_log::{GameId, PlayLog};
use crate::slicer::{self, HALFTIME_QUARTER};
use crate::team::TeamKey;

pub type ModelSet = BTreeMap<String, SupportVectorClassifier>;

pub type EvaluationResults = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, Default)]
pub struct LabelledSet {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl LabelledSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// First-quarter features labelled with whether `team` led at halftime.
pub fn build_samples(
    log: &PlayLog,
    strategy: Strategy,
    team: &TeamKey,
    games: &[GameId],
) -> Result<LabelledSet> {
    let mut out = LabelledSet::default();
    for &game_id in games {
        let vector = features::extract(log, game_id, team, strategy)?;
        let leading = slicer::is_team_leading(log, game_id, team, HALFTIME_QUARTER)?;
        out.features.push(vector.into_values());
        out.labels.push(u8::from(leading));
    }
    Ok(out)
}

pub fn fit_team(
    log: &PlayLog,
    strategy: Strategy,
    team: &TeamKey,
    games: &[GameId],
    params: SvmParams,
) -> Result<SupportVectorClassifier> {
    let samples = build_samples(log, strategy, team, games)?;
    fit_samples(team, &samples, params)
}

fn fit_samples(
    team: &TeamKey,
    samples: &LabelledSet,
    params: SvmParams,
) -> Result<SupportVectorClassifier> {
    if samples.is_empty() {
        return Err(LeadError::EmptyTrainingSet(team.index_key()));
    }
    let mut model = SupportVectorClassifier::new(params);
    model.fit(&samples.features, &samples.labels)?;
    Ok(model)
}

fn score_samples(model: &SupportVectorClassifier, samples: &LabelledSet) -> Result<Vec<u8>> {
    samples
        .features
        .iter()
        .zip(&samples.labels)
        .map(|(x, truth)| -> Result<u8> { Ok(u8::from(model.predict(x)? == *truth)) })
        .collect()
}

/// One model per team over the games the partitioner assigns to `weeks`.
/// Teams without any game in the log are left out.
pub fn train(
    log: &PlayLog,
    partitioner: &Partitioner,
    strategy: Strategy,
    weeks: &WeekSet,
    params: SvmParams,
) -> Result<ModelSet> {
    let index = partitioner.games_by_week_slot(weeks)?;
    let jobs: Vec<(&String, &Vec<GameId>)> =
        index.iter().filter(|(_, games)| !games.is_empty()).collect();

    let fitted = jobs
        .par_iter()
        .map(|(key, games)| {
            let team = TeamKey::from_index_key(key);
            let model = fit_team(log, strategy, &team, games, params)?;
            log::debug!("{strategy}: fitted {key} on {} games", games.len());
            Ok(((*key).clone(), model))
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("{strategy}: trained {} team models ({params})", fitted.len());
    Ok(fitted.into_iter().collect())
}

/// Score held-out games of every team that has a game in `weeks`.
pub fn evaluate(
    log: &PlayLog,
    partitioner: &Partitioner,
    strategy: Strategy,
    weeks: &WeekSet,
    models: &ModelSet,
) -> Result<EvaluationResults> {
    let index = partitioner.games_by_week_slot(weeks)?;
    let mut out = EvaluationResults::new();
    for (key, games) in index.iter() {
        if games.is_empty() {
            continue;
        }
        let model = models
            .get(key)
            .ok_or_else(|| LeadError::MissingModel(key.clone()))?;
        let team = TeamKey::from_index_key(key);
        let samples = build_samples(log, strategy, &team, games)?;
        out.insert(key.clone(), score_samples(model, &samples)?);
    }
    Ok(out)
}

pub fn accuracy(results: &[u8]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| f64::from(*r)).sum::<f64>() / results.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamAccuracy {
    pub correct: usize,
    pub games: usize,
}

impl TeamAccuracy {
    pub fn rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.correct as f64 / self.games as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationSummary {
    pub per_team: BTreeMap<String, TeamAccuracy>,
}

impl EvaluationSummary {
    pub fn from_results(results: &EvaluationResults) -> Self {
        let per_team = results
            .iter()
            .map(|(team, r)| {
                let correct = r.iter().filter(|v| **v == 1).count();
                (
                    team.clone(),
                    TeamAccuracy {
                        correct,
                        games: r.len(),
                    },
                )
            })
            .collect();
        Self { per_team }
    }

    pub fn pooled(&self) -> TeamAccuracy {
        self.per_team.values().fold(
            TeamAccuracy {
                correct: 0,
                games: 0,
            },
            |acc, t| TeamAccuracy {
                correct: acc.correct + t.correct,
                games: acc.games + t.games,
            },
        )
    }
}

/// Train on the training weeks, then score validation and test weeks.
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub strategy: Strategy,
    pub params: SvmParams,
    pub models: ModelSet,
    pub validation: EvaluationResults,
    pub test: EvaluationResults,
}

pub fn run_split(
    log: &PlayLog,
    partitioner: &Partitioner,
    strategy: Strategy,
    params: SvmParams,
) -> Result<SplitReport> {
    let models = train(log, partitioner, strategy, &WeekSet::training(), params)?;
    let validation = evaluate(log, partitioner, strategy, &WeekSet::validation(), &models)?;
    let test = evaluate(log, partitioner, strategy, &WeekSet::test(), &models)?;
    Ok(SplitReport {
        strategy,
        params,
        models,
        validation,
        test,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub kernel: Kernel,
    pub c_values: Vec<f64>,
    pub gamma_values: Vec<Gamma>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            kernel: Kernel::Rbf,
            c_values: vec![0.1, 1.0, 10.0, 100.0],
            gamma_values: vec![
                Gamma::Value(0.001),
                Gamma::Value(0.01),
                Gamma::Value(0.1),
                Gamma::Value(1.0),
            ],
        }
    }
}

impl ParamGrid {
    pub fn candidates(&self) -> Vec<SvmParams> {
        let mut out = Vec::with_capacity(self.c_values.len() * self.gamma_values.len());
        for &c in &self.c_values {
            for &gamma in &self.gamma_values {
                out.push(SvmParams {
                    kernel: self.kernel,
                    c,
                    gamma,
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct GridSearchOutcome {
    pub params: SvmParams,
    pub score: f64,
    pub model: SupportVectorClassifier,
    pub evaluated: usize,
}

/// Exhaustive search over `grid` for one team, fitting on training weeks and
/// scoring mean correctness on validation weeks. Ties keep the earlier candidate.
pub fn grid_search(
    log: &PlayLog,
    partitioner: &Partitioner,
    strategy: Strategy,
    team: &TeamKey,
    grid: &ParamGrid,
) -> Result<GridSearchOutcome> {
    let candidates = grid.candidates();
    if candidates.is_empty() {
        return Err(LeadError::InvalidConfig("empty parameter grid".to_string()));
    }

    let key = team.index_key();
    let training = partitioner.games_by_week_slot(&WeekSet::training())?;
    let validation = partitioner.games_by_week_slot(&WeekSet::validation())?;
    let train_games = training.get(&key).unwrap_or_default();
    let val_games = validation.get(&key).unwrap_or_default();

    let train_set = build_samples(log, strategy, team, train_games)?;
    let val_set = build_samples(log, strategy, team, val_games)?;

    let mut best: Option<GridSearchOutcome> = None;
    for params in &candidates {
        let model = fit_samples(team, &train_set, *params)?;
        let score = accuracy(&score_samples(&model, &val_set)?);
        log::debug!("{key} {strategy}: {params} -> {score:.4}");
        let better = best.as_ref().is_none_or(|b| b.score < score);
        if better {
            best = Some(GridSearchOutcome {
                params: *params,
                score,
                model,
                evaluated: 0,
            });
        }
    }

    let mut best = best.ok_or_else(|| LeadError::InvalidConfig("empty parameter grid".into()))?;
    best.evaluated = candidates.len();
    log::info!(
        "{key} {strategy}: best {} with validation accuracy {:.4}",
        best.params,
        best.score
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_of_empty_is_zero() {
        assert_eq!(accuracy(&[]), 0.0);
        assert!((accuracy(&[1, 0, 1, 1]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn grid_is_cartesian_in_c_major_order() {
        let grid = ParamGrid {
            kernel: Kernel::Rbf,
            c_values: vec![1.0, 2.0],
            gamma_values: vec![Gamma::Auto, Gamma::Scale],
        };
        let c: Vec<(f64, Gamma)> = grid.candidates().iter().map(|p| (p.c, p.gamma)).collect();
        assert_eq!(
            c,
            vec![
                (1.0, Gamma::Auto),
                (1.0, Gamma::Scale),
                (2.0, Gamma::Auto),
                (2.0, Gamma::Scale)
            ]
        );
    }

    #[test]
    fn pooled_accuracy_sums_teams() {
        let mut results = EvaluationResults::new();
        results.insert("DET".into(), vec![1, 0]);
        results.insert("GB".into(), vec![1, 1]);
        let pooled = EvaluationSummary::from_results(&results).pooled();
        assert_eq!((pooled.correct, pooled.games), (3, 4));
    }
}
