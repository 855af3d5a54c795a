use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{LeadError, Result};

const SMO_TOLERANCE: f64 = 1e-3;
const SMO_MAX_PASSES: usize = 10;
const SMO_MAX_SWEEPS: usize = 2_000;
const SMO_SEED: u64 = 0x5EED_1EAD;
const ALPHA_EPS: f64 = 1e-8;

pub trait Classifier {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<()>;
    fn predict(&self, features: &[f64]) -> Result<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
    Poly { degree: u32, coef0: f64 },
    Sigmoid { coef0: f64 },
}

impl FromStr for Kernel {
    type Err = LeadError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf),
            "poly" => Ok(Kernel::Poly {
                degree: 3,
                coef0: 0.0,
            }),
            "sigmoid" => Ok(Kernel::Sigmoid { coef0: 0.0 }),
            other => Err(LeadError::InvalidConfig(format!("unknown kernel {other:?}"))),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Linear => f.write_str("linear"),
            Kernel::Rbf => f.write_str("rbf"),
            Kernel::Poly { degree, .. } => write!(f, "poly{degree}"),
            Kernel::Sigmoid { .. } => f.write_str("sigmoid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * var(X))`
    Scale,
    /// `1 / n_features`
    Auto,
    Value(f64),
}

impl FromStr for Gamma {
    type Err = LeadError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scale" => Ok(Gamma::Scale),
            "auto" => Ok(Gamma::Auto),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|g| g.is_finite() && *g > 0.0)
                .map(Gamma::Value)
                .ok_or_else(|| LeadError::InvalidConfig(format!("bad gamma {raw:?}"))),
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => f.write_str("scale"),
            Gamma::Auto => f.write_str("auto"),
            Gamma::Value(g) => write!(f, "{g}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub kernel: Kernel,
    pub c: f64,
    pub gamma: Gamma,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            kernel: Kernel::Rbf,
            c: 1.0,
            gamma: Gamma::Scale,
        }
    }
}

impl fmt::Display for SvmParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kernel={} C={} gamma={}", self.kernel, self.c, self.gamma)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedSvm {
    n_features: usize,
    gamma: f64,
    constant: Option<u8>,
    support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` per support vector.
    dual_coefs: Vec<f64>,
    bias: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    params: SvmParams,
    fitted: Option<FittedSvm>,
}

impl SupportVectorClassifier {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> SvmParams {
        self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn support_vector_count(&self) -> usize {
        self.fitted
            .as_ref()
            .map(|f| f.support_vectors.len())
            .unwrap_or(0)
    }

    pub fn decision_function(&self, features: &[f64]) -> Result<f64> {
        let fitted = self.fitted.as_ref().ok_or(LeadError::ModelNotFitted)?;
        if features.len() != fitted.n_features {
            return Err(LeadError::FeatureLengthMismatch {
                expected: fitted.n_features,
                actual: features.len(),
            });
        }
        if let Some(label) = fitted.constant {
            return Ok(if label == 1 { 1.0 } else { -1.0 });
        }
        let score = fitted
            .support_vectors
            .iter()
            .zip(&fitted.dual_coefs)
            .map(|(sv, coef)| coef * kernel_value(self.params.kernel, fitted.gamma, sv, features))
            .sum::<f64>();
        Ok(score + fitted.bias)
    }
}

impl Classifier for SupportVectorClassifier {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<()> {
        let n_features = validate_training_set(features, labels)?;
        let gamma = resolve_gamma(self.params.gamma, features, n_features);

        let first = labels[0];
        if labels.iter().all(|l| *l == first) {
            log::warn!("training set holds a single class ({first}); fitting a constant model");
            self.fitted = Some(FittedSvm {
                n_features,
                gamma,
                constant: Some(first),
                support_vectors: Vec::new(),
                dual_coefs: Vec::new(),
                bias: 0.0,
            });
            return Ok(());
        }

        let y: Vec<f64> = labels
            .iter()
            .map(|l| if *l == 1 { 1.0 } else { -1.0 })
            .collect();
        let gram: Vec<Vec<f64>> = features
            .iter()
            .map(|a| {
                features
                    .iter()
                    .map(|b| kernel_value(self.params.kernel, gamma, a, b))
                    .collect()
            })
            .collect();

        let (alpha, bias) = smo(&gram, &y, self.params.c);

        let mut support_vectors = Vec::new();
        let mut dual_coefs = Vec::new();
        for (i, a) in alpha.iter().enumerate() {
            if *a > ALPHA_EPS {
                support_vectors.push(features[i].clone());
                dual_coefs.push(a * y[i]);
            }
        }
        log::debug!(
            "svm fit: {} samples, {} support vectors, {}",
            labels.len(),
            support_vectors.len(),
            self.params
        );

        self.fitted = Some(FittedSvm {
            n_features,
            gamma,
            constant: None,
            support_vectors,
            dual_coefs,
            bias,
        });
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<u8> {
        let score = self.decision_function(features)?;
        Ok(if score > 0.0 { 1 } else { 0 })
    }
}

fn validate_training_set(features: &[Vec<f64>], labels: &[u8]) -> Result<usize> {
    if features.is_empty() {
        return Err(LeadError::EmptyTrainingSet("<unnamed>".to_string()));
    }
    if features.len() != labels.len() {
        return Err(LeadError::InvalidConfig(format!(
            "{} feature rows but {} labels",
            features.len(),
            labels.len()
        )));
    }
    let n_features = features[0].len();
    if let Some(bad) = features.iter().find(|row| row.len() != n_features) {
        return Err(LeadError::FeatureLengthMismatch {
            expected: n_features,
            actual: bad.len(),
        });
    }
    if let Some(bad) = labels.iter().find(|l| **l > 1) {
        return Err(LeadError::InvalidConfig(format!("label {bad} is not 0 or 1")));
    }
    Ok(n_features)
}

fn resolve_gamma(gamma: Gamma, features: &[Vec<f64>], n_features: usize) -> f64 {
    let n_features = n_features.max(1) as f64;
    match gamma {
        Gamma::Value(g) => g,
        Gamma::Auto => 1.0 / n_features,
        Gamma::Scale => {
            let (sum, sum_sq, n) = features
                .iter()
                .flatten()
                .fold((0.0, 0.0, 0usize), |(s, sq, n), v| (s + v, sq + v * v, n + 1));
            if n == 0 {
                return 1.0 / n_features;
            }
            let mean = sum / n as f64;
            let var = sum_sq / n as f64 - mean * mean;
            if var > 0.0 {
                1.0 / (n_features * var)
            } else {
                1.0
            }
        }
    }
}

fn kernel_value(kernel: Kernel, gamma: f64, a: &[f64], b: &[f64]) -> f64 {
    match kernel {
        Kernel::Linear => dot(a, b),
        Kernel::Rbf => {
            let dist_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
            (-gamma * dist_sq).exp()
        }
        Kernel::Poly { degree, coef0 } => (gamma * dot(a, b) + coef0).powi(degree as i32),
        Kernel::Sigmoid { coef0 } => (gamma * dot(a, b) + coef0).tanh(),
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sequential minimal optimisation over a precomputed Gram matrix; `y` is in {-1, +1}.
fn smo(gram: &[Vec<f64>], y: &[f64], c: f64) -> (Vec<f64>, f64) {
    let n = y.len();
    let mut alpha = vec![0.0_f64; n];
    let mut bias = 0.0_f64;
    let mut rng = StdRng::seed_from_u64(SMO_SEED);

    let decision = |alpha: &[f64], bias: f64, i: usize| -> f64 {
        (0..n).map(|k| alpha[k] * y[k] * gram[k][i]).sum::<f64>() + bias
    };

    let mut passes = 0usize;
    let mut sweeps = 0usize;
    while passes < SMO_MAX_PASSES && sweeps < SMO_MAX_SWEEPS {
        sweeps += 1;
        let mut changed = 0usize;
        for i in 0..n {
            let e_i = decision(&alpha, bias, i) - y[i];
            let r_i = y[i] * e_i;
            if !((r_i < -SMO_TOLERANCE && alpha[i] < c) || (r_i > SMO_TOLERANCE && alpha[i] > 0.0))
            {
                continue;
            }

            let mut j = rng.gen_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            let e_j = decision(&alpha, bias, j) - y[j];
            let (ai_old, aj_old) = (alpha[i], alpha[j]);

            let (lo, hi) = if y[i] != y[j] {
                ((aj_old - ai_old).max(0.0), (c + aj_old - ai_old).min(c))
            } else {
                ((ai_old + aj_old - c).max(0.0), (ai_old + aj_old).min(c))
            };
            if hi <= lo + 1e-12 {
                continue;
            }

            let eta = 2.0 * gram[i][j] - gram[i][i] - gram[j][j];
            if eta >= 0.0 {
                continue;
            }

            let aj = (aj_old - y[j] * (e_i - e_j) / eta).clamp(lo, hi);
            if (aj - aj_old).abs() < 1e-5 {
                continue;
            }
            let ai = ai_old + y[i] * y[j] * (aj_old - aj);
            alpha[i] = ai;
            alpha[j] = aj;

            let b1 = bias
                - e_i
                - y[i] * (ai - ai_old) * gram[i][i]
                - y[j] * (aj - aj_old) * gram[i][j];
            let b2 = bias
                - e_j
                - y[i] * (ai - ai_old) * gram[i][j]
                - y[j] * (aj - aj_old) * gram[j][j];
            bias = if ai > 0.0 && ai < c {
                b1
            } else if aj > 0.0 && aj < c {
                b2
            } else {
                (b1 + b2) / 2.0
            };
            changed += 1;
        }
        passes = if changed == 0 { passes + 1 } else { 0 };
    }
    if sweeps >= SMO_MAX_SWEEPS {
        log::warn!("smo stopped after {sweeps} sweeps without converging");
    }
    (alpha, bias)
}
