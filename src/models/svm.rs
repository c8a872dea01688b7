// Svm - binary RBF support vector classifier with Platt probabilities
//
// Training uses simplified SMO: the second multiplier is picked at random
// and sweeps stop after `max_passes` consecutive sweeps without an update,
// or after `max_iterations` sweeps. Kernel values are computed on demand.
//
// Class code 1 is the positive side of the decision function. Probabilities
// come from a sigmoid 1 / (1 + exp(A*f + B)) fitted to the training
// decision values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, TrainingError};
use crate::models::{check_width, squared_distance, ClassifierModel};

/// Multipliers below this are not kept as support vectors
const ALPHA_EPSILON: f64 = 1e-8;

/// Smallest multiplier change SMO accepts as progress
const MIN_ALPHA_STEP: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct SvmParams {
    pub c: f64,
    /// `None` selects `1 / (n_features * var(X))`
    pub gamma: Option<f64>,
    pub tolerance: f64,
    pub max_passes: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tolerance: 1e-3,
            max_passes: 10,
            max_iterations: 1000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svm {
    n_features: usize,
    gamma: f64,
    support_vectors: Vec<Vec<f64>>,
    /// alpha_i * y_i for each support vector
    coefficients: Vec<f64>,
    bias: f64,
    platt_a: f64,
    platt_b: f64,
}

impl Svm {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &SvmParams,
    ) -> Result<Self, TrainingError> {
        if n_classes != 2 {
            return Err(TrainingError::InvalidConfig {
                reason: format!("SVM supports exactly 2 classes, got {}", n_classes),
            });
        }
        if rows.len() < 2 || rows.len() != labels.len() {
            return Err(TrainingError::InsufficientSamples {
                required: 2,
                collected: rows.len().min(labels.len()),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(TrainingError::InvalidConfig {
                reason: format!("label {} out of range for {} classes", bad, n_classes),
            });
        }
        if !labels.contains(&0) || !labels.contains(&1) {
            return Err(TrainingError::InvalidConfig {
                reason: "SVM needs samples of both classes".to_string(),
            });
        }
        if params.c <= 0.0 {
            return Err(TrainingError::InvalidConfig {
                reason: format!("svm_c must be positive, got {}", params.c),
            });
        }

        let gamma = match params.gamma {
            Some(gamma) if gamma > 0.0 => gamma,
            Some(gamma) => {
                return Err(TrainingError::InvalidConfig {
                    reason: format!("svm_gamma must be positive, got {}", gamma),
                })
            }
            None => scale_gamma(rows),
        };

        let targets: Vec<f64> = labels
            .iter()
            .map(|&l| if l == 1 { 1.0 } else { -1.0 })
            .collect();
        let (alphas, bias) = smo(rows, &targets, gamma, params);

        let mut support_vectors = Vec::new();
        let mut coefficients = Vec::new();
        for ((row, &alpha), &y) in rows.iter().zip(&alphas).zip(&targets) {
            if alpha > ALPHA_EPSILON {
                support_vectors.push(row.clone());
                coefficients.push(alpha * y);
            }
        }

        let mut svm = Self {
            n_features: rows[0].len(),
            gamma,
            support_vectors,
            coefficients,
            bias,
            platt_a: 0.0,
            platt_b: 0.0,
        };

        let decisions: Vec<f64> = rows.iter().map(|row| svm.decision(row)).collect();
        let (a, b) = platt_sigmoid(&decisions, &targets);
        svm.platt_a = a;
        svm.platt_b = b;

        tracing::debug!(
            support_vectors = svm.support_vectors.len(),
            gamma,
            "SVM trained"
        );
        Ok(svm)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn support_vector_count(&self) -> usize {
        self.support_vectors.len()
    }

    /// Signed distance-like score; positive favours class code 1
    pub fn decision(&self, row: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.coefficients)
            .map(|(sv, coef)| coef * rbf(sv, row, self.gamma))
            .sum::<f64>()
            + self.bias
    }

    fn positive_probability(&self, decision: f64) -> f64 {
        let f_apb = decision * self.platt_a + self.platt_b;
        // Evaluated on the side that cannot overflow
        if f_apb >= 0.0 {
            (-f_apb).exp() / (1.0 + (-f_apb).exp())
        } else {
            1.0 / (1.0 + f_apb.exp())
        }
    }
}

impl ClassifierModel for Svm {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        2
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        let incompatible = |reason: &str| ArtifactError::Incompatible {
            artifact: "svm_model".to_string(),
            reason: reason.to_string(),
        };
        if self.support_vectors.len() != self.coefficients.len() {
            return Err(incompatible("support vector and coefficient counts differ"));
        }
        if self.support_vectors.iter().any(|sv| sv.len() != self.n_features) {
            return Err(incompatible("support vector width differs from n_features"));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(incompatible("gamma must be finite and positive"));
        }
        let scalars = [self.bias, self.platt_a, self.platt_b];
        if scalars.iter().chain(&self.coefficients).any(|v| !v.is_finite()) {
            return Err(incompatible("non-finite coefficients"));
        }
        Ok(())
    }

    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        check_width("SVM", self.n_features, batch)?;
        if self.support_vectors.len() != self.coefficients.len() {
            return Err(ArtifactError::Corrupt {
                artifact: "svm_model".to_string(),
                reason: "support vector and coefficient counts differ".to_string(),
            });
        }
        Ok(batch
            .iter()
            .map(|row| {
                let p = self.positive_probability(self.decision(row));
                vec![1.0 - p, p]
            })
            .collect())
    }
}

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    (-gamma * squared_distance(a, b)).exp()
}

/// `1 / (n_features * var(X))` over every matrix element
fn scale_gamma(rows: &[Vec<f64>]) -> f64 {
    let n_features = rows[0].len();
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;
    if variance > 0.0 && n_features > 0 {
        1.0 / (n_features as f64 * variance)
    } else {
        1.0
    }
}

/// Simplified SMO; returns the multipliers and the bias
fn smo(rows: &[Vec<f64>], targets: &[f64], gamma: f64, params: &SvmParams) -> (Vec<f64>, f64) {
    let n = rows.len();
    let c = params.c;
    let tol = params.tolerance;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut alphas = vec![0.0; n];
    let mut bias = 0.0;

    let kernel = |i: usize, j: usize| rbf(&rows[i], &rows[j], gamma);
    let output = |alphas: &[f64], bias: f64, i: usize| -> f64 {
        alphas
            .iter()
            .enumerate()
            .filter(|(_, a)| **a > 0.0)
            .map(|(k, a)| a * targets[k] * kernel(k, i))
            .sum::<f64>()
            + bias
    };

    let mut passes = 0;
    let mut iterations = 0;
    while passes < params.max_passes && iterations < params.max_iterations {
        let mut changed = 0;
        for i in 0..n {
            let yi = targets[i];
            let ei = output(&alphas, bias, i) - yi;
            let violates = (yi * ei < -tol && alphas[i] < c) || (yi * ei > tol && alphas[i] > 0.0);
            if !violates {
                continue;
            }

            let mut j = rng.gen_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            let yj = targets[j];
            let ej = output(&alphas, bias, j) - yj;

            let (ai_old, aj_old) = (alphas[i], alphas[j]);
            let (low, high) = if yi != yj {
                ((aj_old - ai_old).max(0.0), (c + aj_old - ai_old).min(c))
            } else {
                ((ai_old + aj_old - c).max(0.0), (ai_old + aj_old).min(c))
            };
            if low >= high {
                continue;
            }

            let kij = kernel(i, j);
            let kii = kernel(i, i);
            let kjj = kernel(j, j);
            let eta = 2.0 * kij - kii - kjj;
            if eta >= 0.0 {
                continue;
            }

            let aj = (aj_old - yj * (ei - ej) / eta).clamp(low, high);
            if (aj - aj_old).abs() < MIN_ALPHA_STEP {
                continue;
            }
            let ai = ai_old + yi * yj * (aj_old - aj);
            alphas[i] = ai;
            alphas[j] = aj;

            let b1 = bias - ei - yi * (ai - ai_old) * kii - yj * (aj - aj_old) * kij;
            let b2 = bias - ej - yi * (ai - ai_old) * kij - yj * (aj - aj_old) * kjj;
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
        iterations += 1;
    }

    tracing::trace!(iterations, "SMO finished");
    (alphas, bias)
}

/// Newton fit of the Platt sigmoid with prior-smoothed targets
fn platt_sigmoid(decisions: &[f64], targets: &[f64]) -> (f64, f64) {
    const MAX_ITERATIONS: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPS: f64 = 1e-5;

    let prior1 = targets.iter().filter(|&&y| y > 0.0).count() as f64;
    let prior0 = targets.len() as f64 - prior1;
    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let t: Vec<f64> = targets
        .iter()
        .map(|&y| if y > 0.0 { hi_target } else { lo_target })
        .collect();

    let objective = |a: f64, b: f64| -> f64 {
        decisions
            .iter()
            .zip(&t)
            .map(|(&f, &ti)| {
                let f_apb = f * a + b;
                if f_apb >= 0.0 {
                    ti * f_apb + (1.0 + (-f_apb).exp()).ln()
                } else {
                    (ti - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(a, b);

    for _ in 0..MAX_ITERATIONS {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);
        for (&f, &ti) in decisions.iter().zip(&t) {
            let f_apb = f * a + b;
            let (p, q) = if f_apb >= 0.0 {
                let e = (-f_apb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_apb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = ti - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da = -(h22 * g1 - h21 * g2) / det;
        let db = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (new_a, new_b) = (a + step * da, b + step * db);
            let new_f = objective(new_a, new_b);
            if new_f < fval + 1e-4 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }
        if step < MIN_STEP {
            break;
        }
    }

    (a, b)
}
