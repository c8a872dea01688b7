// SMOTE - synthetic minority oversampling
//
// Every class smaller than the largest one receives synthetic rows until the
// counts are equal. A synthetic row lies on the segment between a random
// member of the class and one of its k nearest same-class neighbours.
// Original rows come first, in input order, followed by the synthetic ones.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::TrainingError;
use crate::models::squared_distance;

/// Oversampled matrix and labels
#[derive(Debug, Clone, PartialEq)]
pub struct Balanced {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

pub fn smote(
    rows: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    k: usize,
    seed: u64,
) -> Result<Balanced, TrainingError> {
    if k == 0 {
        return Err(TrainingError::InvalidConfig {
            reason: "smote_k must be at least 1".to_string(),
        });
    }

    let members: Vec<Vec<usize>> = (0..n_classes)
        .map(|class| (0..labels.len()).filter(|&i| labels[i] == class).collect())
        .collect();
    if let Some(empty) = members.iter().position(Vec::is_empty) {
        return Err(TrainingError::InsufficientSamples {
            required: 1,
            collected: members[empty].len(),
        });
    }

    let target = members.iter().map(Vec::len).max().unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut balanced = Balanced {
        rows: rows.to_vec(),
        labels: labels.to_vec(),
    };

    for (class, class_rows) in members.iter().enumerate() {
        let deficit = target - class_rows.len();
        if deficit == 0 {
            continue;
        }
        let neighbours = nearest_neighbours(rows, class_rows, k);
        for _ in 0..deficit {
            let pick = rng.gen_range(0..class_rows.len());
            let base = &rows[class_rows[pick]];
            let synthetic = match neighbours[pick].as_slice() {
                // A single-member class can only be duplicated
                [] => base.clone(),
                candidates => {
                    let other = &rows[candidates[rng.gen_range(0..candidates.len())]];
                    let gap: f64 = rng.gen();
                    base.iter().zip(other).map(|(b, o)| b + gap * (o - b)).collect()
                }
            };
            balanced.rows.push(synthetic);
            balanced.labels.push(class);
        }
        tracing::debug!("[Trainer] SMOTE added {} rows to class {}", deficit, class);
    }

    Ok(balanced)
}

/// For each class member, the row indices of its `k` nearest other members
fn nearest_neighbours(rows: &[Vec<f64>], class_rows: &[usize], k: usize) -> Vec<Vec<usize>> {
    let k = k.min(class_rows.len().saturating_sub(1));
    class_rows
        .iter()
        .map(|&i| {
            let mut others: Vec<(f64, usize)> = class_rows
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&rows[i], &rows[j]), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}
