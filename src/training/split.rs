// Split - seeded shuffle split into train and test indices

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::TrainingError;

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_size)` rows
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit, TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidConfig {
            reason: format!("test_size must be in (0, 1), got {}", test_size),
        });
    }

    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainingError::InsufficientSamples {
            required: 2,
            collected: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = indices.split_off(n_test);

    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}
