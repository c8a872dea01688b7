// Summary statistics over feature time series
//
// Standard deviation is the population statistic (divide by N). Empty input
// yields zero for both statistics so extraction never produces NaN.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `(mean, std_dev)` in one call
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    (mean(values), std_dev(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std() {
        let (mu, sigma) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mu, 5.0);
        assert_eq!(sigma, 2.0);
    }

    #[test]
    fn test_empty_and_constant_are_finite() {
        assert_eq!(mean_std(&[]), (0.0, 0.0));
        assert_eq!(mean_std(&[0.0; 16]), (0.0, 0.0));
    }
}
