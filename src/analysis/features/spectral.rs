// Spectral module - frequency-domain features per STFT frame
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use super::stft::{fft_frequencies, Spectrogram};

/// Spectral feature computation functions
pub struct SpectralFeatures {
    freqs: Vec<f64>,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `n_fft` - FFT window size
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        Self {
            freqs: fft_frequencies(sample_rate, n_fft),
        }
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// The spectral centroid represents the "center of mass" of the spectrum,
    /// and is a measure of the brightness of a sound. Silent frames yield 0 Hz.
    ///
    /// # Arguments
    /// * `spectrum` - Magnitude spectrum of one frame
    ///
    /// # Returns
    /// Spectral centroid in Hz
    pub fn compute_centroid(&self, spectrum: &[f64]) -> f64 {
        let magnitude_sum: f64 = spectrum.iter().sum();
        if magnitude_sum < f64::MIN_POSITIVE {
            return 0.0;
        }

        let weighted_sum: f64 = spectrum
            .iter()
            .zip(&self.freqs)
            .map(|(&mag, &freq)| freq * mag)
            .sum();

        weighted_sum / magnitude_sum
    }

    /// Centroid time series, one value per frame
    pub fn centroid_series(&self, spectrogram: &Spectrogram) -> Vec<f64> {
        spectrogram
            .frames()
            .map(|frame| self.compute_centroid(frame))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_of_single_bin() {
        let features = SpectralFeatures::new(16_000, 16);
        let mut spectrum = vec![0.0; 9];
        spectrum[3] = 2.0;
        assert_eq!(features.compute_centroid(&spectrum), 3000.0);
    }

    #[test]
    fn test_centroid_of_two_equal_bins_is_midpoint() {
        let features = SpectralFeatures::new(16_000, 16);
        let mut spectrum = vec![0.0; 9];
        spectrum[2] = 1.0;
        spectrum[6] = 1.0;
        assert_eq!(features.compute_centroid(&spectrum), 4000.0);
    }

    #[test]
    fn test_silent_frame_centroid_is_zero() {
        let features = SpectralFeatures::new(16_000, 2048);
        assert_eq!(features.compute_centroid(&vec![0.0; 1025]), 0.0);
    }
}
