// Mel module - mel filterbank, dB conversion and cepstral coefficients
//
// The filterbank uses the Slaney mel scale (linear below 1 kHz, logarithmic
// above) with area-normalised triangular filters spanning 0 Hz to Nyquist.
// MFCCs are the orthonormal DCT-II of the dB-scaled mel power spectrogram.

use super::stft::{fft_frequencies, Spectrogram};

/// Floor applied before taking logarithms
const AMIN: f64 = 1e-10;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filterbank, `n_mels` rows of `n_fft / 2 + 1` weights
pub struct MelFilterBank {
    weights: Vec<Vec<f64>>,
}

impl MelFilterBank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fft_freqs = fft_frequencies(sample_rate, n_fft);
        let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
        let mel_points: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f64 / (n_mels + 1) as f64))
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (left, center, right) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
                let enorm = 2.0 / (right - left);
                fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - left) / (center - left);
                        let upper = (right - f) / (right - center);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    pub fn n_mels(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Project one power-spectrum frame onto the mel bands
    pub fn apply(&self, power: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .map(|row| row.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }
}

/// Convert power values to dB in place (reference 1.0)
///
/// Values below `max - top_db` (max over the whole slice) are clipped.
pub fn power_to_db(values: &mut [f64], top_db: f64) {
    for v in values.iter_mut() {
        *v = 10.0 * v.max(AMIN).log10();
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() {
        let floor = max - top_db;
        for v in values.iter_mut() {
            *v = v.max(floor);
        }
    }
}

/// Orthonormal DCT-II truncated to the first `n_out` coefficients
pub struct Dct {
    matrix: Vec<Vec<f64>>,
}

impl Dct {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        let n = n_in as f64;
        let matrix = (0..n_out)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_in)
                    .map(|i| {
                        scale
                            * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n))
                                .cos()
                    })
                    .collect()
            })
            .collect();
        Self { matrix }
    }

    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.matrix
            .iter()
            .map(|row| row.iter().zip(input).map(|(c, x)| c * x).sum())
            .collect()
    }
}

/// Computes per-frame MFCCs from a magnitude spectrogram
pub struct MfccProcessor {
    filterbank: MelFilterBank,
    dct: Dct,
    top_db: f64,
}

impl MfccProcessor {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, n_mfcc: usize, top_db: f64) -> Self {
        Self {
            filterbank: MelFilterBank::new(sample_rate, n_fft, n_mels),
            dct: Dct::new(n_mels, n_mfcc),
            top_db,
        }
    }

    /// MFCC matrix, one row of coefficients per frame
    pub fn compute(&self, spectrogram: &Spectrogram) -> Vec<Vec<f64>> {
        let n_mels = self.filterbank.n_mels();
        let mut mel_db: Vec<f64> = Vec::with_capacity(n_mels * spectrogram.n_frames());
        for frame in spectrogram.frames() {
            let power: Vec<f64> = frame.iter().map(|m| m * m).collect();
            mel_db.extend(self.filterbank.apply(&power));
        }

        // dB clipping is relative to the loudest value of the whole signal
        power_to_db(&mut mel_db, self.top_db);

        mel_db
            .chunks_exact(n_mels)
            .map(|frame| self.dct.apply(frame))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for &hz in &[0.0, 200.0, 999.0, 1000.0, 4000.0, 8000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((hz - back).abs() < 1e-6, "roundtrip failed for {} Hz", hz);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_filterbank_shape_and_coverage() {
        let bank = MelFilterBank::new(16_000, 2048, 128);
        assert_eq!(bank.n_mels(), 128);
        for (m, row) in bank.weights().iter().enumerate() {
            assert_eq!(row.len(), 1025);
            assert!(row.iter().all(|&w| w >= 0.0));
            assert!(row.iter().sum::<f64>() > 0.0, "filter {} is empty", m);
        }
    }

    #[test]
    fn test_power_to_db_clips_dynamic_range() {
        let mut values = vec![1.0, 1e-3, 1e-12, 0.0];
        power_to_db(&mut values, 80.0);
        assert_eq!(values[0], 0.0);
        assert!((values[1] + 30.0).abs() < 1e-9);
        assert_eq!(values[2], -80.0);
        assert_eq!(values[3], -80.0);
    }

    #[test]
    fn test_dct_of_constant_is_dc_only() {
        let dct = Dct::new(128, 13);
        let coeffs = dct.apply(&vec![-100.0; 128]);
        assert!((coeffs[0] - (-100.0 * 128f64.sqrt())).abs() < 1e-9);
        for c in &coeffs[1..] {
            assert!(c.abs() < 1e-9);
        }
    }
}
