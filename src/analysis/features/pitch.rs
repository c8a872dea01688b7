// Pitch module - parabolic-interpolated peak picking per STFT frame
//
// For every frame, bins inside [fmin, fmax) that are local maxima of the
// thresholded magnitude spectrum receive an interpolated frequency estimate.
// All other bins are zero. The whole bins x frames map is kept because the
// summary statistics are taken over every cell, not just the dominant peak.

use super::stft::{fft_frequencies, Spectrogram};

pub struct PitchTracker {
    sample_rate: u32,
    n_fft: usize,
    fmin: f64,
    fmax: f64,
    threshold: f64,
}

impl PitchTracker {
    pub fn new(sample_rate: u32, n_fft: usize, fmin: f64, fmax: f64, threshold: f64) -> Self {
        Self {
            sample_rate,
            n_fft,
            fmin,
            fmax,
            threshold,
        }
    }

    /// Pitch map stored frame-major, `n_bins * n_frames` values in Hz
    pub fn track(&self, spectrogram: &Spectrogram) -> Vec<f64> {
        let n_bins = spectrogram.n_bins();
        let freqs = fft_frequencies(self.sample_rate, self.n_fft);
        let in_band: Vec<bool> = freqs
            .iter()
            .map(|&f| self.fmin <= f && f < self.fmax)
            .collect();
        let bin_hz = self.sample_rate as f64 / self.n_fft as f64;

        let mut pitches = vec![0.0; n_bins * spectrogram.n_frames()];
        let mut masked = vec![0.0; n_bins];

        for (t, frame) in spectrogram.frames().enumerate() {
            let reference = self.threshold * frame.iter().copied().fold(0.0, f64::max);
            for (slot, &mag) in masked.iter_mut().zip(frame) {
                *slot = if mag > reference { mag } else { 0.0 };
            }

            let out = &mut pitches[t * n_bins..(t + 1) * n_bins];
            for k in 0..n_bins {
                if !in_band[k] || !is_local_max(&masked, k) {
                    continue;
                }
                out[k] = (k as f64 + parabolic_shift(frame, k)) * bin_hz;
            }
        }

        pitches
    }
}

/// Strictly greater than the left neighbour, not less than the right one.
/// Edges compare against themselves.
fn is_local_max(values: &[f64], k: usize) -> bool {
    let left = values[k.saturating_sub(1)];
    let right = values[(k + 1).min(values.len() - 1)];
    values[k] > left && values[k] >= right
}

/// Sub-bin offset of the vertex of the parabola through bins k-1, k, k+1
fn parabolic_shift(frame: &[f64], k: usize) -> f64 {
    if k == 0 || k + 1 >= frame.len() {
        return 0.0;
    }
    let avg = 0.5 * (frame[k + 1] - frame[k - 1]);
    // Negated second difference, positive at a peak
    let shift = 2.0 * frame[k] - frame[k + 1] - frame[k - 1];
    let denominator = if shift.abs() < f64::MIN_POSITIVE {
        shift + 1.0
    } else {
        shift
    };
    avg / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::stft::StftProcessor;

    fn tone(frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / 16_000.0).sin())
            .collect()
    }

    #[test]
    fn test_local_max_edges() {
        assert!(!is_local_max(&[1.0, 0.5], 0));
        assert!(is_local_max(&[0.5, 1.0], 1));
        assert!(is_local_max(&[0.0, 2.0, 2.0], 1));
        assert!(!is_local_max(&[0.0, 2.0, 2.0], 2));
    }

    #[test]
    fn test_silence_has_no_pitch() {
        let stft = StftProcessor::new(2048, 512);
        let spec = stft.magnitude(&vec![0.0; 8_000]);
        let tracker = PitchTracker::new(16_000, 2048, 150.0, 4000.0, 0.1);
        let pitches = tracker.track(&spec);
        assert_eq!(pitches.len(), spec.n_bins() * spec.n_frames());
        assert!(pitches.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_tone_pitch_at_strongest_bin() {
        let stft = StftProcessor::new(2048, 512);
        let spec = stft.magnitude(&tone(220.0, 16_000));
        let tracker = PitchTracker::new(16_000, 2048, 150.0, 4000.0, 0.1);
        let pitches = tracker.track(&spec);

        let t = spec.n_frames() / 2;
        let frame = spec.frame(t);
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        let estimate = pitches[t * spec.n_bins() + peak];
        assert!(
            (estimate - 220.0).abs() < 1.0,
            "expected ~220 Hz, got {}",
            estimate
        );
    }

    #[test]
    fn test_parabolic_shift_moves_toward_vertex() {
        // Parabola through (0, 1), (1, 3), (2, 2) peaks at x = 7/6
        let shift = parabolic_shift(&[1.0, 3.0, 2.0], 1);
        assert!((shift - 1.0 / 6.0).abs() < 1e-12, "got {}", shift);

        let shift = parabolic_shift(&[2.0, 3.0, 1.0], 1);
        assert!((shift + 1.0 / 6.0).abs() < 1e-12, "got {}", shift);

        assert_eq!(parabolic_shift(&[1.0, 3.0, 1.0], 1), 0.0);
        assert_eq!(parabolic_shift(&[3.0, 1.0], 0), 0.0);
    }

    #[test]
    fn test_flat_neighbourhood_has_no_shift() {
        assert_eq!(parabolic_shift(&[2.0, 2.0, 2.0], 1), 0.0);
    }

    #[test]
    fn test_off_centre_tone_is_interpolated() {
        // 224 Hz sits between bins 28 (218.75 Hz) and 29 (226.56 Hz)
        let stft = StftProcessor::new(2048, 512);
        let spec = stft.magnitude(&tone(224.0, 16_000));
        let tracker = PitchTracker::new(16_000, 2048, 150.0, 4000.0, 0.1);
        let pitches = tracker.track(&spec);

        let t = spec.n_frames() / 2;
        let frame = spec.frame(t);
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 29);
        let estimate = pitches[t * spec.n_bins() + peak];
        assert!(
            (estimate - 224.0).abs() < 1.0,
            "expected ~224 Hz, got {}",
            estimate
        );
        // Interpolation pulls the estimate below the bin centre
        assert!(estimate < 226.5625);
    }

    #[test]
    fn test_out_of_band_tone_is_ignored() {
        let stft = StftProcessor::new(2048, 512);
        let spec = stft.magnitude(&tone(100.0, 16_000));
        let tracker = PitchTracker::new(16_000, 2048, 150.0, 4000.0, 0.1);
        let pitches = tracker.track(&spec);

        let t = spec.n_frames() / 2;
        let frame_pitches = &pitches[t * spec.n_bins()..(t + 1) * spec.n_bins()];
        assert!(frame_pitches.iter().all(|&p| p == 0.0 || p >= 150.0));
        // Nothing is reported at the 100 Hz bin
        assert_eq!(frame_pitches[(100.0f64 / 7.8125).round() as usize], 0.0);
    }
}
