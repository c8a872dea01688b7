// STFT module - centred short-time Fourier transform
//
// Frames are taken from the signal zero-padded by n_fft / 2 on both sides,
// so frame t is centred on sample t * hop. A periodic Hann window is applied
// before the FFT and only the non-negative frequency bins are kept.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Magnitude spectrogram stored frame-major
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    n_bins: usize,
    n_frames: usize,
    data: Vec<f64>,
}

impl Spectrogram {
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Magnitudes of one frame, indexed by frequency bin
    pub fn frame(&self, t: usize) -> &[f64] {
        &self.data[t * self.n_bins..(t + 1) * self.n_bins]
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_bins)
    }
}

/// Computes magnitude spectrograms with a pre-planned FFT
pub struct StftProcessor {
    fft: Arc<dyn Fft<f64>>,
    n_fft: usize,
    hop_length: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f64>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size
    /// * `hop_length` - Samples between successive frames
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let window = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n_fft as f64).cos())
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Self {
            fft,
            n_fft,
            hop_length,
            window,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Compute the magnitude spectrogram of `samples`
    pub fn magnitude(&self, samples: &[f32]) -> Spectrogram {
        let n_bins = self.n_bins();
        let n_frames = self.frame_count(samples.len());
        let pad = (self.n_fft / 2) as isize;

        let mut data = Vec::with_capacity(n_bins * n_frames);
        let mut buffer = vec![Complex::new(0.0f64, 0.0); self.n_fft];

        for t in 0..n_frames {
            let start = (t * self.hop_length) as isize - pad;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize] as f64
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut buffer);
            data.extend(buffer[..n_bins].iter().map(|c| c.norm()));
        }

        Spectrogram {
            n_bins,
            n_frames,
            data,
        }
    }
}

/// Centre frequency of every STFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_matches_centred_layout() {
        let stft = StftProcessor::new(2048, 512);
        assert_eq!(stft.frame_count(0), 1);
        assert_eq!(stft.frame_count(511), 1);
        assert_eq!(stft.frame_count(512), 2);
        assert_eq!(stft.frame_count(16_000), 32);
    }

    #[test]
    fn test_spectrogram_shape() {
        let stft = StftProcessor::new(256, 64);
        let spec = stft.magnitude(&vec![0.0; 1000]);
        assert_eq!(spec.n_bins(), 129);
        assert_eq!(spec.n_frames(), 16);
        assert_eq!(spec.frames().count(), 16);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sample_rate = 16_000;
        let n_fft = 1024;
        // 1000 Hz sits exactly on bin 64
        let signal: Vec<f32> = (0..8_000)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sample_rate as f32).sin())
            .collect();

        let stft = StftProcessor::new(n_fft, 256);
        let spec = stft.magnitude(&signal);
        let frame = spec.frame(spec.n_frames() / 2);
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 64);
    }

    #[test]
    fn test_fft_frequencies() {
        let freqs = fft_frequencies(16_000, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert_eq!(freqs[1024], 8000.0);
    }
}
