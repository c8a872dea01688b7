// FeatureExtractor - acoustic feature extraction for speaker classification
//
// Turns one recording into a fixed-length FeatureVector. Every stage works on
// the same centred STFT so frame counts line up across feature families.
//
// Module organization:
// - types: FeatureVector and its layout constants
// - stft: centred STFT with periodic Hann window
// - mel: mel filterbank, dB conversion, DCT (MFCC)
// - pitch: per-bin peak interpolation (pitch map)
// - spectral: spectral centroid
// - stats: mean / population standard deviation
// - mod.rs: Coordinator (FeatureExtractor)

mod mel;
mod pitch;
mod spectral;
mod stats;
mod stft;
mod types;

pub use types::{FeatureVector, FEATURE_LEN, MFCC_COUNT};

use std::path::Path;

use crate::audio::{self, resample::resample, Waveform};
use crate::config::FeatureConfig;
use crate::error::{log_extraction_error, ExtractionError};
use mel::MfccProcessor;
use pitch::PitchTracker;
use spectral::SpectralFeatures;
use stft::StftProcessor;

/// FeatureExtractor coordinates the feature extraction pipeline
///
/// Construction pre-computes the FFT plan, window, filterbank and DCT
/// matrix; extraction itself is a pure function of the input samples.
pub struct FeatureExtractor {
    config: FeatureConfig,
    /// Set when `config` cannot drive the pipeline; every extraction fails with it
    config_error: Option<ExtractionError>,
    stft: StftProcessor,
    mfcc: MfccProcessor,
    pitch: PitchTracker,
    spectral: SpectralFeatures,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        let config_error = config.validate().err();
        if let Some(err) = &config_error {
            log_extraction_error(err, "FeatureExtractor::new");
        }
        let stft = StftProcessor::new(config.n_fft, config.hop_length);
        let mfcc = MfccProcessor::new(
            config.sample_rate,
            config.n_fft,
            config.n_mels,
            config.n_mfcc,
            config.top_db,
        );
        let pitch = PitchTracker::new(
            config.sample_rate,
            config.n_fft,
            config.pitch_fmin,
            config.pitch_fmax,
            config.pitch_threshold,
        );
        let spectral = SpectralFeatures::new(config.sample_rate, config.n_fft);

        Self {
            config,
            config_error,
            stft,
            mfcc,
            pitch,
            spectral,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Decode, resample and extract features from an audio file
    pub fn extract<P: AsRef<Path>>(&self, audio_path: P) -> Result<FeatureVector, ExtractionError> {
        if let Some(err) = &self.config_error {
            return Err(err.clone());
        }
        let waveform = audio::load_mono(audio_path.as_ref(), self.config.sample_rate)?;
        self.extract_samples(&waveform.samples)
    }

    /// Extract features from a decoded waveform, resampling if needed
    pub fn extract_waveform(&self, waveform: &Waveform) -> Result<FeatureVector, ExtractionError> {
        if let Some(err) = &self.config_error {
            return Err(err.clone());
        }
        if waveform.sample_rate == self.config.sample_rate {
            return self.extract_samples(&waveform.samples);
        }
        let samples = resample(&waveform.samples, waveform.sample_rate, self.config.sample_rate)?;
        self.extract_samples(&samples)
    }

    /// Extract features from mono samples already at the analysis rate
    pub fn extract_samples(&self, samples: &[f32]) -> Result<FeatureVector, ExtractionError> {
        if let Some(err) = &self.config_error {
            return Err(err.clone());
        }
        if samples.is_empty() {
            return Err(ExtractionError::EmptyAudio);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ExtractionError::Decode {
                reason: "audio contains non-finite samples".to_string(),
            });
        }

        let spectrogram = self.stft.magnitude(samples);

        let mfcc = self.mfcc.compute(&spectrogram);
        let n_coeffs = mfcc.first().map_or(0, Vec::len);
        let mut per_coefficient = vec![Vec::with_capacity(mfcc.len()); n_coeffs];
        for frame in &mfcc {
            for (series, &value) in per_coefficient.iter_mut().zip(frame) {
                series.push(value);
            }
        }
        let mut values = Vec::with_capacity(FEATURE_LEN);
        values.extend(per_coefficient.iter().map(|series| stats::mean(series)));
        values.extend(per_coefficient.iter().map(|series| stats::std_dev(series)));

        let pitch_map = self.pitch.track(&spectrogram);
        let (pitch_mean, pitch_std) = stats::mean_std(&pitch_map);
        values.push(pitch_mean);
        values.push(pitch_std);

        let centroid = self.spectral.centroid_series(&spectrogram);
        let (centroid_mean, centroid_std) = stats::mean_std(&centroid);
        values.push(centroid_mean);
        values.push(centroid_std);

        tracing::trace!(
            "[FeatureExtractor] {} samples -> {} frames, pitch mean {:.3}, centroid mean {:.1} Hz",
            samples.len(),
            spectrogram.n_frames(),
            pitch_mean,
            centroid_mean
        );

        FeatureVector::from_vec(values)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}
