//! Synthetic voice recordings for tests and the training harness.
//!
//! Recordings are harmonic tones with a little seeded noise written as
//! 16-bit PCM WAV files. Low fundamentals stand in for the "Male" category,
//! high ones for "Female", which is enough for the classifiers to separate
//! the two without shipping real speech data.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Parameters of one synthetic recording
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    /// Number of harmonics above the fundamental, each at half the
    /// amplitude of the previous one
    pub harmonics: usize,
    pub amplitude: f32,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Peak amplitude of uniform noise added to every sample
    pub noise: f32,
    pub seed: u64,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            frequency_hz: 220.0,
            harmonics: 3,
            amplitude: 0.4,
            duration_secs: 0.5,
            sample_rate: 16_000,
            channels: 1,
            noise: 0.01,
            seed: 7,
        }
    }
}

impl ToneSpec {
    /// Mono samples at `sample_rate`
    pub fn samples(&self) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let frames = (self.duration_secs * self.sample_rate as f32) as usize;
        (0..frames)
            .map(|i| {
                let t = i as f32 / self.sample_rate as f32;
                let mut value = 0.0;
                let mut gain = self.amplitude;
                for h in 0..=self.harmonics {
                    value += gain * (2.0 * PI * self.frequency_hz * (h + 1) as f32 * t).sin();
                    gain *= 0.5;
                }
                if self.noise > 0.0 {
                    value += rng.gen_range(-self.noise..self.noise);
                }
                value.clamp(-1.0, 1.0)
            })
            .collect()
    }
}

/// Write `spec` as a 16-bit PCM WAV file, duplicating mono across channels
pub fn write_tone_wav(path: &Path, spec: &ToneSpec) -> Result<()> {
    let wav_spec = hound::WavSpec {
        channels: spec.channels.max(1),
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, wav_spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for sample in spec.samples() {
        let pcm = (sample * i16::MAX as f32) as i16;
        for _ in 0..wav_spec.channels {
            writer
                .write_sample(pcm)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Fundamental frequency of the i-th synthetic recording in a category
fn category_frequency(category: &str, index: usize) -> f32 {
    let base = if category.eq_ignore_ascii_case("male") {
        110.0
    } else {
        210.0
    };
    base + (index % 5) as f32 * 8.0
}

/// Create `<root>/<category>/<category>_<n>.wav` for each category
///
/// Returns the paths written, category by category.
pub fn write_voice_dataset(
    root: &Path,
    categories: &[&str],
    per_category: usize,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(categories.len() * per_category);
    for category in categories {
        let folder = root.join(category);
        fs::create_dir_all(&folder).with_context(|| format!("creating {}", folder.display()))?;
        for index in 0..per_category {
            let spec = ToneSpec {
                frequency_hz: category_frequency(category, index),
                seed: index as u64,
                ..ToneSpec::default()
            };
            let path = folder.join(format!("{}_{}.wav", category.to_lowercase(), index));
            write_tone_wav(&path, &spec)?;
            written.push(path);
        }
    }
    Ok(written)
}
