// Audio module - waveform decoding and sample rate conversion
//
// Produces the mono, fixed-rate waveform that the feature extractor consumes.
// Waveforms are decoded fresh per request and never cached.

pub mod decode;
pub mod resample;

pub use decode::{decode_wav, load_mono};

/// Mono waveform at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
