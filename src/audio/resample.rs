// Resampling - native sample rate to the analysis rate
//
// Uses rubato's synchronous FFT resampler. The final partial chunk is padded
// with silence and the resampler's output delay is trimmed, so the output
// holds exactly ceil(len * to / from) samples aligned with the input.

use rubato::{FftFixedInOut, Resampler};

use crate::error::ExtractionError;

/// Input frames per resampler chunk
const CHUNK_SIZE: usize = 1024;

/// Convert mono samples from `from_rate` to `to_rate`
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, ExtractionError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ExtractionError::Resample {
            reason: format!("invalid sample rates {} -> {}", from_rate, to_rate),
        });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1)?;
    let delay = resampler.output_delay();
    let expected = output_len(samples.len(), from_rate, to_rate);

    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut position = 0;
    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if position < samples.len() {
            let end = (position + needed).min(samples.len());
            chunk[..end - position].copy_from_slice(&samples[position..end]);
        }
        position += needed;

        let processed = resampler.process(&[chunk], None)?;
        output.extend_from_slice(&processed[0]);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}

fn output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    let numerator = input_len as u64 * to_rate as u64;
    numerator.div_ceil(from_rate as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count()
    }

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&input, 16_000, 16_000).unwrap(), input);
    }

    #[test]
    fn test_output_length_matches_ratio() {
        let input = sine(44_100, 440.0, 44_100);
        let output = resample(&input, 44_100, 16_000).unwrap();
        assert_eq!(output.len(), 16_000);

        let input = sine(8_000, 440.0, 8_001);
        let output = resample(&input, 8_000, 16_000).unwrap();
        assert_eq!(output.len(), 16_002);
    }

    #[test]
    fn test_frequency_is_preserved() {
        let input = sine(48_000, 300.0, 48_000);
        let output = resample(&input, 48_000, 16_000).unwrap();

        // One second of 300 Hz has ~600 zero crossings at any rate
        let crossings = zero_crossings(&output[1_000..15_000]) as f32 / 14_000.0 * 16_000.0;
        assert!(
            (crossings - 600.0).abs() < 10.0,
            "expected ~600 crossings, got {}",
            crossings
        );
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(matches!(
            resample(&[0.0], 0, 16_000),
            Err(ExtractionError::Resample { .. })
        ));
    }
}
