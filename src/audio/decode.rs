// WAV decoding - file to mono f32 samples
//
// Integer PCM is scaled by 2^(bits - 1) so that full scale maps to [-1, 1).
// Multi-channel audio is downmixed by averaging the channels of each frame.

use std::path::Path;

use crate::audio::resample::resample;
use crate::audio::Waveform;
use crate::error::ExtractionError;

/// Decode a WAV file at its native sample rate, downmixed to mono
pub fn decode_wav<P: AsRef<Path>>(path: P) -> Result<Waveform, ExtractionError> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::IoError(io) => ExtractionError::Io {
            path: path.display().to_string(),
            reason: io.to_string(),
        },
        other => other.into(),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(ExtractionError::Decode {
            reason: "WAV header declares zero channels".to_string(),
        });
    }

    let interleaved = read_samples(reader)?;
    let samples = downmix(&interleaved, spec.channels as usize);

    tracing::debug!(
        "[Decode] {}: {} frames, {} Hz, {} channel(s)",
        path.display(),
        samples.len(),
        spec.sample_rate,
        spec.channels
    );

    Ok(Waveform::new(samples, spec.sample_rate))
}

/// Decode a WAV file and resample it to `target_rate`
pub fn load_mono<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Waveform, ExtractionError> {
    let waveform = decode_wav(path)?;
    if waveform.is_empty() {
        return Err(ExtractionError::EmptyAudio);
    }
    let samples = resample(&waveform.samples, waveform.sample_rate, target_rate)?;
    Ok(Waveform::new(samples, target_rate))
}

fn read_samples<R: std::io::Read>(
    mut reader: hound::WavReader<R>,
) -> Result<Vec<f32>, ExtractionError> {
    let spec = reader.spec();
    match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(ExtractionError::UnsupportedFormat {
                    reason: format!("{}-bit float samples", spec.bits_per_sample),
                });
            }
            reader
                .samples::<f32>()
                .map(|sample| sample.map_err(ExtractionError::from))
                .collect()
        }
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(ExtractionError::UnsupportedFormat {
                    reason: format!("{}-bit integer samples", spec.bits_per_sample),
                });
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|value| (value as f64 / scale) as f32)
                        .map_err(ExtractionError::from)
                })
                .collect()
        }
    }
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::error::ExtractionErrorCodes;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_decode_int16_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[0, 16384, -32768]);

        let waveform = decode_wav(&path).unwrap();
        assert_eq!(waveform.sample_rate, 16_000);
        assert_eq!(waveform.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_decode_stereo_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[16384, 0, 16384, 16384]);

        let waveform = decode_wav(&path).unwrap();
        assert_eq!(waveform.len(), 2);
        assert_eq!(waveform.samples, vec![0.25, 0.5]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = decode_wav("/no/such/voice.wav").unwrap_err();
        assert_eq!(err.code(), ExtractionErrorCodes::IO);
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        let err = decode_wav(&path).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Decode { .. } | ExtractionError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_load_mono_rejects_empty_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[]);

        assert_eq!(load_mono(&path, 16_000), Err(ExtractionError::EmptyAudio));
    }
}
