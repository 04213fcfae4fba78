//! WAV file audio source, for piping recordings through the pipeline.

use crate::audio::source::AudioSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{LivesubError, Result};
use std::io::Read;
use std::path::Path;

/// Audio source that reads from WAV file data.
/// Supports arbitrary sample rates and channels, resampling to 16kHz mono.
pub struct WavAudioSource {
    samples: Vec<i16>,
    position: usize,
    chunk_size: usize,
}

impl WavAudioSource {
    /// Create from any reader.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Convert to mono if stereo
        let mono_samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        let samples = if source_rate != SAMPLE_RATE {
            resample(&mono_samples, source_rate, SAMPLE_RATE)
        } else {
            mono_samples
        };

        // 100ms chunks at 16kHz
        let chunk_size = 1600;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
        })
    }

    /// Create from a file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)))
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| LivesubError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Total duration of the loaded audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_16khz_mono_matches_exactly() {
        let input_samples = vec![100i16, 200, 300, 400, 500];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples, input_samples);
        assert_eq!(source.position, 0);
        assert_eq!(source.chunk_size, 1600);
    }

    #[test]
    fn from_reader_16khz_stereo_downmixes_to_mono() {
        // Stereo pairs: (100, 200), (300, 400), (500, 600)
        let stereo_samples = vec![100i16, 200, 300, 400, 500, 600];
        let wav_data = make_wav_data(16000, 2, &stereo_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        // Expected mono: (100+200)/2=150, (300+400)/2=350, (500+600)/2=550
        assert_eq!(source.samples, vec![150i16, 350, 550]);
    }

    #[test]
    fn from_reader_48khz_mono_resamples_to_16khz() {
        let input_samples = vec![0i16; 48000]; // 1 second at 48kHz
        let wav_data = make_wav_data(48000, 1, &input_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert!(source.samples.len() >= 15900 && source.samples.len() <= 16100);
    }

    #[test]
    fn from_file_loads_wav() {
        let input_samples = vec![500i16; 3200];
        let wav_data = make_wav_data(16000, 1, &input_samples);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        std::fs::write(&path, wav_data).unwrap();

        let source = WavAudioSource::from_file(&path).unwrap();
        assert_eq!(source.samples.len(), 3200);
        assert!((source.duration_secs() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn read_samples_returns_chunks_of_correct_size() {
        let input_samples = vec![1i16; 5000]; // More than one chunk
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.read_samples().unwrap().len(), 1600);
        assert_eq!(source.read_samples().unwrap().len(), 1600);
        assert_eq!(source.read_samples().unwrap().len(), 1600);
        // Remaining 200 samples (5000 - 3*1600)
        assert_eq!(source.read_samples().unwrap().len(), 200);
    }

    #[test]
    fn read_samples_returns_empty_vec_at_eof() {
        let input_samples = vec![1i16; 100];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.read_samples().unwrap().len(), 100);
        assert_eq!(source.read_samples().unwrap().len(), 0);
        assert_eq!(source.read_samples().unwrap().len(), 0);
    }

    #[test]
    fn wav_source_is_finite() {
        let wav_data = make_wav_data(16000, 1, &[1i16; 10]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert!(source.is_finite());
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let invalid_data = vec![0u8, 1, 2, 3, 4, 5]; // Not a valid WAV file

        let result = WavAudioSource::from_reader(Box::new(Cursor::new(invalid_data)));

        assert!(result.is_err());
        match result {
            Err(LivesubError::AudioCapture { message }) => {
                assert!(message.contains("Failed to parse WAV file"));
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn empty_wav_data_returns_error() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(Vec::new())));
        assert!(result.is_err());
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![100i16, 200, 300, 400, 500];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsample_verification() {
        let samples = vec![0i16, 1000, 2000];
        let resampled = resample(&samples, 8000, 16000);

        // Upsampling from 8kHz to 16kHz should double the sample count
        assert_eq!(resampled.len(), 6);

        // Values should be interpolated
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
        assert_eq!(resampled[2], 1000);
    }

    #[test]
    fn resample_downsample_verification() {
        let samples = vec![0i16; 3200]; // 200ms at 16kHz
        let resampled = resample(&samples, 16000, 8000);

        assert_eq!(resampled.len(), 1600);
    }

    #[test]
    fn resample_handles_edge_cases() {
        let empty = resample(&[], 16000, 8000);
        assert_eq!(empty.len(), 0);

        let single = resample(&[100i16], 16000, 8000);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0], 100);
    }

    #[test]
    fn resample_preserves_signal_amplitude() {
        let samples = vec![1000i16; 100];
        let resampled = resample(&samples, 16000, 8000);

        assert!(resampled.iter().all(|&s| (999..=1001).contains(&s)));
    }

    #[test]
    fn stereo_downmix_handles_negative_values() {
        // Stereo pairs with negative values: (-100, 100), (300, -300)
        let stereo_samples = vec![-100i16, 100, 300, -300];
        let wav_data = make_wav_data(16000, 2, &stereo_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples, vec![0i16, 0]);
    }

    #[test]
    fn malformed_wav_truncated_header_rejected() {
        let truncated = b"RIFF\x00\x00";
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(truncated.to_vec())));
        assert!(result.is_err(), "Should reject truncated WAV header");
    }

    #[test]
    fn malformed_wav_random_garbage_rejected() {
        let mut garbage = Vec::new();
        for i in 0..500 {
            garbage.push(((i * 17 + 42) % 256) as u8); // Deterministic pseudo-random
        }

        let result = WavAudioSource::from_reader(Box::new(Cursor::new(garbage)));
        assert!(result.is_err(), "Should reject random garbage as WAV");
    }
}
