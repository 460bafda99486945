//! Audio I/O using Symphonia for decoding and hound for WAV output
//!
//! Any format Symphonia's default codec registry can decode is accepted;
//! output is always 32-bit float WAV. Decoded samples are normalized to
//! f64 in [-1, 1] and split into planar per-channel buffers.

use std::io::Cursor;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::{i24, u24};

use crate::error::{DenoiseError, Result};

/// Audio metadata information
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_samples: usize,
    pub duration_seconds: f64,
}

impl AudioInfo {
    pub fn new(sample_rate: u32, channels: usize, duration_samples: usize) -> Self {
        let duration_seconds = duration_samples as f64 / sample_rate as f64;
        Self {
            sample_rate,
            channels,
            duration_samples,
            duration_seconds,
        }
    }
}

/// Append one decoded buffer to the planar channel buffers, converting each
/// sample to normalized f64
macro_rules! extend_planar {
    ($buffer:expr, $channels:expr, $convert:expr) => {
        for (c, out) in $channels.iter_mut().enumerate() {
            out.extend($buffer.chan(c).iter().map($convert));
        }
    };
}

/// Decode a MediaSourceStream into planar f64 channel buffers
fn read_audio_stream(mss: MediaSourceStream) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let hint = Hint::new();
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| DenoiseError::Io(format!("unrecognized audio format: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| DenoiseError::Io("no default track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| DenoiseError::Io(format!("unsupported codec: {}", e)))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DenoiseError::Io("sample rate not specified".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| DenoiseError::Io("channel layout not specified".to_string()))?
        .count();

    let mut channel_buffers: Vec<Vec<f64>> = vec![Vec::new(); channels];
    let mut format = probed.format;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(DenoiseError::Io(err.to_string())),
        };

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(DenoiseError::Io(err.to_string())),
        };

        match decoded {
            AudioBufferRef::F32(b) => extend_planar!(b, channel_buffers, |&s| s as f64),
            AudioBufferRef::F64(b) => extend_planar!(b, channel_buffers, |&s| s),
            AudioBufferRef::U8(b) => {
                extend_planar!(b, channel_buffers, |&s| (s as f64 / u8::MAX as f64) * 2.0
                    - 1.0)
            }
            AudioBufferRef::U16(b) => {
                extend_planar!(b, channel_buffers, |&s| (s as f64 / u16::MAX as f64) * 2.0
                    - 1.0)
            }
            AudioBufferRef::U24(b) => {
                extend_planar!(b, channel_buffers, |&s| (s.inner() as f64
                    / u24::MAX.inner() as f64)
                    * 2.0
                    - 1.0)
            }
            AudioBufferRef::U32(b) => {
                extend_planar!(b, channel_buffers, |&s| (s as f64 / u32::MAX as f64) * 2.0
                    - 1.0)
            }
            AudioBufferRef::S16(b) => {
                extend_planar!(b, channel_buffers, |&s| s as f64 / i16::MAX as f64)
            }
            AudioBufferRef::S24(b) => {
                extend_planar!(b, channel_buffers, |&s| s.inner() as f64
                    / i24::MAX.inner() as f64)
            }
            AudioBufferRef::S32(b) => {
                extend_planar!(b, channel_buffers, |&s| s as f64 / i32::MAX as f64)
            }
            _ => return Err(DenoiseError::Io("unsupported sample format".to_string())),
        }
    }

    let duration_samples = channel_buffers.first().map_or(0, |c| c.len());
    let info = AudioInfo::new(sample_rate, channels, duration_samples);

    log::info!(
        "decoded {} channels, {} Hz, {:.2} s",
        info.channels,
        info.sample_rate,
        info.duration_seconds
    );

    Ok((info, channel_buffers))
}

/// Read an audio file from a filesystem path
#[cfg(not(target_arch = "wasm32"))]
pub fn read_audio_file<P: AsRef<Path>>(path: P) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_audio_stream(mss)
}

/// Read audio data from an in-memory byte buffer
pub fn read_audio_bytes(data: Vec<u8>) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let cursor = Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_audio_stream(mss)
}

fn wav_spec(audio_info: &AudioInfo) -> WavSpec {
    WavSpec {
        channels: audio_info.channels as u16,
        sample_rate: audio_info.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Interleave planar channels into a float WAV stream
fn write_wav<W: std::io::Write + std::io::Seek>(
    writer: W,
    audio_info: &AudioInfo,
    channel_data: &[Vec<f64>],
) -> Result<()> {
    if channel_data.len() != audio_info.channels {
        return Err(DenoiseError::InvalidAudio(format!(
            "channel count mismatch: expected {}, got {}",
            audio_info.channels,
            channel_data.len()
        )));
    }

    let mut writer = WavWriter::new(writer, wav_spec(audio_info))
        .map_err(|e| DenoiseError::Io(e.to_string()))?;

    let num_samples = channel_data.first().map_or(0, |c| c.len());
    for sample_idx in 0..num_samples {
        for channel in channel_data {
            writer
                .write_sample(channel[sample_idx] as f32)
                .map_err(|e| DenoiseError::Io(e.to_string()))?;
        }
    }

    writer.finalize().map_err(|e| DenoiseError::Io(e.to_string()))
}

/// Write planar audio data to a 32-bit float WAV file
#[cfg(not(target_arch = "wasm32"))]
pub fn write_audio_file<P: AsRef<Path>>(
    path: P,
    audio_info: &AudioInfo,
    channel_data: &[Vec<f64>],
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_wav(std::io::BufWriter::new(file), audio_info, channel_data)
}

/// Write planar audio data to WAV format in memory
pub fn write_audio_bytes(audio_info: &AudioInfo, channel_data: &[Vec<f64>]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, audio_info, channel_data)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_info() {
        let info = AudioInfo::new(48000, 2, 24000);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.duration_samples, 24000);
        assert!((info.duration_seconds - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_wav_bytes_round_trip() {
        let sample_rate = 44100;
        let channels = 2;
        let duration_samples = 1000;

        let mut test_data = vec![Vec::new(); channels];
        for i in 0..duration_samples {
            let t = i as f64 / sample_rate as f64;
            test_data[0].push((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5);
            test_data[1].push((2.0 * std::f64::consts::PI * 880.0 * t).sin() * 0.5);
        }

        let info = AudioInfo::new(sample_rate, channels, duration_samples);

        let wav_bytes = write_audio_bytes(&info, &test_data).unwrap();
        assert!(!wav_bytes.is_empty());

        let (read_info, read_data) = read_audio_bytes(wav_bytes).unwrap();
        assert_eq!(read_info.sample_rate, info.sample_rate);
        assert_eq!(read_info.channels, info.channels);

        for ch in 0..channels {
            assert_eq!(read_data[ch].len(), test_data[ch].len());
            for (&original, &read) in test_data[ch].iter().zip(read_data[ch].iter()) {
                assert!((original - read).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_channel_count_mismatch_rejected() {
        let info = AudioInfo::new(44100, 2, 100);
        let data = vec![vec![0.0; 100]];
        assert!(matches!(
            write_audio_bytes(&info, &data),
            Err(DenoiseError::InvalidAudio(_))
        ));
    }
}
