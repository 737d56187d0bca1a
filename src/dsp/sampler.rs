//! Sample-playback voices — one audio file per note.
//!
//! The host hands the backend raw WAV or MP3 bytes per note name; playback
//! resamples with linear interpolation, and the playback rate is the
//! primary pitch control (tilting bends the sample, exactly like a
//! variable-speed tape). One-shot playback, no loop points.

use std::collections::HashMap;
use std::io::Cursor;

use log::{debug, warn};

use crate::config::VoiceConfig;
use crate::error::SampleError;
use crate::instrument::{AudioBackend, Voice};

use super::filter::ToneFilter;

const ATTACK_MS: f64 = 5.0;
const RELEASE_MS: f64 = 10.0;

/// A single mono sample buffer loaded into memory.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Mono f64 samples.
    pub data: Vec<f64>,
    /// Native sample rate of the audio.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer { data, sample_rate }
    }

    /// Create from 16-bit signed PCM data.
    pub fn from_i16(pcm: &[i16], sample_rate: u32) -> Self {
        let data: Vec<f64> = pcm.iter().map(|&s| s as f64 / 32768.0).collect();
        SampleBuffer { data, sample_rate }
    }

    /// Create from f32 samples.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        let data: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        SampleBuffer { data, sample_rate }
    }

    /// Decode a WAV file held in memory, downmixing to mono.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, SampleError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
            SampleError::Wav {
                message: e.to_string(),
            }
        })?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f64> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| v as f64))
                .collect::<Result<_, _>>()
                .map_err(|e| SampleError::Wav {
                    message: e.to_string(),
                })?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| SampleError::Wav {
                        message: e.to_string(),
                    })?
            }
        };

        let buffer = SampleBuffer::new(downmix(&interleaved, channels), spec.sample_rate);
        if buffer.is_empty() {
            return Err(SampleError::EmptyAudio);
        }
        Ok(buffer)
    }

    /// Decode an MP3 file held in memory, downmixing to mono.
    pub fn from_mp3_bytes(bytes: &[u8]) -> Result<Self, SampleError> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
        let mut data = Vec::new();
        let mut sample_rate = 0_u32;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    sample_rate = frame.sample_rate as u32;
                    let channels = frame.channels.max(1);
                    let interleaved: Vec<f64> = frame
                        .data
                        .iter()
                        .map(|&s| s as f64 / 32768.0)
                        .collect();
                    data.extend(downmix(&interleaved, channels));
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => {
                    return Err(SampleError::Mp3 {
                        message: e.to_string(),
                    });
                }
            }
        }

        if data.is_empty() || sample_rate == 0 {
            return Err(SampleError::EmptyAudio);
        }
        Ok(SampleBuffer::new(data, sample_rate))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read a sample with linear interpolation at a fractional position.
    pub fn read_interpolated(&self, position: f64) -> f64 {
        if self.data.is_empty() || position < 0.0 {
            return 0.0;
        }

        let idx = position as usize;
        if idx >= self.data.len() - 1 {
            return if idx < self.data.len() {
                self.data[idx]
            } else {
                0.0
            };
        }

        let frac = position - idx as f64;
        self.data[idx] * (1.0 - frac) + self.data[idx + 1] * frac
    }
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f64], channels: usize) -> Vec<f64> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// A playing sample voice: buffer → tone filter → gain.
#[derive(Debug, Clone)]
pub struct SamplerVoice {
    buffer: SampleBuffer,
    /// Current read position in the buffer (fractional).
    position: f64,
    /// Playback rate (1.0 = original speed); the primary control.
    rate: f64,
    /// Native-to-engine sample rate ratio.
    rate_ratio: f64,
    filter: ToneFilter,
    gain: f64,
    ramp_level: f64,
    attack_step: f64,
    release_step: f64,
    released: bool,
    finished: bool,
}

impl SamplerVoice {
    pub fn new(config: &VoiceConfig, buffer: SampleBuffer, sample_rate: f64) -> Self {
        let rate_ratio = buffer.sample_rate as f64 / sample_rate;
        SamplerVoice {
            buffer,
            position: 0.0,
            rate: 1.0,
            rate_ratio,
            filter: ToneFilter::new(600.0, sample_rate),
            gain: config.gain,
            ramp_level: 0.0,
            attack_step: 1.0 / (ATTACK_MS / 1000.0 * sample_rate).max(1.0),
            release_step: 1.0 / (RELEASE_MS / 1000.0 * sample_rate).max(1.0),
            released: false,
            finished: false,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Voice for SamplerVoice {
    fn set_primary(&mut self, rate: f64) {
        if self.released {
            return;
        }
        self.rate = rate.max(0.0);
    }

    fn set_secondary(&mut self, cutoff_hz: f64) {
        if self.released {
            return;
        }
        self.filter.set_cutoff(cutoff_hz);
    }

    fn stop(&mut self) {
        self.released = true;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn next_sample(&mut self) -> f64 {
        if self.finished {
            return 0.0;
        }

        if self.released {
            self.ramp_level -= self.release_step;
            if self.ramp_level <= 0.0 {
                self.ramp_level = 0.0;
                self.finished = true;
                return 0.0;
            }
        } else if self.ramp_level < 1.0 {
            self.ramp_level = (self.ramp_level + self.attack_step).min(1.0);
        }

        if self.position >= self.buffer.len() as f64 {
            self.finished = true;
            return 0.0;
        }

        let raw = self.buffer.read_interpolated(self.position);
        self.position += self.rate * self.rate_ratio;
        self.filter.process(raw) * self.gain * self.ramp_level
    }
}

/// Audio backend playing one preloaded sample per note.
pub struct SamplerBackend {
    buffers: HashMap<String, SampleBuffer>,
    config: VoiceConfig,
    sample_rate: f64,
}

impl SamplerBackend {
    pub fn new(config: VoiceConfig, sample_rate: f64) -> Self {
        SamplerBackend {
            buffers: HashMap::new(),
            config,
            sample_rate,
        }
    }

    /// Register a decoded buffer for a note name.
    pub fn add_note(&mut self, note: &str, buffer: SampleBuffer) {
        self.buffers.insert(note.to_string(), buffer);
    }

    /// Decode and register WAV bytes for a note name.
    pub fn load_wav(&mut self, note: &str, bytes: &[u8]) -> Result<(), SampleError> {
        let buffer = SampleBuffer::from_wav_bytes(bytes)?;
        self.add_note(note, buffer);
        Ok(())
    }

    /// Decode and register MP3 bytes for a note name.
    pub fn load_mp3(&mut self, note: &str, bytes: &[u8]) -> Result<(), SampleError> {
        let buffer = SampleBuffer::from_mp3_bytes(bytes)?;
        self.add_note(note, buffer);
        Ok(())
    }

    pub fn has_note(&self, note: &str) -> bool {
        self.buffers.contains_key(note)
    }
}

impl AudioBackend for SamplerBackend {
    type Voice = SamplerVoice;

    fn start(&mut self, note: &str) -> Option<SamplerVoice> {
        let Some(buffer) = self.buffers.get(note) else {
            debug!("no sample loaded for note '{note}'");
            return None;
        };
        if buffer.is_empty() {
            warn!("sample for note '{note}' is empty");
            return None;
        }
        Some(SamplerVoice::new(
            &self.config,
            buffer.clone(),
            self.sample_rate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(len: usize) -> SampleBuffer {
        let data: Vec<f64> = (0..len).map(|i| i as f64 / len as f64).collect();
        SampleBuffer::new(data, 44100)
    }

    #[test]
    fn read_interpolated_midpoint() {
        let buf = SampleBuffer::new(vec![0.0, 1.0], 44100);
        let mid = buf.read_interpolated(0.5);
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn read_past_end_is_silent() {
        let buf = ramp_buffer(8);
        assert_eq!(buf.read_interpolated(100.0), 0.0);
        assert_eq!(buf.read_interpolated(-1.0), 0.0);
    }

    #[test]
    fn voice_finishes_at_buffer_end() {
        let buf = ramp_buffer(100);
        let mut v = SamplerVoice::new(&VoiceConfig::default(), buf, 44100.0);
        for _ in 0..200 {
            v.next_sample();
        }
        assert!(v.is_finished(), "One-shot playback should end with the buffer");
    }

    #[test]
    fn doubled_rate_halves_playback_length() {
        let buf = ramp_buffer(1000);
        let mut v = SamplerVoice::new(&VoiceConfig::default(), buf, 44100.0);
        v.set_primary(2.0);
        let mut n = 0;
        while !v.is_finished() && n < 5000 {
            v.next_sample();
            n += 1;
        }
        assert!(
            (450..=560).contains(&n),
            "Rate 2.0 should exhaust 1000 samples in ~500 reads, took {n}"
        );
    }

    #[test]
    fn stop_silences_before_buffer_end() {
        let buf = ramp_buffer(100_000);
        let mut v = SamplerVoice::new(&VoiceConfig::default(), buf, 44100.0);
        for _ in 0..1000 {
            v.next_sample();
        }
        v.stop();
        v.stop();
        for _ in 0..2000 {
            v.next_sample();
        }
        assert!(v.is_finished());
        assert_eq!(v.next_sample(), 0.0);
    }

    #[test]
    fn wav_roundtrip_decodes() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for i in 0..100_i16 {
                writer.write_sample(i * 100).unwrap();
            }
            writer.finalize().unwrap();
        }

        let buf = SampleBuffer::from_wav_bytes(bytes.get_ref()).unwrap();
        assert_eq!(buf.sample_rate, 22050);
        assert_eq!(buf.len(), 100);
        assert!((buf.data[1] - 100.0 / 32768.0).abs() < 1e-9);
    }

    #[test]
    fn stereo_wav_downmixes_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for _ in 0..50 {
                writer.write_sample(1000_i16).unwrap();
                writer.write_sample(3000_i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let buf = SampleBuffer::from_wav_bytes(bytes.get_ref()).unwrap();
        assert_eq!(buf.len(), 50);
        assert!((buf.data[0] - 2000.0 / 32768.0).abs() < 1e-9);
    }

    #[test]
    fn garbage_mp3_is_an_error() {
        let result = SampleBuffer::from_mp3_bytes(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(result.is_err());
    }

    #[test]
    fn backend_skips_unloaded_notes() {
        let mut backend = SamplerBackend::new(VoiceConfig::default(), 44100.0);
        assert!(backend.start("C").is_none());
        backend.add_note("C", ramp_buffer(16));
        assert!(backend.has_note("C"));
        assert!(backend.start("C").is_some());
    }
}
