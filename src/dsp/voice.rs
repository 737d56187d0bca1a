//! Oscillator voice — the default sound source behind the gesture engine.
//!
//! One voice is an oscillator feeding the tone filter and a fixed output
//! gain, with short linear ramps at start and stop to keep the edges
//! click-free. The playback-rate multiplier is the primary control, the
//! filter cutoff the secondary.

use log::warn;

use crate::config::VoiceConfig;
use crate::instrument::{AudioBackend, Voice};

use super::filter::ToneFilter;
use super::oscillator::Oscillator;

/// Gain ramp length at voice start.
const ATTACK_MS: f64 = 5.0;
/// Gain ramp length after `stop()`.
const RELEASE_MS: f64 = 10.0;

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
///
/// A bare note letter ("C", "F#") defaults to octave 4, the octave the
/// instrument's key row is laid out in.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let bytes = note.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    // Parse note name (A-G)
    let name = bytes[0] as char;
    let base_semitone = match name {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut idx = 1;
    let mut semitone = base_semitone;

    // Parse accidental
    if idx < bytes.len() {
        match bytes[idx] as char {
            '#' => {
                semitone += 1;
                idx += 1;
            }
            'b' => {
                semitone -= 1;
                idx += 1;
            }
            _ => {}
        }
    }

    // Parse octave number, defaulting to 4
    let octave_str = &note[idx..];
    let octave: i32 = if octave_str.is_empty() {
        4
    } else {
        octave_str.parse().ok()?
    };

    // MIDI note number: C4 = 60
    Some((octave + 1) * 12 + semitone)
}

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

/// Note-name → frequency with a configurable tuning pitch.
pub fn note_to_frequency(note: &str, tuning_pitch: f64) -> Option<f64> {
    let midi = note_to_midi(note)?;
    Some(midi_to_frequency(midi, tuning_pitch))
}

/// A synthesized voice: oscillator → tone filter → gain.
#[derive(Debug, Clone)]
pub struct OscillatorVoice {
    oscillator: Oscillator,
    filter: ToneFilter,
    gain: f64,
    ramp_level: f64,
    attack_step: f64,
    release_step: f64,
    released: bool,
    finished: bool,
}

impl OscillatorVoice {
    pub fn new(config: &VoiceConfig, frequency: f64, sample_rate: f64) -> Self {
        let mut oscillator = Oscillator::new(config.waveform, sample_rate);
        oscillator.frequency = frequency;
        oscillator.reset();

        OscillatorVoice {
            oscillator,
            filter: ToneFilter::new(600.0, sample_rate),
            gain: config.gain,
            ramp_level: 0.0,
            attack_step: 1.0 / (ATTACK_MS / 1000.0 * sample_rate).max(1.0),
            release_step: 1.0 / (RELEASE_MS / 1000.0 * sample_rate).max(1.0),
            released: false,
            finished: false,
        }
    }

    /// Current playback-rate multiplier.
    pub fn rate(&self) -> f64 {
        self.oscillator.rate()
    }

    /// Current tone cutoff in Hz.
    pub fn cutoff_hz(&self) -> f64 {
        self.filter.cutoff_hz()
    }
}

impl Voice for OscillatorVoice {
    fn set_primary(&mut self, rate: f64) {
        if self.released {
            return;
        }
        self.oscillator.set_rate(rate);
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
                self.filter.reset();
                return 0.0;
            }
        } else if self.ramp_level < 1.0 {
            self.ramp_level = (self.ramp_level + self.attack_step).min(1.0);
        }

        let raw = self.oscillator.next_sample();
        self.filter.process(raw) * self.gain * self.ramp_level
    }
}

/// Audio backend that synthesizes every note on demand.
#[derive(Debug, Clone)]
pub struct OscillatorBackend {
    config: VoiceConfig,
    sample_rate: f64,
}

impl OscillatorBackend {
    pub fn new(config: VoiceConfig, sample_rate: f64) -> Self {
        OscillatorBackend {
            config,
            sample_rate,
        }
    }
}

impl AudioBackend for OscillatorBackend {
    type Voice = OscillatorVoice;

    fn start(&mut self, note: &str) -> Option<OscillatorVoice> {
        let Some(frequency) = note_to_frequency(note, self.config.tuning_pitch) else {
            warn!("unplayable note '{note}', gesture dropped");
            return None;
        };
        Some(OscillatorVoice::new(&self.config, frequency, self.sample_rate))
    }
}
