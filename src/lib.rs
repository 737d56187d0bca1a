pub mod config;
pub mod dsp;
pub mod error;
pub mod instrument;

use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::dsp::voice::OscillatorBackend;
use crate::error::TiltKeysError;
use crate::instrument::{
    BrightnessDisplay, GestureController, MotionSample, OrientationSample, State,
};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tiltkeys-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Parse and validate an `EngineConfig` from a JSON string.
pub fn parse_config(json: &str) -> Result<EngineConfig, TiltKeysError> {
    Ok(EngineConfig::from_json(json)?)
}

/// Display sink that keeps the latest brightness value for the host to poll.
#[derive(Debug, Default, Clone, Copy)]
struct LatestBrightness {
    value: f64,
}

impl BrightnessDisplay for LatestBrightness {
    fn publish_brightness(&mut self, value: f64) {
        self.value = value;
    }
}

/// WASM-exposed instrument handle with the synthesized voice backend.
///
/// The host forwards gestures and sensor events as they arrive and pulls
/// rendered audio from `render` (AudioWorklet playback).
#[wasm_bindgen]
pub struct TiltKeys {
    controller: GestureController<OscillatorBackend, LatestBrightness>,
}

#[wasm_bindgen]
impl TiltKeys {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> TiltKeys {
        Self::from_config(EngineConfig::default(), sample_rate)
    }

    /// Build an instrument from a config object; fields not given take
    /// their defaults.
    pub fn with_config(config: JsValue, sample_rate: f64) -> Result<TiltKeys, JsValue> {
        let config: EngineConfig =
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        config
            .validate()
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(Self::from_config(config, sample_rate))
    }

    pub fn trigger(&mut self, note: &str) {
        self.controller.trigger(note);
    }

    pub fn release(&mut self) {
        self.controller.release();
    }

    /// Deliver one device-orientation reading (signed degrees).
    pub fn orientation(&mut self, pitch_tilt: f64, roll_tilt: f64, timestamp_ms: f64) {
        self.controller
            .orientation(OrientationSample::new(pitch_tilt, roll_tilt, timestamp_ms));
    }

    /// Deliver one motion reading (acceleration-including-gravity norm).
    pub fn motion(&mut self, magnitude: f64, timestamp_ms: f64) {
        self.controller
            .motion(MotionSample::new(magnitude, timestamp_ms));
    }

    /// Advance the vibrato clock between sensor deliveries.
    pub fn tick(&mut self, now_ms: f64) {
        self.controller.tick(now_ms);
    }

    /// Render the next `num_samples` mono f32 samples.
    pub fn render(&mut self, num_samples: usize) -> Vec<f32> {
        let mut out = vec![0.0; num_samples];
        self.controller.render(&mut out);
        out
    }

    /// Latest brightness value [0, 100] for the background tint.
    pub fn brightness(&self) -> f64 {
        self.controller.display().value
    }

    pub fn is_sounding(&self) -> bool {
        self.controller.state() == State::Sounding
    }
}

impl TiltKeys {
    fn from_config(config: EngineConfig, sample_rate: f64) -> TiltKeys {
        let backend = OscillatorBackend::new(config.voice, sample_rate);
        TiltKeys {
            controller: GestureController::with_display(
                backend,
                &config,
                LatestBrightness::default(),
            ),
        }
    }
}

/// WASM-exposed instrument handle with the sample-playback backend.
///
/// The host preloads one audio file per note name (a `C.mp3`-per-key row)
/// before triggering.
#[cfg(feature = "samples")]
#[wasm_bindgen]
pub struct TiltKeysSampler {
    controller: GestureController<crate::dsp::sampler::SamplerBackend, LatestBrightness>,
}

#[cfg(feature = "samples")]
#[wasm_bindgen]
impl TiltKeysSampler {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> TiltKeysSampler {
        let config = EngineConfig::default();
        let backend = crate::dsp::sampler::SamplerBackend::new(config.voice, sample_rate);
        TiltKeysSampler {
            controller: GestureController::with_display(
                backend,
                &config,
                LatestBrightness::default(),
            ),
        }
    }

    /// Decode and register MP3 bytes for a note name.
    pub fn load_mp3(&mut self, note: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.controller
            .backend_mut()
            .load_mp3(note, bytes)
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Decode and register WAV bytes for a note name.
    pub fn load_wav(&mut self, note: &str, bytes: &[u8]) -> Result<(), JsValue> {
        self.controller
            .backend_mut()
            .load_wav(note, bytes)
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn trigger(&mut self, note: &str) {
        self.controller.trigger(note);
    }

    pub fn release(&mut self) {
        self.controller.release();
    }

    pub fn orientation(&mut self, pitch_tilt: f64, roll_tilt: f64, timestamp_ms: f64) {
        self.controller
            .orientation(OrientationSample::new(pitch_tilt, roll_tilt, timestamp_ms));
    }

    pub fn motion(&mut self, magnitude: f64, timestamp_ms: f64) {
        self.controller
            .motion(MotionSample::new(magnitude, timestamp_ms));
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.controller.tick(now_ms);
    }

    pub fn render(&mut self, num_samples: usize) -> Vec<f32> {
        let mut out = vec![0.0; num_samples];
        self.controller.render(&mut out);
        out
    }

    pub fn brightness(&self) -> f64 {
        self.controller.display().value
    }

    pub fn is_sounding(&self) -> bool {
        self.controller.state() == State::Sounding
    }
}
