//! Engine configuration — mapping sensitivities, vibrato constants, voice setup.
//!
//! All tunable constants live here as one serde-deserializable document so a
//! host can ship alternate calibrations without code changes. Defaults match
//! the shipped TiltKeys instrument.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub vibrato: VibratoConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mapping: MappingConfig::default(),
            vibrato: VibratoConfig::default(),
            voice: VoiceConfig::default(),
        }
    }
}

/// Tilt → parameter mapping constants.
///
/// The primary control is a playback-rate multiplier; the secondary control
/// is a low-pass cutoff in Hz. One degree of forward tilt shifts the rate by
/// `pitch_sensitivity`; one degree of sideways tilt shifts the cutoff by
/// `tone_sensitivity_hz` around `tone_center_hz`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "defaults::pitch_sensitivity")]
    pub pitch_sensitivity: f64,
    #[serde(default = "defaults::tone_center_hz")]
    pub tone_center_hz: f64,
    #[serde(default = "defaults::tone_sensitivity_hz")]
    pub tone_sensitivity_hz: f64,
    #[serde(default = "defaults::tone_min_hz")]
    pub tone_min_hz: f64,
    #[serde(default = "defaults::tone_max_hz")]
    pub tone_max_hz: f64,
    /// Brightness units per degree of roll delta, capped at 100.
    #[serde(default = "defaults::brightness_scale")]
    pub brightness_scale: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            pitch_sensitivity: defaults::pitch_sensitivity(),
            tone_center_hz: defaults::tone_center_hz(),
            tone_sensitivity_hz: defaults::tone_sensitivity_hz(),
            tone_min_hz: defaults::tone_min_hz(),
            tone_max_hz: defaults::tone_max_hz(),
            brightness_scale: defaults::brightness_scale(),
        }
    }
}

/// Shake-triggered vibrato constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VibratoConfig {
    /// Acceleration magnitude (gravity included) that counts as a shake.
    #[serde(default = "defaults::shake_threshold")]
    pub shake_threshold: f64,
    /// Minimum interval between two accepted shakes.
    #[serde(default = "defaults::debounce_ms")]
    pub debounce_ms: f64,
    /// How long one overlay lasts before it removes itself.
    #[serde(default = "defaults::duration_ms")]
    pub duration_ms: f64,
    /// Peak rate offset added to the primary control.
    #[serde(default = "defaults::vibrato_depth")]
    pub depth: f64,
    #[serde(default = "defaults::vibrato_rate_hz")]
    pub rate_hz: f64,
}

impl Default for VibratoConfig {
    fn default() -> Self {
        VibratoConfig {
            shake_threshold: defaults::shake_threshold(),
            debounce_ms: defaults::debounce_ms(),
            duration_ms: defaults::duration_ms(),
            depth: defaults::vibrato_depth(),
            rate_hz: defaults::vibrato_rate_hz(),
        }
    }
}

/// Voice source setup for the oscillator backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "defaults::waveform")]
    pub waveform: Waveform,
    /// Output gain [0, 1].
    #[serde(default = "defaults::gain")]
    pub gain: f64,
    /// Frequency of A4 in Hz.
    #[serde(default = "defaults::tuning_pitch")]
    pub tuning_pitch: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            waveform: defaults::waveform(),
            gain: defaults::gain(),
            tuning_pitch: defaults::tuning_pitch(),
        }
    }
}

mod defaults {
    use crate::dsp::oscillator::Waveform;

    pub fn pitch_sensitivity() -> f64 {
        1.0 / 90.0
    }
    pub fn tone_center_hz() -> f64 {
        600.0
    }
    pub fn tone_sensitivity_hz() -> f64 {
        15.0
    }
    pub fn tone_min_hz() -> f64 {
        200.0
    }
    pub fn tone_max_hz() -> f64 {
        5000.0
    }
    pub fn brightness_scale() -> f64 {
        2.0
    }
    pub fn shake_threshold() -> f64 {
        20.0
    }
    pub fn debounce_ms() -> f64 {
        1000.0
    }
    pub fn duration_ms() -> f64 {
        2000.0
    }
    pub fn vibrato_depth() -> f64 {
        0.05
    }
    pub fn vibrato_rate_hz() -> f64 {
        6.0
    }
    pub fn waveform() -> Waveform {
        Waveform::Triangle
    }
    pub fn gain() -> f64 {
        0.8
    }
    pub fn tuning_pitch() -> f64 {
        440.0
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|e| ConfigError::Json {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would poison the audio parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.mapping;
        let v = &self.vibrato;
        let finite_fields = [
            ("mapping.pitch_sensitivity", m.pitch_sensitivity),
            ("mapping.tone_center_hz", m.tone_center_hz),
            ("mapping.tone_sensitivity_hz", m.tone_sensitivity_hz),
            ("mapping.tone_min_hz", m.tone_min_hz),
            ("mapping.tone_max_hz", m.tone_max_hz),
            ("mapping.brightness_scale", m.brightness_scale),
            ("vibrato.shake_threshold", v.shake_threshold),
            ("vibrato.debounce_ms", v.debounce_ms),
            ("vibrato.duration_ms", v.duration_ms),
            ("vibrato.depth", v.depth),
            ("vibrato.rate_hz", v.rate_hz),
            ("voice.gain", self.voice.gain),
            ("voice.tuning_pitch", self.voice.tuning_pitch),
        ];
        for (field, value) in finite_fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        let positive_fields = [
            ("mapping.tone_min_hz", m.tone_min_hz),
            ("mapping.tone_max_hz", m.tone_max_hz),
            ("vibrato.shake_threshold", v.shake_threshold),
            ("vibrato.debounce_ms", v.debounce_ms),
            ("vibrato.duration_ms", v.duration_ms),
            ("vibrato.rate_hz", v.rate_hz),
            ("voice.tuning_pitch", self.voice.tuning_pitch),
        ];
        for (field, value) in positive_fields {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field });
            }
        }

        if m.tone_min_hz > m.tone_max_hz {
            return Err(ConfigError::InvertedRange {
                field: "mapping.tone_min_hz..tone_max_hz",
                low: m.tone_min_hz,
                high: m.tone_max_hz,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_takes_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert!((config.mapping.tone_center_hz - 600.0).abs() < 1e-12);
        assert!((config.vibrato.debounce_ms - 1000.0).abs() < 1e-12);
        assert_eq!(config.voice.waveform, Waveform::Triangle);
    }

    #[test]
    fn partial_json_overrides_one_field() {
        let config =
            EngineConfig::from_json(r#"{"mapping": {"tone_center_hz": 800.0}}"#).unwrap();
        assert!((config.mapping.tone_center_hz - 800.0).abs() < 1e-12);
        // Sibling fields keep their defaults
        assert!((config.mapping.tone_min_hz - 200.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_tone_range_rejected() {
        let json = r#"{"mapping": {"tone_min_hz": 6000.0, "tone_max_hz": 500.0}}"#;
        let err = EngineConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { .. }));
    }

    #[test]
    fn non_finite_field_rejected() {
        let mut config = EngineConfig::default();
        config.mapping.pitch_sensitivity = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { .. })
        ));
    }

    #[test]
    fn zero_debounce_rejected() {
        let mut config = EngineConfig::default();
        config.vibrato.debounce_ms = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn waveform_parses_lowercase() {
        let config = EngineConfig::from_json(r#"{"voice": {"waveform": "sine"}}"#).unwrap();
        assert_eq!(config.voice.waveform, Waveform::Sine);
    }
}
