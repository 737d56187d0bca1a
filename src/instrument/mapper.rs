//! Modulation mapper — tilt deltas to concrete parameter values.
//!
//! All mappings are linear with named constants from [`MappingConfig`]:
//! one degree of forward tilt moves the playback rate by
//! `pitch_sensitivity`, one degree of sideways tilt moves the tone cutoff
//! by `tone_sensitivity_hz` around `tone_center_hz`, clamped to the audible
//! band. Values are written instantaneously, no smoothing.

use crate::config::MappingConfig;

use super::sensor::OrientationSample;

/// Tilt offsets relative to a session baseline, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltDeltas {
    pub pitch: f64,
    pub roll: f64,
}

/// Maps tilt deltas into voice parameter values.
#[derive(Debug, Clone, Copy)]
pub struct ModulationMapper {
    config: MappingConfig,
}

impl ModulationMapper {
    pub fn new(config: MappingConfig) -> Self {
        ModulationMapper { config }
    }

    /// Deltas of `sample` against the frozen baseline reference.
    pub fn deltas(&self, baseline: (f64, f64), sample: &OrientationSample) -> TiltDeltas {
        let (pitch_tilt0, roll_tilt0) = baseline;
        TiltDeltas {
            pitch: sample.pitch_tilt - pitch_tilt0,
            roll: sample.roll_tilt - roll_tilt0,
        }
    }

    /// Primary control: playback rate relative to the session base rate.
    pub fn primary_rate(&self, base_rate: f64, deltas: &TiltDeltas) -> f64 {
        base_rate + deltas.pitch * self.config.pitch_sensitivity
    }

    /// Secondary control: low-pass cutoff in Hz, clamped to the configured
    /// band so extreme tilts stay audible and undistorted.
    pub fn tone_cutoff_hz(&self, deltas: &TiltDeltas) -> f64 {
        let cutoff = self.config.tone_center_hz + deltas.roll * self.config.tone_sensitivity_hz;
        cutoff.clamp(self.config.tone_min_hz, self.config.tone_max_hz)
    }

    /// Visual side channel: 0..=100, monotonic in |roll delta|. Roll-axis
    /// only; the pitch axis deliberately does not contribute.
    pub fn brightness(&self, deltas: &TiltDeltas) -> f64 {
        (deltas.roll.abs() * self.config.brightness_scale).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ModulationMapper {
        ModulationMapper::new(MappingConfig::default())
    }

    #[test]
    fn deltas_are_relative_to_baseline() {
        let m = mapper();
        let d = m.deltas((10.0, 5.0), &OrientationSample::new(20.0, 5.0, 32.0));
        assert_eq!(d.pitch, 10.0);
        assert_eq!(d.roll, 0.0);
    }

    #[test]
    fn primary_rate_is_linear_in_pitch_delta() {
        let m = mapper();
        let d = TiltDeltas {
            pitch: 90.0,
            roll: 0.0,
        };
        // Default sensitivity is 1/90 per degree: +90° doubles the rate
        assert!((m.primary_rate(1.0, &d) - 2.0).abs() < 1e-12);

        let d = TiltDeltas {
            pitch: -45.0,
            roll: 0.0,
        };
        assert!((m.primary_rate(1.0, &d) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_roll_delta_keeps_tone_centered() {
        let m = mapper();
        let d = TiltDeltas {
            pitch: 10.0,
            roll: 0.0,
        };
        assert!((m.tone_cutoff_hz(&d) - 600.0).abs() < 1e-12);
    }

    #[test]
    fn tone_cutoff_clamps_to_band() {
        let m = mapper();
        let hard_left = TiltDeltas {
            pitch: 0.0,
            roll: -90.0,
        };
        assert_eq!(m.tone_cutoff_hz(&hard_left), 200.0);

        let hard_right = TiltDeltas {
            pitch: 0.0,
            roll: 400.0,
        };
        assert_eq!(m.tone_cutoff_hz(&hard_right), 5000.0);
    }

    #[test]
    fn brightness_monotonic_and_capped() {
        let m = mapper();
        let mut last = -1.0;
        for roll in [0.0, 5.0, 20.0, 45.0, 49.0] {
            let b = m.brightness(&TiltDeltas { pitch: 0.0, roll });
            assert!(b >= last, "Brightness must not decrease with |roll|");
            last = b;
        }
        let b = m.brightness(&TiltDeltas {
            pitch: 0.0,
            roll: -80.0,
        });
        assert_eq!(b, 100.0, "Brightness caps at 100");
    }
}
