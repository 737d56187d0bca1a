//! Shake detector — motion-magnitude threshold with debounce.

use log::debug;

use crate::config::VibratoConfig;

use super::sensor::MotionSample;

/// Accepts a shake when the motion magnitude crosses the threshold and the
/// debounce interval has elapsed since the last accepted shake.
#[derive(Debug, Clone, Copy)]
pub struct ShakeDetector {
    threshold: f64,
    debounce_ms: f64,
    last_accepted_ms: Option<f64>,
}

impl ShakeDetector {
    pub fn new(config: &VibratoConfig) -> Self {
        ShakeDetector {
            threshold: config.shake_threshold,
            debounce_ms: config.debounce_ms,
            last_accepted_ms: None,
        }
    }

    /// Feed one motion sample; returns true when it counts as a shake.
    pub fn observe(&mut self, sample: &MotionSample) -> bool {
        if !sample.is_valid() {
            debug!("dropped invalid motion sample: {sample:?}");
            return false;
        }
        if sample.magnitude <= self.threshold {
            return false;
        }
        if let Some(last) = self.last_accepted_ms {
            if sample.timestamp_ms - last < self.debounce_ms {
                debug!(
                    "shake at {} ms suppressed by debounce (last at {last} ms)",
                    sample.timestamp_ms
                );
                return false;
            }
        }
        self.last_accepted_ms = Some(sample.timestamp_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ShakeDetector {
        // threshold 20, debounce 1000ms
        ShakeDetector::new(&VibratoConfig::default())
    }

    #[test]
    fn below_threshold_never_fires() {
        let mut d = detector();
        assert!(!d.observe(&MotionSample::new(19.9, 0.0)));
        assert!(!d.observe(&MotionSample::new(20.0, 100.0)));
    }

    #[test]
    fn debounce_suppresses_second_shake() {
        let mut d = detector();
        assert!(d.observe(&MotionSample::new(25.0, 0.0)));
        assert!(!d.observe(&MotionSample::new(25.0, 200.0)));
        assert!(!d.observe(&MotionSample::new(25.0, 999.0)));
    }

    #[test]
    fn shake_allowed_after_debounce_interval() {
        let mut d = detector();
        assert!(d.observe(&MotionSample::new(25.0, 0.0)));
        assert!(!d.observe(&MotionSample::new(25.0, 500.0)));
        assert!(d.observe(&MotionSample::new(25.0, 1500.0)));
    }

    #[test]
    fn invalid_motion_sample_ignored() {
        let mut d = detector();
        assert!(!d.observe(&MotionSample::new(f64::NAN, 0.0)));
        assert!(!d.observe(&MotionSample::new(-30.0, 0.0)));
        // A valid shake still fires afterwards
        assert!(d.observe(&MotionSample::new(30.0, 10.0)));
    }
}
