//! Voice session — the one live voice plus its modulation state.
//!
//! A session owns the sounding voice, the calibration baseline, the last
//! unmodulated primary value, and the vibrato overlay. Only the gesture
//! controller creates or destroys sessions; everything session-scoped dies
//! with it, which is what makes late sensor callbacks inert.

use log::debug;

use crate::config::VibratoConfig;

use super::baseline::Baseline;
use super::mapper::ModulationMapper;
use super::sensor::OrientationSample;
use super::vibrato::VibratoOverlay;
use super::{BrightnessDisplay, Voice};

pub struct VoiceSession<V: Voice> {
    voice: V,
    baseline: Baseline,
    /// Primary value at trigger time (rate 1.0 = the note as triggered).
    base_primary: f64,
    /// Most recent mapped primary value, without the vibrato offset. This is
    /// what the voice returns to when an overlay expires.
    last_primary: f64,
    vibrato: Option<VibratoOverlay>,
}

impl<V: Voice> VoiceSession<V> {
    pub fn new(voice: V) -> Self {
        VoiceSession {
            voice,
            baseline: Baseline::armed(),
            base_primary: 1.0,
            last_primary: 1.0,
            vibrato: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_calibrated()
    }

    pub fn vibrato_active(&self, now_ms: f64) -> bool {
        self.vibrato.is_some_and(|v| !v.is_expired(now_ms))
    }

    /// Begin (or restart) the vibrato window at `now_ms`.
    pub fn start_vibrato(&mut self, config: &VibratoConfig, now_ms: f64) {
        self.vibrato = Some(VibratoOverlay::start(config, now_ms));
    }

    pub fn voice_mut(&mut self) -> &mut V {
        &mut self.voice
    }

    /// Apply one orientation sample: calibrate if armed, then map deltas
    /// into parameter writes. Invalid samples are dropped before they can
    /// reach an audio parameter; samples arriving before calibration
    /// produce no writes.
    pub fn apply_orientation(
        &mut self,
        mapper: &ModulationMapper,
        sample: &OrientationSample,
        display: &mut impl BrightnessDisplay,
    ) {
        if !sample.is_valid() {
            debug!("dropped invalid orientation sample: {sample:?}");
            return;
        }

        self.baseline.capture(sample);
        let Some(reference) = self.baseline.reference() else {
            return;
        };

        let deltas = mapper.deltas(reference, sample);
        self.last_primary = mapper.primary_rate(self.base_primary, &deltas);
        let offset = self.vibrato_offset(sample.timestamp_ms);
        self.voice.set_primary(self.last_primary + offset);
        self.voice.set_secondary(mapper.tone_cutoff_hz(&deltas));
        display.publish_brightness(mapper.brightness(&deltas));
    }

    /// Advance the vibrato clock to `now_ms`: apply the periodic offset
    /// while a window is active and restore the unmodulated primary the
    /// moment it expires.
    pub fn advance_clock(&mut self, now_ms: f64) {
        if self.vibrato.is_none() {
            return;
        }
        let offset = self.vibrato_offset(now_ms);
        self.voice.set_primary(self.last_primary + offset);
    }

    /// Expire a due overlay and return the current rate offset.
    fn vibrato_offset(&mut self, now_ms: f64) -> f64 {
        match self.vibrato {
            Some(overlay) if overlay.is_expired(now_ms) => {
                self.vibrato = None;
                0.0
            }
            Some(overlay) => overlay.offset(now_ms),
            None => 0.0,
        }
    }

    /// Stop the voice and dissolve the session. The returned voice only has
    /// its release tail left; all modulation state is gone.
    pub fn teardown(mut self) -> V {
        self.voice.stop();
        self.voice
    }
}
