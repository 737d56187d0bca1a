//! Gesture controller — the Idle/Sounding state machine.
//!
//! The controller is the only component that creates or destroys voice
//! sessions. Discrete trigger/release gestures move it between `Idle` and
//! `Sounding`; sensor samples are routed to the active session, shakes
//! through the debounced detector into the vibrato overlay. With no session
//! alive every sensor event is a no-op, which is the whole liveness story:
//! a late callback finds nothing to write to.

use log::debug;

use crate::config::{EngineConfig, VibratoConfig};

use super::mapper::ModulationMapper;
use super::sensor::{MotionSample, OrientationSample};
use super::session::VoiceSession;
use super::shake::ShakeDetector;
use super::{AudioBackend, BrightnessDisplay, NullDisplay, Voice};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Sounding,
}

pub struct GestureController<B: AudioBackend, D: BrightnessDisplay = NullDisplay> {
    backend: B,
    display: D,
    mapper: ModulationMapper,
    shake: ShakeDetector,
    vibrato_config: VibratoConfig,
    session: Option<VoiceSession<B::Voice>>,
    /// Stopped voice still rendering its release tail.
    draining: Option<B::Voice>,
}

impl<B: AudioBackend> GestureController<B> {
    pub fn new(backend: B, config: &EngineConfig) -> Self {
        Self::with_display(backend, config, NullDisplay)
    }
}

impl<B: AudioBackend, D: BrightnessDisplay> GestureController<B, D> {
    pub fn with_display(backend: B, config: &EngineConfig, display: D) -> Self {
        GestureController {
            backend,
            display,
            mapper: ModulationMapper::new(config.mapping),
            shake: ShakeDetector::new(&config.vibrato),
            vibrato_config: config.vibrato,
            session: None,
            draining: None,
        }
    }

    pub fn state(&self) -> State {
        if self.session.is_some() {
            State::Sounding
        } else {
            State::Idle
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// `Idle → Sounding`. While already `Sounding`, last trigger wins: the
    /// previous session is torn down before the new voice starts, so at most
    /// one session is ever alive. A note the backend cannot produce leaves
    /// the controller `Idle` — no sound, no error.
    pub fn trigger(&mut self, note: &str) {
        self.stop_session();
        match self.backend.start(note) {
            Some(voice) => self.session = Some(VoiceSession::new(voice)),
            None => debug!("trigger('{note}') produced no voice"),
        }
    }

    /// `Sounding → Idle`. Idempotent: releasing while `Idle` is a no-op.
    pub fn release(&mut self) {
        self.stop_session();
    }

    /// Route one orientation sample to the active session. No-op while
    /// `Idle`, so sensor callbacks outliving a release are harmless.
    pub fn orientation(&mut self, sample: OrientationSample) {
        if let Some(session) = self.session.as_mut() {
            session.apply_orientation(&self.mapper, &sample, &mut self.display);
        }
    }

    /// Route one motion sample: advances the vibrato clock, then asks the
    /// debounced detector whether this is a shake. An accepted shake starts
    /// the overlay — or restarts the window if one is already running, so
    /// there is never more than one overlay per session.
    pub fn motion(&mut self, sample: MotionSample) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.advance_clock(sample.timestamp_ms);
        if self.shake.observe(&sample) {
            session.start_vibrato(&self.vibrato_config, sample.timestamp_ms);
        }
    }

    /// Optional host heartbeat so the vibrato progresses and expires between
    /// sensor deliveries.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(session) = self.session.as_mut() {
            session.advance_clock(now_ms);
        }
    }

    /// Render the next `out.len()` mono samples: the active voice plus any
    /// draining release tail.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if let Some(session) = self.session.as_mut() {
            let voice = session.voice_mut();
            for slot in out.iter_mut() {
                *slot += voice.next_sample() as f32;
            }
        }
        if let Some(voice) = self.draining.as_mut() {
            for slot in out.iter_mut() {
                *slot += voice.next_sample() as f32;
            }
            if voice.is_finished() {
                self.draining = None;
            }
        }
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.draining = Some(session.teardown());
        }
    }
}
