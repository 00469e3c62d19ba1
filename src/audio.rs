//! Audio system
//!
//! Procedurally generated sound effects - no external files needed! Each
//! effect is a short list of oscillator [`Tone`]s handed to an
//! [`AudioBackend`]. Audio is fire-and-forget: a missing or failing backend
//! degrades to silence and never reaches the simulation.

use crate::error::AudioError;
use crate::sim::{GameEvent, SessionPhase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player leaves the ground
    Jump,
    /// Score milestone crossed
    Milestone,
    /// Currency picked up
    Coin,
    /// Extra life earned or health restored
    ExtraLife,
    /// Harmful contact
    Hurt,
    /// Power-up collected
    PowerUp,
    /// Level target reached
    LevelClear,
    /// Run over
    GameOver,
    /// Final level cleared
    Victory,
    /// New best value
    HighScore,
}

impl SoundEffect {
    /// Effect triggered by a simulation event, if any
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::Milestone(_) => Some(SoundEffect::Milestone),
            GameEvent::Collected { .. } | GameEvent::Shielded { .. } => Some(SoundEffect::Coin),
            GameEvent::Healed | GameEvent::ExtraLife => Some(SoundEffect::ExtraLife),
            GameEvent::Hurt { .. } => Some(SoundEffect::Hurt),
            GameEvent::PowerUp(_) | GameEvent::Cleared { .. } => Some(SoundEffect::PowerUp),
            GameEvent::LevelCleared { .. } => Some(SoundEffect::LevelClear),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::Victory { .. } => Some(SoundEffect::Victory),
            GameEvent::NewBest(_) => Some(SoundEffect::HighScore),
            GameEvent::PhaseChanged { .. }
            | GameEvent::ComboUp { .. }
            | GameEvent::NightToggled { .. }
            | GameEvent::LevelStarted { .. } => None,
        }
    }

    /// Oscillator recipe for this effect at full volume
    pub fn tones(self) -> Vec<Tone> {
        match self {
            // Rising chirp
            SoundEffect::Jump => vec![Tone::sweep(Waveform::Square, 200.0, 600.0, 0.1, 0.15)],
            // Two quick high notes: C5 E5
            SoundEffect::Milestone => arpeggio(&[523.0, 659.0], 0.1, 0.08, 0.12),
            // Bright blip
            SoundEffect::Coin => vec![Tone::sweep(Waveform::Sine, 880.0, 1320.0, 0.07, 0.07)],
            // Four-note rise: C5 E5 G5 C6
            SoundEffect::ExtraLife => arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.11, 0.1, 0.1),
            SoundEffect::Hurt => vec![Tone::sweep(Waveform::Sawtooth, 300.0, 90.0, 0.18, 0.18)],
            SoundEffect::PowerUp => arpeggio(&[659.0, 784.0, 988.0], 0.06, 0.08, 0.1),
            SoundEffect::LevelClear => arpeggio(&[523.0, 659.0, 784.0], 0.12, 0.12, 0.12),
            // Falling growl
            SoundEffect::GameOver => vec![Tone::sweep(Waveform::Square, 200.0, 50.0, 0.3, 0.2)],
            SoundEffect::Victory => {
                arpeggio(&[523.0, 659.0, 784.0, 1047.0, 1319.0], 0.12, 0.14, 0.12)
            }
            SoundEffect::HighScore => arpeggio(&[784.0, 1047.0], 0.1, 0.12, 0.1),
        }
    }
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator note with an exponential frequency and gain ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    /// Seconds after the effect starts
    pub delay: f32,
    /// Seconds
    pub duration: f32,
    /// Peak gain (decays to near silence over the duration)
    pub gain: f32,
}

impl Tone {
    pub fn sweep(waveform: Waveform, start_hz: f32, end_hz: f32, duration: f32, gain: f32) -> Self {
        Self {
            waveform,
            start_hz,
            end_hz,
            delay: 0.0,
            duration,
            gain,
        }
    }
}

/// Square-wave notes played one after another
fn arpeggio(notes: &[f32], step: f32, duration: f32, gain: f32) -> Vec<Tone> {
    notes
        .iter()
        .enumerate()
        .map(|(i, &hz)| Tone {
            waveform: Waveform::Square,
            start_hz: hz,
            end_hz: hz,
            delay: i as f32 * step,
            duration,
            gain,
        })
        .collect()
}

/// Something that can make noise (Web Audio, a native mixer, a test log)
pub trait AudioBackend {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError>;

    /// Resume a suspended output (browsers require a user gesture)
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Backend that records every tone; used headless and in tests
#[derive(Debug, Default)]
pub struct ToneLog {
    pub tones: Vec<Tone>,
}

impl AudioBackend for ToneLog {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        self.tones.push(*tone);
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend: Some(backend),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// No output device: every call is a no-op
    pub fn silent() -> Self {
        Self {
            backend: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Resume audio output (required after user gesture)
    pub fn resume(&mut self) {
        if let Some(backend) = &mut self.backend
            && let Err(e) = backend.resume()
        {
            log::warn!("Audio resume failed: {e}");
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Flip mute, returning whether sound is now enabled
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        !self.muted
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect. A backend error disables audio for the rest of
    /// the session.
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = &mut self.backend else {
            return;
        };

        for mut tone in effect.tones() {
            tone.gain *= vol;
            if let Err(e) = backend.play_tone(&tone) {
                log::warn!("Audio backend failed ({e}) - audio disabled");
                self.backend = None;
                return;
            }
        }
    }

    /// Play whatever a batch of simulation events calls for
    pub fn play_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::PhaseChanged {
                to: SessionPhase::Active,
                ..
            } = event
            {
                self.resume();
            }
            if let Some(effect) = SoundEffect::from_event(event) {
                self.play(effect);
            }
        }
    }
}
