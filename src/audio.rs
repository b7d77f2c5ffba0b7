//! Event-keyed sound effects
//!
//! The simulation raises [`GameEvent`]s; the session forwards each one to an
//! [`AudioSink`]. On wasm32 the sink plays short procedural Web Audio beeps,
//! natively it only logs.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoundEffect {
    /// Player fired
    Shoot,
    /// Elite hit but still alive
    EnemyHit,
    /// Enemy destroyed
    EnemyKilled,
    /// Player lost a life
    PlayerHit,
    /// Pickup collected
    PowerUp,
    /// A power-up ran out
    PowerUpExpired,
    /// Game paused
    Pause,
    /// Game resumed
    Resume,
    /// Game over
    GameOver,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Sound for an event
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Shoot => Some(SoundEffect::Shoot),
            GameEvent::EnemyHit { .. } => Some(SoundEffect::EnemyHit),
            GameEvent::EnemyKilled { .. } => Some(SoundEffect::EnemyKilled),
            GameEvent::PlayerHit { .. } => Some(SoundEffect::PlayerHit),
            GameEvent::PowerUpCollected(_) => Some(SoundEffect::PowerUp),
            GameEvent::PowerUpExpired(_) => Some(SoundEffect::PowerUpExpired),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::NewHighScore(_) => Some(SoundEffect::HighScore),
            GameEvent::Pause => Some(SoundEffect::Pause),
            GameEvent::Resume => Some(SoundEffect::Resume),
        }
    }

    /// Beep parameters: (frequency Hz, duration s, waveform, gain)
    pub fn beep(&self) -> (f32, f64, Waveform, f32) {
        match self {
            SoundEffect::Shoot => (720.0, 0.04, Waveform::Square, 0.045),
            SoundEffect::EnemyHit => (400.0, 0.04, Waveform::Square, 0.035),
            SoundEffect::EnemyKilled => (520.0, 0.06, Waveform::Triangle, 0.06),
            SoundEffect::PlayerHit => (180.0, 0.08, Waveform::Sawtooth, 0.08),
            SoundEffect::PowerUp => (980.0, 0.12, Waveform::Sawtooth, 0.06),
            SoundEffect::PowerUpExpired => (240.0, 0.12, Waveform::Triangle, 0.05),
            SoundEffect::Pause => (330.0, 0.1, Waveform::Sine, 0.05),
            SoundEffect::Resume => (660.0, 0.1, Waveform::Sine, 0.05),
            SoundEffect::GameOver => (200.0, 0.4, Waveform::Sine, 0.08),
            SoundEffect::HighScore => (1000.0, 0.2, Waveform::Triangle, 0.06),
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

/// Fire-and-forget receiver for game events
pub trait AudioSink {
    fn play(&mut self, event: &GameEvent);
}

/// Master/sfx volume with mute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    pub master: f32,
    pub sfx: f32,
    pub muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            master: 0.8,
            sfx: 1.0,
            muted: false,
        }
    }
}

impl Volume {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master: settings.master_volume.clamp(0.0, 1.0),
            sfx: settings.sfx_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Get effective volume
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master * self.sfx
        }
    }
}

/// Native sink: logs each sound at debug level and keeps a tally
#[derive(Debug, Default)]
pub struct LogAudio {
    pub volume: Volume,
    played: std::collections::BTreeMap<SoundEffect, u32>,
}

impl LogAudio {
    pub fn new(volume: Volume) -> Self {
        Self {
            volume,
            played: Default::default(),
        }
    }

    /// How many times `effect` was played
    pub fn count(&self, effect: SoundEffect) -> u32 {
        self.played.get(&effect).copied().unwrap_or(0)
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, event: &GameEvent) {
        let Some(effect) = SoundEffect::for_event(event) else {
            return;
        };
        let vol = self.volume.effective();
        if vol <= 0.0 {
            return;
        }
        let (freq, dur, wave, gain) = effect.beep();
        log::debug!(
            "sfx {:?}: {}Hz {:?} {:.2}s gain {:.3}",
            effect,
            freq,
            wave,
            dur,
            gain * vol
        );
        *self.played.entry(effect).or_insert(0) += 1;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect, Volume, Waveform};
    use crate::sim::GameEvent;

    /// Web Audio beeps
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        pub volume: Volume,
    }

    impl AudioManager {
        pub fn new(volume: Volume) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn beep(&self, effect: SoundEffect, vol: f32) {
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let (freq, dur, wave, gain_value) = effect.beep();
            let osc_type = match wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = Self::create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(gain_value * vol, t).ok();
            osc.start().ok();
            osc.stop_with_when(t + dur).ok();
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, event: &GameEvent) {
            let vol = self.volume.effective();
            if vol <= 0.0 {
                return;
            }
            if let Some(effect) = SoundEffect::for_event(event) {
                self.beep(effect, vol);
            }
        }
    }
}
