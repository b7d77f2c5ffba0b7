//! Session state machine and frame clock
//!
//! A [`Session`] owns the [`GameState`] and decides when the simulation may
//! run. The driver calls [`Session::advance`] once per frame with a
//! monotonic timestamp; the session turns that into elapsed seconds, runs one
//! tick while `Running`, and forwards the tick's events to the audio sink and
//! the scoreboard.

use crate::audio::AudioSink;
use crate::consts::MAX_FRAME_MS;
use crate::highscores::HighScoreBridge;
use crate::sim::{GameEvent, GamePhase, GameState, InputIntent, Snapshot, tick};

/// Converts frame timestamps (ms) into clamped tick deltas (seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    last_tick_ms: Option<f64>,
    max_frame_ms: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_MS)
    }
}

impl FrameClock {
    pub fn new(max_frame_ms: f64) -> Self {
        Self {
            last_tick_ms: None,
            max_frame_ms: max_frame_ms.max(0.0),
        }
    }

    /// Seconds since the previous call, in `[0, max_frame_ms]`.
    /// The first call after construction or `rearm` returns zero.
    pub fn elapsed(&mut self, now_ms: f64) -> f32 {
        let dt_ms = match self.last_tick_ms {
            Some(last) if now_ms.is_finite() => (now_ms - last).clamp(0.0, self.max_frame_ms),
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_tick_ms = Some(now_ms);
        }
        (dt_ms / 1000.0) as f32
    }

    /// Forget the last timestamp so the next frame sees zero elapsed time
    pub fn rearm(&mut self) {
        self.last_tick_ms = None;
    }
}

/// One play session
pub struct Session {
    state: GameState,
    scores: Box<dyn HighScoreBridge>,
    audio: Box<dyn AudioSink>,
    clock: FrameClock,
}

impl Session {
    /// Start a session; the stored best score is read once here
    pub fn new(
        mut state: GameState,
        scores: Box<dyn HighScoreBridge>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        state.best_score = state.best_score.max(scores.high_score());
        log::info!(
            "Session started (seed {}, best {})",
            state.seed,
            state.best_score
        );
        Self {
            state,
            scores,
            audio,
            clock: FrameClock::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.state.snapshot()
    }

    pub fn scores(&self) -> &dyn HighScoreBridge {
        self.scores.as_ref()
    }

    /// Run one frame at time `now_ms`; does nothing unless running
    pub fn advance(&mut self, now_ms: f64, intent: &InputIntent) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        let dt = self.clock.elapsed(now_ms);
        tick(&mut self.state, intent, dt);
        self.dispatch_events();
    }

    /// Running → Paused; timers hold their values
    pub fn pause(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        self.state.phase = GamePhase::Paused;
        self.state.emit(GameEvent::Pause);
        log::info!("Paused at tick {}", self.state.time_ticks);
        self.dispatch_events();
    }

    /// Paused → Running; the first frame afterwards sees zero elapsed time
    pub fn resume(&mut self) {
        if self.state.phase != GamePhase::Paused {
            return;
        }
        self.state.phase = GamePhase::Running;
        self.clock.rearm();
        self.state.emit(GameEvent::Resume);
        log::info!("Resumed at tick {}", self.state.time_ticks);
        self.dispatch_events();
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::GameOver => {}
        }
    }

    /// Start a fresh run from any phase
    pub fn reset(&mut self) {
        self.state.reset();
        self.state.best_score = self.state.best_score.max(self.scores.high_score());
        self.state.events.clear();
        self.clock.rearm();
        log::info!("Session reset (best {})", self.state.best_score);
    }

    /// Queue a single shot for the next tick (still subject to cooldown)
    pub fn shoot(&mut self) {
        if self.state.phase == GamePhase::Running {
            self.state.fire_requested = true;
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::NewHighScore(score) => {
                    self.scores.set_high_score(score);
                }
                GameEvent::GameOver { score } => {
                    self.scores.record_run(score, self.state.level);
                }
                _ => {}
            }
            self.audio.play(&event);
        }
    }
}
