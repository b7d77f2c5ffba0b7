//! Glass Shooter - headless runner
//!
//! Plays a seeded session with the autopilot at a fixed frame rate and prints a
//! summary. Useful for balance checks and reproducing runs.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;

    use glass_shooter::audio::{LogAudio, Volume};
    use glass_shooter::highscores::now_ms;
    use glass_shooter::autopilot::Autopilot;
    use glass_shooter::persistence::{JsonFileStore, KeyValueStore, MemoryStore};
    use glass_shooter::sim::{GamePhase, GameState};
    use glass_shooter::{HighScoreBridge, QualityPreset, Scoreboard, Session, Settings, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "glass-shooter")]
    #[command(about = "Run a headless Glass Shooter session driven by the autopilot")]
    struct Cli {
        /// RNG seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of frames to simulate
        #[arg(long, default_value_t = 3600)]
        frames: u32,
        /// Milliseconds between frames
        #[arg(long, default_value_t = 1000.0 / 60.0)]
        frame_ms: f64,
        /// JSON file overriding any tuning values
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// JSON key-value file for high scores and settings (in-memory if omitted)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Quality preset (low, medium, high); saved to the store
        #[arg(long)]
        quality: Option<String>,
        /// Print the final snapshot as JSON
        #[arg(long)]
        dump: bool,
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let mut store: Box<dyn KeyValueStore> = match &cli.store {
            Some(path) => Box::new(
                JsonFileStore::open(path)
                    .with_context(|| format!("opening store {}", path.display()))?,
            ),
            None => Box::new(MemoryStore::new()),
        };

        let mut settings = Settings::load(&*store);
        if let Some(name) = &cli.quality {
            let preset = QualityPreset::parse(name)
                .with_context(|| format!("unknown quality preset '{}'", name))?;
            settings.quality = preset;
            settings.save(&mut *store);
        }

        let mut tuning = match &cli.tuning {
            Some(path) => Tuning::load(path)
                .with_context(|| format!("loading tuning {}", path.display()))?,
            None => Tuning::default(),
        };
        settings.apply_to(&mut tuning);

        let seed = cli.seed.unwrap_or_else(rand::random);
        let mut scoreboard = Scoreboard::new(store);
        let visits = scoreboard.record_visit();
        log::info!(
            "Visit #{} ({} quality)",
            visits,
            settings.quality.as_str()
        );

        let audio = LogAudio::new(Volume::from_settings(&settings));
        let mut session = Session::new(
            GameState::with_tuning(seed, tuning),
            Box::new(scoreboard),
            Box::new(audio),
        );

        let pilot = Autopilot::new();
        let mut frames_run = 0;
        for frame in 0..cli.frames {
            if session.phase() == GamePhase::GameOver {
                break;
            }
            let input = pilot.intent(&session.snapshot());
            session.advance(frame as f64 * cli.frame_ms, &input);
            frames_run += 1;
        }

        let state = session.state();
        println!("seed:       {}", seed);
        println!("frames:     {}", frames_run);
        println!("ticks:      {}", state.time_ticks);
        println!("score:      {}", state.score);
        println!("level:      {}", state.level);
        println!("lives:      {}", state.lives());
        println!("best:       {}", session.scores().high_score());
        println!(
            "game over:  {}",
            if state.phase == GamePhase::GameOver { "yes" } else { "no" }
        );

        if let Some(board) = session.scores().leaderboard().filter(|b| !b.is_empty()) {
            println!("leaderboard:");
            for line in board.lines(now_ms()) {
                println!("  {}", line);
            }
        }

        if cli.dump {
            let json = serde_json::to_string_pretty(&session.snapshot())
                .context("serializing snapshot")?;
            println!("{}", json);
        }

        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Glass Shooter (headless) starting...");
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser builds drive `Session` from the host page
}
