//! High score bridge and leaderboard
//!
//! The session reads the best score once at start and writes it whenever a run
//! beats it. [`Scoreboard`] keeps that value, the top-10 leaderboard, the visit
//! counter and the player's star rating in a [`KeyValueStore`].

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

const BEST_KEY: &str = "glass_shooter_best";
const VISITS_KEY: &str = "glass_shooter_visits";
const RATING_KEY: &str = "glass_shooter_rating";
const LEADERBOARD_KEY: &str = "glass_shooter_highscores";

/// The narrow interface the session needs from persistent storage
pub trait HighScoreBridge {
    fn high_score(&self) -> u64;
    fn set_high_score(&mut self, score: u64);

    /// Record a finished run; returns its leaderboard rank if it placed
    fn record_run(&mut self, _score: u64, _level: u32) -> Option<usize> {
        None
    }

    /// Saved leaderboard, for bridges that keep one
    fn leaderboard(&self) -> Option<&HighScores> {
        None
    }
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score,
                level,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// One display line per entry, ages relative to `now` (Unix ms)
    pub fn lines(&self, now: f64) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{:>2}. {:>6} pts  level {:<3} {}",
                    i + 1,
                    e.score,
                    e.level,
                    format_age(now, e.timestamp)
                )
            })
            .collect()
    }
}

/// Store-backed scoreboard.
///
/// Reads are cached, so a failing store never changes what the game sees;
/// write failures are logged and dropped.
pub struct Scoreboard<S: KeyValueStore> {
    store: S,
    best: u64,
    leaderboard: HighScores,
}

impl<S: KeyValueStore> Scoreboard<S> {
    pub fn new(store: S) -> Self {
        let best = read_parsed::<u64>(&store, BEST_KEY).unwrap_or(0);
        let leaderboard = match store.get(LEADERBOARD_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable leaderboard: {}", e);
                HighScores::new()
            }),
            Ok(None) => HighScores::new(),
            Err(e) => {
                log::warn!("Failed to read leaderboard: {}", e);
                HighScores::new()
            }
        };
        log::info!(
            "Scoreboard loaded: best {} ({} leaderboard entries)",
            best,
            leaderboard.entries.len()
        );
        Self {
            store,
            best,
            leaderboard,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bump and return the visit counter
    pub fn record_visit(&mut self) -> u64 {
        let count = read_parsed::<u64>(&self.store, VISITS_KEY).unwrap_or(0) + 1;
        self.write(VISITS_KEY, &count.to_string());
        count
    }

    /// Saved star rating (1..=5), if any
    pub fn rating(&self) -> Option<u8> {
        read_parsed::<u8>(&self.store, RATING_KEY).filter(|r| (1..=5).contains(r))
    }

    /// Save a star rating; values outside 1..=5 are ignored
    pub fn set_rating(&mut self, stars: u8) -> bool {
        if !(1..=5).contains(&stars) {
            log::warn!("Ignoring rating {}", stars);
            return false;
        }
        self.write(RATING_KEY, &stars.to_string());
        true
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("Failed to write {}: {}", key, e);
        }
    }
}

impl<S: KeyValueStore> HighScoreBridge for Scoreboard<S> {
    fn high_score(&self) -> u64 {
        self.best
    }

    fn set_high_score(&mut self, score: u64) {
        if score <= self.best {
            return;
        }
        self.best = score;
        self.write(BEST_KEY, &score.to_string());
    }

    fn record_run(&mut self, score: u64, level: u32) -> Option<usize> {
        let rank = self.leaderboard.add_score(score, level, now_ms())?;
        match serde_json::to_string(&self.leaderboard) {
            Ok(json) => self.write(LEADERBOARD_KEY, &json),
            Err(e) => log::warn!("Failed to encode leaderboard: {}", e),
        }
        log::info!("Run placed #{} on the leaderboard ({} pts)", rank, score);
        Some(rank)
    }

    fn leaderboard(&self) -> Option<&HighScores> {
        Some(&self.leaderboard)
    }
}

fn read_parsed<T: std::str::FromStr>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(value) => value.and_then(|v| v.trim().parse().ok()),
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

/// Current wall-clock time in Unix milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_age(now: f64, timestamp: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
