//! Game settings and preferences
//!
//! Persisted as JSON under their own key in the key-value store.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::persistence::KeyValueStore;
use crate::tuning::Tuning;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 1024,
        }
    }

    /// Particles per destroyed ship
    pub fn particles_per_explosion(&self) -> u32 {
        match self {
            QualityPreset::Low => 8,
            QualityPreset::Medium => 16,
            QualityPreset::High => 24,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (explosions, sparks)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Store key
    const STORAGE_KEY: &'static str = "glass_shooter_settings";

    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Push the cosmetic preferences into a tuning
    pub fn apply_to(&self, tuning: &mut Tuning) {
        tuning.max_particles = self.max_particles();
        tuning.particles_per_explosion = self.quality.particles_per_explosion();
    }

    /// Load settings from the store, defaulting on a missing or bad entry
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(StoreError::from)
            .and_then(|json| store.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
