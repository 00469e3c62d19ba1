//! Game settings and preferences
//!
//! Persisted as a JSON file next to the game, separate from best values.
//! Unknown or missing fields fall back to their defaults so old files keep
//! loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::AudioManager;
use crate::error::ConfigError;
use crate::sim::{GameKind, Ruleset};

/// Which game the host runs
pub type GameChoice = GameKind;

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
            QualityPreset::Low => 32,
            QualityPreset::Medium => 128,
            QualityPreset::High => 256,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Which game to run
    pub game: GameChoice,
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (score text, fireworks)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Debug ===
    /// Outline hitboxes
    pub show_hitboxes: bool,

    // === Accessibility ===
    /// Reduced motion (no score flashing)
    pub reduced_motion: bool,

    /// Fixed RNG seed; None picks one per run
    pub seed: Option<u64>,
    /// JSON ruleset replacing the built-in tables
    pub ruleset_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game: GameKind::Runner,
            quality: QualityPreset::Medium,
            particles: true,

            // Audio
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            show_hitboxes: false,
            reduced_motion: false,

            seed: None,
            ruleset_path: None,
        }
    }
}

impl Settings {
    /// Default file name for native hosts
    pub const FILE_NAME: &'static str = "arcade_settings.json";

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, using defaults when the file is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective milestone flashing (respects reduced_motion)
    pub fn effective_score_flash(&self) -> bool {
        !self.reduced_motion
    }

    /// Push volume and mute preferences into the audio manager
    pub fn apply_audio(&self, audio: &mut AudioManager) {
        audio.set_master_volume(self.master_volume);
        audio.set_sfx_volume(self.sfx_volume);
        audio.set_muted(self.muted);
    }

    /// Ruleset for the chosen game.
    ///
    /// An override file that is unreadable, invalid, or for the other game
    /// is ignored in favour of the canonical tables.
    pub fn ruleset(&self) -> Ruleset {
        let Some(path) = &self.ruleset_path else {
            return Ruleset::for_game(self.game);
        };
        let loaded = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|json| Ruleset::from_json(&json));
        match loaded {
            Ok(rules) if rules.kind() == self.game => {
                log::info!("Loaded ruleset override from {}", path.display());
                rules
            }
            Ok(rules) => {
                log::warn!(
                    "Ruleset {} is for {:?}, not {:?}; using built-in tables",
                    path.display(),
                    rules.kind(),
                    self.game
                );
                Ruleset::for_game(self.game)
            }
            Err(e) => {
                log::warn!("Ruleset {} rejected: {e}; using built-in tables", path.display());
                Ruleset::for_game(self.game)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arcade_settings_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "game": "Quest", "muted": true }"#).unwrap();
        assert_eq!(settings.game, GameKind::Quest);
        assert!(settings.muted);
        assert_eq!(settings.master_volume, 0.8);
        assert_eq!(settings.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_particle_cap() {
        let mut settings = Settings::default();
        assert_eq!(settings.max_particles(), 128);
        settings.quality = QualityPreset::parse("HIGH").unwrap();
        assert_eq!(settings.max_particles(), 256);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load_or_default(&temp_path("missing"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save");
        let settings = Settings {
            seed: Some(99),
            reduced_motion: true,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load_or_default(&path), settings);
        assert!(!settings.effective_score_flash());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_ruleset_falls_back() {
        // Unreadable override
        let settings = Settings {
            game: GameKind::Quest,
            ruleset_path: Some(temp_path("no_such_ruleset")),
            ..Settings::default()
        };
        assert_eq!(settings.ruleset().kind(), GameKind::Quest);

        // Override for the other game
        let path = temp_path("runner_rules");
        fs::write(&path, serde_json::to_string(&Ruleset::runner()).unwrap()).unwrap();
        let settings = Settings {
            game: GameKind::Quest,
            ruleset_path: Some(path.clone()),
            ..Settings::default()
        };
        assert_eq!(settings.ruleset().kind(), GameKind::Quest);

        // Matching override is used
        let settings = Settings {
            game: GameKind::Runner,
            ruleset_path: Some(path.clone()),
            ..Settings::default()
        };
        assert_eq!(settings.ruleset().kind(), GameKind::Runner);
        let _ = fs::remove_file(&path);
    }
}
