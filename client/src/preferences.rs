//! User settings persisted between sessions.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::movement::MovementMode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub default_movement_mode: MovementMode,
    pub run_enabled: bool,
    pub log_level: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            default_movement_mode: MovementMode::Walk,
            run_enabled: true,
            log_level: String::from("info"),
        }
    }
}

/// Reads the settings file, falling back to the defaults when it is
/// missing or unreadable.
pub fn load_settings(path: &Path) -> UserSettings {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("settings file {} is invalid, using defaults: {e}", path.display());
                UserSettings::default()
            }
        },
        Err(e) => {
            warn!("could not read settings from {}, using defaults: {e}", path.display());
            UserSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &UserSettings) -> io::Result<()> {
    let contents = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_survive_a_serde_round_trip() {
        let settings = UserSettings {
            default_movement_mode: MovementMode::Run,
            run_enabled: false,
            log_level: String::from("debug"),
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let back: UserSettings = serde_json::from_str("{\"run_enabled\": false}").unwrap();
        assert!(!back.run_enabled);
        assert_eq!(back.default_movement_mode, MovementMode::Walk);
        assert_eq!(back.log_level, "info");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = load_settings(Path::new("/definitely/not/here.json"));
        assert_eq!(settings, UserSettings::default());
    }
}
