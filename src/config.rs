use crate::settings::{BackdropMode, FieldSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Particle field tunables
    pub settings: FieldSettings,
    /// Backdrop shown at startup
    #[serde(default)]
    pub backdrop: BackdropMode,
    /// Palette set name; `None` picks the backdrop's own set
    #[serde(default)]
    pub palette_set: Option<String>,
    /// Random seed; `None` draws one from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        Ok(Self {
            settings: config.settings.clamped(),
            ..config
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: FieldSettings::default(),
            backdrop: BackdropMode::default(),
            palette_set: None,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig {
            version: 1,
            settings: FieldSettings {
                max_particles: 120,
                pointer_radius: 200.0,
                push_factor: 8.0,
                connection_threshold: 90.0,
                palette_step_secs: 12.0,
                ..Default::default()
            },
            backdrop: BackdropMode::Interactive,
            palette_set: Some("Morphing".to_string()),
            seed: Some(42),
        };

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_clamps_out_of_range_settings() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            r#"{"version": 1, "settings": {"push_factor": 400.0, "max_particles": 3}}"#,
        )
        .unwrap();

        let loaded = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.settings.push_factor, 20.0);
        assert_eq!(loaded.settings.max_particles, 10);
        assert_eq!(loaded.backdrop, BackdropMode::Professional);
        assert_eq!(loaded.seed, None);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(result.is_err());
    }
}
