/// Application configuration
///
/// A small JSON file in the platform config directory holding the Gemini
/// API key. The `GEMINI_API_KEY` environment variable takes precedence, so
/// the file is optional.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key; overridden by the GEMINI_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Path of the config file:
    /// - Linux: ~/.config/poster-fusion/config.json
    /// - macOS: ~/Library/Application Support/poster-fusion/config.json
    /// - Windows: %APPDATA%\poster-fusion\config.json
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user config directory");

        path.push("poster-fusion");
        path.push("config.json");
        path
    }

    /// Load the config file, falling back to defaults when it is missing.
    /// A file that exists but fails to parse is reported and ignored.
    pub fn load() -> AppConfig {
        let path = Self::config_path();
        let Ok(json) = std::fs::read_to_string(&path) else {
            return AppConfig::default();
        };

        match serde_json::from_str(&json) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("⚠️  Ignoring unreadable config {}: {}", path.display(), err);
                AppConfig::default()
            }
        }
    }

    /// The API key to use: environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_api_key_round_trip() {
        let config = AppConfig {
            api_key: Some("secret".to_owned()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.api_key.as_deref(), Some("secret"));
    }
}
