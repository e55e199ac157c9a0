use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Gemini,
}

impl AiProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
        }
    }
}

/// Credentials and model choice for the optional text-generation calls.
///
/// Loaded once at start-up and handed to the narrative service; nothing in the
/// metrics path reads it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiApiConfig {
    pub api_key: Option<String>,
    pub provider: AiProvider,
    pub model: String,
}

impl Default for AiApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: AiProvider::default(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AiApiConfig {
    /// The key with surrounding whitespace removed, if one is set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }
}

impl fmt::Debug for AiApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiApiConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish()
    }
}

/// JSON file persisting [`AiApiConfig`] between runs.
#[derive(Debug, Clone)]
pub struct AiSettingsStore {
    path: PathBuf,
}

impl AiSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored settings. A missing or unreadable file yields defaults.
    pub fn load(&self) -> AiApiConfig {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return AiApiConfig::default()
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ai settings unreadable, using defaults");
                return AiApiConfig::default();
            }
        };

        match serde_json::from_str::<AiApiConfig>(&raw) {
            Ok(config) if config.model.trim().is_empty() => AiApiConfig {
                model: DEFAULT_MODEL.to_string(),
                ..config
            },
            Ok(config) => config,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ai settings corrupt, using defaults");
                AiApiConfig::default()
            }
        }
    }

    pub fn save(&self, config: &AiApiConfig) -> Result<(), ConfigError> {
        let settings_error = |source: std::io::Error| ConfigError::Settings {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| settings_error(err.into()))?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(settings_error)?;
        }
        std::fs::write(&self.path, json).map_err(settings_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings(name: &str) -> AiSettingsStore {
        let dir = std::env::temp_dir().join(format!("hr-review-ai-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        AiSettingsStore::new(dir.join("settings.json"))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = temp_settings("missing");
        let config = store.load();
        assert_eq!(config, AiApiConfig::default());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(!config.has_api_key());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let store = temp_settings("roundtrip");
        let config = AiApiConfig {
            api_key: Some("secret-key".to_string()),
            provider: AiProvider::Gemini,
            model: "gemini-pro".to_string(),
        };
        store.save(&config).expect("settings saved");
        assert_eq!(store.load(), config);
    }

    #[test]
    fn corrupt_or_partial_files_fall_back_to_defaults() {
        let store = temp_settings("corrupt");
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("dir");

        std::fs::write(store.path(), "{not json").expect("write");
        assert_eq!(store.load(), AiApiConfig::default());

        std::fs::write(store.path(), r#"{"api_key":"k","model":""}"#).expect("write");
        let partial = store.load();
        assert_eq!(partial.api_key(), Some("k"));
        assert_eq!(partial.model, DEFAULT_MODEL);
    }

    #[test]
    fn blank_key_counts_as_missing_and_debug_redacts() {
        let config = AiApiConfig {
            api_key: Some("   ".to_string()),
            ..AiApiConfig::default()
        };
        assert!(!config.has_api_key());

        let keyed = AiApiConfig {
            api_key: Some("abc123".to_string()),
            ..AiApiConfig::default()
        };
        assert!(!format!("{keyed:?}").contains("abc123"));
        assert_eq!(AiProvider::parse(" Google "), Some(AiProvider::Gemini));
        assert_eq!(AiProvider::parse("openai"), None);
    }
}
