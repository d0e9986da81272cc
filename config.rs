use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DEADLINE_DATA_DIR";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DATABASE_FILE_NAME: &str = "appDatabase.sqlite";

const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub ingredient_model_path: PathBuf,
    pub food_model_path: PathBuf,
    pub input_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ingredient_model_path: PathBuf::from("ingredient_classifier.onnx"),
            food_model_path: PathBuf::from("food_classifier.onnx"),
            input_size: 224,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub api_url: String,
    /// Falls back to `GEMINI_API_KEY` when absent.
    pub api_key: Option<String>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
        }
    }
}

impl RecommendationConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{API_KEY_ENV} environment variable not set")))
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for RecommendationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPaths {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub models_dir: PathBuf,
}

impl AppPaths {
    /// Uses `DEADLINE_DATA_DIR` when set, otherwise the platform data directory.
    pub fn discover() -> Result<Self> {
        let root = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or_else(|| Error::Path("Failed to get app data dir".to_string()))?
                .join("deadline"),
        };
        Self::from_root(root)
    }

    pub fn from_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let models_dir = root.join("models");
        std::fs::create_dir_all(&models_dir)?;

        Ok(Self {
            db_path: root.join(DATABASE_FILE_NAME),
            models_dir,
            root,
        })
    }

    pub fn resolve_model(&self, name: &Path) -> PathBuf {
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.models_dir.join(name)
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
}

impl Settings {
    /// Reads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Like [`Settings::load`], but an unreadable or invalid file is logged
    /// and replaced by the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("Ignoring settings at {}: {err}", path.display());
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings.classifier.input_size, 224);
        assert_eq!(settings.recommendation.api_url, DEFAULT_API_URL);
        assert!(settings.recommendation.api_key.is_none());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"recommendation": {"api_key": "abc"}}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.recommendation.api_key.as_deref(), Some("abc"));
        assert_eq!(settings.recommendation.api_url, DEFAULT_API_URL);
        assert_eq!(
            settings.classifier.food_model_path,
            PathBuf::from("food_classifier.onnx")
        );
    }

    #[test]
    fn partial_classifier_section_keeps_model_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"classifier": {"input_size": 300}}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.classifier.input_size, 300);
        assert_eq!(
            settings.classifier.ingredient_model_path,
            PathBuf::from("ingredient_classifier.onnx")
        );
        assert_eq!(settings.recommendation.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
        assert_eq!(Settings::load_or_default(&path).classifier.input_size, 224);
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let config = RecommendationConfig {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "from-config");
        assert!(!format!("{config:?}").contains("from-config"));
    }

    #[test]
    fn paths_live_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path()).unwrap();
        assert_eq!(paths.db_path, dir.path().join(DATABASE_FILE_NAME));
        assert!(paths.models_dir.is_dir());
        assert_eq!(
            paths.resolve_model(Path::new("food_classifier.onnx")),
            paths.models_dir.join("food_classifier.onnx")
        );
    }
}
