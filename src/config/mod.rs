use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;

const CONFIG_FILE_NAME: &str = "agent.config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Theme {
    pub primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Identity and behavior of one persona app. The `id` is derived from the
/// directory name, never from the config file itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub theme: Theme,
}

fn default_icon() -> String {
    "BsRobot".to_string()
}

impl AppConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("'name' cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Built-in defaults for the two well-known app ids, used when the app's
/// directory carries no config file or the id has no directory at all.
fn builtin_default(id: &str) -> Option<AppConfig> {
    match id {
        "study-buddy" => Some(AppConfig {
            id: id.to_string(),
            name: "StudyBuddy".to_string(),
            description: "Your AI study companion".to_string(),
            icon: "FiBookOpen".to_string(),
            system_prompt: "You are a helpful study assistant.".to_string(),
            welcome_message: "Welcome to StudyBuddy! How can I help you learn today?".to_string(),
            features: vec![
                "Explanations".to_string(),
                "Examples".to_string(),
                "Practice".to_string(),
            ],
            theme: Theme { primary: "#3b82f6".to_string(), secondary: None, accent: None },
        }),
        "idea-forge" => Some(AppConfig {
            id: id.to_string(),
            name: "IdeaForge".to_string(),
            description: "Your creative brainstorming partner".to_string(),
            icon: "HiLightBulb".to_string(),
            system_prompt: "You are a creative brainstorming assistant.".to_string(),
            welcome_message: "Welcome to IdeaForge! Let's create something amazing!".to_string(),
            features: vec![
                "Brainstorming".to_string(),
                "Refinement".to_string(),
                "Innovation".to_string(),
            ],
            theme: Theme { primary: "#8b5cf6".to_string(), secondary: None, accent: None },
        }),
        _ => None,
    }
}

/// Generic default for a directory without a config file: the id echoed as
/// display name, no system prompt.
fn generic_default(id: &str) -> AppConfig {
    AppConfig {
        id: id.to_string(),
        name: id.to_string(),
        description: format!("AI assistant for {id}"),
        icon: default_icon(),
        system_prompt: String::new(),
        welcome_message: format!("Welcome to {id}!"),
        features: vec![],
        theme: Theme::default(),
    }
}

/// Registry of persona apps, populated once at process start by scanning the
/// apps directory. Immutable at request time.
#[derive(Debug)]
pub struct AppRegistry {
    apps: BTreeMap<String, AppConfig>,
    apps_dir: PathBuf,
}

impl AppRegistry {
    /// Scans `apps_dir` and loads one config per subdirectory. A directory
    /// without a config file gets a built-in or generic default; a
    /// present-but-malformed config file fails the scan so misconfiguration
    /// surfaces at startup instead of at request time.
    pub fn scan(apps_dir: &Path) -> Result<Self, AppError> {
        let mut apps = BTreeMap::new();

        let entries = match std::fs::read_dir(apps_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Apps directory '{}' is not readable ({e}); no apps configured", apps_dir.display());
                return Ok(Self { apps, apps_dir: apps_dir.to_path_buf() });
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| AppError::AppsDirUnreadable {
                path: apps_dir.display().to_string(),
                source: e,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            let config = Self::load_config(&entry.path(), &id)?;
            apps.insert(id, config);
        }

        info!("Loaded {} app config(s) from {}", apps.len(), apps_dir.display());
        Ok(Self { apps, apps_dir: apps_dir.to_path_buf() })
    }

    fn load_config(app_path: &Path, id: &str) -> Result<AppConfig, AppError> {
        let config_path = app_path.join(CONFIG_FILE_NAME);
        if !config_path.is_file() {
            warn!("Config file not found for app '{id}', using default");
            return Ok(builtin_default(id).unwrap_or_else(|| generic_default(id)));
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|e| AppError::InvalidAppConfig {
            app_id: id.to_string(),
            message: format!("failed to read {}: {e}", config_path.display()),
        })?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).map_err(|e| AppError::InvalidAppConfig {
                app_id: id.to_string(),
                message: e.to_string(),
            })?;
        config.id = id.to_string();
        config.validate().map_err(|message| AppError::InvalidAppConfig {
            app_id: id.to_string(),
            message,
        })?;
        Ok(config)
    }

    /// Builds a registry directly from configs. Ids are taken from the
    /// configs themselves; `apps_dir` is still needed by the CLI backend.
    pub fn from_configs(apps_dir: &Path, configs: impl IntoIterator<Item = AppConfig>) -> Self {
        let apps = configs.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self { apps, apps_dir: apps_dir.to_path_buf() }
    }

    /// All configured apps, in stable id order.
    pub fn all(&self) -> Vec<AppConfig> {
        self.apps.values().cloned().collect()
    }

    /// Resolves an id to its config, falling back to the built-in default for
    /// well-known ids that have no directory. Returns `None` for everything
    /// else.
    pub fn resolve(&self, id: &str) -> Option<AppConfig> {
        self.apps.get(id).cloned().or_else(|| builtin_default(id))
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// The per-app config directory handed to the CLI backend.
    pub fn config_dir(&self, id: &str) -> PathBuf {
        self.apps_dir.join(id)
    }
}
