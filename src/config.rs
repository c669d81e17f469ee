use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// One entry of the `/change` model menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelChoice {
    /// Model identifier sent to the completion service.
    pub name: String,
    /// Whether tool schemas are offered when this model is selected.
    #[serde(default)]
    pub tools: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    models: Option<Vec<ModelChoice>>,
}

/// The menu shipped when no config file overrides it.
pub fn builtin_models() -> Vec<ModelChoice> {
    [
        ("gpt-4o-mini", true),
        ("gpt-4o", true),
        ("o1-mini", false),
        ("o1-preview", false),
    ]
    .into_iter()
    .map(|(name, tools)| ModelChoice {
        name: name.to_string(),
        tools,
    })
    .collect()
}

/// Loads the model menu: built-ins when no config file exists, the
/// file's `[[models]]` entries otherwise. A malformed file is an error.
pub fn load_models() -> Result<Vec<ModelChoice>, String> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(builtin_models());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;
    parse_models(&raw, &path)
}

fn parse_models(raw: &str, path: &Path) -> Result<Vec<ModelChoice>, String> {
    let config: ConfigFile = toml::from_str(raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    match config.models {
        None => Ok(builtin_models()),
        Some(models) if models.is_empty() => Err(format!(
            "Config file '{}' must list at least one [[models]] entry.",
            path.display()
        )),
        Some(models) => Ok(models),
    }
}

fn config_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var("PARLEY_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join("parley").join("config.toml"));
        }
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve config path: set PARLEY_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("parley")
        .join("config.toml"))
}
