//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treestore/treestore.toml`
//! 3. Local config: `<dir>/.treestore.toml` (usually the working directory)
//! 4. Environment variables: `TREESTORE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{RemoveRedo, StoreOptions};

/// How query results are printed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub history_limit: Option<usize>,
    pub remove_redo: Option<RemoveRedo>,
}

/// Unified configuration for treestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Nodes file used when `--file` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Output format for query results
    pub format: OutputFormat,
    /// Maximum undo depth (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
    /// Whether redo re-runs a removal
    pub remove_redo: RemoveRedo,
}

/// Get the XDG config directory for treestore.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treestore").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treestore.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".treestore.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_remove_redo(value: &str) -> Result<RemoveRedo, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "replay" => Ok(RemoveRedo::Replay),
        "skip" => Ok(RemoveRedo::Skip),
        other => Err(ApplicationError::Config {
            message: format!("remove_redo must be 'replay' or 'skip', got '{other}'"),
        }),
    }
}

fn parse_format(value: &str) -> Result<OutputFormat, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "plain" => Ok(OutputFormat::Plain),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApplicationError::Config {
            message: format!("format must be 'plain' or 'json', got '{other}'"),
        }),
    }
}

impl Settings {
    /// Store options derived from these settings.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            remove_redo: self.remove_redo,
            history_limit: self.history_limit,
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in `data_file`.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.data_file {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.data_file = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins for every field it specifies.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay.data_file.clone().or_else(|| self.data_file.clone()),
            format: overlay.format.unwrap_or(self.format),
            history_limit: overlay.history_limit.or(self.history_limit),
            remove_redo: overlay.remove_redo.unwrap_or(self.remove_redo),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.treestore.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply `TREESTORE_<KEY>` environment variables (e.g. `TREESTORE_FORMAT`) as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREESTORE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("format") {
            settings.format = parse_format(&val)?;
        }
        if let Ok(val) = config.get_string("history_limit") {
            let limit = val.trim().parse::<usize>().map_err(|e| ApplicationError::Config {
                message: format!("history_limit '{val}': {e}"),
            })?;
            settings.history_limit = Some(limit);
        }
        if let Ok(val) = config.get_string("remove_redo") {
            settings.remove_redo = parse_remove_redo(&val)?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treestore configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/treestore/treestore.toml
#   Local:  ./.treestore.toml
#   Env:    TREESTORE_* environment variables (e.g. TREESTORE_FORMAT=json)

# Nodes file used when --file is not given
# data_file = "~/nodes.json"

# Output format for query results: "plain" or "json"
# format = "plain"

# Maximum number of undo steps kept (unbounded when unset)
# history_limit = 100

# Redo of a removal: "replay" removes the subtree again, "skip" leaves nodes in place
# remove_redo = "replay"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_creating_store_options_then_replay_and_unbounded() {
        let options = Settings::default().store_options();
        assert_eq!(options.remove_redo, RemoveRedo::Replay);
        assert_eq!(options.history_limit, None);
    }

    #[test]
    fn given_overlay_when_merging_then_specified_fields_win() {
        let base = Settings {
            data_file: Some(PathBuf::from("base.json")),
            format: OutputFormat::Plain,
            history_limit: Some(10),
            remove_redo: RemoveRedo::Replay,
        };
        let overlay = RawSettings {
            data_file: None,
            format: Some(OutputFormat::Json),
            history_limit: None,
            remove_redo: Some(RemoveRedo::Skip),
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.data_file, Some(PathBuf::from("base.json")));
        assert_eq!(result.format, OutputFormat::Json);
        assert_eq!(result.history_limit, Some(10));
        assert_eq!(result.remove_redo, RemoveRedo::Skip);
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: Some(PathBuf::from("~/nodes.json")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.data_file.unwrap();
        assert!(path.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_unknown_remove_redo_when_parsing_then_config_error() {
        assert!(matches!(
            parse_remove_redo("sometimes"),
            Err(ApplicationError::Config { .. })
        ));
        assert_eq!(parse_remove_redo(" Skip ").unwrap(), RemoveRedo::Skip);
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings {
            history_limit: Some(5),
            remove_redo: RemoveRedo::Skip,
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        assert!(text.contains("history_limit = 5"));
        assert!(text.contains("remove_redo = \"skip\""));
        assert!(!text.contains("data_file"));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_file.is_none());
    }
}
