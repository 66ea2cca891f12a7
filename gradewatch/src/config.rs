use config::{Config, ConfigError, File};
use extractors::TableScoring;
use history::HistoryOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[storage]
# Directory holding one history file per student
# dir = "/path/to/gradewatch/data"

[history]
max_snapshots = 50
max_changes = 100
# "previous": compare with the snapshot before the newest one
# "latest": compare with the newest snapshot
reference = "previous"
# "surface": fail on a malformed history file
# "discard": log a warning and start over
on_corrupt = "surface"

[extraction]
# Minimum header score for a table to be taken as the grade roster
acceptance_threshold = 3
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct GradewatchConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub history: HistoryOptions,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub acceptance_threshold: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: TableScoring::default().acceptance_threshold,
        }
    }
}

impl GradewatchConfig {
    /// Load from `path`, or from the default location when `None`. The file
    /// is created with commented defaults if it does not exist.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::Message(format!("Failed to create config directory: {e}"))
                })?;
            }
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: GradewatchConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    /// Directory for history files; falls back to the platform data dir
    pub fn storage_dir(&self) -> PathBuf {
        self.storage.dir.clone().unwrap_or_else(default_storage_dir)
    }

    pub fn table_scoring(&self) -> TableScoring {
        TableScoring::with_threshold(self.extraction.acceptance_threshold)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("gradewatch").join("gradewatch.toml")
    } else {
        PathBuf::from("gradewatch.toml")
    }
}

pub fn default_storage_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join("gradewatch")
    } else {
        PathBuf::from("gradewatch-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use history::{CorruptFilePolicy, ReferenceSnapshot};

    #[test]
    fn test_default_file_created_and_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gradewatch.toml");

        let (config, loaded_from) = GradewatchConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded_from, path);
        assert!(path.exists());
        assert_eq!(config, GradewatchConfig::default());
        assert_eq!(config.storage_dir(), default_storage_dir());
    }

    #[test]
    fn test_custom_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradewatch.toml");
        std::fs::write(
            &path,
            r#"
[storage]
dir = "/srv/grades"

[history]
max_snapshots = 10
reference = "latest"
on_corrupt = "discard"

[extraction]
acceptance_threshold = 5
"#,
        )
        .unwrap();

        let (config, _) = GradewatchConfig::load(Some(&path)).unwrap();

        assert_eq!(config.storage_dir(), PathBuf::from("/srv/grades"));
        assert_eq!(config.history.max_snapshots, 10);
        assert_eq!(config.history.max_changes, history::MAX_CHANGES);
        assert_eq!(config.history.reference, ReferenceSnapshot::Latest);
        assert_eq!(config.history.on_corrupt, CorruptFilePolicy::Discard);
        assert_eq!(config.table_scoring().acceptance_threshold, 5);
    }

    #[test]
    fn test_unknown_reference_mode_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradewatch.toml");
        std::fs::write(&path, "[history]\nreference = \"oldest\"\n").unwrap();

        assert!(GradewatchConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let config = GradewatchConfig::default();
        let text = toml::to_string(&config).unwrap();

        assert!(text.contains("reference = \"previous\""));
        assert!(text.contains("acceptance_threshold = 3"));
    }
}
