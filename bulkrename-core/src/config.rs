use crate::vcs::VcsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory below the working root holding config, logs, lock and journal.
pub const STATE_DIR: &str = ".bulkrename";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub vcs: VcsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,

    /// Edit whole asset paths instead of leaf names
    #[serde(default)]
    pub show_full_path: bool,
}

impl Config {
    /// Load `<root>/.bulkrename/config.toml`, falling back to the user's
    /// config directory, then to defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let project = root.join(STATE_DIR).join("config.toml");
        if project.exists() {
            return Self::load_from_path(&project);
        }
        if let Some(user) = user_config_path() {
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bulkrename").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.use_color, None);
        assert!(!config.defaults.show_full_path);
        assert!(!config.vcs.enabled);
        assert_eq!(config.vcs.program, "p4");
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
[vcs]
enabled = true
port = "ssl:perforce:1666"
user = "alice"
"#,
        )
        .unwrap();
        assert!(config.vcs.enabled);
        assert_eq!(config.vcs.port, "ssl:perforce:1666");
        assert_eq!(config.vcs.program, "p4");
        assert!(config.vcs.client.is_empty());
        assert_eq!(config.defaults, DefaultsConfig::default());
    }

    #[test]
    fn test_load_from_project_dir() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join(STATE_DIR);
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(
            state_dir.join("config.toml"),
            "[defaults]\nuse_color = false\nshow_full_path = true\n",
        )
        .unwrap();

        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.defaults.use_color, Some(false));
        assert!(config.defaults.show_full_path);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[vcs\n").unwrap();
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_password_is_never_serialized() {
        let mut config = Config::default();
        config.vcs.password = "secret".to_string();
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("secret"));
    }
}
