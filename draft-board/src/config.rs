// Configuration loading and parsing (config/draftboard.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draftboard.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    draft: DraftSection,
    rankings: RankingsSection,
    cache: CacheSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftSection {
    /// Default draft to follow; can be switched at runtime.
    #[serde(default)]
    pub draft_id: Option<String>,
    /// Where the manual format override persists between runs.
    #[serde(default = "default_override_file")]
    pub override_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingsSection {
    /// Directory holding the per-format rankings CSVs.
    pub directory: String,
    /// Keep team-defense rows when parsing rankings.
    #[serde(default = "default_true")]
    pub include_defense: bool,
    /// Rankings older than this are considered stale.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// How long a computed board is served without recomputation.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_override_file() -> String {
    "manual_rankings_override.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_age_hours() -> u64 {
    6
}

fn default_ttl_secs() -> u64 {
    30
}

/// The assembled, validated application config.
#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftSection,
    pub rankings: RankingsSection,
    pub cache: CacheSection,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draftboard.toml` relative
/// to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_path = base_dir.join("config").join("draftboard.toml");
    let text = std::fs::read_to_string(&config_path).map_err(|_| ConfigError::FileNotFound {
        path: config_path.clone(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: config_path,
        source: e,
    })?;

    let config = Config {
        draft: file.draft,
        rankings: file.rankings,
        cache: file.cache,
    };
    validate(&config)?;
    Ok(config)
}

/// Ensure the config file exists by copying it from `defaults/` when
/// missing. Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();
    let source = defaults_dir.join("draftboard.toml");
    let target = config_dir.join("draftboard.toml");
    if source.exists() && !target.exists() {
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.rankings.directory.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "rankings.directory".into(),
            message: "must not be empty".into(),
        });
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "cache.ttl_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.rankings.max_age_hours == 0 {
        return Err(ConfigError::ValidationError {
            field: "rankings.max_age_hours".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.draft.override_file.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "draft.override_file".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID_TOML: &str = r#"
[draft]
draft_id = "123456789"
override_file = "manual_rankings_override.json"

[rankings]
directory = "rankings"
include_defense = true
max_age_hours = 6

[cache]
ttl_secs = 30
"#;

    fn temp_base(tag: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("draftboard_config_{tag}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    #[test]
    fn load_valid_config() {
        let tmp = temp_base("valid");
        fs::write(tmp.join("config/draftboard.toml"), VALID_TOML).unwrap();

        let config = load_config_from(&tmp).expect("should load valid config");
        assert_eq!(config.draft.draft_id.as_deref(), Some("123456789"));
        assert_eq!(config.rankings.directory, "rankings");
        assert!(config.rankings.include_defense);
        assert_eq!(config.rankings.max_age_hours, 6);
        assert_eq!(config.cache.ttl_secs, 30);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let tmp = temp_base("defaults");
        fs::write(
            tmp.join("config/draftboard.toml"),
            "[draft]\n[rankings]\ndirectory = \"rankings\"\n[cache]\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert!(config.draft.draft_id.is_none());
        assert_eq!(config.draft.override_file, "manual_rankings_override.json");
        assert!(config.rankings.include_defense);
        assert_eq!(config.cache.ttl_secs, 30);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found() {
        let tmp = temp_base("missing");
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("draftboard.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_base("invalid");
        fs::write(tmp.join("config/draftboard.toml"), "this is not [[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("draftboard.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_rankings_directory() {
        let tmp = temp_base("emptydir");
        fs::write(
            tmp.join("config/draftboard.toml"),
            "[draft]\n[rankings]\ndirectory = \"\"\n[cache]\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "rankings.directory"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_ttl() {
        let tmp = temp_base("zerottl");
        fs::write(
            tmp.join("config/draftboard.toml"),
            "[draft]\n[rankings]\ndirectory = \"rankings\"\n[cache]\nttl_secs = 0\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "cache.ttl_secs"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing() {
        let tmp = std::env::temp_dir().join("draftboard_config_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults/draftboard.toml"), VALID_TOML).unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/draftboard.toml").exists());

        // Second call copies nothing.
        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("draftboard_config_bare");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
