//! Configuration loading and config file resolution

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// TOML configuration file contents
///
/// Every field is optional; absent fields fall back to built-in defaults.
/// Practice values are range-checked when applied to `GlobalParams`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the verse pack to practice (absent: bundled pack)
    #[serde(default)]
    pub verse_pack: Option<PathBuf>,

    #[serde(default)]
    pub practice: PracticeSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[practice]` section: tunables applied to `GlobalParams` at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeSection {
    pub required_repetitions: Option<u32>,
    pub perfect_word_accuracy: Option<f64>,
    pub success_similarity: Option<f64>,
    pub link_similarity: Option<f64>,
    pub link_word_accuracy: Option<f64>,
    pub link_required_perfect: Option<u32>,
    pub link_word_count: Option<usize>,
    pub struggle_attempt_threshold: Option<u32>,
    pub word_match_threshold: Option<f64>,
    pub playback_ms_per_word: Option<u64>,
    pub event_bus_capacity: Option<usize>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// tracing filter directive; the RUST_LOG environment variable wins
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Resolve and load the effective configuration
    ///
    /// A config file named explicitly (CLI or environment) must exist and
    /// parse; when no file resolves, built-in defaults apply.
    pub fn resolve(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Self> {
        match resolve_config_path(cli_arg, env_var_name) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Config file resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory (tahfiz/config.toml), if the file exists
///
/// Returns None when nothing resolves; built-in defaults apply then.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: User config directory
    let user_config = dirs::config_dir().map(|d| d.join("tahfiz").join("config.toml"))?;
    if user_config.exists() {
        return Some(user_config);
    }

    None
}

/// OS-dependent default data folder; session reports land here
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tahfiz"))
        .unwrap_or_else(|| PathBuf::from("./tahfiz_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let toml = r#"
verse_pack = "/data/al-fatiha.toml"

[practice]
required_repetitions = 5
link_required_perfect = 3

[logging]
filter = "debug"
"#;
        let config: TomlConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.verse_pack.as_deref(),
            Some(Path::new("/data/al-fatiha.toml"))
        );
        assert_eq!(config.practice.required_repetitions, Some(5));
        assert_eq!(config.practice.link_required_perfect, Some(3));
        assert_eq!(config.practice.link_word_count, None);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.verse_pack.is_none());
        assert!(config.practice.required_repetitions.is_none());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[practice]\nrequired_repetitions = 4").unwrap();

        let config = TomlConfig::load(&path).unwrap();
        assert_eq!(config.practice.required_repetitions, Some(4));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = TomlConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn cli_argument_wins_resolution() {
        let cli = PathBuf::from("/tmp/explicit.toml");
        let resolved = resolve_config_path(Some(&cli), "TAHFIZ_TEST_CONFIG_UNSET");
        assert_eq!(resolved, Some(cli));
    }
}
