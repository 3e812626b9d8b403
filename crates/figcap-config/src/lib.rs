//! Configuration management for figcap.
//!
//! Parses `figcap.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Directory Expansion
//!
//! Directory values support home and environment variable expansion:
//!
//! - `~/corpus` - relative to `$HOME`
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `input.dir`
//! - `output.dir`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use figcap_core::{Dialect, DuplicatePolicy, UnknownDialect};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override input directory.
    pub input_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override dialect selection.
    pub dialect: Option<DialectChoice>,
    /// Override worker count.
    pub workers: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "figcap.toml";

/// Default input directory, relative to the config directory.
const DEFAULT_INPUT_DIR: &str = "data/download/arxiv/src";

/// Default output directory, relative to the config directory.
const DEFAULT_OUTPUT_DIR: &str = "data/processed/arxiv";

/// Upper bound on `pipeline.workers`.
const MAX_WORKERS: usize = 1024;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input configuration (paths are relative strings from TOML).
    input: InputConfigRaw,
    /// Output configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Caption filters.
    pub extract: ExtractConfig,
    /// Worker pool and resumption.
    pub pipeline: PipelineConfig,

    /// Resolved input configuration (set after loading).
    #[serde(skip)]
    pub input_resolved: InputConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// How the dialect of a markup file is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectChoice {
    /// By file extension (`.tex` is LaTeX, `.nxml`/`.xml` is JATS).
    #[default]
    Auto,
    /// Every markup file is LaTeX.
    Latex,
    /// Every markup file is JATS.
    Jats,
}

impl DialectChoice {
    /// Dialect forced on every file, or `None` for per-file detection.
    #[must_use]
    pub fn forced(self) -> Option<Dialect> {
        match self {
            Self::Auto => None,
            Self::Latex => Some(Dialect::Latex),
            Self::Jats => Some(Dialect::Jats),
        }
    }
}

impl fmt::Display for DialectChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.forced().map_or("auto", Dialect::as_str))
    }
}

impl FromStr for DialectChoice {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        Ok(match s.parse::<Dialect>()? {
            Dialect::Latex => Self::Latex,
            Dialect::Jats => Self::Jats,
        })
    }
}

/// Raw input configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InputConfigRaw {
    dir: Option<String>,
    dialect: DialectChoice,
}

/// Raw output configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
}

/// Resolved input configuration with absolute paths.
#[derive(Debug, Default)]
pub struct InputConfig {
    /// Directory holding one sub-directory per paper.
    pub dir: PathBuf,
    /// Dialect selection for markup files.
    pub dialect: DialectChoice,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Directory receiving image/caption pairs and `stats.json`.
    pub dir: PathBuf,
}

/// Caption filter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Raw LaTeX caption substrings that exclude a figure.
    pub blocklist: Vec<String>,
    /// Image extensions (without dot) kept from paper bundles.
    pub accepted_extensions: Vec<String>,
    /// Treatment of a graphic captioned twice in one document.
    pub on_duplicate: DuplicatePolicy,
    /// Compare JATS graphic hrefs against kept image stems.
    pub jats_allow_list: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            blocklist: ["\\href", "\\url", "\\email"].map(str::to_owned).to_vec(),
            accepted_extensions: ["jpg", "jpeg", "gif", "png", "pdf", "eps", "ps"]
                .map(str::to_owned)
                .to_vec(),
            on_duplicate: DuplicatePolicy::default(),
            jats_allow_list: true,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads; 0 picks 1.5 x available cores.
    pub workers: usize,
    /// Skip papers whose output pairs already exist.
    pub skip_existing: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            skip_existing: true,
        }
    }
}

impl PipelineConfig {
    /// Effective worker count: `workers`, or 1.5 x available cores rounded up
    /// when it is 0.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        (cores * 3).div_ceil(2)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`input.dir`").
        field: String,
        /// Error message (e.g., "${`DATA_ROOT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `figcap.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(input_dir) = &settings.input_dir {
            self.input_resolved.dir.clone_from(input_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.dir.clone_from(output_dir);
        }
        if let Some(dialect) = settings.dialect {
            self.input_resolved.dialect = dialect;
        }
        if let Some(workers) = settings.workers {
            self.pipeline.workers = workers;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            input: InputConfigRaw::default(),
            output: OutputConfigRaw::default(),
            extract: ExtractConfig::default(),
            pipeline: PipelineConfig::default(),
            input_resolved: InputConfig {
                dir: base.join(DEFAULT_INPUT_DIR),
                dialect: DialectChoice::Auto,
            },
            output_resolved: OutputConfig {
                dir: base.join(DEFAULT_OUTPUT_DIR),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_paths()?;
        self.validate_extract()?;
        self.validate_pipeline()?;
        Ok(())
    }

    /// Input and output must be distinct so outputs never get re-read.
    fn validate_paths(&self) -> Result<(), ConfigError> {
        if self.input_resolved.dir == self.output_resolved.dir {
            return Err(ConfigError::Validation(format!(
                "output.dir must differ from input.dir ({})",
                self.input_resolved.dir.display()
            )));
        }
        Ok(())
    }

    /// Validate extract configuration.
    fn validate_extract(&self) -> Result<(), ConfigError> {
        if self.extract.accepted_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extract.accepted_extensions cannot be empty".to_owned(),
            ));
        }
        for extension in &self.extract.accepted_extensions {
            require_non_empty(extension, "extract.accepted_extensions")?;
            if extension.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "extract.accepted_extensions entries are written without a dot, got {extension:?}"
                )));
            }
        }
        for term in &self.extract.blocklist {
            require_non_empty(term, "extract.blocklist")?;
        }
        Ok(())
    }

    /// Validate pipeline configuration.
    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        if self.pipeline.workers > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "pipeline.workers cannot exceed {MAX_WORKERS}"
            )));
        }
        Ok(())
    }

    /// Expand `~` and environment variable references in directory settings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.input.dir {
            self.input.dir = Some(expand::expand_dir(dir, "input.dir")?);
        }
        if let Some(ref dir) = self.output.dir {
            self.output.dir = Some(expand::expand_dir(dir, "output.dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.input_resolved = InputConfig {
            dir: resolve(self.input.dir.as_deref(), DEFAULT_INPUT_DIR),
            dialect: self.input.dialect,
        };
        self.output_resolved = OutputConfig {
            dir: resolve(self.output.dir.as_deref(), DEFAULT_OUTPUT_DIR),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.input_resolved.dir,
            PathBuf::from("/test/data/download/arxiv/src")
        );
        assert_eq!(
            config.output_resolved.dir,
            PathBuf::from("/test/data/processed/arxiv")
        );
        assert_eq!(config.input_resolved.dialect, DialectChoice::Auto);
        assert_eq!(config.extract.blocklist, vec!["\\href", "\\url", "\\email"]);
        assert_eq!(config.extract.accepted_extensions.len(), 7);
        assert_eq!(config.extract.on_duplicate, DuplicatePolicy::LastWriteWins);
        assert!(config.extract.jats_allow_list);
        assert_eq!(config.pipeline.workers, 0);
        assert!(config.pipeline.skip_existing);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.extract.accepted_extensions[0], "jpg");
        assert!(config.pipeline.skip_existing);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[input]
dir = "pmc/src"
dialect = "jats"

[output]
dir = "pmc/out"

[extract]
blocklist = ["\\href"]
accepted_extensions = ["jpg"]
on_duplicate = "drop"
jats_allow_list = false

[pipeline]
workers = 4
skip_existing = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.input_resolved.dir, PathBuf::from("/project/pmc/src"));
        assert_eq!(config.input_resolved.dialect, DialectChoice::Jats);
        assert_eq!(config.output_resolved.dir, PathBuf::from("/project/pmc/out"));
        assert_eq!(config.extract.blocklist, vec!["\\href"]);
        assert_eq!(config.extract.accepted_extensions, vec!["jpg"]);
        assert_eq!(config.extract.on_duplicate, DuplicatePolicy::DropDuplicates);
        assert!(!config.extract.jats_allow_list);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.worker_count(), 4);
        assert!(!config.pipeline.skip_existing);
    }

    #[test]
    fn test_unknown_duplicate_policy_is_rejected() {
        let toml = r#"
[extract]
on_duplicate = "first"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let toml = r#"
[input]
dir = "/data/src"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.input_resolved.dir, PathBuf::from("/data/src"));
    }

    #[test]
    fn test_load_from_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[output]\ndir = \"out\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.output_resolved.dir, dir.path().join("out"));
        assert_eq!(config.input_resolved.dir, dir.path().join(DEFAULT_INPUT_DIR));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/figcap.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[pipeline\nworkers = 1").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_cli_settings_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[pipeline]\nworkers = 2\n").unwrap();

        let settings = CliSettings {
            input_dir: Some(PathBuf::from("/in")),
            output_dir: Some(PathBuf::from("/out")),
            dialect: Some(DialectChoice::Latex),
            workers: Some(8),
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.input_resolved.dir, PathBuf::from("/in"));
        assert_eq!(config.output_resolved.dir, PathBuf::from("/out"));
        assert_eq!(config.input_resolved.dialect, DialectChoice::Latex);
        assert_eq!(config.pipeline.workers, 8);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(
            config.input_resolved.dir,
            PathBuf::from("/test/data/download/arxiv/src")
        );
        assert_eq!(config.pipeline.workers, 0);
    }

    #[test]
    fn test_expand_env_vars_in_dirs() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FIGCAP_TEST_CORPUS", "/mnt/corpus");
        }

        let toml = r#"
[input]
dir = "${FIGCAP_TEST_CORPUS}/src"

[output]
dir = "${FIGCAP_TEST_OUT:-/tmp/figcap}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.input_resolved.dir, PathBuf::from("/mnt/corpus/src"));
        assert_eq!(config.output_resolved.dir, PathBuf::from("/tmp/figcap"));

        unsafe {
            std::env::remove_var("FIGCAP_TEST_CORPUS");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FIGCAP_TEST_MISSING_DIR");
        }

        let toml = r#"
[output]
dir = "${FIGCAP_TEST_MISSING_DIR}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("FIGCAP_TEST_MISSING_DIR"));
        assert!(err.to_string().contains("output.dir"));
    }

    #[test]
    fn test_dialect_choice_from_str() {
        assert_eq!("auto".parse::<DialectChoice>().unwrap(), DialectChoice::Auto);
        assert_eq!("LaTeX".parse::<DialectChoice>().unwrap(), DialectChoice::Latex);
        assert_eq!("jats".parse::<DialectChoice>().unwrap(), DialectChoice::Jats);
        assert!("html".parse::<DialectChoice>().is_err());
        assert_eq!(DialectChoice::Jats.forced(), Some(Dialect::Jats));
        assert_eq!(DialectChoice::Auto.to_string(), "auto");
    }

    #[test]
    fn test_worker_count_auto_is_positive() {
        let pipeline = PipelineConfig::default();
        assert!(pipeline.worker_count() >= 2);
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_same_input_and_output() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.output_resolved.dir = config.input_resolved.dir.clone();
        assert_validation_error(&config, &["output.dir", "input.dir"]);
    }

    #[test]
    fn test_validate_empty_extensions() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.extract.accepted_extensions.clear();
        assert_validation_error(&config, &["accepted_extensions", "empty"]);
    }

    #[test]
    fn test_validate_dotted_extension() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.extract.accepted_extensions = vec![".png".to_owned()];
        assert_validation_error(&config, &["accepted_extensions", ".png"]);
    }

    #[test]
    fn test_validate_empty_blocklist_term() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.extract.blocklist.push(String::new());
        assert_validation_error(&config, &["extract.blocklist", "empty"]);
    }

    #[test]
    fn test_validate_too_many_workers() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.pipeline.workers = 5000;
        assert_validation_error(&config, &["pipeline.workers", "1024"]);
    }

    #[test]
    fn test_validate_runs_after_cli_overrides() {
        let settings = CliSettings {
            input_dir: Some(PathBuf::from("/same")),
            output_dir: Some(PathBuf::from("/same")),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
