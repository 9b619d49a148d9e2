//! Configuration for rewrite-guard.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (REWRITE_GUARD_HOME, OPENAI_API_KEY)
//! 2. Config file (.rewrite-guard/config.yaml)
//! 3. Defaults (~/.rewrite-guard)
//!
//! Config file discovery:
//! - Searches current directory and parents for .rewrite-guard/config.yaml
//! - Paths in config file are relative to the .rewrite-guard directory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::openai::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use crate::core::audit::RetryPolicy;
use crate::core::input::InputLimits;
use crate::domain::Thresholds;
use crate::validators::{MarkerCategory, PolarityMatch};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".rewrite-guard";
const CONFIG_FILE: &str = "config.yaml";
const HOME_ENV: &str = "REWRITE_GUARD_HOME";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
    #[serde(default)]
    pub input: Option<InputLimits>,
    #[serde(default)]
    pub embeddings: Option<EmbeddingsConfig>,
    #[serde(default)]
    pub proposals: Option<ProposalsConfig>,
    #[serde(default)]
    pub audit: Option<AuditConfig>,
    #[serde(default)]
    pub polarity: Option<PolarityConfig>,

    /// Extra markers appended to the built-in lists, keyed by category
    #[serde(default)]
    pub lexicon: BTreeMap<MarkerCategory, Vec<String>>,
    #[serde(default)]
    pub document_scan: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .rewrite-guard/)
    pub home: Option<String>,
    /// Audit log file (relative to .rewrite-guard/)
    pub audit_log: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: Option<EmbeddingBackend>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalsConfig {
    pub provider: Option<ProposalBackend>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolarityConfig {
    pub match_mode: Option<PolarityMatch>,
}

/// Which embedding provider to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    #[default]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Which proposal provider to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalBackend {
    #[default]
    Placeholder,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Hashing,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dimensions: 128,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalSettings {
    pub provider: ProposalBackend,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ProposalSettings {
    fn default() -> Self {
        Self {
            provider: ProposalBackend::Placeholder,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// JSONL audit log
    pub audit_log: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub thresholds: Thresholds,
    pub input: InputLimits,
    pub embeddings: EmbeddingSettings,
    pub proposals: ProposalSettings,
    pub audit_retry: RetryPolicy,
    pub polarity: PolarityMatch,
    pub extra_markers: BTreeMap<MarkerCategory, Vec<String>>,
    pub document_scan: bool,

    /// Never serialized
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Values read from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub home: Option<String>,
    pub api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            home: std::env::var(HOME_ENV).ok().filter(|v| !v.is_empty()),
            api_key: std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a (possibly absent) config file with environment overrides
fn resolve(
    config_path: Option<PathBuf>,
    file: Option<ConfigFile>,
    env: EnvOverrides,
) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let file = file.unwrap_or(ConfigFile {
        version: "1".to_string(),
        paths: PathsConfig::default(),
        thresholds: None,
        input: None,
        embeddings: None,
        proposals: None,
        audit: None,
        polarity: None,
        lexicon: BTreeMap::new(),
        document_scan: None,
    });

    let home = if let Some(env_home) = env.home {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = file.paths.home {
        resolve_path(&config_dir, home_path)
    } else {
        default_home
    };

    let audit_log = match file.paths.audit_log {
        Some(ref log_path) => resolve_path(&config_dir, log_path),
        None => home.join("audit.jsonl"),
    };

    let thresholds = file.thresholds.unwrap_or_default();
    if !thresholds.is_valid() {
        bail!(
            "Invalid thresholds: risky ({}) must be below safe ({}) and both within [0, 1]",
            thresholds.risky,
            thresholds.safe
        );
    }

    let input = file.input.unwrap_or_default();
    if input.min_chars > input.max_chars {
        bail!(
            "Invalid input limits: min_chars ({}) exceeds max_chars ({})",
            input.min_chars,
            input.max_chars
        );
    }

    let embeddings_file = file.embeddings.unwrap_or_default();
    let embedding_defaults = EmbeddingSettings::default();
    let embeddings = EmbeddingSettings {
        provider: embeddings_file.provider.unwrap_or(embedding_defaults.provider),
        model: embeddings_file.model.unwrap_or(embedding_defaults.model),
        base_url: embeddings_file.base_url.unwrap_or(embedding_defaults.base_url),
        dimensions: embeddings_file.dimensions.unwrap_or(embedding_defaults.dimensions),
        timeout_seconds: embeddings_file
            .timeout_seconds
            .unwrap_or(embedding_defaults.timeout_seconds),
    };

    let proposals_file = file.proposals.unwrap_or_default();
    let proposal_defaults = ProposalSettings::default();
    let proposals = ProposalSettings {
        provider: proposals_file.provider.unwrap_or(proposal_defaults.provider),
        model: proposals_file.model.unwrap_or(proposal_defaults.model),
        base_url: proposals_file.base_url.unwrap_or(proposal_defaults.base_url),
        timeout_seconds: proposals_file
            .timeout_seconds
            .unwrap_or(proposal_defaults.timeout_seconds),
    };

    Ok(ResolvedConfig {
        home,
        audit_log,
        config_file: config_path,
        thresholds,
        input,
        embeddings,
        proposals,
        audit_retry: file.audit.and_then(|a| a.retry).unwrap_or_default(),
        polarity: file
            .polarity
            .and_then(|p| p.match_mode)
            .unwrap_or_default(),
        extra_markers: file.lexicon,
        document_scan: file.document_scan.unwrap_or(false),
        api_key: env.api_key,
    })
}

/// Load configuration from all sources, discovering from `start`
pub fn load_config_from(start: &Path, env: EnvOverrides) -> Result<ResolvedConfig> {
    let config_path = find_config_file(start);
    let file = match config_path {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };
    resolve(config_path, file, env)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd, EnvOverrides::from_env())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the audit log path ($REWRITE_GUARD_HOME/audit.jsonl by default)
pub fn audit_log_path() -> Result<PathBuf> {
    Ok(config()?.audit_log.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, None, EnvOverrides::default()).unwrap();

        let expected_home = dirs::home_dir().unwrap().join(CONFIG_DIR);
        assert_eq!(config.home, expected_home);
        assert_eq!(config.audit_log, expected_home.join("audit.jsonl"));
        assert!(config.config_file.is_none());
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.embeddings.provider, EmbeddingBackend::Hashing);
        assert_eq!(config.embeddings.timeout_seconds, 10);
        assert_eq!(config.polarity, PolarityMatch::Word);
        assert!(!config.document_scan);
    }

    #[test]
    fn test_env_home_wins() {
        let config = resolve(
            None,
            None,
            EnvOverrides {
                home: Some("/srv/guard".to_string()),
                api_key: Some("sk-test".to_string()),
            },
        )
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/srv/guard"));
        assert_eq!(config.audit_log, PathBuf::from("/srv/guard/audit.jsonl"));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_config_file_discovery_and_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1"
paths:
  home: ./state
thresholds:
  safe: 0.9
  risky: 0.7
embeddings:
  provider: openai
  timeout_seconds: 5
audit:
  retry:
    max_attempts: 5
polarity:
  match_mode: substring
lexicon:
  negation: [without]
document_scan: true
"#,
        );

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = load_config_from(&nested, EnvOverrides::default()).unwrap();
        assert_eq!(config.config_file.as_deref(), Some(path.as_path()));
        assert_eq!(config.home, temp.path().join(CONFIG_DIR).join("state"));
        assert_eq!(config.thresholds, Thresholds { safe: 0.9, risky: 0.7 });
        assert_eq!(config.embeddings.provider, EmbeddingBackend::OpenAi);
        assert_eq!(config.embeddings.timeout_seconds, 5);
        assert_eq!(config.audit_retry.max_attempts, 5);
        assert_eq!(config.audit_retry.initial_delay_ms, 200);
        assert_eq!(config.polarity, PolarityMatch::Substring);
        assert_eq!(
            config.extra_markers.get(&MarkerCategory::Negation),
            Some(&vec!["without".to_string()])
        );
        assert!(config.document_scan);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
version: "1"
thresholds:
  safe: 0.5
  risky: 0.8
"#,
        );

        let err = load_config_from(temp.path(), EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid thresholds"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project/.rewrite-guard");

        assert_eq!(
            resolve_path(&base, "/absolute/audit.jsonl"),
            PathBuf::from("/absolute/audit.jsonl")
        );
        assert_eq!(
            resolve_path(&base, "logs/audit.jsonl"),
            PathBuf::from("/home/user/project/.rewrite-guard/logs/audit.jsonl")
        );
    }
}
