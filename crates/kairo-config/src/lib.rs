use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kairo_core::domain::DEFAULT_MAX_CONTACTS;
use kairo_core::matching::{
    ClaimPolicy, MatchOptions, DEFAULT_BATCH_SIZE, DEFAULT_FUZZY_TOKEN_LIMIT, DEFAULT_MAX_WORKERS,
    DEFAULT_PATTERN_LIMIT,
};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "kairo";
const CONFIG_FILENAME: &str = "config.toml";

pub const MAX_BATCH_SIZE: usize = 1000;
pub const MAX_WORKERS: usize = 64;
pub const MAX_FUZZY_TOKEN_LIMIT: usize = 50;
pub const MAX_PATTERN_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Replacement for the built-in calling-code table.
    pub dialing_codes: Option<PathBuf>,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub fuzzy_token_limit: usize,
    pub pattern_limit: usize,
    pub max_contacts: usize,
    pub claim_policy: ClaimPolicy,
}

impl MatchingConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            batch_size: self.batch_size,
            max_workers: self.max_workers,
            fuzzy_token_limit: self.fuzzy_token_limit,
            pattern_limit: self.pattern_limit,
            claim_policy: self.claim_policy,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            fuzzy_token_limit: DEFAULT_FUZZY_TOKEN_LIMIT,
            pattern_limit: DEFAULT_PATTERN_LIMIT,
            max_contacts: DEFAULT_MAX_CONTACTS,
            claim_policy: ClaimPolicy::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dialing_codes: None,
            matching: MatchingConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid batch_size value: {0}")]
    InvalidBatchSize(usize),
    #[error("invalid max_workers value: {0}")]
    InvalidMaxWorkers(usize),
    #[error("invalid fuzzy_token_limit value: {0}")]
    InvalidFuzzyTokenLimit(usize),
    #[error("invalid pattern_limit value: {0}")]
    InvalidPatternLimit(usize),
    #[error("invalid max_contacts value: {0}")]
    InvalidMaxContacts(usize),
    #[error("invalid dialing_codes path: {0}")]
    InvalidDialingCodesPath(PathBuf),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    dialing_codes: Option<PathBuf>,
    matching: Option<MatchingFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchingFile {
    batch_size: Option<usize>,
    max_workers: Option<usize>,
    fuzzy_token_limit: Option<usize>,
    pattern_limit: Option<usize>,
    max_contacts: Option<usize>,
    claim_policy: Option<ClaimPolicy>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = merge_config(parsed)?;

    // Relative table paths are read next to the config file.
    if let Some(codes) = config.dialing_codes.take() {
        config.dialing_codes = Some(match path.parent() {
            Some(dir) if codes.is_relative() => dir.join(codes),
            _ => codes,
        });
    }
    Ok(Some(config))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(codes) = parsed.dialing_codes {
        if codes.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDialingCodesPath(codes));
        }
        config.dialing_codes = Some(codes);
    }

    if let Some(matching) = parsed.matching {
        let target = &mut config.matching;
        if let Some(batch_size) = matching.batch_size {
            target.batch_size =
                validate_batch_size(batch_size).ok_or(ConfigError::InvalidBatchSize(batch_size))?;
        }
        if let Some(workers) = matching.max_workers {
            target.max_workers =
                validate_max_workers(workers).ok_or(ConfigError::InvalidMaxWorkers(workers))?;
        }
        if let Some(limit) = matching.fuzzy_token_limit {
            if limit > MAX_FUZZY_TOKEN_LIMIT {
                return Err(ConfigError::InvalidFuzzyTokenLimit(limit));
            }
            target.fuzzy_token_limit = limit;
        }
        if let Some(limit) = matching.pattern_limit {
            if limit == 0 || limit > MAX_PATTERN_LIMIT {
                return Err(ConfigError::InvalidPatternLimit(limit));
            }
            target.pattern_limit = limit;
        }
        if let Some(max_contacts) = matching.max_contacts {
            if max_contacts == 0 {
                return Err(ConfigError::InvalidMaxContacts(max_contacts));
            }
            target.max_contacts = max_contacts;
        }
        if let Some(policy) = matching.claim_policy {
            target.claim_policy = policy;
        }
    }

    Ok(config)
}

pub fn validate_batch_size(value: usize) -> Option<usize> {
    (1..=MAX_BATCH_SIZE).contains(&value).then_some(value)
}

pub fn validate_max_workers(value: usize) -> Option<usize> {
    (1..=MAX_WORKERS).contains(&value).then_some(value)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
