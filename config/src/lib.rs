//! zkFund Configuration
//!
//! Shared configuration crate for the donation core and CLI.
//!
//! Handles loading configuration from:
//! 1. ZKF_CONFIG env var (explicit path)
//! 2. ./zkfund.toml (current directory)
//! 3. ~/.zkfund/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub use zkfund_amount::MAX_DECIMALS;

const LOCAL_CONFIG_FILE: &str = "zkfund.toml";
const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".zkfund";
const HISTORY_FILE_NAME: &str = "history.json";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_SYMBOL: &str = "ETH";
const DEFAULT_DECIMALS: u8 = 18;
const DEFAULT_RECIPIENT: &str = "0x5a4b46756e64446f6e6174696f6e735661756c74";

const DEFAULT_PROOF_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 500;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 120_000;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZkFundConfig {
    #[serde(default)]
    pub asset: AssetConfig,
    #[serde(default)]
    pub donation: DonationConfig,
    #[serde(default)]
    pub proving: ProvingConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Funding asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Fractional digits of one base unit
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.into(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

fn default_symbol() -> String {
    DEFAULT_SYMBOL.into()
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

/// Donation target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationConfig {
    /// 0x-prefixed 20-byte address of the cause
    #[serde(default = "default_recipient")]
    pub recipient: String,
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.into(),
        }
    }
}

fn default_recipient() -> String {
    DEFAULT_RECIPIENT.into()
}

/// Proof generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvingConfig {
    #[serde(default = "default_proof_timeout")]
    pub timeout_ms: u64,
}

impl Default for ProvingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROOF_TIMEOUT_MS,
        }
    }
}

fn default_proof_timeout() -> u64 {
    DEFAULT_PROOF_TIMEOUT_MS
}

/// Wallet submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Per-attempt timeout
    #[serde(default = "default_submit_timeout")]
    pub timeout_ms: u64,
    /// Retries after the first attempt, transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SUBMIT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
        }
    }
}

fn default_submit_timeout() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_MS
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_retry_base_ms() -> u64 {
    DEFAULT_RETRY_BASE_MS
}

/// Chain confirmation polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_confirm_timeout")]
    pub timeout_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_CONFIRM_TIMEOUT_MS,
        }
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_confirm_timeout() -> u64 {
    DEFAULT_CONFIRM_TIMEOUT_MS
}

/// Donor-local history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// JSON file; defaults to ~/.zkfund/history.json
    #[serde(default)]
    pub path: Option<String>,
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl ZkFundConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check ZKF_CONFIG env var
        if let Ok(path) = env::var("ZKF_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("ZKF_CONFIG points at missing file: {}", path.display());
        }

        // 2. Check ./zkfund.toml (current directory)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.zkfund/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Asset
        env_string("ZKF_ASSET_SYMBOL", &mut self.asset.symbol);
        env_parse("ZKF_ASSET_DECIMALS", &mut self.asset.decimals);

        // Donation
        env_string("ZKF_RECIPIENT", &mut self.donation.recipient);

        // Timeouts and retries
        env_parse("ZKF_PROOF_TIMEOUT_MS", &mut self.proving.timeout_ms);
        env_parse("ZKF_SUBMIT_TIMEOUT_MS", &mut self.submission.timeout_ms);
        env_parse("ZKF_SUBMIT_RETRIES", &mut self.submission.max_retries);
        env_parse("ZKF_SUBMIT_RETRY_BASE_MS", &mut self.submission.retry_base_ms);
        env_parse("ZKF_CONFIRM_POLL_MS", &mut self.confirmation.poll_interval_ms);
        env_parse("ZKF_CONFIRM_TIMEOUT_MS", &mut self.confirmation.timeout_ms);

        // History
        env_option_string("ZKF_HISTORY_PATH", &mut self.history.path);
    }

    /// Reject values the donation pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.asset.decimals <= MAX_DECIMALS,
            "asset.decimals must be at most {}, got {}",
            MAX_DECIMALS,
            self.asset.decimals
        );
        ensure!(self.proving.timeout_ms > 0, "proving.timeout_ms must be non-zero");
        ensure!(self.submission.timeout_ms > 0, "submission.timeout_ms must be non-zero");
        ensure!(
            self.confirmation.poll_interval_ms > 0,
            "confirmation.poll_interval_ms must be non-zero"
        );
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Where donation history is persisted, if anywhere. A leading `~/`
    /// in the configured path resolves against the home directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        match self.history.path.as_deref() {
            Some(path) => match path.strip_prefix("~/") {
                Some(rest) => dirs::home_dir().map(|h| h.join(rest)),
                None => Some(PathBuf::from(path)),
            },
            None => dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(HISTORY_FILE_NAME)),
        }
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.history.path = Some(format!("~/{}/{}", CONFIG_DIR_NAME, HISTORY_FILE_NAME));
        toml::to_string_pretty(&sample).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ZkFundConfig::default();
        assert_eq!(config.asset.decimals, DEFAULT_DECIMALS);
        assert_eq!(config.donation.recipient, DEFAULT_RECIPIENT);
        assert_eq!(config.submission.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_sample() {
        let sample = ZkFundConfig::generate_sample();
        assert!(sample.contains("[asset]"));
        assert!(sample.contains("[donation]"));
        assert!(sample.contains("[submission]"));
        assert!(sample.contains("[confirmation]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = ZkFundConfig::generate_sample();
        let parsed: ZkFundConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.donation.recipient, DEFAULT_RECIPIENT);
        assert_eq!(parsed.proving.timeout_ms, DEFAULT_PROOF_TIMEOUT_MS);
    }

    #[test]
    fn test_sample_history_path_lands_in_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let parsed: ZkFundConfig = toml::from_str(&ZkFundConfig::generate_sample()).unwrap();

        let path = parsed.history_path().unwrap();
        assert!(!path.starts_with("~"));
        assert_eq!(path, home.join(CONFIG_DIR_NAME).join(HISTORY_FILE_NAME));
        assert_eq!(parsed.history_path(), ZkFundConfig::default().history_path());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[asset]\nsymbol = \"USDC\"\ndecimals = 6\n\n[submission]\nmax_retries = 1").unwrap();

        let config = ZkFundConfig::read_file(file.path()).unwrap();
        assert_eq!(config.asset.symbol, "USDC");
        assert_eq!(config.asset.decimals, 6);
        assert_eq!(config.submission.max_retries, 1);
        assert_eq!(config.submission.retry_base_ms, DEFAULT_RETRY_BASE_MS);
        assert_eq!(config.confirmation.timeout_ms, DEFAULT_CONFIRM_TIMEOUT_MS);
    }

    #[test]
    fn test_validate_rejects_excess_decimals() {
        let mut config = ZkFundConfig::default();
        config.asset.decimals = MAX_DECIMALS + 1;
        assert!(config.validate().is_err());
        config.asset.decimals = MAX_DECIMALS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_history_path_override() {
        let mut config = ZkFundConfig::default();
        config.history.path = Some("/tmp/zkfund-history.json".into());
        assert_eq!(
            config.history_path(),
            Some(PathBuf::from("/tmp/zkfund-history.json"))
        );
    }
}
