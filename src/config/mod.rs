//! Configuration for the agent kit

pub mod rpc;

use crate::{Error, Result};
use alloy::primitives::{address, Address};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use rpc::{chains, RpcConfig};

/// Private key environment variable name
pub const PRIVATE_KEY_ENV: &str = "EVM_PRIVATE_KEY";

/// CoinGecko API key environment variable name
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// FourMeme TokenManager on BSC mainnet
pub const FOURMEME_TOKEN_MANAGER: Address = address!("5c952063c7fc8610FFDB798152D69F0B9550762b");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FourMemeConfig {
    pub api_base: String,
    pub token_manager: Address,
}

impl Default for FourMemeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://four.meme/meme-api/v1".to_string(),
            token_manager: FOURMEME_TOKEN_MANAGER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefiLlamaConfig {
    pub api_base: String,
}

impl Default for DefiLlamaConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.llama.fi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoingeckoConfig {
    pub api_base: String,
    pub pro_api_base: String,
    /// Read from `COINGECKO_API_KEY`, never from the config file.
    #[serde(skip)]
    pub api_key: Option<Arc<SecretString>>,
}

impl Default for CoingeckoConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.coingecko.com/api/v3".to_string(),
            pro_api_base: "https://pro-api.coingecko.com/api/v3".to_string(),
            api_key: None,
        }
    }
}

/// Policy settings for action execution
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicySettings {
    /// Path to policy.json; unset means allow-all
    pub path: Option<String>,
    /// Fail at startup when the policy file is missing
    pub require_file: bool,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain the agent wallet operates on
    pub chain_id: u64,
    pub fourmeme: FourMemeConfig,
    pub defillama: DefiLlamaConfig,
    pub coingecko: CoingeckoConfig,
    pub policy: PolicySettings,
    /// Path to audit log file (JSONL)
    pub audit_log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: chains::BSC,
            fourmeme: FourMemeConfig::default(),
            defillama: DefiLlamaConfig::default(),
            coingecko: CoingeckoConfig::default(),
            policy: PolicySettings::default(),
            audit_log_path: None,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Pick up secrets from the environment.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var(COINGECKO_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.coingecko.api_key = Some(Arc::new(SecretString::from(key)));
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_defaults_target_bsc() {
        let config = Config::default();
        assert_eq!(config.chain_id, 56);
        assert_eq!(config.fourmeme.token_manager, FOURMEME_TOKEN_MANAGER);
        assert!(config.coingecko.api_key.is_none());
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"chain_id": 1, "defillama": {{"api_base": "http://localhost:9000"}}, "policy": {{"require_file": true}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.defillama.api_base, "http://localhost:9000");
        assert_eq!(config.fourmeme.api_base, "https://four.meme/meme-api/v1");
        assert!(config.policy.require_file);
        assert!(config.policy.path.is_none());
    }

    #[test]
    fn api_key_is_not_read_from_file() {
        let parsed: Config =
            serde_json::from_value(serde_json::json!({"coingecko": {"api_key": "leaked"}})).unwrap();
        assert!(parsed.coingecko.api_key.is_none());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }
}
