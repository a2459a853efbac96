//! RPC endpoint configuration
//!
//! Resolution order for a chain:
//! 1. `RPC_URL` - applies to whichever chain the agent runs on
//! 2. Per-chain env vars (`BSC_RPC_URL`, `ETH_RPC_URL`)
//! 3. Public RPC fallbacks, rate limited and meant for testing only
//!
//! ```bash
//! export RPC_URL="https://bsc-dataseed.bnbchain.org"
//! export ETH_RPC_URL="https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! ```

use std::collections::HashMap;

/// Chain ID constants
pub mod chains {
    pub const ETHEREUM: u64 = 1;
    pub const BSC: u64 = 56;

    pub fn name(chain_id: u64) -> &'static str {
        match chain_id {
            ETHEREUM => "ethereum",
            BSC => "bsc",
            _ => "unknown",
        }
    }
}

mod env_vars {
    pub const RPC_URL: &str = "RPC_URL";
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const BSC_RPC_URL: &str = "BSC_RPC_URL";
}

mod public_rpcs {
    pub const ETHEREUM: &str = "https://eth.llamarpc.com";
    pub const BSC: &str = "https://bsc-dataseed.bnbchain.org";
}

/// RPC URLs per chain plus an optional override for the active chain.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    override_url: Option<String>,
    urls: HashMap<u64, String>,
}

impl RpcConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut urls = HashMap::new();

        if let Some(url) = var(env_vars::ETH_RPC_URL) {
            tracing::debug!("Using ETH_RPC_URL for Ethereum");
            urls.insert(chains::ETHEREUM, url);
        }
        if let Some(url) = var(env_vars::BSC_RPC_URL) {
            tracing::debug!("Using BSC_RPC_URL for BSC");
            urls.insert(chains::BSC, url);
        }

        urls.entry(chains::ETHEREUM)
            .or_insert_with(|| public_rpcs::ETHEREUM.to_string());
        urls.entry(chains::BSC)
            .or_insert_with(|| public_rpcs::BSC.to_string());

        Self {
            override_url: var(env_vars::RPC_URL).filter(|u| !u.trim().is_empty()),
            urls,
        }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self {
            override_url: None,
            urls,
        }
    }

    /// URL to use when running on `chain_id`.
    pub fn resolve(&self, chain_id: u64) -> Option<&str> {
        if let Some(url) = &self.override_url {
            return Some(url);
        }
        let url = self.get(chain_id)?;
        if url == public_rpcs::ETHEREUM || url == public_rpcs::BSC {
            tracing::warn!(chain_id, "No RPC configured, using public RPC (rate limited)");
        }
        Some(url)
    }

    /// Per-chain URL, ignoring `RPC_URL`.
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
