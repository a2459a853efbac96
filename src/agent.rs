//! The execution context handed to every action.

use crate::config::Config;
use crate::services::{CoingeckoClient, DefiLlamaClient, FourMemeClient};
use crate::wallet::EvmWallet;
use std::sync::Arc;

/// Wallet, HTTP client and configuration shared by all actions.
#[derive(Clone)]
pub struct EvmAgentKit {
    wallet: Arc<dyn EvmWallet>,
    http: reqwest::Client,
    config: Config,
}

impl EvmAgentKit {
    pub fn new(wallet: Arc<dyn EvmWallet>, config: Config) -> Self {
        Self {
            wallet,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Use a preconfigured HTTP client (proxies, timeouts).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn wallet(&self) -> &dyn EvmWallet {
        self.wallet.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fourmeme(&self) -> FourMemeClient {
        FourMemeClient::new(self.http.clone(), self.config.fourmeme.api_base.clone())
    }

    pub fn defillama(&self) -> DefiLlamaClient {
        DefiLlamaClient::new(self.http.clone(), self.config.defillama.api_base.clone())
    }

    pub fn coingecko(&self) -> CoingeckoClient {
        CoingeckoClient::new(self.http.clone(), self.config.coingecko.clone())
    }
}

impl std::fmt::Debug for EvmAgentKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmAgentKit")
            .field("address", &self.wallet.address())
            .field("chain_id", &self.wallet.chain_id())
            .finish_non_exhaustive()
    }
}
