//! CoinGecko market data.

use crate::config::CoingeckoConfig;
use crate::Result;
use secrecy::ExposeSecret;
use serde_json::Value;

const PRO_KEY_HEADER: &str = "x-cg-pro-api-key";

pub struct CoingeckoClient {
    http: reqwest::Client,
    config: CoingeckoConfig,
}

impl CoingeckoClient {
    pub fn new(http: reqwest::Client, config: CoingeckoConfig) -> Self {
        Self { http, config }
    }

    /// Trending coins, NFTs and categories as returned by `/search/trending`.
    /// Uses the pro API when a key is configured.
    pub async fn trending(&self) -> Result<Value> {
        let request = match &self.config.api_key {
            Some(key) => self
                .http
                .get(format!("{}/search/trending", self.config.pro_api_base))
                .header(PRO_KEY_HEADER, key.expose_secret()),
            None => self
                .http
                .get(format!("{}/search/trending", self.config.api_base)),
        };

        let trending = request.send().await?.error_for_status()?.json().await?;
        Ok(trending)
    }
}
