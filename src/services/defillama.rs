//! DeFiLlama TVL lookups with fuzzy protocol-name matching.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Candidates tried per lookup.
const MAX_SLUG_MATCHES: usize = 3;
const MIN_SIMILARITY: f64 = 0.75;

/// Well-known slugs, used when `/protocols` cannot be fetched.
pub const PROTOCOL_SLUGS: &[&str] = &[
    "aave", "aave-v2", "aave-v3", "lido", "eigenlayer", "ether.fi", "ethena", "makerdao",
    "sky", "spark", "uniswap", "uniswap-v2", "uniswap-v3", "uniswap-v4", "pancakeswap",
    "pancakeswap-amm", "pancakeswap-amm-v3", "venus", "venus-core-pool", "compound",
    "compound-v2", "compound-v3", "curve-dex", "convex-finance", "rocket-pool", "jito",
    "marinade-finance", "jupiter", "raydium", "orca", "kamino", "morpho", "morpho-blue",
    "pendle", "gmx", "gmx-v2", "hyperliquid", "dydx", "balancer", "balancer-v2", "sushi",
    "sushiswap", "yearn-finance", "frax", "frax-ether", "instadapp", "summer.fi",
    "stargate", "stargate-v2", "across", "arbitrum-bridge", "polygon-bridge", "binance-staked-eth",
    "coinbase-wrapped-staked-eth", "mantle-staked-eth", "kelp-dao", "renzo", "puffer-finance",
    "swell-liquid-staking", "stader", "lista-dao", "lista-lending", "alpaca-finance",
    "thena", "biswap", "apeswap", "four.meme", "liquity", "liquity-v2", "fluid", "euler",
    "euler-v2", "silo-finance", "radiant-v2", "benqi-lending", "trader-joe", "velodrome",
    "aerodrome", "camelot", "quickswap", "beefy", "ondo-finance", "maple", "centrifuge",
    "ethena-usde", "usual", "babylon", "solv-protocol", "bedrock", "lombard",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolTvl {
    pub tvl: f64,
    pub protocol_name: String,
}

#[derive(Debug, Deserialize)]
struct ProtocolEntry {
    slug: Option<String>,
}

/// Up to three of `slugs` resembling `query`, best first.
pub fn match_protocol_slugs<S: AsRef<str>>(query: &str, slugs: &[S]) -> Vec<String> {
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, f64)> = slugs
        .iter()
        .map(|slug| slug.as_ref())
        .map(|slug| (slug, similarity(&needle, slug)))
        .filter(|(_, score)| *score >= MIN_SIMILARITY)
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.len().cmp(&b.0.len()))
    });
    scored
        .into_iter()
        .take(MAX_SLUG_MATCHES)
        .map(|(slug, _)| slug.to_string())
        .collect()
}

fn normalize(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn similarity(needle: &str, slug: &str) -> f64 {
    if needle == slug {
        return 1.0;
    }
    let fuzzy = strsim::jaro_winkler(needle, slug);
    if slug.starts_with(needle) || needle.starts_with(slug) {
        // prefix hits rank just below exact ones
        fuzzy.max(0.9)
    } else {
        fuzzy
    }
}

pub struct DefiLlamaClient {
    http: reqwest::Client,
    base: String,
}

impl DefiLlamaClient {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Current TVL in USD for an exact slug.
    pub async fn tvl(&self, slug: &str) -> Result<f64> {
        let response = self
            .http
            .get(format!("{}/tvl/{}", self.base, slug))
            .send()
            .await?
            .error_for_status()?;
        let value: serde_json::Value = response.json().await?;
        value
            .as_f64()
            .ok_or_else(|| Error::DefiLlama(format!("unexpected TVL payload for {}: {}", slug, value)))
    }

    /// Every protocol slug DeFiLlama lists.
    pub async fn protocol_slugs(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/protocols", self.base))
            .send()
            .await?
            .error_for_status()?;
        let protocols: Vec<ProtocolEntry> = response.json().await?;
        Ok(protocols.into_iter().filter_map(|p| p.slug).collect())
    }

    async fn candidate_slugs(&self) -> Vec<String> {
        match self.protocol_slugs().await {
            Ok(slugs) if !slugs.is_empty() => slugs,
            Ok(_) => {
                tracing::warn!("DeFiLlama returned no protocols, using built-in slug list");
                PROTOCOL_SLUGS.iter().map(|s| s.to_string()).collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch DeFiLlama protocols, using built-in slug list");
                PROTOCOL_SLUGS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Resolve `query` against the listed protocols and return the first
    /// matching slug DeFiLlama answers a TVL for.
    pub async fn protocol_tvl(&self, query: &str) -> Result<ProtocolTvl> {
        let slugs = self.candidate_slugs().await;
        let candidates = match_protocol_slugs(query, &slugs);
        if candidates.is_empty() {
            return Err(Error::DefiLlama(format!(
                "No matching protocol slugs found for '{}'",
                query
            )));
        }

        let mut last_error = None;
        for slug in candidates {
            match self.tvl(&slug).await {
                Ok(tvl) => {
                    tracing::debug!(query, slug = %slug, tvl, "Resolved protocol TVL");
                    return Ok(ProtocolTvl {
                        tvl,
                        protocol_name: slug,
                    });
                }
                Err(e) => {
                    tracing::debug!(slug = %slug, error = %e, "TVL lookup failed, trying next match");
                    last_error = Some(e);
                }
            }
        }

        Err(Error::DefiLlama(format!(
            "Failed to fetch TVL data for any matching protocol slug: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}
