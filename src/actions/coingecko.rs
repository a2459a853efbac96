use super::COINGECKO_TRENDING_TOKENS;
use crate::agent::EvmAgentKit;
use crate::dispatch::{Action, ActionExample, ActionInput, InputSchema};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct CoingeckoTrendingTokensAction;

#[async_trait]
impl Action<EvmAgentKit> for CoingeckoTrendingTokensAction {
    fn name(&self) -> &'static str {
        COINGECKO_TRENDING_TOKENS
    }

    fn description(&self) -> &'static str {
        "Get the trending tokens on Coingecko"
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "Get the trending tokens on Coingecko",
            "get me a list of the trending tokens on coingecko",
            "what are the trending tokens on coingecko",
        ]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({}),
            json!({
                "coins": [{"item": {"id": "gala", "name": "GALA", "symbol": "GALA", "market_cap_rank": 53}}],
                "nfts": [],
                "categories": [{"id": 251, "name": "Meme Coins", "slug": "meme-coins"}],
            }),
            "Trending coins, NFTs and categories on Coingecko.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn handle(&self, ctx: &EvmAgentKit, _input: ActionInput) -> Result<Value> {
        ctx.coingecko().trending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::builtin_registry;
    use crate::config::Config;
    use crate::dispatch::execute;
    use crate::test_support::{route, MockWallet, StubServer};
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_trending_payload_unchanged() {
        let payload = json!({"coins": [{"item": {"id": "moon-tropica"}}], "nfts": [], "categories": []});
        let server =
            StubServer::start(vec![route("GET", "/search/trending", 200, payload.clone())]).await;
        let mut config = Config::default();
        config.coingecko.api_base = server.base();
        let kit = EvmAgentKit::new(Arc::new(MockWallet::new()), config);
        let registry = builtin_registry().unwrap();

        let envelope = execute(&registry, &kit, COINGECKO_TRENDING_TOKENS, json!({})).await;
        assert_eq!(envelope.result(), Some(&payload));
    }
}
