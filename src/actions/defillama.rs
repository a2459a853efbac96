use super::DEFILLAMA_GET_PROTOCOL_TVL;
use crate::agent::EvmAgentKit;
use crate::dispatch::{Action, ActionExample, ActionInput, FieldKind, InputSchema};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TvlArgs {
    protocol_name: String,
}

pub struct ProtocolTvlAction;

#[async_trait]
impl Action<EvmAgentKit> for ProtocolTvlAction {
    fn name(&self) -> &'static str {
        DEFILLAMA_GET_PROTOCOL_TVL
    }

    fn description(&self) -> &'static str {
        "Fetches the Total Value Locked (TVL) for a protocol using the DeFiLlama API. The protocol name is matched against DeFiLlama protocol identifiers."
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "get protocol tvl",
            "fetch protocol tvl",
            "check protocol tvl",
            "get total value locked",
            "fetch total value locked",
        ]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({"protocolName": "aave-v3"}),
            json!({"tvl": 1234567890.5, "protocolName": "aave-v3"}),
            "Current TVL of Aave V3 in USD.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new().required(
            "protocolName",
            FieldKind::String,
            "Protocol name or DeFiLlama identifier (e.g. 'aave-v3', 'uniswap-v3')",
        )
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: TvlArgs = input.parse()?;
        let tvl = ctx.defillama().protocol_tvl(&args.protocol_name).await?;
        Ok(serde_json::to_value(tvl)?)
    }
}
