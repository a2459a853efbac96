//! Wallet basics: address, balances and transfers.

use super::{parse_address, parse_optional_address, GET_BALANCE, TRANSFER, WALLET_ADDRESS};
use crate::agent::EvmAgentKit;
use crate::contracts::{self, IERC20};
use crate::dispatch::{Action, ActionExample, ActionInput, FieldKind, FieldSpec, InputSchema};
use crate::units::{format_units, parse_amount_f64, to_f64};
use crate::wallet::PreparedTransaction;
use crate::Result;
use alloy::primitives::Bytes;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const NATIVE_DECIMALS: u8 = 18;

pub struct WalletAddressAction;

#[async_trait]
impl Action<EvmAgentKit> for WalletAddressAction {
    fn name(&self) -> &'static str {
        WALLET_ADDRESS
    }

    fn description(&self) -> &'static str {
        "Get the wallet address of the agent"
    }

    fn similes(&self) -> &'static [&'static str] {
        &["wallet address", "address", "wallet"]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({}),
            json!({"address": "0x1234567890123456789012345678901234567890"}),
            "The agent reports its own wallet address.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn handle(&self, ctx: &EvmAgentKit, _input: ActionInput) -> Result<Value> {
        Ok(json!({ "address": ctx.wallet().address().to_checksum(None) }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceArgs {
    token_address: Option<String>,
}

pub struct GetBalanceAction;

#[async_trait]
impl Action<EvmAgentKit> for GetBalanceAction {
    fn name(&self) -> &'static str {
        GET_BALANCE
    }

    fn description(&self) -> &'static str {
        "Get the balance of the agent wallet in the native currency, or in an ERC20 token when a token address is given. Amounts are in UI units."
    }

    fn similes(&self) -> &'static [&'static str] {
        &["check balance", "get wallet balance", "view balance", "token balance"]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new().optional(
            "tokenAddress",
            FieldKind::String,
            "ERC20 token address; omit for the native balance",
        )
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: BalanceArgs = input.parse()?;
        let wallet = ctx.wallet();
        let owner = wallet.address();

        match parse_optional_address("tokenAddress", args.token_address.as_deref())? {
            None => {
                let balance = wallet.native_balance(owner).await?;
                Ok(json!({
                    "balance": to_f64(balance, NATIVE_DECIMALS),
                    "token": "native",
                }))
            }
            Some(token) => {
                let balance = contracts::erc20_balance(wallet, token, owner).await?;
                let decimals = contracts::erc20_decimals(wallet, token).await?;
                Ok(json!({
                    "balance": to_f64(balance, decimals),
                    "token": token.to_checksum(None),
                }))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferArgs {
    to: String,
    amount: f64,
    token_address: Option<String>,
}

pub struct TransferAction;

#[async_trait]
impl Action<EvmAgentKit> for TransferAction {
    fn name(&self) -> &'static str {
        TRANSFER
    }

    fn description(&self) -> &'static str {
        "Transfer the native currency or an ERC20 token from the agent wallet to a recipient."
    }

    fn similes(&self) -> &'static [&'static str] {
        &["send tokens", "transfer funds", "send money", "transfer tokens"]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({"to": "0x8c3f4d1a0a3b7e9c2b6f1d5e4a3c2b1a09f8e7d6", "amount": 0.5}),
            json!({"txHash": "0x5f3c...e1"}),
            "Send 0.5 of the native currency.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
            .required("to", FieldKind::String, "Recipient address")
            .field(
                FieldSpec::required("amount", FieldKind::Number, "Amount in UI units").coercible(),
            )
            .optional(
                "tokenAddress",
                FieldKind::String,
                "ERC20 token address; omit to send the native currency",
            )
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: TransferArgs = input.parse()?;
        let wallet = ctx.wallet();
        let to = parse_address("to", &args.to)?;

        let tx = match parse_optional_address("tokenAddress", args.token_address.as_deref())? {
            None => {
                let value = parse_amount_f64(args.amount, NATIVE_DECIMALS)?;
                PreparedTransaction::call(to, Bytes::new()).with_value(value)
            }
            Some(token) => {
                let decimals = contracts::erc20_decimals(wallet, token).await?;
                let amount = parse_amount_f64(args.amount, decimals)?;
                info!(token = %token, amount = %format_units(amount, decimals), "Preparing ERC20 transfer");
                contracts::transaction(token, IERC20::transferCall { to, amount })
            }
        };

        let tx_hash = wallet.send_transaction(tx).await?;
        info!(to = %to, tx_hash = %tx_hash, "Transfer submitted");
        Ok(json!({ "txHash": tx_hash.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::builtin_registry;
    use crate::config::Config;
    use crate::dispatch::execute;
    use crate::test_support::MockWallet;
    use alloy::primitives::{address, Address, U256};
    use alloy::sol_types::{SolCall, SolValue};
    use std::sync::Arc;

    const TOKEN: Address = address!("55d398326f99059fF775485246999027B3197955");
    const RECIPIENT: &str = "0x1111111111111111111111111111111111111111";

    fn kit(wallet: &Arc<MockWallet>) -> EvmAgentKit {
        EvmAgentKit::new(wallet.clone(), Config::default())
    }

    #[tokio::test]
    async fn reports_checksummed_wallet_address() {
        let wallet = Arc::new(MockWallet::new());
        let registry = builtin_registry().unwrap();

        let envelope = execute(&registry, &kit(&wallet), WALLET_ADDRESS, json!({})).await;
        assert_eq!(
            envelope.result().unwrap()["address"],
            Address::repeat_byte(0xaa).to_checksum(None)
        );
    }

    #[tokio::test]
    async fn native_balance_in_ui_units() {
        let wallet = Arc::new(
            MockWallet::new().with_native_balance(U256::from(1_500_000_000_000_000_000u128)),
        );
        let registry = builtin_registry().unwrap();

        let envelope = execute(&registry, &kit(&wallet), GET_BALANCE, Value::Null).await;
        let result = envelope.result().unwrap();
        assert_eq!(result["balance"], 1.5);
        assert_eq!(result["token"], "native");
    }

    #[tokio::test]
    async fn erc20_balance_uses_token_decimals() {
        let wallet = Arc::new(
            MockWallet::new()
                .with_call(TOKEN, IERC20::decimalsCall::SELECTOR, IERC20::decimalsCall::abi_encode_returns(&6u8))
                .with_call(
                    TOKEN,
                    IERC20::balanceOfCall::SELECTOR,
                    U256::from(2_250_000u64).abi_encode(),
                ),
        );
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit(&wallet),
            GET_BALANCE,
            json!({"tokenAddress": TOKEN.to_string()}),
        )
        .await;
        assert_eq!(envelope.result().unwrap()["balance"], 2.25);
    }

    #[tokio::test]
    async fn native_transfer_sends_value() {
        let wallet = Arc::new(MockWallet::new());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit(&wallet),
            TRANSFER,
            json!({"to": RECIPIENT, "amount": "0.25"}),
        )
        .await;
        assert!(envelope.is_success(), "{:?}", envelope);

        let sent = wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Address::repeat_byte(0x11));
        assert_eq!(sent[0].value, U256::from(250_000_000_000_000_000u128));
        assert!(sent[0].data.is_empty());
    }

    #[tokio::test]
    async fn erc20_transfer_encodes_transfer_call() {
        let wallet = Arc::new(
            MockWallet::new().with_call(TOKEN, IERC20::decimalsCall::SELECTOR, IERC20::decimalsCall::abi_encode_returns(&6u8)),
        );
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit(&wallet),
            TRANSFER,
            json!({"to": RECIPIENT, "amount": 12.5, "tokenAddress": TOKEN.to_string()}),
        )
        .await;
        assert!(envelope.is_success(), "{:?}", envelope);

        let sent = wallet.sent();
        assert_eq!(sent[0].to, TOKEN);
        assert_eq!(sent[0].value, U256::ZERO);
        let call = IERC20::transferCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.to, Address::repeat_byte(0x11));
        assert_eq!(call.amount, U256::from(12_500_000u64));
    }

    #[tokio::test]
    async fn bad_recipient_is_a_failure_envelope() {
        let wallet = Arc::new(MockWallet::new());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit(&wallet),
            TRANSFER,
            json!({"to": "not-an-address", "amount": 1}),
        )
        .await;
        assert!(envelope.message().unwrap().contains("not an address"));
        assert!(wallet.sent().is_empty());
    }
}
