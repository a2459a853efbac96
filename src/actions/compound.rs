//! Compound III (Comet) supply on the Ethereum mainnet USDC market.

use super::COMPOUND_SUPPLY;
use crate::agent::EvmAgentKit;
use crate::config::chains;
use crate::contracts::{self, view, IComet};
use crate::dispatch::{Action, ActionExample, ActionInput, FieldKind, InputSchema};
use crate::units::{format_units, parse_amount, to_f64};
use crate::wallet::EvmWallet;
use crate::{Error, Result};
use alloy::primitives::{address, Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

pub const COMET_USDC: Address = address!("c3d688B66703497DAA19211EEdff47f25384cdc3");

const ASSETS: &[(&str, Address)] = &[
    ("weth", address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
    ("cbbtc", address!("cbB7C0000aB88B473b1f5aFd9ef808440eed33Bf")),
    ("wsteth", address!("7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0")),
    ("usdc", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
];

/// Comet prices carry eight decimals.
const PRICE_DECIMALS: u8 = 8;
const FACTOR_SCALE: f64 = 1e18;

fn asset_address(asset_id: &str) -> Option<Address> {
    ASSETS
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(asset_id))
        .map(|(_, address)| *address)
}

/// One collateral asset held in a Comet market.
#[derive(Debug, Clone, PartialEq)]
pub struct CollateralPosition {
    pub balance: U256,
    /// `10^decimals` of the collateral asset.
    pub scale: u64,
    pub price: U256,
    pub borrow_collateral_factor: u64,
}

/// Borrow-factor-weighted collateral value over borrowed value. Infinite when
/// nothing is borrowed.
pub fn health_ratio(
    collateral: &[CollateralPosition],
    borrow: U256,
    base_decimals: u8,
    base_price: U256,
) -> f64 {
    let borrow_value = to_f64(borrow, base_decimals) * to_f64(base_price, PRICE_DECIMALS);
    if borrow_value == 0.0 {
        return f64::INFINITY;
    }

    let collateral_value: f64 = collateral
        .iter()
        .filter(|p| p.scale > 0)
        .map(|p| {
            let amount = to_f64(p.balance, 0) / p.scale as f64;
            let price = to_f64(p.price, PRICE_DECIMALS);
            amount * price * (p.borrow_collateral_factor as f64 / FACTOR_SCALE)
        })
        .sum();

    collateral_value / borrow_value
}

fn format_health(ratio: f64) -> String {
    if ratio.is_infinite() {
        "Infinity".to_string()
    } else {
        format!("{:.2}", ratio)
    }
}

async fn current_health(wallet: &dyn EvmWallet, comet: Address) -> Result<f64> {
    let account = wallet.address();

    let borrow = view(wallet, comet, IComet::borrowBalanceOfCall { account }).await?;
    if borrow.is_zero() {
        return Ok(f64::INFINITY);
    }

    let mut collateral = Vec::new();
    let num_assets = view(wallet, comet, IComet::numAssetsCall {}).await?;
    for i in 0..num_assets {
        let info = view(wallet, comet, IComet::getAssetInfoCall { i }).await?;
        let balance = view(
            wallet,
            comet,
            IComet::collateralBalanceOfCall {
                account,
                asset: info.asset,
            },
        )
        .await?;
        if balance == 0 {
            continue;
        }
        let price = view(
            wallet,
            comet,
            IComet::getPriceCall {
                priceFeed: info.priceFeed,
            },
        )
        .await?;
        collateral.push(CollateralPosition {
            balance: U256::from(balance),
            scale: info.scale,
            price,
            borrow_collateral_factor: info.borrowCollateralFactor,
        });
    }

    let base_token = view(wallet, comet, IComet::baseTokenCall {}).await?;
    let base_decimals = contracts::erc20_decimals(wallet, base_token).await?;
    let base_feed = view(wallet, comet, IComet::baseTokenPriceFeedCall {}).await?;
    let base_price = view(wallet, comet, IComet::getPriceCall { priceFeed: base_feed }).await?;

    Ok(health_ratio(&collateral, borrow, base_decimals, base_price))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupplyArgs {
    asset_id: String,
    amount: String,
}

pub struct CompoundSupplyAction;

#[async_trait]
impl Action<EvmAgentKit> for CompoundSupplyAction {
    fn name(&self) -> &'static str {
        COMPOUND_SUPPLY
    }

    fn description(&self) -> &'static str {
        "Supply a token to the Compound protocol. The token must be an approved collateral asset for the Compound market."
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "supply compound",
            "supply compound token",
            "supply token to compound",
            "deposit collateral on compound",
        ]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({"assetId": "usdc", "amount": "1"}),
            json!({
                "supplyBalance": "1",
                "tokenSymbol": "USDC",
                "tokenDecimals": 6,
                "txHash": "0x9a1c...04",
                "healthRatio": {"before": "Infinity", "after": "Infinity"},
            }),
            "Supply 1 USDC to Compound.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
            .required(
                "assetId",
                FieldKind::one_of(&["weth", "cbbtc", "wsteth", "usdc"]),
                "The asset to supply",
            )
            .required("amount", FieldKind::String, "The amount of tokens to supply")
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: SupplyArgs = input.parse()?;
        let wallet = ctx.wallet();

        let chain_id = wallet.chain_id();
        if chain_id != chains::ETHEREUM {
            return Err(Error::Compound(format!(
                "supply is only supported on Ethereum mainnet (chainId {}). Current chain: {}",
                chains::ETHEREUM,
                chain_id
            )));
        }

        let asset = asset_address(&args.asset_id).ok_or_else(|| {
            Error::Compound(format!("Token address undefined for assetId {}", args.asset_id))
        })?;

        let decimals = contracts::erc20_decimals(wallet, asset).await?;
        let amount = parse_amount(&args.amount, decimals)?;

        let balance = contracts::erc20_balance(wallet, asset, wallet.address()).await?;
        if balance < amount {
            return Err(Error::Compound(format!(
                "Insufficient balance. You have {}, but trying to supply {}",
                format_units(balance, decimals),
                args.amount.trim()
            )));
        }

        let health_before = current_health(wallet, COMET_USDC).await?;
        debug!(asset = %asset, health = health_before, "Health ratio before supply");

        contracts::approve(wallet, asset, COMET_USDC, amount).await?;

        let tx = contracts::transaction(COMET_USDC, IComet::supplyCall { asset, amount });
        let tx_hash = wallet.send_transaction(tx).await?;
        wallet.wait_for_receipt(tx_hash).await?;
        info!(asset = %asset, tx_hash = %tx_hash, "Supplied to Compound");

        let health_after = current_health(wallet, COMET_USDC).await?;
        let symbol = contracts::erc20_symbol(wallet, asset).await?;

        Ok(json!({
            "supplyBalance": format_units(amount, decimals),
            "tokenSymbol": symbol,
            "tokenDecimals": decimals,
            "txHash": tx_hash.to_string(),
            "healthRatio": {
                "before": format_health(health_before),
                "after": format_health(health_after),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::builtin_registry;
    use crate::config::Config;
    use crate::contracts::IERC20;
    use crate::dispatch::execute;
    use crate::test_support::MockWallet;
    use alloy::sol_types::{SolCall, SolValue};
    use std::sync::Arc;

    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    fn usdc_wallet(balance: u64) -> MockWallet {
        MockWallet::new()
            .with_chain_id(chains::ETHEREUM)
            .with_call(USDC, IERC20::decimalsCall::SELECTOR, IERC20::decimalsCall::abi_encode_returns(&6u8))
            .with_call(USDC, IERC20::balanceOfCall::SELECTOR, U256::from(balance).abi_encode())
            .with_call(USDC, IERC20::symbolCall::SELECTOR, "USDC".to_string().abi_encode())
            .with_call(COMET_USDC, IComet::borrowBalanceOfCall::SELECTOR, U256::ZERO.abi_encode())
    }

    #[test]
    fn health_ratio_weights_collateral_by_borrow_factor() {
        // 2 WETH at 3000 with a 0.9 factor against 2700 USDC borrowed
        let collateral = [CollateralPosition {
            balance: U256::from(2_000_000_000_000_000_000u128),
            scale: 1_000_000_000_000_000_000,
            price: U256::from(300_000_000_000u64),
            borrow_collateral_factor: 900_000_000_000_000_000,
        }];
        let ratio = health_ratio(
            &collateral,
            U256::from(2_700_000_000u64),
            6,
            U256::from(100_000_000u64),
        );
        assert!((ratio - 2.0).abs() < 1e-9, "{}", ratio);
    }

    #[test]
    fn no_borrow_is_infinitely_healthy() {
        let ratio = health_ratio(&[], U256::ZERO, 6, U256::from(100_000_000u64));
        assert!(ratio.is_infinite());
        assert_eq!(format_health(ratio), "Infinity");
        assert_eq!(format_health(1.23456), "1.23");
    }

    #[tokio::test]
    async fn supplies_after_approval() {
        let wallet = Arc::new(usdc_wallet(5_000_000));
        let kit = EvmAgentKit::new(wallet.clone(), Config::default());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit,
            COMPOUND_SUPPLY,
            json!({"assetId": "usdc", "amount": "1.5"}),
        )
        .await;
        let result = envelope.result().expect("supply should succeed");
        assert_eq!(result["supplyBalance"], "1.5");
        assert_eq!(result["tokenSymbol"], "USDC");
        assert_eq!(result["tokenDecimals"], 6);
        assert_eq!(result["healthRatio"]["before"], "Infinity");

        let sent = wallet.sent();
        assert_eq!(sent.len(), 2);
        let approval = IERC20::approveCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(approval.spender, COMET_USDC);
        assert_eq!(approval.amount, U256::from(1_500_000u64));
        assert_eq!(sent[1].to, COMET_USDC);
        let supply = IComet::supplyCall::abi_decode(&sent[1].data).unwrap();
        assert_eq!(supply.asset, USDC);
        assert_eq!(wallet.receipts_awaited(), 2);
    }

    #[tokio::test]
    async fn insufficient_balance_sends_nothing() {
        let wallet = Arc::new(usdc_wallet(5_000_000));
        let kit = EvmAgentKit::new(wallet.clone(), Config::default());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit,
            COMPOUND_SUPPLY,
            json!({"assetId": "usdc", "amount": "10"}),
        )
        .await;
        assert!(envelope
            .message()
            .unwrap()
            .contains("Insufficient balance. You have 5, but trying to supply 10"));
        assert!(wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn rejects_other_chains() {
        let wallet = Arc::new(usdc_wallet(5_000_000).with_chain_id(chains::BSC));
        let kit = EvmAgentKit::new(wallet.clone(), Config::default());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit,
            COMPOUND_SUPPLY,
            json!({"assetId": "usdc", "amount": "1"}),
        )
        .await;
        assert!(envelope.message().unwrap().contains("only supported on Ethereum mainnet"));
    }

    #[tokio::test]
    async fn unknown_asset_fails_validation() {
        let wallet = Arc::new(usdc_wallet(0));
        let kit = EvmAgentKit::new(wallet.clone(), Config::default());
        let registry = builtin_registry().unwrap();

        let envelope = execute(
            &registry,
            &kit,
            COMPOUND_SUPPLY,
            json!({"assetId": "dai", "amount": "1"}),
        )
        .await;
        assert_eq!(
            envelope.message(),
            Some("field assetId: expected enum member of {weth,cbbtc,wsteth,usdc}, got 'dai'")
        );
    }
    #[tokio::test]
    async fn health_ratio_reads_collateral_and_prices_when_borrowed() {
        const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        let weth_feed = Address::repeat_byte(0x11);
        let usdc_feed = Address::repeat_byte(0x22);
        let account = MockWallet::new().address();

        let weth_info = IComet::AssetInfo {
            offset: 0,
            asset: WETH,
            priceFeed: weth_feed,
            scale: 1_000_000_000_000_000_000,
            borrowCollateralFactor: 900_000_000_000_000_000,
            liquidateCollateralFactor: 950_000_000_000_000_000,
            liquidationFactor: 930_000_000_000_000_000,
            supplyCap: 100_000_000_000_000_000_000_000,
        };

        // 2 WETH at $3000 with a 0.9 borrow factor against 2700 USDC borrowed
        let wallet = MockWallet::new()
            .with_chain_id(chains::ETHEREUM)
            .with_call(USDC, IERC20::decimalsCall::SELECTOR, IERC20::decimalsCall::abi_encode_returns(&6u8))
            .with_call(USDC, IERC20::balanceOfCall::SELECTOR, U256::from(5_000_000u64).abi_encode())
            .with_call(USDC, IERC20::symbolCall::SELECTOR, "USDC".to_string().abi_encode())
            .with_call(
                COMET_USDC,
                IComet::borrowBalanceOfCall::SELECTOR,
                U256::from(2_700_000_000u64).abi_encode(),
            )
            .with_call(COMET_USDC, IComet::numAssetsCall::SELECTOR, IComet::numAssetsCall::abi_encode_returns(&1u8))
            .with_call(
                COMET_USDC,
                IComet::getAssetInfoCall::SELECTOR,
                IComet::getAssetInfoCall::abi_encode_returns(&weth_info),
            )
            .with_exact_call(
                COMET_USDC,
                SolCall::abi_encode(&IComet::collateralBalanceOfCall { account, asset: WETH }),
                IComet::collateralBalanceOfCall::abi_encode_returns(&2_000_000_000_000_000_000u128),
            )
            .with_exact_call(
                COMET_USDC,
                SolCall::abi_encode(&IComet::getPriceCall { priceFeed: weth_feed }),
                U256::from(300_000_000_000u64).abi_encode(),
            )
            .with_call(COMET_USDC, IComet::baseTokenCall::SELECTOR, USDC.abi_encode())
            .with_call(COMET_USDC, IComet::baseTokenPriceFeedCall::SELECTOR, usdc_feed.abi_encode())
            .with_exact_call(
                COMET_USDC,
                SolCall::abi_encode(&IComet::getPriceCall { priceFeed: usdc_feed }),
                U256::from(100_000_000u64).abi_encode(),
            );

        let ratio = current_health(&wallet, COMET_USDC).await.unwrap();
        assert!((ratio - 2.0).abs() < 1e-9, "{}", ratio);

        let wallet = Arc::new(wallet);
        let kit = EvmAgentKit::new(wallet.clone(), Config::default());
        let registry = builtin_registry().unwrap();
        let envelope = execute(
            &registry,
            &kit,
            COMPOUND_SUPPLY,
            json!({"assetId": "usdc", "amount": "1"}),
        )
        .await;
        let result = envelope.result().expect("supply should succeed");
        assert_eq!(result["healthRatio"], json!({"before": "2.00", "after": "2.00"}));
    }
}
