//! FourMeme launchpad actions on BSC.

use super::{
    parse_address, FOURMEME_CREATE_TOKEN, FOURMEME_GET_TOKEN_HOLDINGS,
    FOURMEME_GET_TRENDING_TOKENS, FOURMEME_PURCHASE_TOKEN, FOURMEME_SELL_TOKEN,
};
use crate::agent::EvmAgentKit;
use crate::config::chains;
use crate::contracts::{self, ITokenManager};
use crate::dispatch::{Action, ActionExample, ActionInput, FieldKind, FieldSpec, InputSchema};
use crate::services::fourmeme::{MarketToken, NewToken, OwnedToken, TOKEN_LABELS};
use crate::units::{format_units, parse_amount, parse_amount_f64};
use crate::wallet::EvmWallet;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// FourMeme tokens always have 18 decimals.
const TOKEN_DECIMALS: u8 = 18;

/// BNB kept back from a purchase when computing the minimum output.
const PURCHASE_FEE_BUFFER: f64 = 0.001;

/// Minimum tokens to accept when spending `bnb_amount` at `price` BNB per token.
/// The spend must exceed the fee buffer.
pub fn min_tokens_out(bnb_amount: f64, price: f64) -> Result<U256> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::FourMeme(format!("token price must be positive, got {}", price)));
    }
    if bnb_amount <= PURCHASE_FEE_BUFFER {
        return Err(Error::InvalidArgument(format!(
            "tokenAmount must be greater than {} BNB, got {}",
            PURCHASE_FEE_BUFFER, bnb_amount
        )));
    }
    let expected = (bnb_amount - PURCHASE_FEE_BUFFER) / price;
    parse_amount_f64(expected, TOKEN_DECIMALS)
}

/// Render an API ratio the way FourMeme's UI labels it.
fn percent(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{} * 100%", rendered)
}

fn require_bsc(wallet: &dyn EvmWallet, what: &str) -> Result<()> {
    let chain_id = wallet.chain_id();
    if chain_id != chains::BSC {
        return Err(Error::FourMeme(format!(
            "{} is only supported on BSC mainnet (chainId {}). Current chain: {}",
            what,
            chains::BSC,
            chain_id
        )));
    }
    Ok(())
}

/// A FourMeme token owned by the agent, with its on-chain balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenHolding {
    user_id: Value,
    user_name: Option<String>,
    token_name: Option<String>,
    token_address: String,
    short_name: Option<String>,
    descr: Option<String>,
    image: Option<String>,
    my_token_amount: String,
    increase: String,
    price: Value,
    day_increase: String,
    status: Option<String>,
    oscar_status: Option<String>,
    symbol: Option<String>,
    progress_to_bonding_curve: String,
    #[serde(skip)]
    balance: U256,
}

impl TokenHolding {
    fn new(token: OwnedToken, balance: U256) -> Self {
        Self {
            my_token_amount: format_units(balance, TOKEN_DECIMALS),
            increase: percent(&token.increase),
            day_increase: percent(&token.day_increase),
            progress_to_bonding_curve: percent(&token.progress),
            user_id: token.user_id,
            user_name: token.user_name,
            token_name: token.token_name,
            token_address: token.token_address,
            short_name: token.short_name,
            descr: token.descr,
            image: token.image,
            price: token.price,
            status: token.status,
            oscar_status: token.oscar_status,
            symbol: token.symbol,
            balance,
        }
    }
}

/// Sign in and list the agent's tokens. A token whose balance cannot be read
/// is reported with a zero balance.
async fn token_holdings(ctx: &EvmAgentKit) -> Result<Vec<TokenHolding>> {
    let client = ctx.fourmeme();
    let wallet = ctx.wallet();
    let owner = wallet.address();

    let access = client.sign_in(wallet).await?;
    let user = client.user_info(&access).await?;
    let owned = client.owned_tokens(&access, &user.user_id).await?;

    let lookups = owned.into_iter().map(move |token| async move {
        let balance = match parse_address("tokenAddress", &token.token_address) {
            Ok(address) => contracts::erc20_balance(wallet, address, owner).await,
            Err(e) => Err(e),
        };
        let balance = balance.unwrap_or_else(|e| {
            warn!(token = %token.token_address, error = %e, "Could not read token balance");
            U256::ZERO
        });
        TokenHolding::new(token, balance)
    });

    Ok(join_all(lookups).await)
}

fn trending_entry(token: &MarketToken) -> Value {
    let price = &token.token_price;
    json!({
        "id": token.id,
        "tokenAddress": token.address,
        "image": token.image,
        "name": token.name,
        "shortName": token.short_name,
        "symbol": token.symbol,
        "descr": token.descr,
        "twitterUrl": token.twitter_url,
        "telegramUrl": token.telegram_url,
        "webUrl": token.web_url,
        "launchTime": token.launch_time,
        "userId": token.user_id,
        "tokenPrice": {
            "price": price.price,
            "maxPrice": price.max_price,
            "increasePercent": price.increase,
            "marketCapInNetworkCode": price.market_cap,
            "dayIncreasePercent": price.day_increase,
            "progressToBondingCurvePercent": price.progress,
            "tradingVolumeUsd": price.trading_usd,
        },
        "networkCode": token.network_code,
        "label": token.label,
        "createDate": token.create_date,
        "dexType": token.dex_type,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenArgs {
    bnb_amount: f64,
    name: String,
    short_name: String,
    desc: String,
    img_url: String,
    launch_time_from_now: f64,
    label: String,
    web_url: Option<String>,
    twitter_url: Option<String>,
    telegram_url: Option<String>,
}

pub struct FourMemeCreateTokenAction;

#[async_trait]
impl Action<EvmAgentKit> for FourMemeCreateTokenAction {
    fn name(&self) -> &'static str {
        FOURMEME_CREATE_TOKEN
    }

    fn description(&self) -> &'static str {
        "Creates a new token on FourMeme. Requires BNB amount, token name, short name, description, image URL, launch time, and category label. Optional fields include website URL, Twitter URL, and Telegram URL. If the required fields are not provided, ask the user for them before proceeding. Convert the requested launch time to seconds from now. Double check everything with the user and have them confirm before proceeding."
    }

    fn similes(&self) -> &'static [&'static str] {
        &["create token", "fourmeme", "make token", "fourmeme create token"]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({
                "bnbAmount": 0.1,
                "name": "My Token",
                "shortName": "MTK",
                "desc": "My Token is a token on the Binance Smart Chain.",
                "imgUrl": "https://example.com/mytoken.png",
                "launchTimeFromNow": 120,
                "label": "Meme",
            }),
            json!({"txHash": "0x3b9d...7a"}),
            "Create 'My Token' (MTK) with a 0.1 BNB initial buy, launching two minutes from now.",
        )]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
            .field(
                FieldSpec::required(
                    "bnbAmount",
                    FieldKind::Number,
                    "Amount of BNB used for the initial purchase of the token",
                )
                .coercible(),
            )
            .required("name", FieldKind::String, "Full name of the token")
            .required("shortName", FieldKind::String, "Short name/symbol of the token")
            .required("desc", FieldKind::String, "Description of the token")
            .required("imgUrl", FieldKind::String, "URL to the token's image")
            .field(
                FieldSpec::required(
                    "launchTimeFromNow",
                    FieldKind::Number,
                    "Seconds from now until the token launches",
                )
                .coercible(),
            )
            .required(
                "label",
                FieldKind::one_of(TOKEN_LABELS),
                "Category label for the token",
            )
            .optional("webUrl", FieldKind::String, "Website URL")
            .optional("twitterUrl", FieldKind::String, "Twitter profile URL")
            .optional("telegramUrl", FieldKind::String, "Telegram group URL")
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: CreateTokenArgs = input.parse()?;
        let wallet = ctx.wallet();
        require_bsc(wallet, "token creation")?;

        if args.launch_time_from_now < 0.0 {
            return Err(Error::InvalidArgument(
                "launchTimeFromNow must not be negative".to_string(),
            ));
        }
        let value = parse_amount_f64(args.bnb_amount, TOKEN_DECIMALS)?;
        let launch_time =
            chrono::Utc::now().timestamp_millis() + (args.launch_time_from_now * 1000.0) as i64;

        let client = ctx.fourmeme();
        let access = client.sign_in(wallet).await?;
        let img_url = client.upload_image(&access, &args.img_url).await?;
        debug!(img_url = %img_url, "Uploaded token image");

        let token = NewToken {
            name: args.name,
            short_name: args.short_name,
            desc: args.desc,
            img_url,
            launch_time,
            label: args.label,
            pre_sale: args.bnb_amount,
            web_url: args.web_url,
            twitter_url: args.twitter_url,
            telegram_url: args.telegram_url,
        };
        let signed = client.create_token(&access, &token).await?;

        let manager = ctx.config().fourmeme.token_manager;
        let tx = contracts::transaction(
            manager,
            ITokenManager::createTokenCall {
                args: signed.create_arg,
                signature: signed.signature,
            },
        )
        .with_value(value);
        let tx_hash = wallet.send_transaction(tx).await?;
        info!(name = %token.name, tx_hash = %tx_hash, "FourMeme token creation submitted");

        Ok(json!({ "txHash": tx_hash.to_string() }))
    }
}

pub struct FourMemeGetTokenHoldingsAction;

#[async_trait]
impl Action<EvmAgentKit> for FourMemeGetTokenHoldingsAction {
    fn name(&self) -> &'static str {
        FOURMEME_GET_TOKEN_HOLDINGS
    }

    fn description(&self) -> &'static str {
        "Retrieves all token listings held by the current user on the FourMeme platform. Always show the full token address, token name, token symbol, description, my token amount, total increase percent, day increase percent, and progress to bonding curve."
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "get my token holdings",
            "fourmeme get my token holdings",
            "get my tokens",
            "fourmeme get my tokens",
        ]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn handle(&self, ctx: &EvmAgentKit, _input: ActionInput) -> Result<Value> {
        let tokens = token_holdings(ctx).await?;
        Ok(json!({ "tokens": tokens }))
    }
}

pub struct FourMemeGetTrendingTokensAction;

#[async_trait]
impl Action<EvmAgentKit> for FourMemeGetTrendingTokensAction {
    fn name(&self) -> &'static str {
        FOURMEME_GET_TRENDING_TOKENS
    }

    fn description(&self) -> &'static str {
        "Retrieves the latest trending tokens on the FourMeme platform. Always show the full token address, token name, token symbol, description, current price and market cap."
    }

    fn similes(&self) -> &'static [&'static str] {
        &["get trending tokens", "fourmeme get trending tokens"]
    }

    fn schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn handle(&self, ctx: &EvmAgentKit, _input: ActionInput) -> Result<Value> {
        let tokens = ctx.fourmeme().trending_tokens().await?;
        let trending: Vec<Value> = tokens.iter().map(trending_entry).collect();
        Ok(json!({ "trendingTokens": trending }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeArgs {
    token_address: String,
    token_amount: String,
}

fn trade_schema(amount_description: &'static str) -> InputSchema {
    InputSchema::new()
        .required("tokenAddress", FieldKind::String, "Address of the FourMeme token")
        .required("tokenAmount", FieldKind::String, amount_description)
}

pub struct FourMemePurchaseTokenAction;

#[async_trait]
impl Action<EvmAgentKit> for FourMemePurchaseTokenAction {
    fn name(&self) -> &'static str {
        FOURMEME_PURCHASE_TOKEN
    }

    fn description(&self) -> &'static str {
        "Purchases a token on the FourMeme platform, spending the given amount of BNB. Always confirm the token address and amount with the user before purchasing. The token address must be a valid FourMeme token address."
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "purchase token",
            "fourmeme purchase token",
            "buy token",
            "fourmeme buy token",
        ]
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample::new(
            json!({"tokenAddress": "0x1234567890123456789012345678901234567890", "tokenAmount": "0.05"}),
            json!({"txHash": "0x8e21...c4"}),
            "Spend 0.05 BNB on the token at 0x1234...7890.",
        )]
    }

    fn schema(&self) -> InputSchema {
        trade_schema("Amount of BNB to spend")
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: TradeArgs = input.parse()?;
        let wallet = ctx.wallet();
        let token = parse_address("tokenAddress", &args.token_address)?;

        let funds = parse_amount(&args.token_amount, TOKEN_DECIMALS)?;
        let bnb_amount: f64 = args.token_amount.trim().parse().map_err(|e| {
            Error::InvalidArgument(format!("tokenAmount '{}': {}", args.token_amount, e))
        })?;

        let info = ctx.fourmeme().token_info(token).await?;
        match info.symbol.as_deref() {
            Some("BNB") => {}
            other => {
                return Err(Error::FourMeme(format!(
                    "Only BNB is supported at this time; token is quoted in {}",
                    other.unwrap_or("an unknown currency")
                )))
            }
        }
        let price = info
            .token_price
            .price_f64()
            .ok_or_else(|| Error::FourMeme(format!("token info for {} has no price", token)))?;
        let min_amount = min_tokens_out(bnb_amount, price)?;

        let manager = ctx.config().fourmeme.token_manager;
        let tx = contracts::transaction(
            manager,
            ITokenManager::buyTokenAMAPCall {
                token,
                funds,
                minAmount: min_amount,
            },
        )
        .with_value(funds);
        let tx_hash = wallet.send_transaction(tx).await?;
        info!(token = %token, bnb = %args.token_amount, tx_hash = %tx_hash, "FourMeme purchase submitted");

        Ok(json!({ "txHash": tx_hash.to_string() }))
    }
}

pub struct FourMemeSellTokenAction;

#[async_trait]
impl Action<EvmAgentKit> for FourMemeSellTokenAction {
    fn name(&self) -> &'static str {
        FOURMEME_SELL_TOKEN
    }

    fn description(&self) -> &'static str {
        "Sells a token on the FourMeme platform. Always confirm the token address and amount with the user before selling. The token address must be a valid FourMeme token address. If no token address is provided, call FOURMEME_GET_TOKEN_HOLDINGS first."
    }

    fn similes(&self) -> &'static [&'static str] {
        &[
            "sell token",
            "fourmeme sell token",
            "sell my token",
            "fourmeme sell my token",
        ]
    }

    fn schema(&self) -> InputSchema {
        trade_schema("Amount of tokens to sell")
    }

    async fn handle(&self, ctx: &EvmAgentKit, input: ActionInput) -> Result<Value> {
        let args: TradeArgs = input.parse()?;
        let wallet = ctx.wallet();
        let token = parse_address("tokenAddress", &args.token_address)?;
        let amount = parse_amount(&args.token_amount, TOKEN_DECIMALS)?;

        let holdings = token_holdings(ctx).await?;
        let holding = holdings
            .iter()
            .find(|h| h.token_address.trim().parse::<Address>().ok() == Some(token))
            .ok_or_else(|| Error::FourMeme(format!("Token {} not found in holdings", token)))?;

        if holding.balance < amount {
            return Err(Error::FourMeme(format!(
                "Token amount is less than the amount to sell: holding {}, selling {}",
                holding.my_token_amount,
                args.token_amount.trim()
            )));
        }

        let manager = ctx.config().fourmeme.token_manager;
        contracts::approve(wallet, token, manager, amount).await?;

        let tx = contracts::transaction(manager, ITokenManager::sellTokenCall { token, amount });
        let tx_hash = wallet.send_transaction(tx).await?;
        info!(token = %token, amount = %args.token_amount, tx_hash = %tx_hash, "FourMeme sale submitted");

        Ok(json!({ "txHash": tx_hash.to_string() }))
    }
}
