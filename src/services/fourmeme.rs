//! FourMeme launchpad REST API client.
//!
//! Private endpoints need an access token obtained by signing
//! `You are sign in Meme <nonce>` with the agent wallet; the token travels in
//! the `meme-web-access` header.

use crate::wallet::EvmWallet;
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const ACCESS_HEADER: &str = "meme-web-access";
const NETWORK_CODE: &str = "BSC";

/// Category labels accepted by token creation.
pub const TOKEN_LABELS: &[&str] = &[
    "Meme", "AI", "Defi", "Games", "Infra", "De-Sci", "Social", "Depin", "Charity", "Others",
];

pub fn sign_in_message(nonce: &str) -> String {
    format!("You are sign in Meme {}", nonce)
}

/// User-supplied parameters of a new token.
#[derive(Debug, Clone, PartialEq)]
pub struct NewToken {
    pub name: String,
    pub short_name: String,
    pub desc: String,
    /// Image URL as hosted by FourMeme (see [`FourMemeClient::upload_image`]).
    pub img_url: String,
    /// Unix milliseconds.
    pub launch_time: i64,
    pub label: String,
    /// BNB spent on the creator's initial buy.
    pub pre_sale: f64,
    pub web_url: Option<String>,
    pub twitter_url: Option<String>,
    pub telegram_url: Option<String>,
}

/// Signed `createToken` arguments returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTokenArgs {
    pub create_arg: Bytes,
    pub signature: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnedToken {
    pub user_id: Value,
    pub user_name: Option<String>,
    pub token_name: Option<String>,
    pub token_address: String,
    pub short_name: Option<String>,
    pub descr: Option<String>,
    pub image: Option<String>,
    pub increase: Value,
    pub price: Value,
    pub day_increase: Value,
    pub status: Option<String>,
    pub oscar_status: Option<String>,
    pub symbol: Option<String>,
    pub progress: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenPrice {
    pub price: Value,
    pub max_price: Value,
    pub increase: Value,
    pub market_cap: Value,
    pub day_increase: Value,
    pub progress: Value,
    pub trading_usd: Value,
}

impl TokenPrice {
    /// Price in the quote currency; the API sends it as a string or a number.
    pub fn price_f64(&self) -> Option<f64> {
        match &self.price {
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_f64(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketToken {
    pub id: Value,
    pub address: String,
    pub image: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub symbol: Option<String>,
    pub descr: Option<String>,
    pub twitter_url: Option<String>,
    pub telegram_url: Option<String>,
    pub web_url: Option<String>,
    pub launch_time: Value,
    pub user_id: Value,
    pub token_price: TokenPrice,
    pub network_code: Option<String>,
    pub label: Option<String>,
    pub create_date: Value,
    pub dex_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenData {
    create_arg: Option<String>,
    signature: Option<String>,
}

pub struct FourMemeClient {
    http: reqwest::Client,
    base: String,
}

impl FourMemeClient {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn generate_nonce(&self, address: Address) -> Result<String> {
        let response = self
            .http
            .post(self.url("/private/user/nonce/generate"))
            .json(&json!({
                "accountAddress": address.to_checksum(None),
                "verifyType": "LOGIN",
                "networkCode": NETWORK_CODE,
            }))
            .send()
            .await?;
        data(response, "nonce generation").await
    }

    pub async fn login(&self, address: Address, signature: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/private/user/login/dex"))
            .json(&json!({
                "region": "WEB",
                "langType": "EN",
                "loginIp": "",
                "inviteCode": "",
                "verifyInfo": {
                    "address": address.to_checksum(None),
                    "networkCode": NETWORK_CODE,
                    "signature": signature,
                    "verifyType": "LOGIN",
                },
                "walletName": "MetaMask",
            }))
            .send()
            .await?;
        data(response, "login").await
    }

    /// Nonce, signature and login in one go. Returns the access token.
    pub async fn sign_in(&self, wallet: &dyn EvmWallet) -> Result<String> {
        let address = wallet.address();
        let nonce = self.generate_nonce(address).await?;
        let signature = wallet.sign_message(&sign_in_message(&nonce)).await?;
        let token = self.login(address, &signature).await?;
        tracing::debug!(address = %address, "Signed in to FourMeme");
        Ok(token)
    }

    /// Download `image_url` and re-host it on FourMeme. Returns the new URL.
    pub async fn upload_image(&self, access_token: &str, image_url: &str) -> Result<String> {
        let image = self
            .http
            .get(image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let form = Form::new().part("file", Part::bytes(image.to_vec()).file_name("image.png"));
        let response = self
            .http
            .post(self.url("/private/token/upload"))
            .header(ACCESS_HEADER, access_token)
            .multipart(form)
            .send()
            .await?;
        data(response, "image upload").await
    }

    pub async fn create_token(&self, access_token: &str, token: &NewToken) -> Result<CreateTokenArgs> {
        let response = self
            .http
            .post(self.url("/private/token/create"))
            .header(ACCESS_HEADER, access_token)
            .json(&create_token_body(token))
            .send()
            .await?;
        let created: CreateTokenData = data(response, "token creation").await?;

        match (created.create_arg, created.signature) {
            (Some(create_arg), Some(signature)) => Ok(CreateTokenArgs {
                create_arg: parse_hex(&create_arg, "createArg")?,
                signature: parse_hex(&signature, "signature")?,
            }),
            _ => Err(Error::FourMeme(
                "token creation response is missing createArg or signature".to_string(),
            )),
        }
    }

    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo> {
        let response = self
            .http
            .get(self.url("/private/user/info"))
            .header(ACCESS_HEADER, access_token)
            .send()
            .await?;
        data(response, "user info").await
    }

    pub async fn owned_tokens(&self, access_token: &str, user_id: &Value) -> Result<Vec<OwnedToken>> {
        let user_id = match user_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let response = self
            .http
            .get(self.url("/private/user/token/owner/list"))
            .header(ACCESS_HEADER, access_token)
            .query(&[
                ("userId", user_id.as_str()),
                ("orderBy", "CREATE_DATE"),
                ("sorted", "DESC"),
                ("tokenName", ""),
                ("pageIndex", "1"),
                ("pageSize", "300"),
                ("symbol", ""),
            ])
            .send()
            .await?;
        data(response, "token listing").await
    }

    pub async fn trending_tokens(&self) -> Result<Vec<MarketToken>> {
        let response = self
            .http
            .get(self.url("/private/token/query"))
            .query(&[
                ("orderBy", "Hot"),
                ("tokenName", ""),
                ("listedPancake", "false"),
                ("pageIndex", "1"),
                ("pageSize", "30"),
                ("symbol", ""),
                ("labels", ""),
            ])
            .send()
            .await?;
        data(response, "trending tokens").await
    }

    pub async fn token_info(&self, token: Address) -> Result<MarketToken> {
        let response = self
            .http
            .get(self.url("/private/token/get/v2"))
            .query(&[("address", token.to_checksum(None))])
            .send()
            .await?;
        data(response, "token info").await
    }
}

/// Request body for `/private/token/create`. Launch economics are fixed by
/// the platform: 1B supply, 24 BNB raise, 80% sale rate, BNB as raised token.
pub fn create_token_body(token: &NewToken) -> Value {
    let mut body = json!({
        "name": token.name,
        "shortName": token.short_name,
        "desc": token.desc,
        "imgUrl": token.img_url,
        "launchTime": token.launch_time,
        "label": token.label,
        "lpTradingFee": 0.0025,
        "preSale": token.pre_sale,
        "totalSupply": 1_000_000_000u64,
        "raisedAmount": 24,
        "saleRate": 0.8,
        "reserveRate": 0,
        "funGroup": false,
        "clickFun": false,
        "symbol": "BNB",
        "raisedToken": {
            "symbol": "BNB",
            "nativeSymbol": "BNB",
            "symbolAddress": "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c",
            "deployCost": "0",
            "buyFee": "0.01",
            "sellFee": "0.01",
            "minTradeFee": "0",
            "b0Amount": "8",
            "totalBAmount": "24",
            "totalAmount": "1000000000",
            "logoUrl": "https://static.four.meme/market/68b871b6-96f7-408c-b8d0-388d804b34275092658264263839640.png",
            "tradeLevel": ["0.1", "0.5", "1"],
            "status": "PUBLISH",
            "buyTokenLink": "https://pancakeswap.finance/swap",
            "reservedNumber": 10,
            "saleRate": "0.8",
            "networkCode": NETWORK_CODE,
            "platform": "MEME",
        },
    });

    let optional = [
        ("webUrl", &token.web_url),
        ("twitterUrl", &token.twitter_url),
        ("telegramUrl", &token.telegram_url),
    ];
    if let Value::Object(map) = &mut body {
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
    body
}

/// Unwrap the `data` field of a FourMeme response. A missing or null `data`
/// is an error carrying the whole body.
async fn data<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::FourMeme(format!("{} returned HTTP {} with unreadable body: {}", what, status, e)))?;

    match body.get("data") {
        Some(data) if !data.is_null() => serde_json::from_value(data.clone())
            .map_err(|e| Error::FourMeme(format!("{} returned unexpected data: {}", what, e))),
        _ => Err(Error::FourMeme(format!("{} failed: {}", what, body))),
    }
}

fn parse_hex(value: &str, field: &str) -> Result<Bytes> {
    value
        .parse()
        .map_err(|e| Error::FourMeme(format!("{} is not hex: {}", field, e)))
}
