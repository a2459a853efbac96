//! Built-in actions over [`EvmAgentKit`].
//!
//! Each action is a unit struct implementing [`Action`](crate::dispatch::Action);
//! [`builtin_registry`] registers all of them in a fixed order.

mod agent;
mod coingecko;
mod compound;
mod defillama;
mod fourmeme;

pub use agent::{GetBalanceAction, TransferAction, WalletAddressAction};
pub use coingecko::CoingeckoTrendingTokensAction;
pub use compound::{health_ratio, CollateralPosition, CompoundSupplyAction};
pub use defillama::ProtocolTvlAction;
pub use fourmeme::{
    min_tokens_out, FourMemeCreateTokenAction, FourMemeGetTokenHoldingsAction,
    FourMemeGetTrendingTokensAction, FourMemePurchaseTokenAction, FourMemeSellTokenAction,
};

use crate::agent::EvmAgentKit;
use crate::dispatch::ActionRegistry;
use crate::{Error, Result};
use alloy::primitives::Address;

pub const WALLET_ADDRESS: &str = "WALLET_ADDRESS_ACTION";
pub const GET_BALANCE: &str = "GET_BALANCE";
pub const TRANSFER: &str = "TRANSFER";
pub const COMPOUND_SUPPLY: &str = "COMPOUND_SUPPLY";
pub const FOURMEME_CREATE_TOKEN: &str = "FOURMEME_CREATE_TOKEN";
pub const FOURMEME_GET_TOKEN_HOLDINGS: &str = "FOURMEME_GET_TOKEN_HOLDINGS";
pub const FOURMEME_GET_TRENDING_TOKENS: &str = "FOURMEME_GET_TRENDING_TOKENS";
pub const FOURMEME_PURCHASE_TOKEN: &str = "FOURMEME_PURCHASE_TOKEN";
pub const FOURMEME_SELL_TOKEN: &str = "FOURMEME_SELL_TOKEN";
pub const DEFILLAMA_GET_PROTOCOL_TVL: &str = "DEFILLAMA_GET_PROTOCOL_TVL";
pub const COINGECKO_TRENDING_TOKENS: &str = "GET_COINGECKO_TRENDING_TOKENS_ACTION";

/// Registry holding every built-in action.
pub fn builtin_registry() -> Result<ActionRegistry<EvmAgentKit>> {
    let mut registry = ActionRegistry::new();
    registry.register(WalletAddressAction)?;
    registry.register(GetBalanceAction)?;
    registry.register(TransferAction)?;
    registry.register(CompoundSupplyAction)?;
    registry.register(FourMemeCreateTokenAction)?;
    registry.register(FourMemeGetTokenHoldingsAction)?;
    registry.register(FourMemeGetTrendingTokensAction)?;
    registry.register(FourMemePurchaseTokenAction)?;
    registry.register(FourMemeSellTokenAction)?;
    registry.register(ProtocolTvlAction)?;
    registry.register(CoingeckoTrendingTokensAction)?;
    Ok(registry)
}

fn parse_address(field: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse()
        .map_err(|e| Error::InvalidArgument(format!("{} '{}' is not an address: {}", field, raw, e)))
}

/// Optional address argument; blank strings count as absent.
fn parse_optional_address(field: &str, raw: Option<&str>) -> Result<Option<Address>> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_address(field, raw).map(Some),
        _ => Ok(None),
    }
}
