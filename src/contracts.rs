//! ABI bindings and small call helpers for the contracts actions touch.

use crate::wallet::{EvmWallet, PreparedTransaction};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    interface IERC20 {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    interface IComet {
        struct AssetInfo {
            uint8 offset;
            address asset;
            address priceFeed;
            uint64 scale;
            uint64 borrowCollateralFactor;
            uint64 liquidateCollateralFactor;
            uint64 liquidationFactor;
            uint128 supplyCap;
        }

        function supply(address asset, uint256 amount) external;
        function getPrice(address priceFeed) external view returns (uint256);
        function borrowBalanceOf(address account) external view returns (uint256);
        function numAssets() external view returns (uint8);
        function getAssetInfo(uint8 i) external view returns (AssetInfo memory);
        function baseToken() external view returns (address);
        function baseTokenPriceFeed() external view returns (address);
        function collateralBalanceOf(address account, address asset) external view returns (uint128);
    }

    interface ITokenManager {
        function createToken(bytes args, bytes signature) external payable;
        function buyTokenAMAP(address token, uint256 funds, uint256 minAmount) external payable;
        function sellToken(address token, uint256 amount) external;
    }
}

/// `eth_call` a view function and decode its return value.
pub async fn view<C: SolCall>(wallet: &dyn EvmWallet, to: Address, call: C) -> Result<C::Return> {
    let data = wallet.call(to, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&data).map_err(|e| {
        Error::Contract(format!("{} on {} returned malformed data: {}", C::SIGNATURE, to, e))
    })
}

/// Encode a state-changing call as a zero-value transaction.
pub fn transaction<C: SolCall>(to: Address, call: C) -> PreparedTransaction {
    PreparedTransaction::call(to, call.abi_encode())
}

pub async fn erc20_decimals(wallet: &dyn EvmWallet, token: Address) -> Result<u8> {
    view(wallet, token, IERC20::decimalsCall {}).await
}

pub async fn erc20_symbol(wallet: &dyn EvmWallet, token: Address) -> Result<String> {
    view(wallet, token, IERC20::symbolCall {}).await
}

pub async fn erc20_balance(wallet: &dyn EvmWallet, token: Address, account: Address) -> Result<U256> {
    view(wallet, token, IERC20::balanceOfCall { account }).await
}

/// Approve `spender` for `amount` of `token` and wait for the approval to land.
pub async fn approve(
    wallet: &dyn EvmWallet,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<()> {
    let tx = transaction(token, IERC20::approveCall { spender, amount });
    let tx_hash = wallet.send_transaction(tx).await?;
    wallet.wait_for_receipt(tx_hash).await?;
    tracing::debug!(token = %token, spender = %spender, amount = %amount, "Approval confirmed");
    Ok(())
}
