//! Wallet management
//!
//! Private keys live in [`SecureWallet`] and never leave it. Actions reach the
//! chain through the [`EvmWallet`] trait, implemented over JSON-RPC by
//! [`RpcWallet`].

mod provider;
mod signer;

pub use provider::{EvmWallet, PreparedTransaction, ReceiptSummary, RpcWallet};
pub use signer::SecureWallet;
