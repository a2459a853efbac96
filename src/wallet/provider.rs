//! Chain access used by actions.

use super::SecureWallet;
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A transaction built by an action, ready to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl PreparedTransaction {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Outcome of a mined, successful transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// The agent's signing account on one chain.
#[async_trait]
pub trait EvmWallet: Send + Sync {
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn send_transaction(&self, tx: PreparedTransaction) -> Result<B256>;

    /// Wait until `tx_hash` is mined. Reverted transactions are errors.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary>;

    /// EIP-191 signature as 0x-prefixed hex.
    async fn sign_message(&self, message: &str) -> Result<String>;
}

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(2);
const DEFAULT_RECEIPT_ATTEMPTS: u32 = 90;

/// [`EvmWallet`] over an HTTP JSON-RPC endpoint.
pub struct RpcWallet {
    signer: Arc<SecureWallet>,
    provider: DynProvider,
    chain_id: u64,
    receipt_poll: Duration,
    receipt_attempts: u32,
}

impl RpcWallet {
    /// Connect and query the endpoint's chain id.
    pub async fn connect(signer: Arc<SecureWallet>, rpc_url: &str) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(signer.wallet().clone())
            .connect_http(url)
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get chain id: {}", e)))?;

        tracing::info!(address = %signer.address(), chain_id, "Connected wallet");

        Ok(Self {
            signer,
            provider,
            chain_id,
            receipt_poll: DEFAULT_RECEIPT_POLL,
            receipt_attempts: DEFAULT_RECEIPT_ATTEMPTS,
        })
    }

    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_poll = interval;
        self.receipt_attempts = attempts.max(1);
        self
    }
}

impl std::fmt::Debug for RpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWallet")
            .field("signer", &self.signer)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[async_trait]
impl EvmWallet for RpcWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .from(self.signer.address())
            .to(to)
            .input(data.into());

        self.provider
            .call(tx)
            .await
            .map_err(|e| Error::Rpc(format!("eth_call to {} failed: {}", to, e)))
    }

    async fn send_transaction(&self, tx: PreparedTransaction) -> Result<B256> {
        let request = TransactionRequest::default()
            .from(self.signer.address())
            .to(tx.to)
            .value(tx.value)
            .input(tx.data.into());

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to send transaction to {}: {}", tx.to, e)))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, to = %tx.to, value = %tx.value, "Transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary> {
        for _ in 0..self.receipt_attempts {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| Error::Rpc(format!("Failed to get receipt for {}: {}", tx_hash, e)))?;

            if let Some(receipt) = receipt {
                if !receipt.status() {
                    return Err(Error::Contract(format!("Transaction {} reverted", tx_hash)));
                }
                tracing::debug!(tx_hash = %tx_hash, block = ?receipt.block_number, "Transaction mined");
                return Ok(ReceiptSummary {
                    tx_hash,
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                });
            }

            tokio::time::sleep(self.receipt_poll).await;
        }

        Err(Error::Rpc(format!(
            "Transaction {} not mined after {} attempts",
            tx_hash, self.receipt_attempts
        )))
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        self.signer.sign_message_hex(message)
    }
}
