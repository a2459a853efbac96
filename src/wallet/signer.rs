//! Secure wallet implementation
//!
//! This is the only place where private keys exist.
//! - Keys are held in alloy's PrivateKeySigner
//! - Keys are never serialized and never logged
//! - Callers only get signatures back

use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::{hex, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use secrecy::{ExposeSecret, SecretString};

/// Signing key plus its derived address.
pub struct SecureWallet {
    signer: PrivateKeySigner,
    address: Address,
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Create a wallet from an environment variable holding a hex key.
    pub fn from_env(var_name: &str) -> Result<Self> {
        let key = std::env::var(var_name).map_err(|_| {
            Error::Wallet(format!(
                "Environment variable {} not set. Required for wallet initialization.",
                var_name
            ))
        })?;

        Self::from_secret(&SecretString::from(key))
    }

    pub fn from_secret(key: &SecretString) -> Result<Self> {
        Self::from_hex(key.expose_secret())
    }

    /// Create a wallet from a hex-encoded private key, with or without `0x`.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer.clone());

        Ok(Self {
            signer,
            address,
            wallet,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Checksummed address string.
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// Transaction signer for alloy providers. Exposes signing only.
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }

    pub fn sign_hash(&self, hash: &B256) -> Result<Signature> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| Error::Wallet(format!("Signing failed: {}", e)))
    }

    /// EIP-191 `personal_sign` of a UTF-8 message.
    pub fn sign_message(&self, message: &str) -> Result<Signature> {
        self.signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| Error::Wallet(format!("Message signing failed: {}", e)))
    }

    /// [`sign_message`](Self::sign_message) rendered as 0x-prefixed r‖s‖v hex.
    pub fn sign_message_hex(&self, message: &str) -> Result<String> {
        let signature = self.sign_message(message)?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}

impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
