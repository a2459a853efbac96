//! Error types for the agent kit

use crate::dispatch::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    #[error("Invalid action name: {0:?}")]
    InvalidActionName(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failure raised by an action handler; the message is surfaced verbatim.
    #[error("{0}")]
    Action(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("FourMeme API error: {0}")]
    FourMeme(String),

    #[error("Compound error: {0}")]
    Compound(String),

    #[error("DeFiLlama error: {0}")]
    DefiLlama(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
