use thiserror::Error;

use crate::types::B256;

#[derive(Debug, Error)]
pub enum EvmError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed JSON-RPC response: {0}")]
    Response(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("transaction {0} reverted")]
    Reverted(B256),
}
