//! `evm-client`: a small native driver for EVM-compatible JSON-RPC ledgers.
//!
//! It covers exactly what a deploy-and-drive script needs: encode a call,
//! sign it, submit it, wait for the receipt, and read state back.
//!
//! # Architecture
//!
//! ```text
//! abi::encode_call   ← selector + head/tail encoded arguments
//!     │
//!     ▼
//! TxRequest          ← to / data / value, built by contract bindings
//!     │
//!     ▼
//! Provider::send     ← nonce, gas price, gas estimate, EIP-155 signature
//!     │                 (Wallet + rlp), eth_sendRawTransaction
//!     ▼
//! TxReceipt          ← polled with eth_getTransactionReceipt until mined
//! ```
//!
//! Read-only calls go through [`Provider::call`] and are decoded with
//! [`abi::decode`].

pub mod abi;
pub mod error;
pub mod provider;
pub mod rlp;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use error::EvmError;
pub use provider::{Provider, TxRequest, DEFAULT_POLL_INTERVAL};
pub use rpc::{CallRequest, RpcClient};
pub use types::{keccak256, parse_ether, Address, TxHash, TxReceipt, B256, U256};
pub use wallet::{LegacyTransaction, Wallet};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, EvmError>;
