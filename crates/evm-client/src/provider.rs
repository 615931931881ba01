use std::time::Duration;

use crate::rpc::{CallRequest, RpcClient};
use crate::types::{Address, TxHash, TxReceipt, U256};
use crate::wallet::{LegacyTransaction, Wallet};
use crate::{EvmError, Result};

/// Default interval between `eth_getTransactionReceipt` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Extra gas on top of `eth_estimateGas`, in percent.
const GAS_MARGIN_PERCENT: u64 = 20;

/// An unsigned transaction as built by contract bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxRequest {
    /// `None` deploys `data` as init code.
    pub to: Option<Address>,
    pub data: Vec<u8>,
    pub value: U256,
}

/// A connected JSON-RPC client that fills, signs and submits transactions and
/// waits for their receipts.
#[derive(Debug)]
pub struct Provider {
    rpc: RpcClient,
    chain_id: u64,
    poll_interval: Duration,
}

impl Provider {
    /// Connect to `url`. When `chain_id` is `None` it is queried once with
    /// `eth_chainId`.
    pub async fn connect(
        url: impl Into<String>,
        chain_id: Option<u64>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let rpc = RpcClient::new(url);
        let chain_id = match chain_id {
            Some(id) => id,
            None => rpc.chain_id().await?,
        };
        tracing::debug!(url = rpc.url(), chain_id, "connected to ledger");
        Ok(Self {
            rpc,
            chain_id,
            poll_interval,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign and submit `req` from `wallet`, then wait for confirmation.
    ///
    /// A receipt with status 0 is returned as [`EvmError::Reverted`].
    pub async fn send(&self, wallet: &Wallet, req: TxRequest) -> Result<TxReceipt> {
        let from = wallet.address();
        let nonce = self.rpc.transaction_count(from).await?;
        let gas_price = self.rpc.gas_price().await?;
        let estimate = self
            .rpc
            .estimate_gas(&CallRequest {
                from: Some(from),
                to: req.to,
                value: Some(req.value),
                data: req.data.clone(),
            })
            .await?;
        let gas = with_margin(estimate);

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas,
            to: req.to,
            value: req.value,
            data: req.data,
            chain_id: self.chain_id,
        };
        let raw = wallet.sign_legacy(&tx)?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        tracing::debug!(%from, nonce, gas, tx = %hash, "transaction submitted");

        let receipt = self.wait_for_receipt(hash).await?;
        if !receipt.succeeded() {
            return Err(EvmError::Reverted(hash));
        }
        Ok(receipt)
    }

    /// Poll until the transaction is mined. There is no overall deadline.
    pub async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Read-only `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        self.rpc
            .call(&CallRequest {
                to: Some(to),
                data,
                ..Default::default()
            })
            .await
    }
}

/// `estimate` plus [`GAS_MARGIN_PERCENT`], capped at `u64::MAX`.
fn with_margin(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_MARGIN_PERCENT) / 100)
}
