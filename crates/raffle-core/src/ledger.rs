//! The seam between the orchestrator and the remote ledger.
//!
//! Every component binding, the resolver and the driver talk to a
//! [`Ledger`]; production runs use [`RpcLedger`], tests use an in-memory
//! recorder.

use std::collections::HashMap;

use evm_client::{Address, EvmError, Provider, TxReceipt, TxRequest, Wallet, U256};

use crate::actor::Actor;

/// Remote execution environment.
///
/// Each call suspends until the ledger answers; `deploy` and `transact`
/// return only after the transaction is confirmed.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Deploy `init_code` (bytecode plus encoded constructor arguments) from
    /// `from` and return the new contract address.
    async fn deploy(&self, from: &Actor, init_code: Vec<u8>) -> evm_client::Result<Address>;

    /// Submit a state-changing call to `to` and wait for its receipt.
    async fn transact(
        &self,
        from: &Actor,
        to: Address,
        data: Vec<u8>,
        value: U256,
    ) -> evm_client::Result<TxReceipt>;

    /// Side-effect-free call against the latest state.
    async fn read(&self, to: Address, data: Vec<u8>) -> evm_client::Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// RpcLedger
// ---------------------------------------------------------------------------

/// [`Ledger`] backed by a JSON-RPC [`Provider`] and one wallet per actor.
///
/// Wallets are keyed by address; `Debug` output never shows key material.
#[derive(Debug)]
pub struct RpcLedger {
    provider: Provider,
    wallets: HashMap<Address, Wallet>,
}

impl RpcLedger {
    pub fn new(provider: Provider, wallets: impl IntoIterator<Item = Wallet>) -> Self {
        let wallets = wallets.into_iter().map(|w| (w.address(), w)).collect();
        Self { provider, wallets }
    }

    fn wallet_for(&self, actor: &Actor) -> evm_client::Result<&Wallet> {
        self.wallets.get(&actor.address).ok_or_else(|| {
            EvmError::Signer(format!(
                "no signing key for {} ({})",
                actor.role, actor.address
            ))
        })
    }
}

impl Ledger for RpcLedger {
    async fn deploy(&self, from: &Actor, init_code: Vec<u8>) -> evm_client::Result<Address> {
        let wallet = self.wallet_for(from)?;
        let receipt = self
            .provider
            .send(
                wallet,
                TxRequest {
                    to: None,
                    data: init_code,
                    value: U256::ZERO,
                },
            )
            .await?;
        tracing::debug!(
            actor = %from.role,
            tx = %receipt.transaction_hash,
            block = receipt.block_number,
            "deployment confirmed"
        );
        receipt.contract_address.ok_or_else(|| {
            EvmError::Response(format!(
                "deployment receipt {} has no contract address",
                receipt.transaction_hash
            ))
        })
    }

    async fn transact(
        &self,
        from: &Actor,
        to: Address,
        data: Vec<u8>,
        value: U256,
    ) -> evm_client::Result<TxReceipt> {
        let wallet = self.wallet_for(from)?;
        let receipt = self
            .provider
            .send(
                wallet,
                TxRequest {
                    to: Some(to),
                    data,
                    value,
                },
            )
            .await?;
        tracing::debug!(
            actor = %from.role,
            %to,
            tx = %receipt.transaction_hash,
            block = receipt.block_number,
            "transaction confirmed"
        );
        Ok(receipt)
    }

    async fn read(&self, to: Address, data: Vec<u8>) -> evm_client::Result<Vec<u8>> {
        self.provider.call(to, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use std::time::Duration;

    #[tokio::test]
    async fn unknown_actor_has_no_signing_key() {
        let server = mockito::Server::new_async().await;
        let provider = Provider::connect(server.url(), Some(1), Duration::from_millis(1))
            .await
            .unwrap();
        let ledger = RpcLedger::new(provider, vec![]);
        let stranger = Actor {
            index: 0,
            role: Role::Owner,
            address: Address::ZERO,
        };
        let err = ledger
            .transact(&stranger, Address::ZERO, vec![], U256::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, EvmError::Signer(_)));
    }
}
