//! In-memory [`Ledger`] that records every call for assertions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use evm_client::abi::{self, Token};
use evm_client::{Address, EvmError, TxHash, TxReceipt, B256, U256};

use crate::actor::{Actor, ActorRegistry, Role};
use crate::component::{Components, Handle, ComponentKind, Provenance};
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    Deploy,
    Transact,
    Read,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub kind: CallKind,
    pub from: Option<Role>,
    pub to: Option<Address>,
    pub data: Vec<u8>,
    pub value: U256,
    pub at: Instant,
}

impl Recorded {
    pub fn selector(&self) -> [u8; 4] {
        let mut s = [0u8; 4];
        if self.data.len() >= 4 {
            s.copy_from_slice(&self.data[..4]);
        }
        s
    }

    pub fn is(&self, signature: &str) -> bool {
        self.kind != CallKind::Deploy && self.selector() == abi::selector(signature)
    }

    pub fn args(&self) -> &[u8] {
        self.data.get(4..).unwrap_or(&[])
    }
}

#[derive(Default)]
pub struct MockLedger {
    calls: Mutex<Vec<Recorded>>,
    responses: Mutex<HashMap<[u8; 4], Vec<u8>>>,
    failing: Mutex<Option<[u8; 4]>>,
    deploys_fail: Mutex<bool>,
    next_address: Mutex<u8>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer reads of `signature` with ABI-encoded `tokens`.
    pub fn respond(&self, signature: &str, tokens: &[Token]) {
        self.responses
            .lock()
            .unwrap()
            .insert(abi::selector(signature), abi::encode(tokens));
    }

    /// Answer reads of `signature` with `data` as is.
    pub fn respond_raw(&self, signature: &str, data: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(abi::selector(signature), data);
    }

    pub fn respond_uint(&self, signature: &str, v: u64) {
        self.respond(signature, &[Token::Uint(U256::from(v))]);
    }

    /// Make every call to `signature` fail with a revert.
    pub fn fail_on(&self, signature: &str) {
        *self.failing.lock().unwrap() = Some(abi::selector(signature));
    }

    /// Make every deploy fail with a revert.
    pub fn fail_deploys(&self) {
        *self.deploys_fail.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating(&self) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind != CallKind::Read)
            .collect()
    }

    pub fn reads(&self) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == CallKind::Read)
            .collect()
    }

    fn record(&self, kind: CallKind, from: Option<Role>, to: Option<Address>, data: &[u8], value: U256) {
        self.calls.lock().unwrap().push(Recorded {
            kind,
            from,
            to,
            data: data.to_vec(),
            value,
            at: Instant::now(),
        });
    }

    fn check_failure(&self, data: &[u8]) -> evm_client::Result<()> {
        let failing = *self.failing.lock().unwrap();
        match failing {
            Some(sel) if data.len() >= 4 && data[..4] == sel => {
                Err(EvmError::Reverted(fake_hash(self.calls.lock().unwrap().len())))
            }
            _ => Ok(()),
        }
    }
}

fn fake_hash(n: usize) -> TxHash {
    let mut b = [0u8; 32];
    b[24..].copy_from_slice(&(n as u64).to_be_bytes());
    B256::new(b)
}

pub fn addr(n: u8) -> Address {
    let mut b = [0u8; 20];
    b[0] = 0xc0;
    b[19] = n;
    Address::new(b)
}

impl Ledger for MockLedger {
    async fn deploy(&self, from: &Actor, init_code: Vec<u8>) -> evm_client::Result<Address> {
        self.record(CallKind::Deploy, Some(from.role), None, &init_code, U256::ZERO);
        if *self.deploys_fail.lock().unwrap() {
            return Err(EvmError::Reverted(fake_hash(self.calls.lock().unwrap().len())));
        }
        let mut next = self.next_address.lock().unwrap();
        *next += 1;
        let mut b = [0u8; 20];
        b[0] = 0xde;
        b[19] = *next;
        Ok(Address::new(b))
    }

    async fn transact(
        &self,
        from: &Actor,
        to: Address,
        data: Vec<u8>,
        value: U256,
    ) -> evm_client::Result<TxReceipt> {
        self.record(CallKind::Transact, Some(from.role), Some(to), &data, value);
        self.check_failure(&data)?;
        Ok(TxReceipt {
            transaction_hash: fake_hash(self.calls.lock().unwrap().len()),
            block_number: 1,
            status: 1,
            contract_address: None,
            gas_used: 21_000,
        })
    }

    async fn read(&self, to: Address, data: Vec<u8>) -> evm_client::Result<Vec<u8>> {
        self.record(CallKind::Read, None, Some(to), &data, U256::ZERO);
        self.check_failure(&data)?;
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&data[..4]);
        self.responses
            .lock()
            .unwrap()
            .get(&sel)
            .cloned()
            .ok_or_else(|| EvmError::Rpc {
                code: -32000,
                message: "no scripted response".into(),
            })
    }
}

/// Owner plus five participants at deterministic addresses.
pub fn registry() -> ActorRegistry {
    let mut entries = vec![(Role::Owner, addr(0xa0))];
    for n in 1..=5u8 {
        entries.push((Role::Participant(n), addr(0xa0 + n)));
    }
    ActorRegistry::new(entries).unwrap()
}

/// Four attached components at deterministic addresses.
pub fn components() -> Components {
    let handle = |kind, n| Handle {
        kind,
        address: addr(n),
        provenance: Provenance::Attached,
    };
    Components {
        collection: handle(ComponentKind::Collection, 1),
        manager: handle(ComponentKind::Manager, 2),
        randomness: handle(ComponentKind::Randomness, 3),
        checker: handle(ComponentKind::Checker, 4),
    }
}
