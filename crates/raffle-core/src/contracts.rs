//! Typed call surfaces of the four external components.
//!
//! Each binding wraps a resolved address and knows the Solidity signatures
//! of the operations the orchestrator consumes. Business logic stays on the
//! ledger; these only encode calls and decode results.

use evm_client::abi::{self, ParamType, Token};
use evm_client::{Address, EvmError, TxReceipt, U256};
use serde::Serialize;

use crate::actor::Actor;
use crate::component::Handle;
use crate::ledger::Ledger;

type CallResult<T> = evm_client::Result<T>;

/// Canonical signatures, shared with tests that assert on selectors.
pub mod sig {
    pub const COLLECTION_CONSTRUCTOR: &str = "constructor(string,string,string)";
    pub const SET_APPROVAL_FOR_ALL: &str = "setApprovalForAll(address,bool)";
    pub const SAFE_MINT: &str = "safeMint(address,string)";
    pub const CURRENT_SUPPLY: &str = "currentSupply()";
    pub const TOKEN_URI: &str = "tokenURI(uint256)";

    pub const UPDATE_RANDOM_GENERATOR: &str = "updateRandomGenerator(address)";
    pub const UPDATE_RAFFLE_CHECKER: &str = "updateRaffleChecker(address)";
    pub const START_RAFFLE: &str = "startRaffle(uint256,uint256,address,uint256)";
    pub const PARTICIPATE: &str = "participate(uint256)";
    pub const RAFFLES: &str = "raffles(uint256)";
    pub const PARTICIPANT_COUNT: &str = "getNumberOfParticipantsInRaffle(uint256)";
    pub const RAFFLE_COUNTER: &str = "getRaffleCounter()";

    pub const UPDATE_RAFFLE_MANAGER: &str = "updateRaffleManager(address)";
    pub const LAST_REQUEST_ID: &str = "lastRequestId()";
    pub const REQUEST_STATUS: &str = "getRequestStatus(uint256)";
}

fn single(types: &[ParamType], data: &[u8]) -> CallResult<Token> {
    abi::decode(types, data)?
        .into_iter()
        .next()
        .ok_or_else(|| EvmError::Abi("empty return data".into()))
}

fn decode_uint(data: &[u8]) -> CallResult<U256> {
    single(&[ParamType::Uint], data)?
        .into_uint()
        .ok_or_else(|| EvmError::Abi("expected uint256".into()))
}

fn decode_string(data: &[u8]) -> CallResult<String> {
    single(&[ParamType::String], data)?
        .into_string()
        .ok_or_else(|| EvmError::Abi("expected string".into()))
}

// ---------------------------------------------------------------------------
// Result records
// ---------------------------------------------------------------------------

/// A raffle entry as returned by the manager's public getter.
///
/// The field layout belongs to the manager contract, so the record is kept
/// as raw words and reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaffleRecord {
    pub words: Vec<U256>,
}

impl std::fmt::Display for RaffleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.words.iter().map(U256::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

/// Fulfilment state of a randomness request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Fulfilled { random_words: Vec<U256> },
    /// Marked fulfilled but delivered no words.
    Failed,
}

impl RequestStatus {
    fn from_parts(fulfilled: bool, random_words: Vec<U256>) -> Self {
        match (fulfilled, random_words.is_empty()) {
            (false, _) => RequestStatus::Pending,
            (true, false) => RequestStatus::Fulfilled { random_words },
            (true, true) => RequestStatus::Failed,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => f.write_str("pending"),
            RequestStatus::Fulfilled { random_words } => {
                let words: Vec<String> = random_words.iter().map(U256::to_string).collect();
                write!(f, "fulfilled [{}]", words.join(","))
            }
            RequestStatus::Failed => f.write_str("failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

pub struct Collection {
    address: Address,
}

impl Collection {
    pub fn at(handle: &Handle) -> Self {
        Self {
            address: handle.address,
        }
    }

    /// Constructor arguments: collection metadata URI, name, symbol.
    pub fn constructor_args(metadata_uri: &str, name: &str, symbol: &str) -> Vec<Token> {
        vec![
            Token::String(metadata_uri.to_string()),
            Token::String(name.to_string()),
            Token::String(symbol.to_string()),
        ]
    }

    pub async fn set_approval_for_all<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        operator: Address,
        approved: bool,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(
            sig::SET_APPROVAL_FOR_ALL,
            &[Token::Address(operator), Token::Bool(approved)],
        );
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    pub async fn safe_mint<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        to: Address,
        uri: &str,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(
            sig::SAFE_MINT,
            &[Token::Address(to), Token::String(uri.to_string())],
        );
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    pub async fn current_supply<L: Ledger>(&self, ledger: &L) -> CallResult<U256> {
        let out = ledger
            .read(self.address, abi::encode_call(sig::CURRENT_SUPPLY, &[]))
            .await?;
        decode_uint(&out)
    }

    pub async fn token_uri<L: Ledger>(&self, ledger: &L, token_id: U256) -> CallResult<String> {
        let out = ledger
            .read(
                self.address,
                abi::encode_call(sig::TOKEN_URI, &[Token::Uint(token_id)]),
            )
            .await?;
        decode_string(&out)
    }
}

// ---------------------------------------------------------------------------
// RaffleManager
// ---------------------------------------------------------------------------

pub struct RaffleManager {
    address: Address,
}

impl RaffleManager {
    pub fn at(handle: &Handle) -> Self {
        Self {
            address: handle.address,
        }
    }

    pub async fn update_random_generator<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        generator: Address,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(sig::UPDATE_RANDOM_GENERATOR, &[Token::Address(generator)]);
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    pub async fn update_raffle_checker<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        checker: Address,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(sig::UPDATE_RAFFLE_CHECKER, &[Token::Address(checker)]);
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    pub async fn start_raffle<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        ticket_price: U256,
        max_participants: U256,
        collection: Address,
        token_id: U256,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(
            sig::START_RAFFLE,
            &[
                Token::Uint(ticket_price),
                Token::Uint(max_participants),
                Token::Address(collection),
                Token::Uint(token_id),
            ],
        );
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    /// Enter `raffle_id`, paying `ticket_price` as the call value.
    pub async fn participate<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        raffle_id: U256,
        ticket_price: U256,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(sig::PARTICIPATE, &[Token::Uint(raffle_id)]);
        ledger.transact(from, self.address, data, ticket_price).await
    }

    pub async fn raffle<L: Ledger>(&self, ledger: &L, raffle_id: U256) -> CallResult<RaffleRecord> {
        let out = ledger
            .read(
                self.address,
                abi::encode_call(sig::RAFFLES, &[Token::Uint(raffle_id)]),
            )
            .await?;
        Ok(RaffleRecord {
            words: abi::decode_words(&out)?,
        })
    }

    pub async fn participant_count<L: Ledger>(
        &self,
        ledger: &L,
        raffle_id: U256,
    ) -> CallResult<U256> {
        let out = ledger
            .read(
                self.address,
                abi::encode_call(sig::PARTICIPANT_COUNT, &[Token::Uint(raffle_id)]),
            )
            .await?;
        decode_uint(&out)
    }

    pub async fn raffle_counter<L: Ledger>(&self, ledger: &L) -> CallResult<U256> {
        let out = ledger
            .read(self.address, abi::encode_call(sig::RAFFLE_COUNTER, &[]))
            .await?;
        decode_uint(&out)
    }
}

// ---------------------------------------------------------------------------
// RandomnessSource
// ---------------------------------------------------------------------------

pub struct RandomnessSource {
    address: Address,
}

impl RandomnessSource {
    pub fn at(handle: &Handle) -> Self {
        Self {
            address: handle.address,
        }
    }

    pub async fn update_raffle_manager<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        manager: Address,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(sig::UPDATE_RAFFLE_MANAGER, &[Token::Address(manager)]);
        ledger.transact(from, self.address, data, U256::ZERO).await
    }

    pub async fn last_request_id<L: Ledger>(&self, ledger: &L) -> CallResult<U256> {
        let out = ledger
            .read(self.address, abi::encode_call(sig::LAST_REQUEST_ID, &[]))
            .await?;
        decode_uint(&out)
    }

    /// Decodes `(bool fulfilled, uint256[] randomWords)`.
    pub async fn request_status<L: Ledger>(
        &self,
        ledger: &L,
        request_id: U256,
    ) -> CallResult<RequestStatus> {
        let out = ledger
            .read(
                self.address,
                abi::encode_call(sig::REQUEST_STATUS, &[Token::Uint(request_id)]),
            )
            .await?;
        let mut tokens = abi::decode(
            &[ParamType::Bool, ParamType::Array(Box::new(ParamType::Uint))],
            &out,
        )?
        .into_iter();
        let fulfilled = tokens
            .next()
            .and_then(Token::into_bool)
            .ok_or_else(|| EvmError::Abi("expected bool".into()))?;
        let words = tokens
            .next()
            .and_then(Token::into_array)
            .ok_or_else(|| EvmError::Abi("expected uint256[]".into()))?
            .into_iter()
            .map(|t| t.into_uint().ok_or_else(|| EvmError::Abi("expected uint256".into())))
            .collect::<CallResult<Vec<_>>>()?;
        Ok(RequestStatus::from_parts(fulfilled, words))
    }
}

// ---------------------------------------------------------------------------
// EligibilityChecker
// ---------------------------------------------------------------------------

pub struct EligibilityChecker {
    address: Address,
}

impl EligibilityChecker {
    pub fn at(handle: &Handle) -> Self {
        Self {
            address: handle.address,
        }
    }

    pub async fn update_raffle_manager<L: Ledger>(
        &self,
        ledger: &L,
        from: &Actor,
        manager: Address,
    ) -> CallResult<TxReceipt> {
        let data = abi::encode_call(sig::UPDATE_RAFFLE_MANAGER, &[Token::Address(manager)]);
        ledger.transact(from, self.address, data, U256::ZERO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{components, registry, MockLedger};

    #[tokio::test]
    async fn participate_pays_ticket_price() {
        let ledger = MockLedger::new();
        let comps = components();
        let actors = registry();
        let p1 = actors.get(crate::actor::Role::Participant(1)).unwrap();
        RaffleManager::at(&comps.manager)
            .participate(&ledger, p1, U256::from(4u64), U256::from(1_000u64))
            .await
            .unwrap();
        let calls = ledger.mutating();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is(sig::PARTICIPATE));
        assert_eq!(calls[0].value, U256::from(1_000u64));
        assert_eq!(calls[0].to, Some(comps.manager.address));
        assert_eq!(
            abi::decode(&[ParamType::Uint], calls[0].args()).unwrap()[0],
            Token::Uint(U256::from(4u64))
        );
    }

    #[tokio::test]
    async fn request_status_maps_fulfilment() {
        let ledger = MockLedger::new();
        let source = RandomnessSource::at(&components().randomness);

        ledger.respond(sig::REQUEST_STATUS, &[Token::Bool(false), Token::Array(vec![])]);
        assert_eq!(
            source.request_status(&ledger, U256::from(1u64)).await.unwrap(),
            RequestStatus::Pending
        );

        ledger.respond(
            sig::REQUEST_STATUS,
            &[
                Token::Bool(true),
                Token::Array(vec![Token::Uint(U256::from(77u64))]),
            ],
        );
        assert_eq!(
            source.request_status(&ledger, U256::from(1u64)).await.unwrap(),
            RequestStatus::Fulfilled {
                random_words: vec![U256::from(77u64)]
            }
        );

        ledger.respond(sig::REQUEST_STATUS, &[Token::Bool(true), Token::Array(vec![])]);
        assert_eq!(
            source.request_status(&ledger, U256::from(1u64)).await.unwrap(),
            RequestStatus::Failed
        );
    }

    #[tokio::test]
    async fn raffle_record_keeps_raw_words() {
        let ledger = MockLedger::new();
        ledger.respond(
            sig::RAFFLES,
            &[
                Token::Uint(U256::from(0u64)),
                Token::Uint(U256::from(3u64)),
                Token::Address(components().collection.address),
            ],
        );
        let record = RaffleManager::at(&components().manager)
            .raffle(&ledger, U256::from(0u64))
            .await
            .unwrap();
        assert_eq!(record.words.len(), 3);
        assert_eq!(record.words[1], U256::from(3u64));
    }

    #[test]
    fn constructor_args_order() {
        let args = Collection::constructor_args("uri", "Name", "SYM");
        assert_eq!(args[0], Token::String("uri".into()));
        assert_eq!(args[2], Token::String("SYM".into()));
    }
}
