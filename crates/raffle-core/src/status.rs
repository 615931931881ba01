//! Read-only status poll of a raffle and its randomness request, plus one
//! fetch of the prize token's metadata.

use evm_client::{EvmError, U256};
use serde::Serialize;

use crate::component::Components;
use crate::contracts::{Collection, RaffleManager, RaffleRecord, RandomnessSource, RequestStatus};
use crate::error::{RaffleError, Result};
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MetadataOutcome {
    Fetched { body: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub raffle_id: U256,
    pub raffle: RaffleRecord,
    pub participants: U256,
    pub last_request_id: U256,
    pub request_status: RequestStatus,
    pub token_id: U256,
    pub token_uri: String,
    pub metadata: MetadataOutcome,
}

pub struct StatusPoller<'a, L> {
    ledger: &'a L,
    components: &'a Components,
    http: reqwest::Client,
}

fn query(name: &'static str) -> impl FnOnce(EvmError) -> RaffleError {
    move |source| RaffleError::Query {
        query: name.to_string(),
        source,
    }
}

impl<'a, L: Ledger> StatusPoller<'a, L> {
    pub fn new(ledger: &'a L, components: &'a Components) -> Self {
        Self::with_client(ledger, components, reqwest::Client::new())
    }

    pub fn with_client(ledger: &'a L, components: &'a Components, http: reqwest::Client) -> Self {
        Self {
            ledger,
            components,
            http,
        }
    }

    /// Five ledger reads in fixed order, then the metadata fetch.
    ///
    /// A failed read fails the poll. A failed fetch is logged and recorded in
    /// the report only.
    pub async fn poll(&self, raffle_id: U256, token_id: U256) -> Result<StatusReport> {
        let manager = RaffleManager::at(&self.components.manager);
        let randomness = RandomnessSource::at(&self.components.randomness);
        let collection = Collection::at(&self.components.collection);

        let raffle = manager
            .raffle(self.ledger, raffle_id)
            .await
            .map_err(query("raffles"))?;
        tracing::info!(raffle_id = %raffle_id, record = %raffle, "raffle");

        let participants = manager
            .participant_count(self.ledger, raffle_id)
            .await
            .map_err(query("getNumberOfParticipantsInRaffle"))?;
        tracing::info!(%participants, "participants");

        let last_request_id = randomness
            .last_request_id(self.ledger)
            .await
            .map_err(query("lastRequestId"))?;
        tracing::info!(request_id = %last_request_id, "last randomness request");

        let request_status = randomness
            .request_status(self.ledger, last_request_id)
            .await
            .map_err(query("getRequestStatus"))?;
        tracing::info!(status = %request_status, "request status");

        let token_uri = collection
            .token_uri(self.ledger, token_id)
            .await
            .map_err(query("tokenURI"))?;
        tracing::info!(token_id = %token_id, uri = %token_uri, "token uri");

        let metadata = match self.fetch(&token_uri).await {
            Ok(body) => {
                tracing::info!(bytes = body.len(), "metadata fetched");
                MetadataOutcome::Fetched { body }
            }
            Err(e) => {
                tracing::error!(uri = %token_uri, error = %e, "metadata fetch failed");
                MetadataOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(StatusReport {
            raffle_id,
            raffle,
            participants,
            last_request_id,
            request_status,
            token_id,
            token_uri,
            metadata,
        })
    }

    async fn fetch(&self, uri: &str) -> std::result::Result<String, reqwest::Error> {
        self.http
            .get(uri)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::sig;
    use crate::testing::{components, MockLedger};
    use evm_client::abi::Token;

    fn scripted(token_uri: &str) -> MockLedger {
        let ledger = MockLedger::new();
        ledger.respond(
            sig::RAFFLES,
            &[
                Token::Uint(U256::from(1_000u64)),
                Token::Uint(U256::from(3u64)),
                Token::Address(components().collection.address),
                Token::Uint(U256::from(13u64)),
            ],
        );
        ledger.respond_uint(sig::PARTICIPANT_COUNT, 2);
        ledger.respond_uint(sig::LAST_REQUEST_ID, 42);
        ledger.respond(
            sig::REQUEST_STATUS,
            &[Token::Bool(false), Token::Array(vec![])],
        );
        ledger.respond(sig::TOKEN_URI, &[Token::String(token_uri.to_string())]);
        ledger
    }

    #[tokio::test]
    async fn five_reads_then_one_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/token-0013")
            .with_status(200)
            .with_body(r#"{"name":"Prize #13"}"#)
            .expect(1)
            .create_async()
            .await;
        let ledger = scripted(&format!("{}/token-0013", server.url()));
        let comps = components();

        let report = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(13u64))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(ledger.mutating().is_empty());
        let reads = ledger.reads();
        assert_eq!(reads.len(), 5);
        let order = [
            sig::RAFFLES,
            sig::PARTICIPANT_COUNT,
            sig::LAST_REQUEST_ID,
            sig::REQUEST_STATUS,
            sig::TOKEN_URI,
        ];
        for (read, signature) in reads.iter().zip(order) {
            assert!(read.is(signature), "expected {signature}");
        }
        assert_eq!(reads[3].args()[31], 42);
        assert_eq!(report.participants, U256::from(2u64));
        assert_eq!(report.request_status, RequestStatus::Pending);
        assert_eq!(report.raffle.words.len(), 4);
        assert_eq!(
            report.metadata,
            MetadataOutcome::Fetched {
                body: r#"{"name":"Prize #13"}"#.into()
            }
        );
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_raised() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        let ledger = scripted(&format!("{}/missing", server.url()));
        let comps = components();

        let report = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(0u64))
            .await
            .unwrap();
        assert!(matches!(report.metadata, MetadataOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn unreachable_uri_is_reported_not_raised() {
        let ledger = scripted("not a url");
        let comps = components();
        let report = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(0u64))
            .await
            .unwrap();
        assert!(matches!(report.metadata, MetadataOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn failed_read_aborts_the_poll() {
        let ledger = scripted("http://127.0.0.1:1/");
        ledger.fail_on(sig::LAST_REQUEST_ID);
        let comps = components();
        let err = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(0u64))
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::Query { ref query, .. } if query == "lastRequestId"));
        assert_eq!(ledger.reads().len(), 3);
    }

    #[tokio::test]
    async fn truncated_request_status_aborts_before_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let ledger = scripted(&format!("{}/token", server.url()));
        // Only the bool word; the uint256[] head is missing.
        ledger.respond(sig::REQUEST_STATUS, &[Token::Bool(true)]);
        let comps = components();

        let err = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(0u64))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RaffleError::Query { ref query, source: EvmError::Abi(_) } if query == "getRequestStatus"
        ));
        assert_eq!(ledger.reads().len(), 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_token_uri_aborts_before_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let ledger = scripted(&format!("{}/token", server.url()));
        // String offset pointing far past the end of the data.
        let mut data = vec![0u8; 32];
        data[24..].copy_from_slice(&u64::MAX.to_be_bytes());
        ledger.respond_raw(sig::TOKEN_URI, data);
        let comps = components();

        let err = StatusPoller::new(&ledger, &comps)
            .poll(U256::from(0u64), U256::from(0u64))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RaffleError::Query { ref query, source: EvmError::Abi(_) } if query == "tokenURI"
        ));
        assert_eq!(ledger.reads().len(), 5);
        mock.assert_async().await;
    }
}
