use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{decode_hex, encode_hex, parse_quantity, Address, TxHash, TxReceipt, U256};
use crate::{EvmError, Result};

// ─── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Call parameters shared by `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub data: Vec<u8>,
}

impl CallRequest {
    fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        if let Some(from) = &self.from {
            obj.insert("from".into(), json!(from.to_checksum()));
        }
        if let Some(to) = &self.to {
            obj.insert("to".into(), json!(to.to_checksum()));
        }
        if let Some(value) = &self.value {
            obj.insert("value".into(), json!(value.to_quantity()));
        }
        obj.insert("data".into(), json!(encode_hex(&self.data)));
        Value::Object(obj)
    }
}

// ─── RpcClient ────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 over HTTP POST.
///
/// Requests are issued one at a time by callers; the id counter only keeps
/// responses distinguishable in node logs.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let envelope: RpcResponse = response.json().await?;

        if let Some(err) = envelope.error {
            let message = match err.data {
                Some(Value::String(data)) => format!("{} ({data})", err.message),
                _ => err.message,
            };
            return Err(EvmError::Rpc {
                code: err.code,
                message,
            });
        }
        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| {
            EvmError::Response(format!("unexpected result for {method}: {e}"))
        })
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u64> {
        let raw: String = self.request(method, params).await?;
        parse_quantity(&raw)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.quantity("eth_chainId", json!([])).await
    }

    pub async fn gas_price(&self) -> Result<U256> {
        let raw: String = self.request("eth_gasPrice", json!([])).await?;
        raw.parse()
    }

    /// Next nonce for `address`, counting transactions still in the pool.
    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.quantity(
            "eth_getTransactionCount",
            json!([address.to_checksum(), "pending"]),
        )
        .await
    }

    pub async fn estimate_gas(&self, req: &CallRequest) -> Result<u64> {
        self.quantity("eth_estimateGas", json!([req.to_json()]))
            .await
    }

    pub async fn call(&self, req: &CallRequest) -> Result<Vec<u8>> {
        let raw: String = self
            .request("eth_call", json!([req.to_json(), "latest"]))
            .await?;
        decode_hex(&raw)
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        let hash: String = self
            .request("eth_sendRawTransaction", json!([encode_hex(raw)]))
            .await?;
        hash.parse()
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn request_returns_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_chainId"})))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x13882"}"#)
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        assert_eq!(client.chain_id().await.unwrap(), 80002);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rpc_error_object_becomes_rpc_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted","data":"raffle not open"}}"#,
            )
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let err = client
            .call(&CallRequest::default())
            .await
            .unwrap_err();
        match err {
            EvmError::Rpc { code, message } => {
                assert_eq!(code, 3);
                assert!(message.contains("raffle not open"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pending_receipt_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let receipt = client.transaction_receipt(TxHash::default()).await.unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn http_failure_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let err = client.chain_id().await.unwrap_err();
        assert!(matches!(err, EvmError::Http(_)));
    }

    #[tokio::test]
    async fn call_decodes_hex_return_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_call"})))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x0102"}"#)
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        assert_eq!(client.call(&CallRequest::default()).await.unwrap(), vec![1, 2]);
    }
}
