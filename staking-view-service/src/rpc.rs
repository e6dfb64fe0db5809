use crate::dto::{CallRequest, JsonRpcError, JsonRpcRequest, JsonRpcResponse, BLOCK_LATEST};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bad status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("rpc error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),
    #[error("no response for request {0}")]
    MissingResponse(u64),
}

impl RpcError {
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            RpcError::Rpc(error) => Some(error),
            _ => None,
        }
    }
}

/// Read side of the chain: a batch of `eth_call`s sent as one request.
///
/// Results line up with `calls` and fail independently, a dead transport
/// simply yields one error per call.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call_batch(&self, calls: &[CallRequest]) -> Vec<Result<Bytes, RpcError>>;
}

/// JSON-RPC 2.0 over HTTP.
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<JsonRpcClient, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RpcError::Transport(error.to_string()))?;
        Ok(JsonRpcClient::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: &str) -> JsonRpcClient {
        JsonRpcClient {
            client,
            url: url.to_owned(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id();
        let body = JsonRpcRequest::new(id, method, params);
        let response = self.post(&body).await?;
        let response: JsonRpcResponse = serde_json::from_value(response)
            .map_err(|error| RpcError::Decode(error.to_string()))?;
        into_result(response)
    }

    /// Sends all requests in one HTTP round trip. The returned vector has one
    /// entry per request, in request order.
    pub async fn batch(&self, requests: Vec<(&str, Value)>) -> Vec<Result<Value, RpcError>> {
        if requests.is_empty() {
            return vec![];
        }
        let first_id = self.next_id.fetch_add(requests.len() as u64, Ordering::Relaxed);
        let ids: Vec<u64> = (0..requests.len() as u64).map(|i| first_id + i).collect();
        let body: Vec<JsonRpcRequest> = requests
            .into_iter()
            .zip(ids.iter())
            .map(|((method, params), id)| JsonRpcRequest::new(*id, method, params))
            .collect();

        let response = match self.post(&body).await {
            Ok(response) => response,
            Err(error) => return ids.iter().map(|_| Err(error.clone())).collect(),
        };
        split_batch_response(&ids, response)
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, body: &B) -> Result<Value, RpcError> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .header("User-Agent", "Staking View Service")
            .send()
            .await
            .map_err(|error| {
                warn!("rpc request to {} failed: {:?}", self.url, error);
                RpcError::Transport(error.to_string())
            })?;
        let response = response.error_for_status().map_err(|error| {
            let status = error.status().map(|s| s.as_u16()).unwrap_or_default();
            warn!("rpc bad status {}: {:?}", status, error);
            RpcError::Status(status)
        })?;
        response
            .json::<Value>()
            .await
            .map_err(|error| RpcError::Decode(error.to_string()))
    }
}

fn into_result<T: DeserializeOwned>(response: JsonRpcResponse) -> Result<T, RpcError> {
    if let Some(error) = response.error {
        return Err(RpcError::Rpc(error));
    }
    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .map_err(|error| RpcError::Decode(error.to_string()))
}

/// Matches a batch reply to request ids. Some nodes answer a whole batch
/// with a single error object, that error is then copied to every slot.
pub(crate) fn split_batch_response(ids: &[u64], response: Value) -> Vec<Result<Value, RpcError>> {
    let items = match response {
        Value::Array(items) => items,
        other => {
            let error = match serde_json::from_value::<JsonRpcResponse>(other) {
                Ok(JsonRpcResponse {
                    error: Some(error), ..
                }) => RpcError::Rpc(error),
                _ => RpcError::Decode("batch response is not an array".to_owned()),
            };
            return ids.iter().map(|_| Err(error.clone())).collect();
        }
    };

    let mut by_id: HashMap<u64, JsonRpcResponse> = HashMap::new();
    for item in items {
        match serde_json::from_value::<JsonRpcResponse>(item) {
            Ok(response) => {
                if let Some(id) = response.id {
                    by_id.insert(id, response);
                }
            }
            Err(error) => debug!("skipping malformed batch item: {}", error),
        }
    }

    ids.iter()
        .map(|id| match by_id.remove(id) {
            Some(response) => into_result::<Value>(response),
            None => Err(RpcError::MissingResponse(*id)),
        })
        .collect()
}

#[async_trait]
impl ChainReader for JsonRpcClient {
    async fn call_batch(&self, calls: &[CallRequest]) -> Vec<Result<Bytes, RpcError>> {
        let requests: Vec<(&str, Value)> = calls
            .iter()
            .map(|call| ("eth_call", json!([call, BLOCK_LATEST])))
            .collect();
        self.batch(requests)
            .await
            .into_iter()
            .map(|result| {
                result.and_then(|value| {
                    serde_json::from_value::<Bytes>(value)
                        .map_err(|error| RpcError::Decode(error.to_string()))
                })
            })
            .collect()
    }
}

/// Position of one typed call inside a [`ReadBatch`].
pub struct Slot<C> {
    index: usize,
    _call: PhantomData<C>,
}

/// Collects typed contract calls so they can go out as a single batch.
#[derive(Default)]
pub struct ReadBatch {
    calls: Vec<CallRequest>,
    names: Vec<&'static str>,
}

impl ReadBatch {
    pub fn new() -> ReadBatch {
        ReadBatch::default()
    }

    pub fn add<C: SolCall>(&mut self, to: Address, call: &C) -> Slot<C> {
        self.calls.push(CallRequest::new(to, call.abi_encode()));
        self.names.push(C::SIGNATURE);
        Slot {
            index: self.calls.len() - 1,
            _call: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub async fn execute(self, reader: &dyn ChainReader) -> BatchResults {
        let mut results = reader.call_batch(&self.calls).await;
        // a reader returning fewer results than calls degrades the tail
        results.resize_with(self.calls.len(), || {
            Err(RpcError::Decode("reader returned too few results".to_owned()))
        });
        BatchResults {
            results,
            names: self.names,
        }
    }
}

pub struct BatchResults {
    results: Vec<Result<Bytes, RpcError>>,
    names: Vec<&'static str>,
}

impl BatchResults {
    /// Decoded return value of one call, `None` when that call failed.
    pub fn get<C: SolCall>(&self, slot: &Slot<C>) -> Option<C::Return> {
        let name = self.names.get(slot.index).copied().unwrap_or_default();
        match self.results.get(slot.index) {
            Some(Ok(data)) => match C::abi_decode_returns(data, true) {
                Ok(value) => Some(value),
                Err(error) => {
                    debug!("{} returned undecodable data: {}", name, error);
                    None
                }
            },
            Some(Err(error)) => {
                debug!("{} failed: {}", name, error);
                None
            }
            None => None,
        }
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}
