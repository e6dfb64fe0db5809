//! In-memory chain and wallet used by tests here and in the web API.

use crate::dto::{CallRequest, JsonRpcError, Log, TransactionReceipt, TransactionRequest};
use crate::rpc::{ChainReader, RpcError};
use crate::wallet::{WalletError, WalletSession};
use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

fn reverted() -> RpcError {
    RpcError::Rpc(JsonRpcError {
        code: 3,
        message: "execution reverted".to_owned(),
        data: None,
    })
}

/// Answers `eth_call`s from a table keyed by target and calldata. Calls
/// without an entry revert.
#[derive(Default)]
pub struct MockChain {
    responses: Mutex<HashMap<(Address, Bytes), Result<Bytes, RpcError>>>,
    batches: AtomicUsize,
    offline: AtomicBool,
    delay: Option<Duration>,
}

impl MockChain {
    pub fn new() -> MockChain {
        MockChain::default()
    }

    /// Every batch sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> MockChain {
        MockChain {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn respond<C: SolCall, V: SolValue>(&self, to: Address, call: &C, value: V) {
        self.insert(to, call, Ok(Bytes::from(value.abi_encode())));
    }

    pub fn fail<C: SolCall>(&self, to: Address, call: &C) {
        self.insert(to, call, Err(reverted()));
    }

    /// Simulates an unreachable node: the whole batch fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    fn insert<C: SolCall>(&self, to: Address, call: &C, result: Result<Bytes, RpcError>) {
        let key = (to, Bytes::from(call.abi_encode()));
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(key, result);
        }
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call_batch(&self, calls: &[CallRequest]) -> Vec<Result<Bytes, RpcError>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            let error = RpcError::Transport("connection refused".to_owned());
            return calls.iter().map(|_| Err(error.clone())).collect();
        }
        let responses = match self.responses.lock() {
            Ok(responses) => responses,
            Err(_) => return calls.iter().map(|_| Err(reverted())).collect(),
        };
        calls
            .iter()
            .map(|call| {
                responses
                    .get(&(call.to, call.data.clone()))
                    .cloned()
                    .unwrap_or_else(|| Err(reverted()))
            })
            .collect()
    }
}

#[derive(Default)]
struct WalletState {
    account: Option<Address>,
    chain_id: Option<u64>,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<B256, TransactionRequest>,
    reject: Vec<[u8; 4]>,
    revert: Vec<[u8; 4]>,
    logs: HashMap<[u8; 4], Vec<Log>>,
}

/// Records submitted transactions and mines them instantly.
pub struct MockWallet {
    state: Mutex<WalletState>,
    gate: Option<Arc<Semaphore>>,
}

impl MockWallet {
    pub fn connected(account: Address, chain_id: u64) -> MockWallet {
        MockWallet {
            state: Mutex::new(WalletState {
                account: Some(account),
                chain_id: Some(chain_id),
                ..Default::default()
            }),
            gate: None,
        }
    }

    /// Sends block until [`MockWallet::release`] hands out a permit.
    pub fn gated(account: Address, chain_id: u64) -> MockWallet {
        MockWallet {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..MockWallet::connected(account, chain_id)
        }
    }

    pub fn release(&self, sends: usize) {
        if let Some(ref gate) = self.gate {
            gate.add_permits(sends);
        }
    }

    pub fn set_account(&self, account: Option<Address>) {
        self.with_state(|state| state.account = account);
    }

    pub fn set_chain_id(&self, chain_id: Option<u64>) {
        self.with_state(|state| state.chain_id = chain_id);
    }

    /// The user declines every call with this selector.
    pub fn reject<C: SolCall>(&self) {
        self.with_state(|state| state.reject.push(C::SELECTOR));
    }

    /// Calls with this selector are mined but revert.
    pub fn revert<C: SolCall>(&self) {
        self.with_state(|state| state.revert.push(C::SELECTOR));
    }

    /// Logs attached to the receipt of every call with this selector.
    pub fn emit<C: SolCall>(&self, logs: Vec<Log>) {
        self.with_state(|state| {
            state.logs.insert(C::SELECTOR, logs);
        });
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state
            .lock()
            .map(|state| state.sent.clone())
            .unwrap_or_default()
    }

    /// Selectors of submitted transactions, in submission order.
    pub fn sent_selectors(&self) -> Vec<[u8; 4]> {
        self.sent().iter().map(|tx| selector(&tx.data)).collect()
    }

    fn with_state<F: FnOnce(&mut WalletState)>(&self, f: F) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }
}

fn selector(data: &Bytes) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if data.len() >= 4 {
        selector.copy_from_slice(&data[..4]);
    }
    selector
}

fn poisoned() -> WalletError {
    WalletError::Rpc(RpcError::Transport("mock wallet poisoned".to_owned()))
}

#[async_trait]
impl WalletSession for MockWallet {
    async fn account(&self) -> Option<Address> {
        self.state.lock().ok().and_then(|state| state.account)
    }

    async fn chain_id(&self) -> Option<u64> {
        self.state.lock().ok().and_then(|state| state.chain_id)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, WalletError> {
        if let Some(ref gate) = self.gate {
            let permit = gate.acquire().await.map_err(|_| poisoned())?;
            permit.forget();
        }
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if state.account.is_none() {
            return Err(WalletError::Disconnected);
        }
        if state.reject.contains(&selector(&request.data)) {
            return Err(WalletError::Rejected(
                "User denied transaction signature.".to_owned(),
            ));
        }
        state.sent.push(request.clone());
        let hash = B256::with_last_byte(state.sent.len() as u8);
        state.receipts.insert(hash, request);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, WalletError> {
        let state = self.state.lock().map_err(|_| poisoned())?;
        let request = state
            .receipts
            .get(&hash)
            .ok_or(WalletError::Timeout(hash, Duration::ZERO))?;
        let selector = selector(&request.data);
        if state.revert.contains(&selector) {
            return Err(WalletError::Reverted(hash));
        }
        Ok(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(format!("{:#x}", state.sent.len())),
            status: Some("0x1".to_owned()),
            logs: state.logs.get(&selector).cloned().unwrap_or_default(),
        })
    }
}
