use crate::dto::{parse_quantity, TransactionReceipt, TransactionRequest, USER_REJECTED_CODE};
use crate::rpc::{JsonRpcClient, RpcError};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum WalletError {
    #[error("no wallet connected")]
    Disconnected,
    #[error("request rejected by user: {0}")]
    Rejected(String),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("no receipt for {0} after {1:?}")]
    Timeout(B256, Duration),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl WalletError {
    /// Short text fit for a status line, `None` when only a technical
    /// description is available.
    pub fn short_message(&self) -> Option<String> {
        match self {
            WalletError::Disconnected => Some("Connect wallet first".to_owned()),
            WalletError::Rejected(_) => Some("User rejected the request.".to_owned()),
            WalletError::Reverted(_) => Some("Transaction reverted".to_owned()),
            WalletError::Timeout(_, _) => None,
            WalletError::Rpc(RpcError::Rpc(error)) => error
                .message
                .lines()
                .map(|line| line.trim())
                .find(|line| !line.is_empty())
                .map(|line| line.to_owned()),
            WalletError::Rpc(_) => None,
        }
    }
}

/// Connected wallet. Signing and nonce/gas handling belong to the wallet.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Active account, `None` while disconnected.
    async fn account(&self) -> Option<Address>;

    async fn chain_id(&self) -> Option<u64>;

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, WalletError>;

    /// Resolves once the transaction is included; a reverted receipt is an error.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, WalletError>;
}

/// Stand-in used when no wallet endpoint is configured; reads keep working.
pub struct DisconnectedWallet;

#[async_trait]
impl WalletSession for DisconnectedWallet {
    async fn account(&self) -> Option<Address> {
        None
    }

    async fn chain_id(&self) -> Option<u64> {
        None
    }

    async fn send_transaction(&self, _request: TransactionRequest) -> Result<B256, WalletError> {
        Err(WalletError::Disconnected)
    }

    async fn wait_for_receipt(&self, _hash: B256) -> Result<TransactionReceipt, WalletError> {
        Err(WalletError::Disconnected)
    }
}

/// Wallet reached over JSON-RPC (browser bridge, local signer or dev node
/// with unlocked accounts).
pub struct RpcWallet {
    rpc: JsonRpcClient,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcWallet {
    pub fn new(
        rpc: JsonRpcClient,
        receipt_poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> RpcWallet {
        RpcWallet {
            rpc,
            receipt_poll_interval,
            receipt_timeout,
        }
    }
}

fn classify(error: RpcError) -> WalletError {
    match error {
        RpcError::Rpc(ref rpc_error) if rpc_error.code == USER_REJECTED_CODE => {
            WalletError::Rejected(rpc_error.message.to_owned())
        }
        other => WalletError::Rpc(other),
    }
}

#[async_trait]
impl WalletSession for RpcWallet {
    async fn account(&self) -> Option<Address> {
        match self.rpc.request::<Vec<Address>>("eth_accounts", json!([])).await {
            Ok(accounts) => accounts.first().copied(),
            Err(error) => {
                warn!("eth_accounts failed on {}: {}", self.rpc.url(), error);
                None
            }
        }
    }

    async fn chain_id(&self) -> Option<u64> {
        match self.rpc.request::<String>("eth_chainId", json!([])).await {
            Ok(id) => parse_quantity(&id),
            Err(error) => {
                warn!("eth_chainId failed on {}: {}", self.rpc.url(), error);
                None
            }
        }
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, WalletError> {
        let hash = self
            .rpc
            .request::<B256>("eth_sendTransaction", json!([request]))
            .await
            .map_err(classify)?;
        info!("Submitted transaction {}", hash);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, WalletError> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            let receipt = self
                .rpc
                .request::<Option<TransactionReceipt>>("eth_getTransactionReceipt", json!([hash]))
                .await;
            match receipt {
                Ok(Some(receipt)) => {
                    if receipt.succeeded() {
                        return Ok(receipt);
                    }
                    return Err(WalletError::Reverted(hash));
                }
                Ok(None) => debug!("Receipt for {} not available yet", hash),
                Err(error) => warn!("eth_getTransactionReceipt {} failed: {}", hash, error),
            }
            if Instant::now() >= deadline {
                return Err(WalletError::Timeout(hash, self.receipt_timeout));
            }
            sleep(self.receipt_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::JsonRpcError;

    #[test]
    fn user_rejection_is_classified() {
        let error = classify(RpcError::Rpc(JsonRpcError {
            code: 4001,
            message: "User denied transaction signature.".to_owned(),
            data: None,
        }));
        assert_eq!(
            error.short_message(),
            Some("User rejected the request.".to_owned())
        );
    }

    #[test]
    fn rpc_message_keeps_first_line_only() {
        let error = classify(RpcError::Rpc(JsonRpcError {
            code: 3,
            message: "execution reverted: Insufficient reward pool\nRaw: 0x08c379a0".to_owned(),
            data: None,
        }));
        assert_eq!(
            error.short_message(),
            Some("execution reverted: Insufficient reward pool".to_owned())
        );
    }

    #[test]
    fn transport_errors_have_no_short_message() {
        let error = classify(RpcError::Transport("connection refused".to_owned()));
        assert_eq!(error.short_message(), None);
    }

    #[tokio::test]
    async fn disconnected_wallet_refuses_writes() {
        let wallet = DisconnectedWallet;
        assert_eq!(wallet.account().await, None);
        let result = wallet
            .send_transaction(TransactionRequest {
                from: Address::ZERO,
                to: Address::ZERO,
                data: Default::default(),
            })
            .await;
        assert_eq!(result, Err(WalletError::Disconnected));
    }
}
