use crate::aggregator::ViewStateAggregator;
use crate::config::{Config, ConfigError};
use crate::orchestrator::TransactionOrchestrator;
use crate::poller::{Poller, PollerHandle};
use crate::rpc::{ChainReader, JsonRpcClient, RpcError};
use crate::wallet::{DisconnectedWallet, RpcWallet, WalletSession};
use alloy_primitives::Address;
use staking_contracts::{ChainDescriptor, Deployment};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Aggregator, poller and orchestrator wired to one chain reader and wallet.
pub struct StakingServices {
    pub chain: ChainDescriptor,
    pub aggregator: Arc<ViewStateAggregator>,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub poller: PollerHandle,
    pub max_fraction_digits: usize,
}

impl StakingServices {
    /// Connects to the configured endpoints and starts polling. The first
    /// watched account is the wallet's, falling back to `watch_account`.
    pub async fn start(config: &Config) -> Result<StakingServices, ServiceError> {
        let chain = config.chain();
        let deployment = config.deployment()?;
        let reader = JsonRpcClient::new(&config.rpc_url, config.rpc_timeout())?;
        info!("Reading {} through {}", chain.label(), reader.url());

        let wallet: Arc<dyn WalletSession> = match config.wallet_rpc_url {
            Some(ref url) => {
                info!("Using wallet endpoint {}", url);
                Arc::new(RpcWallet::new(
                    JsonRpcClient::new(url, config.rpc_timeout())?,
                    config.receipt_poll_interval(),
                    config.receipt_timeout(),
                ))
            }
            None => {
                warn!("No wallet_rpc_url configured, writes are disabled");
                Arc::new(DisconnectedWallet)
            }
        };

        let mut services = StakingServices::with_parts(
            Arc::new(reader),
            wallet,
            chain,
            deployment,
            config.poll_interval(),
            None,
        );
        services.max_fraction_digits = config.max_fraction_digits();
        let account = match services.orchestrator.wallet().account().await {
            Some(account) => Some(account),
            None => config.watch_account()?,
        };
        services.poller.set_account(account);
        Ok(services)
    }

    pub fn with_parts(
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn WalletSession>,
        chain: ChainDescriptor,
        deployment: Deployment,
        poll_interval: Duration,
        account: Option<Address>,
    ) -> StakingServices {
        let aggregator = Arc::new(ViewStateAggregator::new(reader, deployment));
        let poller = Poller::new(aggregator.clone(), poll_interval).spawn(account);
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            aggregator.clone(),
            wallet,
            chain.clone(),
            poller.refresh_handle(),
        ));
        StakingServices {
            chain,
            aggregator,
            orchestrator,
            poller,
            max_fraction_digits: crate::config::DEFAULT_MAX_FRACTION_DIGITS,
        }
    }

    pub fn deployment(&self) -> &Deployment {
        self.aggregator.deployment()
    }

    /// Asks the wallet for its account and points the poller at it.
    pub async fn sync_account(&self) -> Option<Address> {
        let account = self.orchestrator.wallet().account().await;
        self.poller.set_account(account);
        account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockChain, MockWallet};
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn wallet_account_switch_reaches_poller() {
        let first = Address::repeat_byte(0x01);
        let wallet = Arc::new(MockWallet::connected(first, 143));
        let services = StakingServices::with_parts(
            Arc::new(MockChain::new()),
            wallet.clone(),
            ChainDescriptor::monad(),
            Deployment::polynad(),
            Duration::from_secs(10),
            Some(first),
        );
        assert_eq!(services.sync_account().await, Some(first));

        wallet.set_account(None);
        assert_eq!(services.sync_account().await, None);
        sleep(Duration::from_millis(100)).await;
        let snapshot = services.poller.latest().unwrap();
        assert_eq!(snapshot.account, None);
        assert!(snapshot.user.is_none());
    }
}
