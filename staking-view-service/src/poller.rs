use crate::aggregator::ViewStateAggregator;
use crate::snapshot::StakingSnapshot;
use alloy_primitives::Address;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshReason {
    /// Explicit request, also used for a regained page focus.
    Manual,
    /// A write was confirmed.
    ActionCompleted,
}

/// Asks the poller for an immediate refetch.
#[derive(Clone, Debug)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<RefreshReason>,
}

impl RefreshHandle {
    pub fn channel() -> (RefreshHandle, mpsc::UnboundedReceiver<RefreshReason>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RefreshHandle { tx }, rx)
    }

    pub fn refresh(&self, reason: RefreshReason) {
        if self.tx.send(reason).is_err() {
            debug!("Refresh {:?} dropped, poller stopped", reason);
        }
    }
}

pub struct Poller {
    aggregator: Arc<ViewStateAggregator>,
    interval: Duration,
}

impl Poller {
    pub fn new(aggregator: Arc<ViewStateAggregator>, interval: Duration) -> Poller {
        Poller {
            aggregator,
            interval,
        }
    }

    /// Starts polling for `account`. The first fetch runs immediately.
    pub fn spawn(self, account: Option<Address>) -> PollerHandle {
        let (refresh, refresh_rx) = RefreshHandle::channel();
        let (account_tx, account_rx) = watch::channel(account);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(refresh_rx, account_rx, snapshot_tx, shutdown_rx));
        PollerHandle {
            refresh,
            account: account_tx,
            snapshots: snapshot_rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        self,
        mut refresh_rx: mpsc::UnboundedReceiver<RefreshReason>,
        mut account_rx: watch::Receiver<Option<Address>>,
        snapshot_tx: watch::Sender<Option<StakingSnapshot>>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
                reason = refresh_rx.recv() => match reason {
                    Some(reason) => debug!("Refresh requested: {:?}", reason),
                    None => break,
                },
                changed = account_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let account = *account_rx.borrow_and_update();
                    info!("Account changed to {:?}", account);
                    // drop the previous account's section right away
                    let global = snapshot_tx
                        .borrow()
                        .as_ref()
                        .map(|snapshot| snapshot.global.clone())
                        .unwrap_or_default();
                    snapshot_tx.send_replace(Some(StakingSnapshot::pending(
                        account,
                        global,
                        Utc::now().timestamp(),
                    )));
                }
            }

            let account = *account_rx.borrow_and_update();
            let snapshot = self.aggregator.snapshot(account).await;
            if *account_rx.borrow() != account {
                debug!("Discarding snapshot for stale account {:?}", account);
                continue;
            }
            snapshot_tx.send_replace(Some(snapshot));
        }
        info!("Poller stopped");
    }
}

/// Owner side of a running [`Poller`]. Dropping it stops the task.
pub struct PollerHandle {
    refresh: RefreshHandle,
    account: watch::Sender<Option<Address>>,
    snapshots: watch::Receiver<Option<StakingSnapshot>>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    pub fn refresh(&self) {
        self.refresh.refresh(RefreshReason::Manual);
    }

    pub fn account(&self) -> Option<Address> {
        *self.account.borrow()
    }

    /// Switches the watched account; a no-op if it did not change.
    pub fn set_account(&self, account: Option<Address>) {
        self.account.send_if_modified(|current| {
            if *current == account {
                return false;
            }
            *current = account;
            true
        });
    }

    /// `None` until the first fetch completes.
    pub fn latest(&self) -> Option<StakingSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StakingSnapshot>> {
        self.snapshots.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(error) = self.task.await {
            debug!("Poller task ended abnormally: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use alloy_primitives::U256;
    use staking_contracts::abi::IPolynadStaking;
    use staking_contracts::Deployment;
    use tokio::time::sleep;

    fn aggregator(chain: Arc<MockChain>) -> Arc<ViewStateAggregator> {
        Arc::new(ViewStateAggregator::new(chain, Deployment::polynad()))
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_and_refresh() {
        let chain = Arc::new(MockChain::new());
        let handle = Poller::new(aggregator(chain.clone()), Duration::from_secs(10)).spawn(None);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(chain.batches(), 1);
        assert!(handle.latest().is_some());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(chain.batches(), 2);

        handle.refresh();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(chain.batches(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn new_snapshot_replaces_old_values() {
        let deployment = Deployment::polynad();
        let chain = Arc::new(MockChain::new());
        chain.respond(
            deployment.staking,
            &IPolynadStaking::totalStakedCall {},
            U256::from(1u8),
        );
        let handle = Poller::new(aggregator(chain.clone()), Duration::from_secs(10)).spawn(None);
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(handle.latest().unwrap().global.total_staked, U256::from(1u8));

        chain.respond(
            deployment.staking,
            &IPolynadStaking::totalStakedCall {},
            U256::from(2u8),
        );
        handle.refresh();
        rx.changed().await.unwrap();
        assert_eq!(handle.latest().unwrap().global.total_staked, U256::from(2u8));
    }

    #[tokio::test(start_paused = true)]
    async fn account_switch_never_shows_previous_user() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let chain = Arc::new(MockChain::with_delay(Duration::from_secs(1)));
        let handle = Poller::new(aggregator(chain.clone()), Duration::from_secs(10)).spawn(Some(a));

        // switch while the fetch for `a` is still in flight
        sleep(Duration::from_millis(500)).await;
        handle.set_account(Some(b));

        sleep(Duration::from_millis(1_000)).await;
        let pending = handle.latest().unwrap();
        assert_eq!(pending.account, Some(b));
        assert!(pending.user.is_none());

        sleep(Duration::from_secs(2)).await;
        let settled = handle.latest().unwrap();
        assert_eq!(settled.account, Some(b));
        assert!(settled.user_for(Some(b)).is_some());
        assert!(settled.user_for(Some(a)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_clears_user_section() {
        let a = Address::repeat_byte(0xaa);
        let chain = Arc::new(MockChain::new());
        let handle = Poller::new(aggregator(chain), Duration::from_secs(10)).spawn(Some(a));
        sleep(Duration::from_millis(100)).await;
        assert!(handle.latest().unwrap().user.is_some());

        handle.set_account(None);
        sleep(Duration::from_millis(100)).await;
        let snapshot = handle.latest().unwrap();
        assert_eq!(snapshot.account, None);
        assert!(snapshot.user.is_none());
    }
}
