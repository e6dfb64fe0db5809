use crate::aggregator::ViewStateAggregator;
use crate::config::DEFAULT_MAX_FRACTION_DIGITS;
use crate::dto::{TransactionReceipt, TransactionRequest};
use crate::events::{decode_logs, StakingEvent};
use crate::format::parse_positive_units;
use crate::poller::{RefreshHandle, RefreshReason};
use crate::wallet::{WalletError, WalletSession};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use serde::Serialize;
use staking_contracts::abi::{IPolynadStaking as Staking, IERC20};
use staking_contracts::{ChainDescriptor, LockTier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Stake,
    Unstake,
    #[strum(serialize = "Early unstake")]
    EarlyUnstake,
    #[strum(serialize = "Claim")]
    ClaimRewards,
    #[strum(serialize = "Compound")]
    CompoundRewards,
    #[strum(serialize = "Sync")]
    SyncRewards,
}

impl ActionKind {
    pub fn progress_message(&self) -> &'static str {
        match self {
            ActionKind::Approve => "Approving…",
            ActionKind::Stake => "Staking…",
            ActionKind::Unstake => "Unstaking…",
            ActionKind::EarlyUnstake => "Early unstaking…",
            ActionKind::ClaimRewards => "Claiming…",
            ActionKind::CompoundRewards => "Compounding…",
            ActionKind::SyncRewards => "Syncing…",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ActionKind::Approve => "✅ Approved",
            ActionKind::Stake => "✅ Staked",
            ActionKind::Unstake => "✅ Unstaked",
            ActionKind::EarlyUnstake => "✅ Early unstaked",
            ActionKind::ClaimRewards => "✅ Claimed",
            ActionKind::CompoundRewards => "✅ Compounded",
            ActionKind::SyncRewards => "✅ Synced",
        }
    }

    /// Generic text when the underlying error has nothing better.
    pub fn failure_message(&self) -> String {
        format!("{} failed", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ActionPhase {
    Idle,
    Rejected,
    Submitting { step: u8, of: u8 },
    Succeeded,
    Failed,
}

/// The single status line shown next to the controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub kind: Option<ActionKind>,
    #[serde(flatten)]
    pub phase: ActionPhase,
    pub message: String,
}

impl ActionStatus {
    pub fn idle() -> ActionStatus {
        ActionStatus {
            kind: None,
            phase: ActionPhase::Idle,
            message: String::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, ActionPhase::Submitting { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ActionError {
    #[error("Connect wallet first")]
    NotConnected,
    #[error("Switch to {expected}")]
    WrongNetwork {
        expected: String,
        actual: Option<u64>,
    },
    #[error("Enter a valid amount")]
    InvalidAmount,
    #[error("Insufficient {symbol} balance")]
    InsufficientBalance { symbol: String },
    #[error("No rewards to claim")]
    NothingToClaim,
    #[error("Another transaction is in progress")]
    Busy,
    #[error("{kind} failed: {source}")]
    Transaction {
        kind: ActionKind,
        #[source]
        source: WalletError,
    },
}

impl ActionError {
    /// True for errors raised before anything was sent to the wallet.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ActionError::Transaction { .. })
    }

    pub fn status_message(&self) -> String {
        match self {
            ActionError::Transaction { kind, source } => source
                .short_message()
                .unwrap_or_else(|| kind.failure_message()),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalStep {
    /// Allowance already covered the amount.
    Skipped,
    /// Exact-amount approval mined.
    Submitted { tx_hash: B256 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub tx_hashes: Vec<B256>,
    pub tx_urls: Vec<String>,
    pub events: Vec<StakingEvent>,
    /// The amount field should be emptied.
    pub clear_input: bool,
}

/// Which controls are enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionAvailability {
    pub stake: bool,
    pub unstake: bool,
    pub early_unstake: bool,
    pub claim_rewards: bool,
    pub compound_rewards: bool,
    pub sync_rewards: bool,
}

impl ActionAvailability {
    pub fn evaluate(connected: bool, earned: U256, busy: bool) -> ActionAvailability {
        if !connected || busy {
            return ActionAvailability::default();
        }
        let has_rewards = !earned.is_zero();
        ActionAvailability {
            stake: true,
            unstake: true,
            early_unstake: true,
            claim_rewards: has_rewards,
            compound_rewards: has_rewards,
            sync_rewards: true,
        }
    }
}

/// Releases the in-flight flag. An action dropped before `finish` leaves a
/// failed status instead of a stale `Submitting` one.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    status: &'a watch::Sender<ActionStatus>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.status.send_if_modified(|status| {
            if !status.is_busy() {
                return false;
            }
            warn!("{} interrupted before completion", status.message);
            *status = ActionStatus {
                kind: status.kind,
                phase: ActionPhase::Failed,
                message: match status.kind {
                    Some(kind) => format!("{} interrupted", kind),
                    None => "Transaction interrupted".to_owned(),
                },
            };
            true
        });
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs user-triggered writes one at a time and reports progress through
/// an [`ActionStatus`] watch channel.
pub struct TransactionOrchestrator {
    aggregator: Arc<ViewStateAggregator>,
    wallet: Arc<dyn WalletSession>,
    chain: ChainDescriptor,
    refresh: RefreshHandle,
    in_flight: AtomicBool,
    status: watch::Sender<ActionStatus>,
}

impl TransactionOrchestrator {
    pub fn new(
        aggregator: Arc<ViewStateAggregator>,
        wallet: Arc<dyn WalletSession>,
        chain: ChainDescriptor,
        refresh: RefreshHandle,
    ) -> TransactionOrchestrator {
        let (status, _) = watch::channel(ActionStatus::idle());
        TransactionOrchestrator {
            aggregator,
            wallet,
            chain,
            refresh,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    pub fn status(&self) -> ActionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn wallet(&self) -> &Arc<dyn WalletSession> {
        &self.wallet
    }

    pub async fn stake(&self, amount: &str, tier: LockTier) -> Result<ActionOutcome, ActionError> {
        let _guard = self.begin()?;
        let result = self.run_stake(amount, tier).await;
        self.finish(ActionKind::Stake, result)
    }

    pub async fn unstake(&self) -> Result<ActionOutcome, ActionError> {
        self.simple(ActionKind::Unstake, Staking::unstakeCall {}.abi_encode())
            .await
    }

    pub async fn early_unstake(&self) -> Result<ActionOutcome, ActionError> {
        self.simple(
            ActionKind::EarlyUnstake,
            Staking::earlyUnstakeCall {}.abi_encode(),
        )
        .await
    }

    pub async fn claim_rewards(&self) -> Result<ActionOutcome, ActionError> {
        self.simple(
            ActionKind::ClaimRewards,
            Staking::claimRewardsCall {}.abi_encode(),
        )
        .await
    }

    pub async fn compound_rewards(&self) -> Result<ActionOutcome, ActionError> {
        self.simple(
            ActionKind::CompoundRewards,
            Staking::compoundRewardsCall {}.abi_encode(),
        )
        .await
    }

    /// Anyone may push pending rewards into the stream, so no account checks
    /// happen here; the wallet refuses if it cannot sign.
    pub async fn sync_rewards(&self) -> Result<ActionOutcome, ActionError> {
        let _guard = self.begin()?;
        let result = self.run_sync().await;
        self.finish(ActionKind::SyncRewards, result)
    }

    async fn simple(&self, kind: ActionKind, data: Vec<u8>) -> Result<ActionOutcome, ActionError> {
        let _guard = self.begin()?;
        let result = self.run_simple(kind, data).await;
        self.finish(kind, result)
    }

    async fn run_sync(&self) -> Result<ActionOutcome, ActionError> {
        let kind = ActionKind::SyncRewards;
        let from = self.wallet.account().await.unwrap_or(Address::ZERO);
        self.set_submitting(kind, 1, 1);
        let data = Staking::syncRewardsCall {}.abi_encode();
        let receipt = self.submit(kind, from, self.staking(), data).await?;
        Ok(self.outcome(kind, vec![receipt], false))
    }

    async fn run_simple(&self, kind: ActionKind, data: Vec<u8>) -> Result<ActionOutcome, ActionError> {
        let account = self.connected_account().await?;
        if matches!(kind, ActionKind::ClaimRewards | ActionKind::CompoundRewards)
            && self.aggregator.earned(account).await.is_zero()
        {
            return Err(ActionError::NothingToClaim);
        }
        self.set_submitting(kind, 1, 1);
        let receipt = self.submit(kind, account, self.staking(), data).await?;
        Ok(self.outcome(kind, vec![receipt], false))
    }

    async fn run_stake(&self, amount: &str, tier: LockTier) -> Result<ActionOutcome, ActionError> {
        let account = self.connected_account().await?;
        let deployment = self.aggregator.deployment();
        let amount = parse_positive_units(amount, deployment.token_decimals)
            .ok_or(ActionError::InvalidAmount)?;
        let position = self.aggregator.token_position(account).await;
        if position.balance < amount {
            return Err(ActionError::InsufficientBalance {
                symbol: deployment.token_symbol.to_owned(),
            });
        }

        let mut receipts = Vec::with_capacity(2);
        let approval = if position.allowance < amount {
            self.set_submitting(ActionKind::Approve, 1, 2);
            let call = IERC20::approveCall {
                spender: self.staking(),
                amount,
            };
            let receipt = self
                .submit(ActionKind::Approve, account, deployment.token, call.abi_encode())
                .await?;
            let tx_hash = receipt.transaction_hash;
            receipts.push(receipt);
            ApprovalStep::Submitted { tx_hash }
        } else {
            ApprovalStep::Skipped
        };
        info!("Approval step for {}: {:?}", account, approval);

        let (step, of) = match approval {
            ApprovalStep::Skipped => (1, 1),
            ApprovalStep::Submitted { .. } => (2, 2),
        };
        self.set_submitting(ActionKind::Stake, step, of);
        let call = Staking::stakeCall {
            amount,
            tier: tier.index(),
        };
        let receipt = match self
            .submit(ActionKind::Stake, account, self.staking(), call.abi_encode())
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                if let ApprovalStep::Submitted { .. } = approval {
                    // The allowance changed on-chain even though staking did not.
                    self.refresh.refresh(RefreshReason::ActionCompleted);
                }
                return Err(err);
            }
        };
        receipts.push(receipt);
        Ok(self.outcome(ActionKind::Stake, receipts, true))
    }

    fn staking(&self) -> Address {
        self.aggregator.deployment().staking
    }

    fn begin(&self) -> Result<InFlight<'_>, ActionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Action rejected, another transaction is in progress");
            return Err(ActionError::Busy);
        }
        self.status.send_replace(ActionStatus::idle());
        Ok(InFlight {
            flag: &self.in_flight,
            status: &self.status,
        })
    }

    async fn connected_account(&self) -> Result<Address, ActionError> {
        let account = self.wallet.account().await.ok_or(ActionError::NotConnected)?;
        let chain_id = self.wallet.chain_id().await;
        if chain_id != Some(self.chain.id) {
            return Err(ActionError::WrongNetwork {
                expected: self.chain.label(),
                actual: chain_id,
            });
        }
        Ok(account)
    }

    fn set_submitting(&self, kind: ActionKind, step: u8, of: u8) {
        self.status.send_replace(ActionStatus {
            kind: Some(kind),
            phase: ActionPhase::Submitting { step, of },
            message: kind.progress_message().to_owned(),
        });
    }

    async fn submit(
        &self,
        kind: ActionKind,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TransactionReceipt, ActionError> {
        let request = TransactionRequest {
            from,
            to,
            data: Bytes::from(data),
        };
        let hash = self
            .wallet
            .send_transaction(request)
            .await
            .map_err(|source| ActionError::Transaction { kind, source })?;
        info!("{} submitted: {}", kind, self.chain.tx_url(&hash));
        self.wallet
            .wait_for_receipt(hash)
            .await
            .map_err(|source| ActionError::Transaction { kind, source })
    }

    fn outcome(
        &self,
        kind: ActionKind,
        receipts: Vec<TransactionReceipt>,
        clear_input: bool,
    ) -> ActionOutcome {
        let deployment = self.aggregator.deployment();
        let events: Vec<StakingEvent> = receipts
            .iter()
            .flat_map(|receipt| decode_logs(deployment.staking, &receipt.logs))
            .collect();
        for event in events.iter() {
            info!("{}", event.describe(deployment, DEFAULT_MAX_FRACTION_DIGITS));
        }
        let tx_hashes: Vec<B256> = receipts.iter().map(|r| r.transaction_hash).collect();
        ActionOutcome {
            kind,
            tx_urls: tx_hashes.iter().map(|hash| self.chain.tx_url(hash)).collect(),
            tx_hashes,
            events,
            clear_input,
        }
    }

    fn finish(
        &self,
        kind: ActionKind,
        result: Result<ActionOutcome, ActionError>,
    ) -> Result<ActionOutcome, ActionError> {
        let status = match result {
            Ok(_) => {
                self.refresh.refresh(RefreshReason::ActionCompleted);
                ActionStatus {
                    kind: Some(kind),
                    phase: ActionPhase::Succeeded,
                    message: kind.success_message().to_owned(),
                }
            }
            Err(ref err) if err.is_rejection() => {
                info!("{} rejected: {}", kind, err);
                ActionStatus {
                    kind: Some(kind),
                    phase: ActionPhase::Rejected,
                    message: err.status_message(),
                }
            }
            Err(ref err) => {
                error!("{} failed: {:?}", kind, err);
                ActionStatus {
                    kind: Some(kind),
                    phase: ActionPhase::Failed,
                    message: err.status_message(),
                }
            }
        };
        self.status.send_replace(status);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::log_for;
    use crate::mock::{MockChain, MockWallet};
    use staking_contracts::Deployment;
    use tokio::sync::mpsc;

    const CHAIN_ID: u64 = 143;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u8))
    }

    fn user() -> Address {
        Address::repeat_byte(0x42)
    }

    struct Fixture {
        chain: Arc<MockChain>,
        wallet: Arc<MockWallet>,
        orchestrator: Arc<TransactionOrchestrator>,
        refresh_rx: mpsc::UnboundedReceiver<RefreshReason>,
    }

    fn fixture_with(wallet: MockWallet) -> Fixture {
        let chain = Arc::new(MockChain::new());
        let wallet = Arc::new(wallet);
        let aggregator = Arc::new(ViewStateAggregator::new(
            chain.clone(),
            Deployment::polynad(),
        ));
        let (refresh, refresh_rx) = RefreshHandle::channel();
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            aggregator,
            wallet.clone(),
            ChainDescriptor::monad(),
            refresh,
        ));
        Fixture {
            chain,
            wallet,
            orchestrator,
            refresh_rx,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockWallet::connected(user(), CHAIN_ID))
    }

    fn fund(chain: &MockChain, balance: U256, allowance: U256) {
        let deployment = Deployment::polynad();
        chain.respond(
            deployment.token,
            &IERC20::balanceOfCall { owner: user() },
            balance,
        );
        chain.respond(
            deployment.token,
            &IERC20::allowanceCall {
                owner: user(),
                spender: deployment.staking,
            },
            allowance,
        );
    }

    #[tokio::test]
    async fn stake_approves_exact_amount_first() {
        let mut f = fixture();
        fund(&f.chain, tokens(100), U256::ZERO);

        let outcome = f
            .orchestrator
            .stake("10", LockTier::NinetyDays)
            .await
            .unwrap();

        let sent = f.wallet.sent();
        assert_eq!(sent.len(), 2);
        let deployment = Deployment::polynad();
        assert_eq!(sent[0].to, deployment.token);
        let approve = IERC20::approveCall::abi_decode(&sent[0].data, true).unwrap();
        assert_eq!(approve.spender, deployment.staking);
        assert_eq!(approve.amount, tokens(10));

        assert_eq!(sent[1].to, deployment.staking);
        let stake = Staking::stakeCall::abi_decode(&sent[1].data, true).unwrap();
        assert_eq!(stake.amount, tokens(10));
        assert_eq!(stake.tier, 1);

        assert_eq!(outcome.tx_hashes.len(), 2);
        assert!(outcome.clear_input);
        assert!(outcome.tx_urls[1].starts_with("https://explorer.monad.xyz/tx/0x"));
        assert_eq!(f.orchestrator.status().message, "✅ Staked");
        assert_eq!(f.refresh_rx.try_recv(), Ok(RefreshReason::ActionCompleted));
    }

    #[tokio::test]
    async fn stake_skips_approval_when_allowance_covers() {
        let f = fixture();
        fund(&f.chain, tokens(100), tokens(10));

        f.orchestrator.stake("10", LockTier::OneYear).await.unwrap();
        assert_eq!(
            f.wallet.sent_selectors(),
            vec![Staking::stakeCall::SELECTOR]
        );
    }

    #[tokio::test]
    async fn stake_validation_sends_nothing() {
        let f = fixture();
        fund(&f.chain, tokens(5), U256::ZERO);

        let err = f
            .orchestrator
            .stake("0", LockTier::ThirtyDays)
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::InvalidAmount);
        assert_eq!(f.orchestrator.status().phase, ActionPhase::Rejected);
        assert_eq!(f.orchestrator.status().message, "Enter a valid amount");

        let err = f
            .orchestrator
            .stake("10", LockTier::ThirtyDays)
            .await
            .unwrap_err();
        assert_eq!(err.status_message(), "Insufficient POLYNAD balance");
        assert!(f.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn disconnected_wallet_is_rejected() {
        let f = fixture();
        f.wallet.set_account(None);
        let err = f.orchestrator.unstake().await.unwrap_err();
        assert_eq!(err, ActionError::NotConnected);
        assert_eq!(f.orchestrator.status().message, "Connect wallet first");
    }

    #[tokio::test]
    async fn wrong_network_is_rejected() {
        let f = fixture();
        f.wallet.set_chain_id(Some(1));
        let err = f.orchestrator.early_unstake().await.unwrap_err();
        assert_eq!(err.status_message(), "Switch to Monad (143)");
        assert!(f.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn claim_requires_rewards() {
        let f = fixture();
        let err = f.orchestrator.claim_rewards().await.unwrap_err();
        assert_eq!(err, ActionError::NothingToClaim);

        f.chain.respond(
            Deployment::polynad().staking,
            &Staking::earnedCall { user: user() },
            tokens(3),
        );
        f.wallet.emit::<Staking::claimRewardsCall>(vec![log_for(
            Deployment::polynad().staking,
            &Staking::RewardPaid {
                user: user(),
                reward: tokens(3),
            },
        )]);
        let outcome = f.orchestrator.claim_rewards().await.unwrap();
        assert_eq!(
            outcome.events,
            vec![StakingEvent::RewardPaid {
                user: user(),
                reward: tokens(3)
            }]
        );
        assert!(!outcome.clear_input);
        assert_eq!(f.orchestrator.status().message, "✅ Claimed");
    }

    #[tokio::test]
    async fn user_rejection_keeps_short_message() {
        let mut f = fixture();
        fund(&f.chain, tokens(100), U256::ZERO);
        f.wallet.reject::<IERC20::approveCall>();

        let err = f
            .orchestrator
            .stake("10", LockTier::ThirtyDays)
            .await
            .unwrap_err();
        assert!(!err.is_rejection());
        let status = f.orchestrator.status();
        assert_eq!(status.phase, ActionPhase::Failed);
        assert_eq!(status.message, "User rejected the request.");
        // stake never submitted after a failed approval
        assert!(f.wallet.sent().is_empty());
        assert!(f.refresh_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn revert_reports_generic_failure() {
        let f = fixture();
        f.wallet.revert::<Staking::compoundRewardsCall>();
        f.chain.respond(
            Deployment::polynad().staking,
            &Staking::earnedCall { user: user() },
            tokens(1),
        );
        let err = f.orchestrator.compound_rewards().await.unwrap_err();
        assert_eq!(err.status_message(), "Transaction reverted");
    }

    #[tokio::test]
    async fn sync_without_wallet_fails_in_wallet() {
        let f = fixture();
        f.wallet.set_account(None);
        let err = f.orchestrator.sync_rewards().await.unwrap_err();
        assert_eq!(
            err,
            ActionError::Transaction {
                kind: ActionKind::SyncRewards,
                source: WalletError::Disconnected
            }
        );
        assert_eq!(f.orchestrator.status().message, "Connect wallet first");
    }

    #[tokio::test]
    async fn second_trigger_while_in_flight_is_busy() {
        let f = fixture_with(MockWallet::gated(user(), CHAIN_ID));
        let orchestrator = f.orchestrator.clone();
        let first = tokio::spawn(async move { orchestrator.unstake().await });

        let mut status = f.orchestrator.subscribe();
        while !status.borrow_and_update().is_busy() {
            status.changed().await.unwrap();
        }
        assert!(f.orchestrator.is_busy());
        assert_eq!(f.orchestrator.status().message, "Unstaking…");

        let err = f.orchestrator.sync_rewards().await.unwrap_err();
        assert_eq!(err, ActionError::Busy);
        // the running action keeps its status line
        assert_eq!(f.orchestrator.status().message, "Unstaking…");

        f.wallet.release(1);
        first.await.unwrap().unwrap();
        assert!(!f.orchestrator.is_busy());
        assert_eq!(f.wallet.sent().len(), 1);
    }

    #[tokio::test]
    async fn dropped_action_leaves_failed_status() {
        let f = fixture_with(MockWallet::gated(user(), CHAIN_ID));
        let orchestrator = f.orchestrator.clone();
        let task = tokio::spawn(async move { orchestrator.unstake().await });

        let mut status = f.orchestrator.subscribe();
        while !status.borrow_and_update().is_busy() {
            status.changed().await.unwrap();
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!f.orchestrator.is_busy());
        let status = f.orchestrator.status();
        assert!(!status.is_busy());
        assert_eq!(status.kind, Some(ActionKind::Unstake));
        assert_eq!(status.phase, ActionPhase::Failed);
        assert_eq!(status.message, "Unstake interrupted");

        // a new action can start afterwards
        f.wallet.release(1);
        f.orchestrator.unstake().await.unwrap();
        assert_eq!(f.orchestrator.status().message, "✅ Unstaked");
    }

    #[tokio::test]
    async fn failed_stake_after_approval_still_refreshes() {
        let mut f = fixture();
        fund(&f.chain, tokens(100), U256::ZERO);
        f.wallet.revert::<Staking::stakeCall>();

        let err = f
            .orchestrator
            .stake("10", LockTier::ThirtyDays)
            .await
            .unwrap_err();
        assert_eq!(err.status_message(), "Transaction reverted");
        assert_eq!(f.refresh_rx.try_recv(), Ok(RefreshReason::ActionCompleted));
    }

    #[test]
    fn availability_rules() {
        let none = ActionAvailability::default();
        assert_eq!(ActionAvailability::evaluate(false, tokens(1), false), none);
        assert_eq!(ActionAvailability::evaluate(true, tokens(1), true), none);

        let no_rewards = ActionAvailability::evaluate(true, U256::ZERO, false);
        assert!(no_rewards.stake && no_rewards.unstake && no_rewards.sync_rewards);
        assert!(!no_rewards.claim_rewards);
        assert!(!no_rewards.compound_rewards);

        let rewards = ActionAvailability::evaluate(true, tokens(1), false);
        assert!(rewards.claim_rewards && rewards.compound_rewards);
    }
}
