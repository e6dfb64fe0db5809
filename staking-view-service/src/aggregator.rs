use crate::rpc::{BatchResults, ChainReader, ReadBatch, Slot};
use crate::snapshot::{GlobalSnapshot, StakingSnapshot, UserSnapshot};
use alloy_primitives::{Address, U256};
use chrono::Utc;
use staking_contracts::abi::{IPolynadStaking as Staking, IERC20};
use staking_contracts::Deployment;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Balance and allowance the stake flow checks right before submitting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenPosition {
    pub balance: U256,
    pub allowance: U256,
}

struct GlobalSlots {
    total_staked: Slot<Staking::totalStakedCall>,
    total_staked_all_time: Slot<Staking::totalStakedAllTimeCall>,
    active_stakers: Slot<Staking::activeStakersCall>,
    reward_pool: Slot<Staking::rewardPoolCall>,
    early_penalty_bps: Slot<Staking::EARLY_PENALTY_BPSCall>,
    reward_duration: Slot<Staking::REWARD_DURATIONCall>,
    lock_duration: Slot<Staking::LOCK_DURATIONCall>,
    lock_durations: Slot<Staking::getLockDurationsCall>,
}

impl GlobalSlots {
    fn add(batch: &mut ReadBatch, staking: Address) -> GlobalSlots {
        GlobalSlots {
            total_staked: batch.add(staking, &Staking::totalStakedCall {}),
            total_staked_all_time: batch.add(staking, &Staking::totalStakedAllTimeCall {}),
            active_stakers: batch.add(staking, &Staking::activeStakersCall {}),
            reward_pool: batch.add(staking, &Staking::rewardPoolCall {}),
            early_penalty_bps: batch.add(staking, &Staking::EARLY_PENALTY_BPSCall {}),
            reward_duration: batch.add(staking, &Staking::REWARD_DURATIONCall {}),
            lock_duration: batch.add(staking, &Staking::LOCK_DURATIONCall {}),
            lock_durations: batch.add(staking, &Staking::getLockDurationsCall {}),
        }
    }

    fn read(&self, results: &BatchResults) -> GlobalSnapshot {
        GlobalSnapshot {
            total_staked: results.get(&self.total_staked).map(|r| r._0).unwrap_or_default(),
            total_staked_all_time: results
                .get(&self.total_staked_all_time)
                .map(|r| r._0)
                .unwrap_or_default(),
            active_stakers: results.get(&self.active_stakers).map(|r| r._0).unwrap_or_default(),
            reward_pool: results.get(&self.reward_pool).map(|r| r._0).unwrap_or_default(),
            early_penalty_bps: results
                .get(&self.early_penalty_bps)
                .map(|r| r._0)
                .unwrap_or_default(),
            reward_duration: results
                .get(&self.reward_duration)
                .map(|r| r._0)
                .unwrap_or_default(),
            lock_duration: results.get(&self.lock_duration).map(|r| r._0).unwrap_or_default(),
            lock_durations: results
                .get(&self.lock_durations)
                .map(|r| r._0)
                .unwrap_or_default(),
        }
    }
}

struct UserSlots {
    staked: Slot<Staking::stakeOfCall>,
    stake_timestamp: Slot<Staking::stakeTimestampCall>,
    lock_seconds: Slot<Staking::lockSecondsCall>,
    lock_tier: Slot<Staking::lockTierCall>,
    is_active_staker: Slot<Staking::isActiveStakerCall>,
    can_unstake: Slot<Staking::canUnstakeCall>,
    earned: Slot<Staking::earnedCall>,
    balance: Slot<IERC20::balanceOfCall>,
    allowance: Slot<IERC20::allowanceCall>,
}

impl UserSlots {
    fn add(batch: &mut ReadBatch, deployment: &Deployment, user: Address) -> UserSlots {
        let staking = deployment.staking;
        UserSlots {
            staked: batch.add(staking, &Staking::stakeOfCall { user }),
            stake_timestamp: batch.add(staking, &Staking::stakeTimestampCall { user }),
            lock_seconds: batch.add(staking, &Staking::lockSecondsCall { user }),
            lock_tier: batch.add(staking, &Staking::lockTierCall { user }),
            is_active_staker: batch.add(staking, &Staking::isActiveStakerCall { user }),
            can_unstake: batch.add(staking, &Staking::canUnstakeCall { user }),
            earned: batch.add(staking, &Staking::earnedCall { user }),
            balance: batch.add(deployment.token, &IERC20::balanceOfCall { owner: user }),
            allowance: batch.add(
                deployment.token,
                &IERC20::allowanceCall {
                    owner: user,
                    spender: staking,
                },
            ),
        }
    }

    fn read(&self, results: &BatchResults) -> UserSnapshot {
        UserSnapshot {
            staked: results.get(&self.staked).map(|r| r._0).unwrap_or_default(),
            stake_timestamp: results
                .get(&self.stake_timestamp)
                .map(|r| r._0)
                .unwrap_or_default(),
            lock_seconds: results.get(&self.lock_seconds).map(|r| r._0).unwrap_or_default(),
            lock_tier: results.get(&self.lock_tier).map(|r| r._0).unwrap_or_default(),
            is_active_staker: results
                .get(&self.is_active_staker)
                .map(|r| r._0)
                .unwrap_or_default(),
            can_unstake: results.get(&self.can_unstake).map(|r| r._0).unwrap_or_default(),
            earned: results.get(&self.earned).map(|r| r._0).unwrap_or_default(),
            balance: results.get(&self.balance).map(|r| r._0).unwrap_or_default(),
            allowance: results.get(&self.allowance).map(|r| r._0).unwrap_or_default(),
        }
    }
}

/// Reads pool and account state from the contracts and assembles snapshots.
///
/// Never fails: each call that errors or reverts leaves its field at zero
/// (or `false`) and the rest of the snapshot is kept.
pub struct ViewStateAggregator {
    reader: Arc<dyn ChainReader>,
    deployment: Deployment,
}

impl ViewStateAggregator {
    pub fn new(reader: Arc<dyn ChainReader>, deployment: Deployment) -> ViewStateAggregator {
        ViewStateAggregator { reader, deployment }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// One batch covering the global reads and, if `account` is set, the user reads.
    pub async fn snapshot(&self, account: Option<Address>) -> StakingSnapshot {
        let mut batch = ReadBatch::new();
        let global_slots = GlobalSlots::add(&mut batch, self.deployment.staking);
        let user_slots = account.map(|user| UserSlots::add(&mut batch, &self.deployment, user));
        let calls = batch.len();

        let results = batch.execute(self.reader.as_ref()).await;
        let failures = results.failures();
        if failures == calls {
            warn!("All {} staking reads failed, showing defaults", calls);
        } else if failures > 0 {
            debug!("{} of {} staking reads degraded", failures, calls);
        }

        let snapshot = StakingSnapshot {
            account,
            fetched_at: Utc::now().timestamp(),
            global: global_slots.read(&results),
            user: user_slots.map(|slots| slots.read(&results)),
        };
        info!(
            "Snapshot for {:?}: total_staked={}, active_stakers={}",
            account, snapshot.global.total_staked, snapshot.global.active_stakers
        );
        snapshot
    }

    pub async fn token_position(&self, account: Address) -> TokenPosition {
        let mut batch = ReadBatch::new();
        let balance = batch.add(self.deployment.token, &IERC20::balanceOfCall { owner: account });
        let allowance = batch.add(
            self.deployment.token,
            &IERC20::allowanceCall {
                owner: account,
                spender: self.deployment.staking,
            },
        );
        let results = batch.execute(self.reader.as_ref()).await;
        TokenPosition {
            balance: results.get(&balance).map(|r| r._0).unwrap_or_default(),
            allowance: results.get(&allowance).map(|r| r._0).unwrap_or_default(),
        }
    }

    pub async fn earned(&self, account: Address) -> U256 {
        let mut batch = ReadBatch::new();
        let earned = batch.add(self.deployment.staking, &Staking::earnedCall { user: account });
        let results = batch.execute(self.reader.as_ref()).await;
        results.get(&earned).map(|r| r._0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u8))
    }

    fn user() -> Address {
        Address::repeat_byte(0x42)
    }

    fn populated_chain(deployment: &Deployment) -> MockChain {
        let staking = deployment.staking;
        let mock = MockChain::new();
        mock.respond(staking, &Staking::totalStakedCall {}, tokens(8_420_000));
        mock.respond(staking, &Staking::totalStakedAllTimeCall {}, tokens(9_000_000));
        mock.respond(staking, &Staking::activeStakersCall {}, U256::from(37u8));
        mock.respond(staking, &Staking::rewardPoolCall {}, tokens(420_000));
        mock.respond(staking, &Staking::EARLY_PENALTY_BPSCall {}, U256::from(1000u16));
        mock.respond(staking, &Staking::REWARD_DURATIONCall {}, U256::from(604_800u64));
        mock.respond(staking, &Staking::LOCK_DURATIONCall {}, U256::from(1_209_600u64));
        mock.respond(
            staking,
            &Staking::getLockDurationsCall {},
            [
                U256::from(2_592_000u64),
                U256::from(7_776_000u64),
                U256::from(15_552_000u64),
                U256::from(31_536_000u64),
            ],
        );
        mock
    }

    #[tokio::test]
    async fn global_reads_fill_snapshot() {
        let deployment = Deployment::polynad();
        let mock = Arc::new(populated_chain(&deployment));
        let aggregator = ViewStateAggregator::new(mock.clone(), deployment);

        let snapshot = aggregator.snapshot(None).await;
        assert_eq!(snapshot.account, None);
        assert!(snapshot.user.is_none());
        assert_eq!(snapshot.global.total_staked, tokens(8_420_000));
        assert_eq!(snapshot.global.active_stakers, U256::from(37u8));
        assert_eq!(snapshot.global.lock_durations[1], U256::from(7_776_000u64));
        // one round trip for everything
        assert_eq!(mock.batches(), 1);
    }

    #[tokio::test]
    async fn reverting_read_degrades_only_its_field() {
        let deployment = Deployment::polynad();
        let mock = populated_chain(&deployment);
        mock.fail(deployment.staking, &Staking::rewardPoolCall {});
        let aggregator = ViewStateAggregator::new(Arc::new(mock), deployment);

        let snapshot = aggregator.snapshot(None).await;
        assert_eq!(snapshot.global.reward_pool, U256::ZERO);
        assert_eq!(snapshot.global.total_staked, tokens(8_420_000));
        assert_eq!(snapshot.global.early_penalty_bps, U256::from(1000u16));
    }

    #[tokio::test]
    async fn dead_transport_yields_defaults() {
        let mock = MockChain::new();
        mock.set_offline(true);
        let aggregator = ViewStateAggregator::new(Arc::new(mock), Deployment::polynad());

        let snapshot = aggregator.snapshot(Some(user())).await;
        assert_eq!(snapshot.global, GlobalSnapshot::default());
        assert_eq!(snapshot.user, Some(UserSnapshot::default()));
    }

    #[tokio::test]
    async fn user_reads_are_keyed_by_account() {
        let deployment = Deployment::polynad();
        let mock = populated_chain(&deployment);
        let staking = deployment.staking;
        mock.respond(staking, &Staking::stakeOfCall { user: user() }, tokens(10));
        mock.respond(staking, &Staking::lockTierCall { user: user() }, 2u16);
        mock.respond(staking, &Staking::canUnstakeCall { user: user() }, true);
        mock.respond(
            deployment.token,
            &IERC20::balanceOfCall { owner: user() },
            tokens(100),
        );
        let aggregator = ViewStateAggregator::new(Arc::new(mock), deployment);

        let snapshot = aggregator.snapshot(Some(user())).await;
        let position = snapshot.user.unwrap();
        assert_eq!(position.staked, tokens(10));
        assert_eq!(position.lock_tier, 2);
        assert!(position.can_unstake);
        assert_eq!(position.balance, tokens(100));
        // no allowance answer registered
        assert_eq!(position.allowance, U256::ZERO);

        let other = aggregator.snapshot(Some(Address::repeat_byte(0x43))).await;
        assert_eq!(other.user.unwrap().staked, U256::ZERO);
    }

    #[tokio::test]
    async fn token_position_reads_allowance_for_staking_contract() {
        let deployment = Deployment::polynad();
        let mock = MockChain::new();
        mock.respond(
            deployment.token,
            &IERC20::allowanceCall {
                owner: user(),
                spender: deployment.staking,
            },
            tokens(5),
        );
        mock.respond(deployment.token, &IERC20::balanceOfCall { owner: user() }, tokens(7));
        let aggregator = ViewStateAggregator::new(Arc::new(mock), deployment);

        let position = aggregator.token_position(user()).await;
        assert_eq!(
            position,
            TokenPosition {
                balance: tokens(7),
                allowance: tokens(5)
            }
        );
    }
}
