use crate::dto::Log;
use crate::format::display_amount;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use serde::Serialize;
use staking_contracts::abi::IPolynadStaking;
use staking_contracts::{Deployment, LockTier};
use tracing::debug;

/// Staking contract event found in a transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StakingEvent {
    Staked {
        user: Address,
        amount: U256,
        tier: u8,
        lock_seconds: U256,
    },
    Unstaked {
        user: Address,
        principal: U256,
        reward: U256,
    },
    EarlyUnstaked {
        user: Address,
        returned: U256,
        penalty: U256,
    },
    RewardsSynced {
        added: U256,
        new_reward_rate: U256,
        period_finish: U256,
    },
    RewardPaid {
        user: Address,
        reward: U256,
    },
    RewardsCompounded {
        user: Address,
        reward_added_to_stake: U256,
    },
}

impl StakingEvent {
    pub fn describe(&self, deployment: &Deployment, max_fraction_digits: usize) -> String {
        let amount = |value: U256| {
            format!(
                "{} {}",
                display_amount(value, deployment.token_decimals, max_fraction_digits),
                deployment.token_symbol
            )
        };
        match self {
            StakingEvent::Staked { amount: a, tier, .. } => {
                let tier = LockTier::try_from(*tier)
                    .map(|tier| tier.to_string())
                    .unwrap_or_else(|_| format!("tier {}", tier));
                format!("Staked {} for {}", amount(*a), tier)
            }
            StakingEvent::Unstaked {
                principal, reward, ..
            } => format!("Unstaked {} plus {} reward", amount(*principal), amount(*reward)),
            StakingEvent::EarlyUnstaked {
                returned, penalty, ..
            } => format!("Returned {} after {} penalty", amount(*returned), amount(*penalty)),
            StakingEvent::RewardsSynced { added, .. } => {
                format!("Synced {} into the reward stream", amount(*added))
            }
            StakingEvent::RewardPaid { reward, .. } => format!("Claimed {}", amount(*reward)),
            StakingEvent::RewardsCompounded {
                reward_added_to_stake,
                ..
            } => format!("Compounded {}", amount(*reward_added_to_stake)),
        }
    }
}

fn decode<E: SolEvent>(log: &Log) -> Option<E> {
    match E::decode_raw_log(log.topics.iter().copied(), &log.data, true) {
        Ok(event) => Some(event),
        Err(error) => {
            debug!("Skipping malformed {} log: {}", E::SIGNATURE, error);
            None
        }
    }
}

fn decode_log(log: &Log) -> Option<StakingEvent> {
    use IPolynadStaking::*;

    let topic = *log.topics.first()?;
    if topic == Staked::SIGNATURE_HASH {
        decode::<Staked>(log).map(|e| StakingEvent::Staked {
            user: e.user,
            amount: e.amount,
            tier: e.tier,
            lock_seconds: e.lockSeconds,
        })
    } else if topic == Unstaked::SIGNATURE_HASH {
        decode::<Unstaked>(log).map(|e| StakingEvent::Unstaked {
            user: e.user,
            principal: e.principal,
            reward: e.reward,
        })
    } else if topic == EarlyUnstaked::SIGNATURE_HASH {
        decode::<EarlyUnstaked>(log).map(|e| StakingEvent::EarlyUnstaked {
            user: e.user,
            returned: e.returned,
            penalty: e.penalty,
        })
    } else if topic == RewardsSynced::SIGNATURE_HASH {
        decode::<RewardsSynced>(log).map(|e| StakingEvent::RewardsSynced {
            added: e.added,
            new_reward_rate: e.newRewardRate,
            period_finish: e.periodFinish,
        })
    } else if topic == RewardPaid::SIGNATURE_HASH {
        decode::<RewardPaid>(log).map(|e| StakingEvent::RewardPaid {
            user: e.user,
            reward: e.reward,
        })
    } else if topic == RewardsCompounded::SIGNATURE_HASH {
        decode::<RewardsCompounded>(log).map(|e| StakingEvent::RewardsCompounded {
            user: e.user,
            reward_added_to_stake: e.rewardAddedToStake,
        })
    } else {
        None
    }
}

/// Staking events emitted by `staking`; logs from other contracts (the token's
/// `Approval`/`Transfer`) and unknown topics are skipped.
pub fn decode_logs(staking: Address, logs: &[Log]) -> Vec<StakingEvent> {
    logs.iter()
        .filter(|log| log.address == staking)
        .filter_map(decode_log)
        .collect()
}

/// Receipt log for an event, as a node would return it.
#[cfg(any(test, feature = "mock"))]
pub fn log_for<E: SolEvent>(address: Address, event: &E) -> Log {
    let data = event.encode_log_data();
    Log {
        address,
        topics: data.topics().to_vec(),
        data: data.data.clone(),
    }
}
