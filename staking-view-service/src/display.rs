//! Display-ready values derived from a [`StakingSnapshot`].

use crate::format::{
    display_amount, duration_days, format_duration, parse_units, penalty_percent, to_unix_seconds,
    PLACEHOLDER, UNLOCKED,
};
use crate::snapshot::{GlobalSnapshot, UserSnapshot};
use alloy_primitives::U256;
use chrono::{TimeZone, Utc};
use serde::Serialize;
use staking_contracts::deployment::SECS_IN_DAY;
use staking_contracts::{Deployment, LockTier};
use strum::IntoEnumIterator;

/// True iff the typed amount, in smallest units, exceeds the allowance.
/// Unparsable input never asks for an approval.
pub fn needs_approval(amount_input: &str, allowance: U256, decimals: u8) -> bool {
    match parse_units(amount_input, decimals) {
        Some(amount) => amount > allowance,
        None => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockCountdown {
    NoStake,
    Locked { remaining: i64 },
    Unlocked,
}

impl LockCountdown {
    /// Remaining lock at `now` (unix seconds). Reaching the unlock second
    /// counts as unlocked.
    pub fn at(user: &UserSnapshot, now: i64) -> LockCountdown {
        match user.unlock_timestamp() {
            None => LockCountdown::NoStake,
            Some(unlock) => {
                let remaining = to_unix_seconds(unlock).saturating_sub(now);
                if remaining <= 0 {
                    LockCountdown::Unlocked
                } else {
                    LockCountdown::Locked { remaining }
                }
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            LockCountdown::NoStake => PLACEHOLDER.to_owned(),
            LockCountdown::Locked { remaining } => format_duration(*remaining),
            LockCountdown::Unlocked => UNLOCKED.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierDisplay {
    pub tier: LockTier,
    pub label: String,
    pub days: u64,
}

/// Tier list using the on-chain durations where the contract reported them.
pub fn lock_tiers(global: &GlobalSnapshot) -> Vec<TierDisplay> {
    LockTier::iter()
        .map(|tier| {
            let on_chain = global.lock_durations[tier.index() as usize];
            let days = if on_chain.is_zero() {
                tier.days()
            } else {
                u64::try_from(on_chain / U256::from(SECS_IN_DAY)).unwrap_or(tier.days())
            };
            TierDisplay {
                tier,
                label: tier.to_string(),
                days,
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlobalDisplay {
    pub total_staked: String,
    pub total_staked_all_time: String,
    pub active_stakers: String,
    pub reward_pool: String,
    pub early_penalty: String,
    pub reward_duration_days: String,
    pub lock_duration_days: String,
    pub lock_tiers: Vec<TierDisplay>,
}

impl GlobalDisplay {
    pub fn new(
        global: &GlobalSnapshot,
        deployment: &Deployment,
        max_fraction_digits: usize,
    ) -> GlobalDisplay {
        let amount = |value: U256| {
            display_amount(value, deployment.token_decimals, max_fraction_digits)
        };
        GlobalDisplay {
            total_staked: amount(global.total_staked),
            total_staked_all_time: amount(global.total_staked_all_time),
            active_stakers: display_amount(global.active_stakers, 0, 0),
            reward_pool: amount(global.reward_pool),
            early_penalty: penalty_percent(global.early_penalty_bps),
            reward_duration_days: duration_days(global.reward_duration),
            lock_duration_days: duration_days(global.lock_duration),
            lock_tiers: lock_tiers(global),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserDisplay {
    pub staked: String,
    pub balance: String,
    pub allowance: String,
    pub earned: String,
    pub lock_tier: String,
    /// RFC 3339 unlock time.
    pub unlocks_at: String,
    pub time_remaining: String,
    pub can_unstake: String,
    pub is_active_staker: String,
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_owned()
}

impl UserDisplay {
    pub fn new(
        user: &UserSnapshot,
        deployment: &Deployment,
        max_fraction_digits: usize,
        now: i64,
    ) -> UserDisplay {
        let amount = |value: U256| {
            display_amount(value, deployment.token_decimals, max_fraction_digits)
        };
        let unlocks_at = user
            .unlock_timestamp()
            .and_then(|unlock| Utc.timestamp_opt(to_unix_seconds(unlock), 0).single())
            .map(|unlock| unlock.to_rfc3339())
            .unwrap_or_else(|| PLACEHOLDER.to_owned());
        let lock_tier = if user.staked.is_zero() {
            PLACEHOLDER.to_owned()
        } else {
            LockTier::try_from(user.lock_tier)
                .map(|tier| tier.to_string())
                .unwrap_or_else(|_| PLACEHOLDER.to_owned())
        };
        let countdown = LockCountdown::at(user, now);
        UserDisplay {
            staked: amount(user.staked),
            balance: amount(user.balance),
            allowance: amount(user.allowance),
            earned: amount(user.earned),
            lock_tier,
            unlocks_at,
            time_remaining: countdown.label(),
            can_unstake: yes_no(user.can_unstake || countdown == LockCountdown::Unlocked),
            is_active_staker: yes_no(user.is_active_staker),
        }
    }

    /// Shown while no wallet is connected.
    pub fn absent() -> UserDisplay {
        let dash = || PLACEHOLDER.to_owned();
        UserDisplay {
            staked: dash(),
            balance: dash(),
            allowance: dash(),
            earned: dash(),
            lock_tier: dash(),
            unlocks_at: dash(),
            time_remaining: dash(),
            can_unstake: dash(),
            is_active_staker: dash(),
        }
    }
}
