use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Pool-wide state read in one poll cycle. Fields whose call failed hold zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlobalSnapshot {
    pub total_staked: U256,
    pub total_staked_all_time: U256,
    pub active_stakers: U256,
    pub reward_pool: U256,
    pub early_penalty_bps: U256,
    pub reward_duration: U256,
    /// Single-tier lock the contract still exposes.
    pub lock_duration: U256,
    /// Seconds per tier, index = tier.
    pub lock_durations: [U256; 4],
}

/// Connected account's position. Fields whose call failed hold zero/false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserSnapshot {
    pub staked: U256,
    pub stake_timestamp: U256,
    pub lock_seconds: U256,
    pub lock_tier: u8,
    pub is_active_staker: bool,
    pub can_unstake: bool,
    pub earned: U256,
    pub balance: U256,
    pub allowance: U256,
}

impl UserSnapshot {
    /// `stake timestamp + lock seconds`, only meaningful once something is staked.
    pub fn unlock_timestamp(&self) -> Option<U256> {
        if self.stake_timestamp.is_zero() {
            return None;
        }
        Some(self.stake_timestamp.saturating_add(self.lock_seconds))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakingSnapshot {
    /// Account the user section was read for.
    pub account: Option<Address>,
    /// Unix seconds at which the batch completed.
    pub fetched_at: i64,
    pub global: GlobalSnapshot,
    pub user: Option<UserSnapshot>,
}

impl StakingSnapshot {
    /// Snapshot published right after an account switch, before the refetch lands.
    pub fn pending(account: Option<Address>, global: GlobalSnapshot, fetched_at: i64) -> Self {
        StakingSnapshot {
            account,
            fetched_at,
            global,
            user: None,
        }
    }

    /// User section, only if it belongs to `account`.
    pub fn user_for(&self, account: Option<Address>) -> Option<&UserSnapshot> {
        match account {
            Some(_) if self.account == account => self.user.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_requires_stake_timestamp() {
        let mut user = UserSnapshot {
            lock_seconds: U256::from(2_592_000u64),
            ..Default::default()
        };
        assert_eq!(user.unlock_timestamp(), None);
        user.stake_timestamp = U256::from(1_700_000_000u64);
        assert_eq!(user.unlock_timestamp(), Some(U256::from(1_702_592_000u64)));
    }

    #[test]
    fn user_section_never_leaks_to_other_account() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let snapshot = StakingSnapshot {
            account: Some(a),
            fetched_at: 0,
            global: GlobalSnapshot::default(),
            user: Some(UserSnapshot::default()),
        };
        assert!(snapshot.user_for(Some(a)).is_some());
        assert!(snapshot.user_for(Some(b)).is_none());
        assert!(snapshot.user_for(None).is_none());
    }
}
