use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

pub const POLYNAD_ADDRESS: Address = address!("8b194601E648BD96c13A8Ddc4AdB8CDfaFc67777");
pub const STAKING_ADDRESS: Address = address!("3e543A1DD1db7d6eaC0E89Cf1b6705d8F5BEAd70");
pub const TOKEN_DECIMALS: u8 = 18;
pub const TOKEN_SYMBOL: &str = "POLYNAD";
pub const MARKETPLACE_BASE_URL: &str = "https://nad.fun/tokens";

pub const SECS_IN_DAY: u64 = 86_400;

/// Lock duration chosen at stake time, encoded on-chain as `uint8`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, Display, EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum LockTier {
    #[strum(serialize = "30 Days")]
    ThirtyDays = 0,
    #[strum(serialize = "90 Days")]
    NinetyDays = 1,
    #[strum(serialize = "6 Months")]
    SixMonths = 2,
    #[strum(serialize = "1 Year")]
    OneYear = 3,
}

impl LockTier {
    pub fn days(&self) -> u64 {
        match self {
            LockTier::ThirtyDays => 30,
            LockTier::NinetyDays => 90,
            LockTier::SixMonths => 180,
            LockTier::OneYear => 365,
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for LockTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LockTier::iter()
            .find(|tier| tier.index() == value)
            .ok_or_else(|| format!("Unknown lock tier: {}", value))
    }
}

impl From<LockTier> for u8 {
    fn from(tier: LockTier) -> u8 {
        tier.index()
    }
}

/// Where the token and staking contracts live, and how token amounts scale.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Deployment {
    pub token: Address,
    pub staking: Address,
    pub token_decimals: u8,
    pub token_symbol: String,
}

impl Deployment {
    pub fn polynad() -> Deployment {
        Deployment {
            token: POLYNAD_ADDRESS,
            staking: STAKING_ADDRESS,
            token_decimals: TOKEN_DECIMALS,
            token_symbol: TOKEN_SYMBOL.to_owned(),
        }
    }

    /// Link where users can buy the token.
    pub fn marketplace_url(&self) -> String {
        format!("{}/{}", MARKETPLACE_BASE_URL, self.token)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Deployment::polynad()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_on_chain_order() {
        let labels: Vec<String> = LockTier::iter().map(|tier| tier.to_string()).collect();
        assert_eq!(labels, vec!["30 Days", "90 Days", "6 Months", "1 Year"]);
        assert_eq!(LockTier::SixMonths.days(), 180);
        assert_eq!(LockTier::OneYear.index(), 3);
    }

    #[test]
    fn tier_from_u8() {
        assert_eq!(LockTier::try_from(1), Ok(LockTier::NinetyDays));
        assert!(LockTier::try_from(4).is_err());
    }

    #[test]
    fn marketplace_link_uses_token_address() {
        let deployment = Deployment::polynad();
        assert_eq!(
            deployment.marketplace_url().to_lowercase(),
            "https://nad.fun/tokens/0x8b194601e648bd96c13a8ddc4adb8cdfafc67777"
        );
    }
}
