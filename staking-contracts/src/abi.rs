//! Call and event descriptors for the token and staking contracts.
//!
//! Only the surface the client consumes is declared here; the contracts
//! themselves are deployed and owned elsewhere.

use alloy_sol_types::sol;

sol! {
    /// Fungible token being staked.
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    /// Multi-tier staking contract.
    interface IPolynadStaking {
        event Staked(address indexed user, uint256 amount, uint8 tier, uint256 lockSeconds);
        event Unstaked(address indexed user, uint256 principal, uint256 reward);
        event EarlyUnstaked(address indexed user, uint256 returned, uint256 penalty);
        event RewardsSynced(uint256 added, uint256 newRewardRate, uint256 periodFinish);
        event RewardPaid(address indexed user, uint256 reward);
        event RewardsCompounded(address indexed user, uint256 rewardAddedToStake);

        function totalStaked() external view returns (uint256);
        function totalStakedAllTime() external view returns (uint256);
        function activeStakers() external view returns (uint256);
        function rewardPool() external view returns (uint256);
        function EARLY_PENALTY_BPS() external view returns (uint256);
        function REWARD_DURATION() external view returns (uint256);
        function LOCK_DURATION() external view returns (uint256);
        function getLockDurations() external view returns (uint256[4]);

        function stakeOf(address user) external view returns (uint256);
        function stakeTimestamp(address user) external view returns (uint256);
        function isActiveStaker(address user) external view returns (bool);
        function lockTier(address user) external view returns (uint8);
        function lockSeconds(address user) external view returns (uint256);
        function canUnstake(address user) external view returns (bool);
        function earned(address user) external view returns (uint256);

        function stake(uint256 amount, uint8 tier) external;
        function unstake() external;
        function earlyUnstake() external;
        function claimRewards() external;
        function compoundRewards() external;
        function syncRewards() external;
    }
}
