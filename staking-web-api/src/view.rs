use crate::dto::{AccountInfo, ChainInfo, ContractInfo, DashboardView};
use alloy_primitives::Address;
use staking_view_service::display::{needs_approval, GlobalDisplay, UserDisplay};
use staking_view_service::format::{short_address, PLACEHOLDER};
use staking_view_service::orchestrator::ActionAvailability;
use staking_view_service::{StakingServices, StakingSnapshot};

/// Builds the page view for `account`. Values from a snapshot taken for a
/// different account are never shown.
pub fn render(
    services: &StakingServices,
    account: Option<Address>,
    snapshot: Option<StakingSnapshot>,
    amount: Option<String>,
    now: i64,
) -> DashboardView {
    let deployment = services.deployment();
    let chain = &services.chain;
    let digits = services.max_fraction_digits;

    let snapshot = snapshot.unwrap_or_else(|| StakingSnapshot::pending(account, Default::default(), 0));
    let user = snapshot.user_for(account);

    let needs_approval = match (user, amount.as_deref()) {
        (Some(user), Some(amount)) => {
            needs_approval(amount, user.allowance, deployment.token_decimals)
        }
        _ => false,
    };
    let busy = services.orchestrator.is_busy();
    let actions = ActionAvailability::evaluate(
        account.is_some(),
        user.map(|user| user.earned).unwrap_or_default(),
        busy,
    );

    DashboardView {
        chain: ChainInfo {
            id: chain.id,
            name: chain.name.to_owned(),
            label: chain.label(),
            rpc_url: chain.rpc_url().unwrap_or_default().to_owned(),
            explorer_url: chain.block_explorer.url.to_owned(),
        },
        contracts: ContractInfo {
            token_address: deployment.token.to_string(),
            token_url: chain.address_url(&deployment.token),
            staking_address: deployment.staking.to_string(),
            staking_url: chain.address_url(&deployment.staking),
            token_symbol: deployment.token_symbol.to_owned(),
            token_decimals: deployment.token_decimals,
            marketplace_url: deployment.marketplace_url(),
        },
        account: match account {
            Some(address) => AccountInfo {
                connected: true,
                display: short_address(&address.to_string()),
                address: Some(address.to_string()),
                explorer_url: Some(chain.address_url(&address)),
            },
            None => AccountInfo {
                connected: false,
                display: PLACEHOLDER.to_owned(),
                address: None,
                explorer_url: None,
            },
        },
        fetched_at: snapshot.fetched_at,
        global: GlobalDisplay::new(&snapshot.global, deployment, digits),
        user: match user {
            Some(user) => UserDisplay::new(user, deployment, digits, now),
            None => UserDisplay::absent(),
        },
        amount,
        needs_approval,
        actions,
        status: services.orchestrator.status(),
    }
}
