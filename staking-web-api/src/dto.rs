use rocket::serde::{Deserialize, Serialize};
use staking_contracts::LockTier;
use staking_view_service::display::{GlobalDisplay, UserDisplay};
use staking_view_service::orchestrator::{ActionAvailability, ActionStatus};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ResponseData<T> {
    pub code: Option<u16>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> ResponseData<T> {
        ResponseData {
            code: Some(code),
            status_code: None,
            message,
            data,
        }
    }
}

pub const RESPONSE_OK: u16 = 200;
pub const RESPONSE_BAD_REQUEST: u16 = 400;
pub const RESPONSE_CONFLICT: u16 = 409;
pub const RESPONSE_INTERNAL_ERROR: u16 = 500;
pub const RESPONSE_MAINTENANCE: u16 = 503;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StakeRequest {
    /// Decimal token amount as typed, e.g. "12.5".
    pub amount: String,
    pub tier: LockTier,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ChainInfo {
    pub id: u64,
    pub name: String,
    pub label: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ContractInfo {
    pub token_address: String,
    pub token_url: String,
    pub staking_address: String,
    pub staking_url: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub marketplace_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AccountInfo {
    pub connected: bool,
    /// Shortened address, placeholder when disconnected.
    pub display: String,
    pub address: Option<String>,
    pub explorer_url: Option<String>,
}

/// Everything the staking page renders in one response.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DashboardView {
    pub chain: ChainInfo,
    pub contracts: ContractInfo,
    pub account: AccountInfo,
    /// Unix seconds of the snapshot, 0 before the first fetch.
    pub fetched_at: i64,
    pub global: GlobalDisplay,
    pub user: UserDisplay,
    pub amount: Option<String>,
    pub needs_approval: bool,
    pub actions: ActionAvailability,
    pub status: ActionStatus,
}
