use crate::dto::{DashboardView, ResponseData, RESPONSE_OK};
use chrono::Utc;
use rocket::{serde::json::Json, State};
use staking_view_service::{ActionStatus, StakingServices};
use tracing::debug;

#[get("/staking_details?<amount>")]
pub async fn get_details(
    services: &State<StakingServices>,
    amount: Option<String>,
) -> Json<ResponseData<DashboardView>> {
    let account = services.sync_account().await;
    let snapshot = services.poller.latest();
    let message = match snapshot {
        Some(_) => String::new(),
        None => "Loading staking data.".to_owned(),
    };
    debug!("staking_details for {:?}", account);
    let view = crate::view::render(
        services,
        account,
        snapshot,
        amount,
        Utc::now().timestamp(),
    );
    Json(ResponseData::new(RESPONSE_OK, message, Some(view)))
}

/// Refetch right away, e.g. when the page regains focus.
#[post("/refresh")]
pub async fn refresh(services: &State<StakingServices>) -> Json<ResponseData<String>> {
    services.sync_account().await;
    services.poller.refresh();
    Json(ResponseData::new(
        RESPONSE_OK,
        "Refresh scheduled.".to_owned(),
        None,
    ))
}

#[get("/action_status")]
pub async fn action_status(services: &State<StakingServices>) -> Json<ResponseData<ActionStatus>> {
    let status = services.orchestrator.status();
    Json(ResponseData::new(
        RESPONSE_OK,
        status.message.to_owned(),
        Some(status),
    ))
}
