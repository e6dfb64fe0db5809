use crate::dto::{
    ResponseData, StakeRequest, RESPONSE_BAD_REQUEST, RESPONSE_CONFLICT,
    RESPONSE_INTERNAL_ERROR, RESPONSE_OK,
};
use rocket::{serde::json::Json, State};
use staking_view_service::orchestrator::ActionOutcome;
use staking_view_service::{ActionError, StakingServices};
use tracing::info;

fn respond(
    services: &StakingServices,
    result: Result<ActionOutcome, ActionError>,
) -> Json<ResponseData<ActionOutcome>> {
    match result {
        Ok(outcome) => Json(ResponseData::new(
            RESPONSE_OK,
            services.orchestrator.status().message,
            Some(outcome),
        )),
        Err(ActionError::Busy) => Json(ResponseData::new(
            RESPONSE_CONFLICT,
            ActionError::Busy.status_message(),
            None,
        )),
        Err(error) => {
            let code = if error.is_rejection() {
                RESPONSE_BAD_REQUEST
            } else {
                RESPONSE_INTERNAL_ERROR
            };
            Json(ResponseData::new(code, error.status_message(), None))
        }
    }
}

#[post("/stake", format = "json", data = "<request>")]
pub async fn stake(
    services: &State<StakingServices>,
    request: Json<StakeRequest>,
) -> Json<ResponseData<ActionOutcome>> {
    info!("stake {} for {}", request.amount, request.tier);
    services.sync_account().await;
    let result = services
        .orchestrator
        .stake(&request.amount, request.tier)
        .await;
    respond(services, result)
}

#[post("/unstake")]
pub async fn unstake(services: &State<StakingServices>) -> Json<ResponseData<ActionOutcome>> {
    services.sync_account().await;
    let result = services.orchestrator.unstake().await;
    respond(services, result)
}

#[post("/early_unstake")]
pub async fn early_unstake(
    services: &State<StakingServices>,
) -> Json<ResponseData<ActionOutcome>> {
    services.sync_account().await;
    let result = services.orchestrator.early_unstake().await;
    respond(services, result)
}

#[post("/claim_rewards")]
pub async fn claim_rewards(
    services: &State<StakingServices>,
) -> Json<ResponseData<ActionOutcome>> {
    services.sync_account().await;
    let result = services.orchestrator.claim_rewards().await;
    respond(services, result)
}

#[post("/compound_rewards")]
pub async fn compound_rewards(
    services: &State<StakingServices>,
) -> Json<ResponseData<ActionOutcome>> {
    services.sync_account().await;
    let result = services.orchestrator.compound_rewards().await;
    respond(services, result)
}

#[post("/sync_rewards")]
pub async fn sync_rewards(
    services: &State<StakingServices>,
) -> Json<ResponseData<ActionOutcome>> {
    let result = services.orchestrator.sync_rewards().await;
    respond(services, result)
}
