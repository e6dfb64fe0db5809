mod config;
mod cors;
mod dto;
mod maintenance;
mod request_timer;
mod routes;
mod view;

use config::StakingConfig;
use dto::{ResponseData, RESPONSE_BAD_REQUEST, RESPONSE_INTERNAL_ERROR, RESPONSE_MAINTENANCE};
use rocket::{serde::json::Json, Build, Config, Request, Rocket};
use staking_view_service::StakingServices;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[macro_use]
extern crate rocket;

#[get("/")]
async fn health_ping() -> &'static str {
    ""
}

#[get("/maintenance_mode")]
async fn maintenance_mode() -> Json<ResponseData<&'static str>> {
    Json(ResponseData::new(
        RESPONSE_MAINTENANCE,
        "Staking is under maintenance.".to_owned(),
        None,
    ))
}

#[catch(404)]
async fn bad_request(req: &Request<'_>) -> Json<ResponseData<String>> {
    let message = format!("Couldn't find '{}'", req.uri());
    Json(ResponseData::new(RESPONSE_BAD_REQUEST, message, None))
}

#[catch(500)]
async fn internal_error() -> Json<ResponseData<String>> {
    Json(ResponseData::new(
        RESPONSE_INTERNAL_ERROR,
        "Whoops! Looks like we messed up.".to_owned(),
        None,
    ))
}

#[catch(default)]
async fn stake_bad_data() -> Json<ResponseData<String>> {
    let message = "Please check body. 'amount' should be a decimal string and 'tier' one of 0, 1, 2, 3.".to_owned();
    Json(ResponseData::new(RESPONSE_BAD_REQUEST, message, None))
}

fn build_rocket(
    rocket: Rocket<Build>,
    staking_config: StakingConfig,
    services: StakingServices,
) -> Rocket<Build> {
    let allowed_domains = staking_config.allowed_domains();
    rocket
        .register("/stake", catchers![stake_bad_data])
        .register("/", catchers![internal_error, bad_request])
        .attach(request_timer::RequestTimer)
        .attach(maintenance::MaintenanceMode)
        .manage(staking_config)
        .manage(services)
        .attach(cors::OriginHeader { allowed_domains })
        .attach(routes::mount())
        .mount("/", routes![health_ping, maintenance_mode])
}

#[launch]
async fn rocket() -> _ {
    let staking_config =
        StakingConfig::from_figment(&Config::figment()).expect("Invalid staking configuration");
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &staking_config.service.rust_log);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("staking_web_api={}", &staking_config.web_api_log)
                    .parse()
                    .expect("Error parsing directive"),
            ),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let services = StakingServices::start(&staking_config.service)
        .await
        .expect("Staking services failed to start");

    build_rocket(rocket::build(), staking_config, services)
}
