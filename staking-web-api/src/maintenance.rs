use crate::config::StakingConfig;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{uri::Origin, Method},
    Data, Request,
};
use tracing::{info, warn};

pub struct MaintenanceMode;

#[rocket::async_trait]
impl Fairing for MaintenanceMode {
    fn info(&self) -> Info {
        Info {
            name: "Maintenance Mode",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let enabled = match request.rocket().state::<StakingConfig>() {
            Some(staking_config) => staking_config.enable_maintenance,
            None => {
                warn!("Staking config missing from rocket state");
                false
            }
        };
        let path = request.uri().path().as_str().to_owned();
        if enabled && path.ne("/") && path.ne("/maintenance_mode") {
            if let Ok(uri) = Origin::parse("/maintenance_mode") {
                request.set_uri(uri);
                request.set_method(Method::Get);
                info!("URI: {}", request.uri());
            }
        }
    }
}
