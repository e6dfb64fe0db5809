use rocket::serde::Deserialize;
use staking_view_service::config::ConfigError;
use std::collections::HashSet;

/// Web API settings, read from `Rocket.toml` / `ROCKET_*` through rocket's figment.
/// The chain, deployment and wallet keys are the ones the view service reads.
#[derive(Clone, Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StakingConfig {
    #[serde(flatten)]
    pub service: staking_view_service::Config,
    #[serde(default = "default_web_api_log")]
    pub web_api_log: String,
    /// Comma separated origins allowed by the CORS fairing.
    #[serde(default)]
    pub cors_allowed_domains: String,
    #[serde(default)]
    pub enable_maintenance: bool,
}

impl StakingConfig {
    pub fn from_figment(figment: &rocket::figment::Figment) -> Result<StakingConfig, ConfigError> {
        let config = figment.extract::<StakingConfig>()?;
        config.service.validate()?;
        Ok(config)
    }

    pub fn allowed_domains(&self) -> HashSet<String> {
        self.cors_allowed_domains
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn default_web_api_log() -> String {
    "info".to_owned()
}
