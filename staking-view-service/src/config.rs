use alloy_primitives::Address;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use staking_contracts::{
    chain::{BlockExplorer, MONAD_CHAIN_ID, MONAD_EXPLORER_URL, MONAD_RPC_URL},
    deployment::{POLYNAD_ADDRESS, STAKING_ADDRESS, TOKEN_DECIMALS, TOKEN_SYMBOL},
    ChainDescriptor, Deployment,
};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_FRACTION_DIGITS: usize = 4;
pub const DEFAULT_RECEIPT_POLL_MILLIS: u64 = 1_000;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config extraction failed: {0}")]
    Extract(#[from] figment::Error),
    #[error("invalid address for {field}: {value}")]
    Address { field: &'static str, value: String },
    #[error("invalid url for {field}: {value}")]
    Url { field: &'static str, value: String },
}

/// Settings shared by the view service binary and the web api.
///
/// Every field has a default pointing at the Monad deployment, so an empty
/// `App.toml` still yields a working read-only client.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_rust_log")]
    pub rust_log: String,
    #[serde(default = "default_service_log")]
    pub view_service_log: String,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_chain_name")]
    pub chain_name: String,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    #[serde(default = "default_token_address")]
    pub token_address: String,
    #[serde(default = "default_staking_address")]
    pub staking_address: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    /// Wallet JSON-RPC endpoint able to sign `eth_sendTransaction`.
    /// When missing the service runs disconnected.
    pub wallet_rpc_url: Option<String>,
    /// Account to watch when no wallet is connected, binary only.
    pub watch_account: Option<String>,

    pub poll_interval_secs: Option<u64>,
    pub max_fraction_digits: Option<usize>,
    pub receipt_poll_millis: Option<u64>,
    pub receipt_timeout_secs: Option<u64>,
    pub rpc_timeout_secs: Option<u64>,
}

impl Config {
    /// `App.toml` in the working directory, overridden by `STAKING_*` env vars.
    pub fn load() -> Result<Config, ConfigError> {
        Config::from_figment(
            Figment::new()
                .merge(Toml::file("App.toml"))
                .merge(Env::prefixed("STAKING_")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Config, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("rpc_url", &self.rpc_url)?;
        check_url("explorer_url", &self.explorer_url)?;
        if let Some(ref url) = self.wallet_rpc_url {
            check_url("wallet_rpc_url", url)?;
        }
        self.deployment()?;
        self.watch_account()?;
        Ok(())
    }

    pub fn chain(&self) -> ChainDescriptor {
        let monad = ChainDescriptor::monad();
        ChainDescriptor {
            id: self.chain_id,
            name: self.chain_name.to_owned(),
            native_currency: monad.native_currency,
            rpc_urls: vec![self.rpc_url.to_owned()],
            block_explorer: BlockExplorer {
                url: self.explorer_url.to_owned(),
                ..monad.block_explorer
            },
        }
    }

    pub fn deployment(&self) -> Result<Deployment, ConfigError> {
        Ok(Deployment {
            token: parse_address("token_address", &self.token_address)?,
            staking: parse_address("staking_address", &self.staking_address)?,
            token_decimals: self.token_decimals,
            token_symbol: TOKEN_SYMBOL.to_owned(),
        })
    }

    pub fn watch_account(&self) -> Result<Option<Address>, ConfigError> {
        match self.watch_account {
            Some(ref value) if !value.trim().is_empty() => {
                parse_address("watch_account", value).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(match self.poll_interval_secs {
            Some(v) if v > 0 => v,
            _ => DEFAULT_POLL_INTERVAL_SECS,
        })
    }

    pub fn max_fraction_digits(&self) -> usize {
        match self.max_fraction_digits {
            Some(v) => v,
            None => DEFAULT_MAX_FRACTION_DIGITS,
        }
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(match self.receipt_poll_millis {
            Some(v) => v,
            None => DEFAULT_RECEIPT_POLL_MILLIS,
        })
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(match self.receipt_timeout_secs {
            Some(v) => v,
            None => DEFAULT_RECEIPT_TIMEOUT_SECS,
        })
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(match self.rpc_timeout_secs {
            Some(v) => v,
            None => DEFAULT_RPC_TIMEOUT_SECS,
        })
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| ConfigError::Address {
            field,
            value: value.to_owned(),
        })
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(ConfigError::Url {
            field,
            value: value.to_owned(),
        }),
    }
}

fn default_rust_log() -> String {
    "warn".to_owned()
}

fn default_service_log() -> String {
    "info".to_owned()
}

fn default_chain_id() -> u64 {
    MONAD_CHAIN_ID
}

fn default_chain_name() -> String {
    "Monad".to_owned()
}

fn default_rpc_url() -> String {
    MONAD_RPC_URL.to_owned()
}

fn default_explorer_url() -> String {
    MONAD_EXPLORER_URL.to_owned()
}

fn default_token_address() -> String {
    POLYNAD_ADDRESS.to_string()
}

fn default_staking_address() -> String {
    STAKING_ADDRESS.to_string()
}

fn default_token_decimals() -> u8 {
    TOKEN_DECIMALS
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    fn figment_with(pairs: &[(&str, &str)]) -> Figment {
        let mut figment = Figment::new();
        for (key, value) in pairs {
            figment = figment.merge(Serialized::default(key, value));
        }
        figment
    }

    #[test]
    fn empty_config_targets_monad_deployment() {
        let config = Config::from_figment(Figment::new()).unwrap();
        assert_eq!(config.chain().id, 143);
        assert_eq!(config.deployment().unwrap(), Deployment::polynad());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.max_fraction_digits(), 4);
        assert!(config.wallet_rpc_url.is_none());
        assert_eq!(config.watch_account().unwrap(), None);
    }

    #[test]
    fn bad_address_is_fatal() {
        let result = Config::from_figment(figment_with(&[("staking_address", "0x1234")]));
        assert!(matches!(
            result,
            Err(ConfigError::Address {
                field: "staking_address",
                ..
            })
        ));
    }

    #[test]
    fn bad_wallet_url_is_fatal() {
        let result = Config::from_figment(figment_with(&[("wallet_rpc_url", "not a url")]));
        assert!(matches!(result, Err(ConfigError::Url { .. })));
    }

    #[test]
    fn explorer_override_flows_into_chain() {
        let config = Config::from_figment(figment_with(&[(
            "explorer_url",
            "https://monadvision.com",
        )]))
        .unwrap();
        let chain = config.chain();
        assert_eq!(chain.block_explorer.url, "https://monadvision.com");
        assert_eq!(chain.block_explorer.name, "Monad Explorer");
        assert_eq!(chain.native_currency.symbol, "MON");
    }
}
