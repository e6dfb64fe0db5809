use staking_view_service::display::{GlobalDisplay, UserDisplay};
use staking_view_service::{Config, StakingServices};
use std::error::Error;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.rust_log);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("staking_view_service={}", &config.view_service_log).parse()?),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let services = StakingServices::start(&config).await?;
    let deployment = services.deployment().clone();
    let mut snapshots = services.poller.subscribe();
    info!(
        "Watching {} on {} (buy at {})",
        deployment.staking,
        services.chain.label(),
        deployment.marketplace_url()
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Poller stopped unexpectedly");
                    break;
                }
            }
        }
        let snapshot = match snapshots.borrow_and_update().clone() {
            Some(snapshot) => snapshot,
            None => continue,
        };
        let global = GlobalDisplay::new(&snapshot.global, &deployment, services.max_fraction_digits);
        info!(
            "Pool: staked {} {}, all time {}, stakers {}, reward pool {}, penalty {}, reward period {} days, lock {} days",
            global.total_staked,
            deployment.token_symbol,
            global.total_staked_all_time,
            global.active_stakers,
            global.reward_pool,
            global.early_penalty,
            global.reward_duration_days,
            global.lock_duration_days
        );
        if let Some(user) = snapshot.user_for(services.poller.account()) {
            let user = UserDisplay::new(
                user,
                &deployment,
                services.max_fraction_digits,
                snapshot.fetched_at,
            );
            info!(
                "Account {:?}: staked {}, earned {}, balance {}, tier {}, unlock in {}",
                snapshot.account,
                user.staked,
                user.earned,
                user.balance,
                user.lock_tier,
                user.time_remaining
            );
        }
    }

    info!("Shutting down");
    services.poller.shutdown().await;
    Ok(())
}
