use rocket::fairing::AdHoc;

pub mod actions;
pub mod dashboard;

pub fn mount() -> AdHoc {
    AdHoc::on_ignite("Attaching Routes", |rocket| async {
        rocket.mount(
            "/",
            routes![
                dashboard::get_details,
                dashboard::refresh,
                dashboard::action_status,
                actions::stake,
                actions::unstake,
                actions::early_unstake,
                actions::claim_rewards,
                actions::compound_rewards,
                actions::sync_rewards,
                crate::cors::preflight
            ],
        )
    })
}
