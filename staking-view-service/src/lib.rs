pub mod aggregator;
pub mod config;
pub mod display;
pub mod dto;
pub mod events;
pub mod format;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod orchestrator;
pub mod poller;
pub mod rpc;
pub mod service;
pub mod snapshot;
pub mod wallet;

pub use aggregator::ViewStateAggregator;
pub use config::Config;
pub use orchestrator::{ActionError, ActionKind, ActionStatus, TransactionOrchestrator};
pub use poller::{Poller, PollerHandle, RefreshHandle};
pub use service::{ServiceError, StakingServices};
pub use snapshot::StakingSnapshot;
