pub mod abi;
pub mod chain;
pub mod deployment;

pub use chain::ChainDescriptor;
pub use deployment::{Deployment, LockTier};
