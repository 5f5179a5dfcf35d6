//! Storage Proposal Client Library
//!
//! Marshals storage proposals between plain application objects and the
//! typed `a{sv}` structures of the storage service on D-Bus.

pub mod bus;
pub mod config;
pub mod proposal;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use proposal::{Proposal, ProposalClient, ProposalSettings};
pub use utils::errors::ProposalError;
pub type Result<T> = std::result::Result<T, ProposalError>;
