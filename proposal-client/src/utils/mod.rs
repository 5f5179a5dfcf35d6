//! Utility modules for the proposal client.

pub mod errors;
pub mod logger;

pub use errors::{ProposalError, Result};
