//! Access to the storage service on the message bus.
//!
//! The proposal client never talks to zbus directly. It resolves proxies
//! through a [`ProxyProvider`] and uses them through two small capabilities:
//! - [`Calculator`]: list devices, request a new proposal
//! - [`ProposalObject`]: snapshot of the current proposal's properties

pub mod proxy;
pub mod value;

pub use proxy::{connect, BusCalculator, BusProposal, CalculatorProvider, ProposalProvider};
pub use value::{BusValue, VariantMap};

use crate::Result;
use async_trait::async_trait;

/// Resolves a handle for one remote object.
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    type Proxy: Send + Sync;

    /// `Ok(None)` when nothing on the bus answers for the object.
    async fn resolve(&self) -> Result<Option<Self::Proxy>>;
}

/// The proposal calculator interface.
#[async_trait]
pub trait Calculator: Send + Sync {
    /// `(path, description)` pairs, in the order the service reports them.
    async fn available_devices(&self) -> Result<Vec<(String, String)>>;

    /// Ask the service to compute a new proposal from `settings`.
    async fn calculate(&self, settings: VariantMap) -> Result<()>;
}

/// The current proposal, as seen when the proxy was resolved.
pub trait ProposalObject: Send + Sync {
    /// Whether the remote object actually exists.
    fn is_valid(&self) -> bool;

    fn properties(&self) -> &VariantMap;
}
