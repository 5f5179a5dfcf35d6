//! zbus-backed proxies for the storage service.

use super::{Calculator, ProposalObject, ProxyProvider, VariantMap};
use crate::config::{BusConfig, BusKind, ServiceConfig};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use zbus::fdo::{DBusProxy, PropertiesProxy};
use zbus::names::{BusName, InterfaceName};
use zbus::proxy::CacheProperties;
use zbus::Connection;
use zvariant::{ObjectPath, Optional, Value};

#[zbus::proxy(
    interface = "org.opensuse.DInstaller.Storage.Proposal.Calculator1",
    default_service = "org.opensuse.DInstaller.Storage",
    default_path = "/org/opensuse/DInstaller/Storage1"
)]
trait Calculator1 {
    fn calculate(&self, settings: HashMap<String, Value<'_>>) -> zbus::Result<()>;

    #[zbus(property)]
    fn available_devices(&self) -> zbus::Result<Vec<(String, String)>>;
}

/// Open a connection to the configured bus.
pub async fn connect(config: &BusConfig) -> Result<Connection> {
    let connection = match (&config.address, config.kind) {
        (Some(address), _) => {
            info!("Connecting to bus at {}", address);
            zbus::connection::Builder::address(address.as_str())?
                .build()
                .await?
        }
        (None, BusKind::System) => Connection::system().await?,
        (None, BusKind::Session) => Connection::session().await?,
    };
    debug!("Bus connection established: {:?}", connection.unique_name());
    Ok(connection)
}

/// Service name, object path and interface of one remote object.
#[derive(Debug, Clone)]
struct BusTarget {
    service: String,
    path: String,
    interface: String,
}

impl BusTarget {
    fn new(service: &str, path: &str, interface: &str) -> Result<Self> {
        BusName::try_from(service)?;
        ObjectPath::try_from(path)?;
        InterfaceName::try_from(interface)?;
        Ok(Self {
            service: service.to_string(),
            path: path.to_string(),
            interface: interface.to_string(),
        })
    }

    /// Interface argument for `Properties.GetAll`.
    fn interface_arg(&self) -> Result<Optional<InterfaceName<'_>>> {
        Ok(Some(InterfaceName::try_from(self.interface.as_str())?).into())
    }

    async fn has_owner(&self, connection: &Connection) -> Result<bool> {
        let dbus = DBusProxy::new(connection).await?;
        let owned = dbus
            .name_has_owner(BusName::try_from(self.service.as_str())?)
            .await?;
        if !owned {
            warn!("{} has no owner on the bus", self.service);
        }
        Ok(owned)
    }
}

/// Resolves the calculator object.
pub struct CalculatorProvider {
    connection: Connection,
    target: BusTarget,
}

impl CalculatorProvider {
    pub fn new(connection: Connection, service: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            connection,
            target: BusTarget::new(
                &service.name,
                &service.calculator_path,
                &service.calculator_interface,
            )?,
        })
    }
}

#[async_trait]
impl ProxyProvider for CalculatorProvider {
    type Proxy = BusCalculator;

    async fn resolve(&self) -> Result<Option<BusCalculator>> {
        if !self.target.has_owner(&self.connection).await? {
            return Ok(None);
        }

        let proxy = Calculator1Proxy::builder(&self.connection)
            .destination(self.target.service.clone())?
            .path(self.target.path.clone())?
            .interface(self.target.interface.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(Some(BusCalculator { proxy }))
    }
}

pub struct BusCalculator {
    proxy: Calculator1Proxy<'static>,
}

#[async_trait]
impl Calculator for BusCalculator {
    async fn available_devices(&self) -> Result<Vec<(String, String)>> {
        Ok(self.proxy.available_devices().await?)
    }

    async fn calculate(&self, settings: VariantMap) -> Result<()> {
        debug!("Calling Calculate with {} settings", settings.len());
        self.proxy.calculate(settings.to_dict()).await?;
        Ok(())
    }
}

/// Resolves the current proposal object.
pub struct ProposalProvider {
    connection: Connection,
    target: BusTarget,
}

impl ProposalProvider {
    pub fn new(connection: Connection, service: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            connection,
            target: BusTarget::new(
                &service.name,
                &service.proposal_path,
                &service.proposal_interface,
            )?,
        })
    }
}

#[async_trait]
impl ProxyProvider for ProposalProvider {
    type Proxy = BusProposal;

    async fn resolve(&self) -> Result<Option<BusProposal>> {
        if !self.target.has_owner(&self.connection).await? {
            return Ok(None);
        }

        let properties = PropertiesProxy::builder(&self.connection)
            .destination(self.target.service.clone())?
            .path(self.target.path.clone())?
            .build()
            .await?;
        match properties.get_all(self.target.interface_arg()?).await {
            Ok(values) => Ok(Some(BusProposal {
                valid: true,
                properties: VariantMap::from_owned_lossy(&values),
            })),
            Err(zbus::fdo::Error::UnknownObject(msg))
            | Err(zbus::fdo::Error::UnknownInterface(msg)) => {
                debug!("No proposal exported at {}: {}", self.target.path, msg);
                Ok(Some(BusProposal {
                    valid: false,
                    properties: VariantMap::new(),
                }))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Property snapshot of the proposal object.
#[derive(Debug, Clone)]
pub struct BusProposal {
    valid: bool,
    properties: VariantMap,
}

impl ProposalObject for BusProposal {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn properties(&self) -> &VariantMap {
        &self.properties
    }
}
