//! Proposal client.
//!
//! Reads the storage service's current proposal and requests new ones. Every
//! call is a single round trip; nothing is cached between calls.

pub mod model;

pub use model::{Action, Device, Proposal, ProposalSettings, Volume};

use crate::bus::{
    self, Calculator, CalculatorProvider, ProposalObject, ProposalProvider, ProxyProvider,
};
use crate::config::Config;
use crate::{ProposalError, Result};
use tracing::{debug, info, trace, warn};

pub struct ProposalClient<C, P> {
    calculator: C,
    proposal: P,
}

impl ProposalClient<CalculatorProvider, ProposalProvider> {
    /// Connect to the bus and storage service described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let connection = bus::connect(&config.bus).await?;
        Ok(Self::new(
            CalculatorProvider::new(connection.clone(), &config.service)?,
            ProposalProvider::new(connection, &config.service)?,
        ))
    }
}

impl<C, P> ProposalClient<C, P>
where
    C: ProxyProvider,
    C::Proxy: Calculator,
    P: ProxyProvider,
    P::Proxy: ProposalObject,
{
    pub fn new(calculator: C, proposal: P) -> Self {
        Self {
            calculator,
            proposal,
        }
    }

    /// Devices the service can build a proposal on.
    pub async fn available_devices(&self) -> Result<Vec<Device>> {
        let calculator = self.calculator().await?;
        let devices = calculator.available_devices().await?;
        debug!("Service reports {} available devices", devices.len());
        Ok(devices.into_iter().map(Device::from).collect())
    }

    /// Current proposal, or the empty proposal when the service has none.
    pub async fn get_proposal(&self) -> Result<Proposal> {
        let available_devices = self.available_devices().await?;

        let Some(proposal) = self.proposal.resolve().await? else {
            warn!("Proposal object could not be resolved");
            return Ok(Proposal::default());
        };
        if !proposal.is_valid() {
            debug!("Proposal object is not valid");
            return Ok(Proposal::default());
        }

        let properties = proposal.properties();
        trace!("Proposal properties: {}", properties.clone().into_plain());
        Proposal::from_properties(available_devices, properties)
    }

    /// Ask the service to recalculate the proposal with `settings`.
    pub async fn calculate_proposal(&self, settings: &ProposalSettings) -> Result<()> {
        let calculator = self.calculator().await?;
        let settings = settings.to_variant_map();
        info!(
            "Requesting proposal calculation ({})",
            settings.keys().collect::<Vec<_>>().join(", ")
        );
        calculator.calculate(settings).await
    }

    async fn calculator(&self) -> Result<C::Proxy> {
        self.calculator.resolve().await?.ok_or_else(|| {
            ProposalError::ServiceUnavailable("proposal calculator".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusValue, VariantMap};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Provider that always resolves to the same proxy (or to nothing).
    struct Fixed<T>(Option<T>);

    #[async_trait]
    impl<T: Clone + Send + Sync> ProxyProvider for Fixed<T> {
        type Proxy = T;

        async fn resolve(&self) -> Result<Option<T>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Clone, Default)]
    struct FakeCalculator {
        devices: Vec<(String, String)>,
        calls: Arc<Mutex<Vec<VariantMap>>>,
        reject: bool,
    }

    #[async_trait]
    impl Calculator for FakeCalculator {
        async fn available_devices(&self) -> Result<Vec<(String, String)>> {
            Ok(self.devices.clone())
        }

        async fn calculate(&self, settings: VariantMap) -> Result<()> {
            if self.reject {
                return Err(ProposalError::Fdo(zbus::fdo::Error::Failed(
                    "calculation failed".to_string(),
                )));
            }
            self.calls.lock().unwrap().push(settings);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeProposal {
        valid: bool,
        properties: VariantMap,
    }

    impl ProposalObject for FakeProposal {
        fn is_valid(&self) -> bool {
            self.valid
        }

        fn properties(&self) -> &VariantMap {
            &self.properties
        }
    }

    fn two_devices() -> Vec<(String, String)> {
        vec![
            ("/dev/sda".to_string(), "/dev/sda, 950.87 GiB".to_string()),
            ("/dev/sdb".to_string(), "/dev/sdb, 500 GiB".to_string()),
        ]
    }

    fn populated_properties() -> VariantMap {
        let mut volume = VariantMap::new();
        volume.insert("MountPoint", BusValue::Str("/".into()));
        volume.insert(
            "FsTypes",
            BusValue::StrList(vec!["btrfs".into(), "xfs".into()]),
        );
        volume.insert("MinSize", BusValue::Int64(5 * 1024 * 1024 * 1024));
        volume.insert("Snapshots", BusValue::Bool(true));

        let mut action = VariantMap::new();
        action.insert("Text", BusValue::Str("Create GPT on /dev/sda".into()));
        action.insert("Subvol", BusValue::Bool(false));
        action.insert("Delete", BusValue::Bool(false));

        let mut properties = VariantMap::new();
        properties.insert("CandidateDevices", BusValue::StrList(vec!["/dev/sda".into()]));
        properties.insert("LVM", BusValue::Bool(false));
        properties.insert("Volumes", BusValue::MapList(vec![volume]));
        properties.insert("Actions", BusValue::MapList(vec![action]));
        properties
    }

    fn client(
        calculator: FakeCalculator,
        proposal: Option<FakeProposal>,
    ) -> ProposalClient<Fixed<FakeCalculator>, Fixed<FakeProposal>> {
        ProposalClient::new(Fixed(Some(calculator)), Fixed(proposal))
    }

    #[tokio::test]
    async fn test_unresolved_proposal_is_empty() {
        let client = client(
            FakeCalculator {
                devices: two_devices(),
                ..Default::default()
            },
            None,
        );

        let proposal = client.get_proposal().await.unwrap();

        assert!(proposal.is_empty());
        assert_eq!(serde_json::to_value(&proposal).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_invalid_proposal_is_empty() {
        let client = client(
            FakeCalculator {
                devices: two_devices(),
                ..Default::default()
            },
            Some(FakeProposal {
                valid: false,
                properties: populated_properties(),
            }),
        );

        let proposal = client.get_proposal().await.unwrap();

        assert_eq!(proposal, Proposal::default());
    }

    #[tokio::test]
    async fn test_valid_proposal_is_mapped() {
        let client = client(
            FakeCalculator {
                devices: two_devices(),
                ..Default::default()
            },
            Some(FakeProposal {
                valid: true,
                properties: populated_properties(),
            }),
        );

        let proposal = client.get_proposal().await.unwrap();

        assert_eq!(
            serde_json::to_value(&proposal).unwrap(),
            json!({
                "availableDevices": [
                    { "id": "/dev/sda", "label": "/dev/sda, 950.87 GiB" },
                    { "id": "/dev/sdb", "label": "/dev/sdb, 500 GiB" }
                ],
                "candidateDevices": ["/dev/sda"],
                "lvm": false,
                "volumes": [{
                    "mountPoint": "/",
                    "fsTypes": ["btrfs", "xfs"],
                    "minSize": 5_i64 * 1024 * 1024 * 1024,
                    "snapshots": true
                }],
                "actions": [
                    { "text": "Create GPT on /dev/sda", "subvol": false, "delete": false }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_missing_calculator_is_an_error() {
        let client: ProposalClient<Fixed<FakeCalculator>, Fixed<FakeProposal>> =
            ProposalClient::new(Fixed(None), Fixed(None));

        let err = client.get_proposal().await.unwrap_err();
        assert!(matches!(err, ProposalError::ServiceUnavailable(_)));

        let err = client
            .calculate_proposal(&ProposalSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_calculate_with_empty_settings() {
        let calculator = FakeCalculator::default();
        let calls = calculator.calls.clone();
        let client = client(calculator, None);

        client
            .calculate_proposal(&ProposalSettings::default())
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_empty());
    }

    #[tokio::test]
    async fn test_calculate_with_partial_volume() {
        let calculator = FakeCalculator::default();
        let calls = calculator.calls.clone();
        let client = client(calculator, None);

        let settings = ProposalSettings {
            volumes: Some(vec![Volume {
                min_size: Some(2048),
                ..Volume::new("/var")
            }]),
            ..Default::default()
        };
        client.calculate_proposal(&settings).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&calls[0]).unwrap(),
            json!({
                "Volumes": {
                    "t": "aa{sv}",
                    "v": [{
                        "MinSize": { "t": "x", "v": 2048 },
                        "MountPoint": { "t": "s", "v": "/var" }
                    }]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_calculate_rejection_propagates() {
        let client = client(
            FakeCalculator {
                reject: true,
                ..Default::default()
            },
            None,
        );

        let settings = ProposalSettings {
            lvm: Some(true),
            ..Default::default()
        };
        let err = client.calculate_proposal(&settings).await.unwrap_err();

        assert!(matches!(err, ProposalError::Fdo(zbus::fdo::Error::Failed(_))));
    }
}
