//! Snapshot loading and validation.
//!
//! A snapshot is one YAML document holding the device configurations, the
//! Layer-1 cabling (user-supplied and synthesized edges), the VXLAN topology
//! and optionally the Layer-1 variant policy:
//!
//! ```yaml
//! configurations:
//!   - hostname: r1
//!     interfaces:
//!       - name: Ethernet1
//!         type: physical
//!         addresses: ["10.0.0.1/24"]
//! layer1:
//!   physical:
//!     - node1: { hostname: r1, interface_name: Ethernet1 }
//!       node2: { hostname: r2, interface_name: Ethernet1 }
//! vxlan: []
//! policy:
//!   broadcast: logical
//!   point_to_point: logical
//! ```

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use crate::broadcast::{BroadcastL3Adjacencies, Layer1VariantPolicy};
use crate::datamodel::{is_valid_vlan, Configuration, Vlan};
use crate::topology::{Layer1Topologies, Layer1Topology, VxlanTopology};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Configuration has an empty hostname")]
    EmptyHostname,

    #[error("Duplicate hostname: {0}")]
    DuplicateHostname(String),

    #[error("Invalid {field} {vlan} on {hostname}[{interface}] (must be 1-4094)")]
    InvalidVlan {
        hostname: String,
        interface: String,
        field: &'static str,
        vlan: Vlan,
    },

    #[error("Invalid VNI 0 in VRF {vrf} on {hostname}")]
    InvalidVni { hostname: String, vrf: String },

    #[error("Invalid VLAN {vlan} for VNI {vni} on {hostname} (must be 1-4094)")]
    InvalidVniVlan {
        hostname: String,
        vni: u32,
        vlan: Vlan,
    },
}

/// Raw cabling as written in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer1Section {
    #[serde(default)]
    pub physical: Layer1Topology,
    #[serde(default)]
    pub synthesized: Layer1Topology,
}

/// The snapshot file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub configurations: Vec<Configuration>,
    #[serde(default)]
    pub layer1: Layer1Section,
    #[serde(default)]
    pub vxlan: VxlanTopology,
    #[serde(default)]
    pub policy: Layer1VariantPolicy,
}

impl SnapshotFile {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = BTreeSet::new();
        for c in &self.configurations {
            if c.hostname.is_empty() {
                return Err(SnapshotError::EmptyHostname);
            }
            if !seen.insert(c.hostname.as_str()) {
                return Err(SnapshotError::DuplicateHostname(c.hostname.clone()));
            }
            Self::validate_interfaces(c)?;
            Self::validate_vnis(c)?;
        }
        Ok(())
    }

    fn validate_interfaces(c: &Configuration) -> Result<(), SnapshotError> {
        for i in c.interfaces.values() {
            let fields = [
                ("access vlan", i.access_vlan),
                ("native vlan", i.native_vlan),
                ("vlan", i.vlan),
                ("encapsulation vlan", i.encapsulation_vlan),
            ];
            for (field, vlan) in fields {
                if let Some(vlan) = vlan.filter(|v| !is_valid_vlan(*v)) {
                    return Err(SnapshotError::InvalidVlan {
                        hostname: c.hostname.clone(),
                        interface: i.name.clone(),
                        field,
                        vlan,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_vnis(c: &Configuration) -> Result<(), SnapshotError> {
        for vrf in &c.vrfs {
            for l2 in &vrf.layer2_vnis {
                if l2.vni == 0 {
                    return Err(SnapshotError::InvalidVni {
                        hostname: c.hostname.clone(),
                        vrf: vrf.name.clone(),
                    });
                }
                if !is_valid_vlan(l2.vlan) {
                    return Err(SnapshotError::InvalidVniVlan {
                        hostname: c.hostname.clone(),
                        vni: l2.vni,
                        vlan: l2.vlan,
                    });
                }
            }
        }
        Ok(())
    }

    /// Keys configurations by hostname and derives the Layer-1 variants.
    pub fn into_snapshot(self) -> Snapshot {
        let configurations: BTreeMap<String, Configuration> = self
            .configurations
            .into_iter()
            .map(|c| (c.hostname.clone(), c))
            .collect();
        let layer1_topologies = Layer1Topologies::create(
            &self.layer1.physical,
            &self.layer1.synthesized,
            &configurations,
        );
        Snapshot {
            configurations,
            layer1_topologies,
            vxlan_topology: self.vxlan,
            policy: self.policy,
        }
    }
}

/// A validated snapshot, ready for adjacency computation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub configurations: BTreeMap<String, Configuration>,
    pub layer1_topologies: Layer1Topologies,
    pub vxlan_topology: VxlanTopology,
    pub policy: Layer1VariantPolicy,
}

impl Snapshot {
    pub fn adjacencies(&self) -> BroadcastL3Adjacencies {
        BroadcastL3Adjacencies::create_with_policy(
            &self.layer1_topologies,
            &self.vxlan_topology,
            &self.configurations,
            self.policy,
        )
    }
}

/// Load, parse and validate a snapshot from a YAML file
pub fn load_snapshot(snapshot_path: &Path) -> Result<Snapshot> {
    info!("Loading snapshot from: {:?}", snapshot_path);

    let file = File::open(snapshot_path)
        .wrap_err_with(|| format!("Failed to open snapshot '{}'", snapshot_path.display()))?;

    let raw: SnapshotFile = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse snapshot '{}'", snapshot_path.display()))?;

    finish(raw)
}

/// Parse and validate a snapshot held in memory
pub fn parse_snapshot(yaml: &str) -> Result<Snapshot> {
    let raw: SnapshotFile = serde_yaml::from_str(yaml).wrap_err("Failed to parse snapshot")?;
    finish(raw)
}

fn finish(raw: SnapshotFile) -> Result<Snapshot> {
    raw.validate()?;
    debug!(
        "Snapshot has {} configurations, {} physical and {} synthesized Layer-1 edges",
        raw.configurations.len(),
        raw.layer1.physical.len(),
        raw.layer1.synthesized.len()
    );
    Ok(raw.into_snapshot())
}
