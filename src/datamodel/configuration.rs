//! Per-device configuration snapshot.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::interface::Interface;
use super::vlan::Vlan;

/// Default VRF name used when a device does not declare any VRF.
pub const DEFAULT_VRF_NAME: &str = "default";

/// A VXLAN layer-2 segment bridged to a local VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layer2Vni {
    pub vni: u32,
    pub vlan: Vlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vrf {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer2_vnis: Vec<Layer2Vni>,
}

impl Vrf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer2_vnis: Vec::new(),
        }
    }
}

/// One device: its hostname, interfaces (keyed by name) and VRFs.
///
/// In YAML the interfaces are written as a list; names must be unique per device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub hostname: String,
    #[serde(
        default,
        serialize_with = "serialize_interfaces",
        deserialize_with = "deserialize_interfaces"
    )]
    pub interfaces: BTreeMap<String, Interface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vrfs: Vec<Vrf>,
}

impl Configuration {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            interfaces: BTreeMap::new(),
            vrfs: Vec::new(),
        }
    }

    /// Adds (or replaces) an interface, keyed by its name.
    pub fn add_interface(&mut self, interface: Interface) -> &mut Self {
        self.interfaces.insert(interface.name.clone(), interface);
        self
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn interface_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.interfaces.get_mut(name)
    }

    /// Adds an L2 VNI to the named VRF, creating the VRF if needed.
    pub fn add_layer2_vni(&mut self, vrf_name: &str, vni: Layer2Vni) -> &mut Self {
        match self.vrfs.iter_mut().find(|v| v.name == vrf_name) {
            Some(vrf) => vrf.layer2_vnis.push(vni),
            None => {
                let mut vrf = Vrf::new(vrf_name);
                vrf.layer2_vnis.push(vni);
                self.vrfs.push(vrf);
            }
        }
        self
    }

    /// All L2 VNIs across every VRF of this device.
    pub fn layer2_vnis(&self) -> impl Iterator<Item = &Layer2Vni> + '_ {
        self.vrfs.iter().flat_map(|vrf| vrf.layer2_vnis.iter())
    }
}

fn serialize_interfaces<S>(
    interfaces: &BTreeMap<String, Interface>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(interfaces.values())
}

fn deserialize_interfaces<'de, D>(deserializer: D) -> Result<BTreeMap<String, Interface>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Vec::<Interface>::deserialize(deserializer)?;
    let mut interfaces = BTreeMap::new();
    for interface in list {
        let name = interface.name.clone();
        if interfaces.insert(name.clone(), interface).is_some() {
            return Err(serde::de::Error::custom(format!(
                "duplicate interface name '{}'",
                name
            )));
        }
    }
    Ok(interfaces)
}
