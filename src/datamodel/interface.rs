//! Vendor-independent interface model.
//!
//! This is the slice of a device interface that matters for L2/L3 adjacency:
//! its kind, administrative state, addresses, switchport settings, 802.1Q
//! encapsulation and the dependencies that tie sub-interfaces to parents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

use super::vlan::{Vlan, VlanSet};

/// Kind of interface, as normalized from vendor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceType {
    /// A port with a real wire behind it
    Physical,
    /// A link-aggregation (port-channel / bond) interface
    Aggregated,
    /// A member port of a link-aggregation group
    AggregateChild,
    /// A logical unit or sub-interface riding on a parent interface
    Logical,
    /// A switch virtual interface (IRB / SVI)
    Vlan,
    Loopback,
    Tunnel,
    Null,
}

impl InterfaceType {
    /// Physical and aggregated interfaces are the ones that appear in the Layer-1 topology.
    pub fn is_physical_like(self) -> bool {
        matches!(self, Self::Physical | Self::Aggregated)
    }
}

/// Switchport operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchportMode {
    #[default]
    None,
    Access,
    Trunk,
    Monitor,
    DynamicAuto,
    DynamicDesirable,
    Tap,
    FexFabric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// The interface is bound to (rides on) the named interface
    Bind,
    /// The interface aggregates the named interface
    Aggregate,
}

/// A declared dependency of one interface on another interface of the same device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub interface_name: String,
    #[serde(rename = "type")]
    pub dependency_type: DependencyType,
}

impl Dependency {
    pub fn bind(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            dependency_type: DependencyType::Bind,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),
}

const LINK_LOCAL_PREFIX: &str = "link-local:";

/// An address configured on an interface.
///
/// Textual forms: `10.0.0.1/24` for a concrete address and `link-local:169.254.0.1`
/// for a link-local-only address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterfaceAddress {
    Concrete { ip: IpAddr, prefix_length: u8 },
    LinkLocal(IpAddr),
}

impl InterfaceAddress {
    pub fn ip(&self) -> IpAddr {
        match self {
            Self::Concrete { ip, .. } | Self::LinkLocal(ip) => *ip,
        }
    }

    pub fn is_link_local(&self) -> bool {
        matches!(self, Self::LinkLocal(_))
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete { ip, prefix_length } => write!(f, "{}/{}", ip, prefix_length),
            Self::LinkLocal(ip) => write!(f, "{}{}", LINK_LOCAL_PREFIX, ip),
        }
    }
}

impl FromStr for InterfaceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(ip) = s.strip_prefix(LINK_LOCAL_PREFIX) {
            let ip = IpAddr::from_str(ip)
                .map_err(|_| AddressError::InvalidIpAddress(ip.to_string()))?;
            return Ok(Self::LinkLocal(ip));
        }

        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| AddressError::InvalidCidr(s.to_string()))?;
        let ip = IpAddr::from_str(addr_str)
            .map_err(|_| AddressError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| AddressError::InvalidCidr(s.to_string()))?;
        let max_prefix = match ip {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_length > max_prefix {
            return Err(AddressError::InvalidPrefixLength(prefix_length));
        }
        Ok(Self::Concrete { ip, prefix_length })
    }
}

impl TryFrom<String> for InterfaceAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InterfaceAddress> for String {
    fn from(value: InterfaceAddress) -> Self {
        value.to_string()
    }
}

fn default_active() -> bool {
    true
}

/// One interface of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(rename = "type")]
    pub interface_type: InterfaceType,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<InterfaceAddress>,
    #[serde(default)]
    pub switchport: bool,
    #[serde(default)]
    pub switchport_mode: SwitchportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<Vlan>,
    #[serde(default, skip_serializing_if = "VlanSet::is_empty")]
    pub allowed_vlans: VlanSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_vlan: Option<Vlan>,
    /// VLAN served by a VLAN (SVI) interface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<Vlan>,
    /// 802.1Q tag used by an L3 (sub-)interface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encapsulation_vlan: Option<Vlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Interface {
    /// An active interface of the given type with no addresses and no L2 settings.
    pub fn new(name: impl Into<String>, interface_type: InterfaceType) -> Self {
        Self {
            name: name.into(),
            interface_type,
            active: true,
            addresses: Vec::new(),
            switchport: false,
            switchport_mode: SwitchportMode::None,
            access_vlan: None,
            allowed_vlans: VlanSet::empty(),
            native_vlan: None,
            vlan: None,
            encapsulation_vlan: None,
            channel_group: None,
            dependencies: Vec::new(),
        }
    }

    /// Name of the interface this one is bound to, from its first Bind dependency.
    pub fn bind_parent(&self) -> Option<&str> {
        self.dependencies
            .iter()
            .find(|d| d.dependency_type == DependencyType::Bind)
            .map(|d| d.interface_name.as_str())
    }

    /// Whether this interface is a member of a link-aggregation group.
    pub fn is_aggregated(&self) -> bool {
        self.channel_group.is_some()
    }

    pub fn has_addresses(&self) -> bool {
        !self.addresses.is_empty()
    }

    pub fn with_address(mut self, address: InterfaceAddress) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_encapsulation_vlan(mut self, vlan: Option<Vlan>) -> Self {
        self.encapsulation_vlan = vlan;
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Configures the interface as an access-mode switchport.
    pub fn with_access(mut self, vlan: Option<Vlan>) -> Self {
        self.switchport = true;
        self.switchport_mode = SwitchportMode::Access;
        self.access_vlan = vlan;
        self
    }

    /// Configures the interface as a trunk-mode switchport.
    pub fn with_trunk(mut self, allowed_vlans: VlanSet, native_vlan: Option<Vlan>) -> Self {
        self.switchport = true;
        self.switchport_mode = SwitchportMode::Trunk;
        self.allowed_vlans = allowed_vlans;
        self.native_vlan = native_vlan;
        self
    }
}
