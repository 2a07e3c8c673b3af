//! Nodes of the broadcast graph.
//!
//! Nodes live in per-kind arenas inside [`BroadcastGraph`](super::graph::BroadcastGraph)
//! and refer to each other by index. Identity is the node's name only; the
//! wiring fields are construction state and do not take part in equality.

use std::collections::{BTreeMap, BTreeSet};

use super::ethernet_tag::EthernetTag;
use super::traversal::SwitchportAdmission;
use crate::datamodel::{NodeInterfacePair, Vlan};
use crate::topology::VxlanNode;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`PhysicalInterface`].
    PhysicalInterfaceId
);
arena_id!(
    /// Index of an [`EthernetHub`].
    EthernetHubId
);
arena_id!(
    /// Index of a [`DeviceBroadcastDomain`].
    DeviceBroadcastDomainId
);
arena_id!(
    /// Index of an [`L3Interface`].
    L3InterfaceId
);
arena_id!(
    /// Index of an [`L2Vni`].
    L2VniId
);
arena_id!(
    /// Index of an [`L2VniHub`].
    L2VniHubId
);

/// A wire-level port of one device.
#[derive(Debug, Clone)]
pub struct PhysicalInterface {
    iface: NodeInterfacePair,
    pub(crate) hub: Option<EthernetHubId>,
    pub(crate) switch: Option<DeviceBroadcastDomainId>,
    pub(crate) l3_interfaces: BTreeMap<L3InterfaceId, EthernetTag>,
}

impl PhysicalInterface {
    pub fn new(iface: NodeInterfacePair) -> Self {
        Self {
            iface,
            hub: None,
            switch: None,
            l3_interfaces: BTreeMap::new(),
        }
    }

    pub fn iface(&self) -> &NodeInterfacePair {
        &self.iface
    }

    pub fn hub(&self) -> Option<EthernetHubId> {
        self.hub
    }

    pub fn switch(&self) -> Option<DeviceBroadcastDomainId> {
        self.switch
    }

    /// L3 interfaces riding directly on this port and the tag each one uses.
    pub fn l3_interfaces(&self) -> &BTreeMap<L3InterfaceId, EthernetTag> {
        &self.l3_interfaces
    }
}

impl PartialEq for PhysicalInterface {
    fn eq(&self, other: &Self) -> bool {
        self.iface == other.iface
    }
}

impl Eq for PhysicalInterface {}

/// A shared L1 medium.
#[derive(Debug, Clone)]
pub struct EthernetHub {
    name: String,
    pub(crate) attached: BTreeSet<PhysicalInterfaceId>,
}

impl EthernetHub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attached: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attached(&self) -> &BTreeSet<PhysicalInterfaceId> {
        &self.attached
    }
}

impl PartialEq for EthernetHub {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EthernetHub {}

/// The VLAN-aware bridge inside one device.
#[derive(Debug, Clone)]
pub struct DeviceBroadcastDomain {
    hostname: String,
    pub(crate) physical_interfaces: BTreeMap<PhysicalInterfaceId, SwitchportAdmission>,
    pub(crate) svis: BTreeMap<L3InterfaceId, Vlan>,
    pub(crate) l2_vnis: BTreeMap<L2VniId, Vlan>,
}

impl DeviceBroadcastDomain {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            physical_interfaces: BTreeMap::new(),
            svis: BTreeMap::new(),
            l2_vnis: BTreeMap::new(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Member ports and how each admits frames.
    pub fn physical_interfaces(&self) -> &BTreeMap<PhysicalInterfaceId, SwitchportAdmission> {
        &self.physical_interfaces
    }

    /// VLAN interfaces and the VLAN each one serves.
    pub fn svis(&self) -> &BTreeMap<L3InterfaceId, Vlan> {
        &self.svis
    }

    pub fn l2_vnis(&self) -> &BTreeMap<L2VniId, Vlan> {
        &self.l2_vnis
    }
}

impl PartialEq for DeviceBroadcastDomain {
    fn eq(&self, other: &Self) -> bool {
        self.hostname == other.hostname
    }
}

impl Eq for DeviceBroadcastDomain {}

/// Where an L3 interface sends its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L3Connection {
    /// Plain routed port or 802.1Q sub-interface
    Physical {
        interface: PhysicalInterfaceId,
        tag: EthernetTag,
    },
    /// SVI
    Switch {
        domain: DeviceBroadcastDomainId,
        vlan: Vlan,
    },
}

/// An IP-capable endpoint.
#[derive(Debug, Clone)]
pub struct L3Interface {
    iface: NodeInterfacePair,
    pub(crate) connection: Option<L3Connection>,
}

impl L3Interface {
    pub fn new(iface: NodeInterfacePair) -> Self {
        Self {
            iface,
            connection: None,
        }
    }

    pub fn iface(&self) -> &NodeInterfacePair {
        &self.iface
    }

    /// `None` when the interface is topologically unreachable.
    pub fn connection(&self) -> Option<L3Connection> {
        self.connection
    }

    pub fn send_to_interface(&self) -> Option<(PhysicalInterfaceId, EthernetTag)> {
        match self.connection {
            Some(L3Connection::Physical { interface, tag }) => Some((interface, tag)),
            _ => None,
        }
    }

    pub fn send_to_switch(&self) -> Option<(DeviceBroadcastDomainId, Vlan)> {
        match self.connection {
            Some(L3Connection::Switch { domain, vlan }) => Some((domain, vlan)),
            _ => None,
        }
    }
}

impl PartialEq for L3Interface {
    fn eq(&self, other: &Self) -> bool {
        self.iface == other.iface
    }
}

impl Eq for L3Interface {}

/// A layer-2 VNI on one device, bridged to one local VLAN.
#[derive(Debug, Clone)]
pub struct L2Vni {
    node: VxlanNode,
    pub(crate) switch: Option<(DeviceBroadcastDomainId, Vlan)>,
    pub(crate) hub: Option<L2VniHubId>,
}

impl L2Vni {
    pub fn new(node: VxlanNode) -> Self {
        Self {
            node,
            switch: None,
            hub: None,
        }
    }

    pub fn node(&self) -> &VxlanNode {
        &self.node
    }

    pub fn switch(&self) -> Option<(DeviceBroadcastDomainId, Vlan)> {
        self.switch
    }

    pub fn hub(&self) -> Option<L2VniHubId> {
        self.hub
    }
}

impl PartialEq for L2Vni {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for L2Vni {}

/// The VXLAN flood list joining mutually reachable L2 VNIs.
#[derive(Debug, Clone)]
pub struct L2VniHub {
    name: String,
    pub(crate) vnis: BTreeSet<L2VniId>,
}

impl L2VniHub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vnis: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vnis(&self) -> &BTreeSet<L2VniId> {
        &self.vnis
    }
}

impl PartialEq for L2VniHub {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for L2VniHub {}
