//! The broadcast graph arena, its wiring operations and frame flooding.

use log::trace;
use std::collections::{BTreeSet, HashSet};

use super::ethernet_tag::EthernetTag;
use super::nodes::{
    DeviceBroadcastDomain, DeviceBroadcastDomainId, EthernetHub, EthernetHubId, L2Vni, L2VniHub,
    L2VniHubId, L2VniId, L3Connection, L3Interface, L3InterfaceId, PhysicalInterface,
    PhysicalInterfaceId,
};
use super::traversal::{
    DeliverFromVlan, DeliverWithTag, OriginateInVlan, OriginateWithTag, Preserve,
    SwitchportAdmission, Traverse,
};
use crate::datamodel::{NodeInterfacePair, Vlan, VlanSet};
use crate::topology::VxlanNode;

/// All nodes of one computation run, owned by index.
#[derive(Debug, Clone, Default)]
pub struct BroadcastGraph {
    physical_interfaces: Vec<PhysicalInterface>,
    ethernet_hubs: Vec<EthernetHub>,
    domains: Vec<DeviceBroadcastDomain>,
    l3_interfaces: Vec<L3Interface>,
    l2_vnis: Vec<L2Vni>,
    l2_vni_hubs: Vec<L2VniHub>,
}

/// A frame sitting at a node, in the form it has there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FrameAt {
    Physical(PhysicalInterfaceId, EthernetTag),
    Hub(EthernetHubId, EthernetTag),
    Switch(DeviceBroadcastDomainId, Vlan),
    L3(L3InterfaceId),
    Vni(L2VniId),
    VniHub(L2VniHubId),
}

impl BroadcastGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_physical_interface(&mut self, iface: NodeInterfacePair) -> PhysicalInterfaceId {
        self.physical_interfaces.push(PhysicalInterface::new(iface));
        PhysicalInterfaceId(self.physical_interfaces.len() - 1)
    }

    pub fn add_ethernet_hub(&mut self, name: impl Into<String>) -> EthernetHubId {
        self.ethernet_hubs.push(EthernetHub::new(name));
        EthernetHubId(self.ethernet_hubs.len() - 1)
    }

    pub fn add_domain(&mut self, hostname: impl Into<String>) -> DeviceBroadcastDomainId {
        self.domains.push(DeviceBroadcastDomain::new(hostname));
        DeviceBroadcastDomainId(self.domains.len() - 1)
    }

    pub fn add_l3_interface(&mut self, iface: NodeInterfacePair) -> L3InterfaceId {
        self.l3_interfaces.push(L3Interface::new(iface));
        L3InterfaceId(self.l3_interfaces.len() - 1)
    }

    pub fn add_l2_vni(&mut self, node: VxlanNode) -> L2VniId {
        self.l2_vnis.push(L2Vni::new(node));
        L2VniId(self.l2_vnis.len() - 1)
    }

    pub fn add_l2_vni_hub(&mut self, name: impl Into<String>) -> L2VniHubId {
        self.l2_vni_hubs.push(L2VniHub::new(name));
        L2VniHubId(self.l2_vni_hubs.len() - 1)
    }

    pub fn physical_interface(&self, id: PhysicalInterfaceId) -> &PhysicalInterface {
        &self.physical_interfaces[id.0]
    }

    pub fn ethernet_hub(&self, id: EthernetHubId) -> &EthernetHub {
        &self.ethernet_hubs[id.0]
    }

    pub fn domain(&self, id: DeviceBroadcastDomainId) -> &DeviceBroadcastDomain {
        &self.domains[id.0]
    }

    pub fn l3_interface(&self, id: L3InterfaceId) -> &L3Interface {
        &self.l3_interfaces[id.0]
    }

    pub fn l2_vni(&self, id: L2VniId) -> &L2Vni {
        &self.l2_vnis[id.0]
    }

    pub fn l2_vni_hub(&self, id: L2VniHubId) -> &L2VniHub {
        &self.l2_vni_hubs[id.0]
    }

    pub fn ethernet_hub_ids(&self) -> impl Iterator<Item = EthernetHubId> {
        (0..self.ethernet_hubs.len()).map(EthernetHubId)
    }

    pub fn l3_interface_ids(&self) -> impl Iterator<Item = L3InterfaceId> {
        (0..self.l3_interfaces.len()).map(L3InterfaceId)
    }

    /// Plugs every interface into the hub, preserving frames both ways.
    pub fn connect_to_hub(&mut self, hub: EthernetHubId, interfaces: &[PhysicalInterfaceId]) {
        for &iface in interfaces {
            self.physical_interfaces[iface.0].hub = Some(hub);
            self.ethernet_hubs[hub.0].attached.insert(iface);
        }
    }

    /// Bridges untagged frames on `iface` into `vlan` of the device switch.
    pub fn connect_in_access_mode(
        &mut self,
        iface: PhysicalInterfaceId,
        domain: DeviceBroadcastDomainId,
        vlan: Vlan,
    ) {
        self.connect_to_switch(iface, domain, SwitchportAdmission::Access(vlan));
    }

    pub fn connect_trunk(
        &mut self,
        iface: PhysicalInterfaceId,
        domain: DeviceBroadcastDomainId,
        allowed_vlans: VlanSet,
        native_vlan: Option<Vlan>,
    ) {
        self.connect_to_switch(
            iface,
            domain,
            SwitchportAdmission::Trunk {
                allowed_vlans,
                native_vlan,
            },
        );
    }

    fn connect_to_switch(
        &mut self,
        iface: PhysicalInterfaceId,
        domain: DeviceBroadcastDomainId,
        admission: SwitchportAdmission,
    ) {
        self.physical_interfaces[iface.0].switch = Some(domain);
        self.domains[domain.0]
            .physical_interfaces
            .insert(iface, admission);
    }

    /// Rides `l3` on `iface` with the given tag (untagged port or dot1q sub-interface).
    pub fn connect_l3_to_physical(
        &mut self,
        l3: L3InterfaceId,
        iface: PhysicalInterfaceId,
        tag: EthernetTag,
    ) {
        self.l3_interfaces[l3.0].connection = Some(L3Connection::Physical {
            interface: iface,
            tag,
        });
        self.physical_interfaces[iface.0]
            .l3_interfaces
            .insert(l3, tag);
    }

    /// Makes `l3` the SVI of `vlan` on the device switch.
    pub fn connect_irb(&mut self, l3: L3InterfaceId, domain: DeviceBroadcastDomainId, vlan: Vlan) {
        self.l3_interfaces[l3.0].connection = Some(L3Connection::Switch { domain, vlan });
        self.domains[domain.0].svis.insert(l3, vlan);
    }

    pub fn connect_l2_vni_to_vlan(
        &mut self,
        vni: L2VniId,
        domain: DeviceBroadcastDomainId,
        vlan: Vlan,
    ) {
        self.l2_vnis[vni.0].switch = Some((domain, vlan));
        self.domains[domain.0].l2_vnis.insert(vni, vlan);
    }

    pub fn connect_to_l2_vni_hub(&mut self, hub: L2VniHubId, vnis: &[L2VniId]) {
        for &vni in vnis {
            self.l2_vnis[vni.0].hub = Some(hub);
            self.l2_vni_hubs[hub.0].vnis.insert(vni);
        }
    }

    /// Every L3 interface that receives a broadcast sent by `origin`, `origin` included.
    pub fn broadcast_domain(&self, origin: L3InterfaceId) -> BTreeSet<L3InterfaceId> {
        let mut domain = BTreeSet::from([origin]);
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        match self.l3_interfaces[origin.0].connection {
            Some(L3Connection::Physical { interface, tag }) => {
                if let Some(tag) = OriginateWithTag(tag).traverse(()) {
                    stack.push(FrameAt::Physical(interface, tag));
                }
            }
            Some(L3Connection::Switch { domain: switch, vlan }) => {
                if let Some(vlan) = OriginateInVlan(vlan).traverse(()) {
                    stack.push(FrameAt::Switch(switch, vlan));
                }
            }
            None => {}
        }

        while let Some(frame) = stack.pop() {
            if !visited.insert(frame) {
                continue;
            }
            match frame {
                FrameAt::Physical(id, tag) => {
                    let iface = &self.physical_interfaces[id.0];
                    for (&l3, &l3_tag) in &iface.l3_interfaces {
                        if DeliverWithTag(l3_tag).traverse(tag).is_some() {
                            stack.push(FrameAt::L3(l3));
                        }
                    }
                    if let Some(hub) = iface.hub {
                        if let Some(tag) = Preserve.traverse(tag) {
                            stack.push(FrameAt::Hub(hub, tag));
                        }
                    }
                    if let Some(switch) = iface.switch {
                        let admission = self.domains[switch.0].physical_interfaces.get(&id);
                        if let Some(vlan) = admission.and_then(|a| a.ingress(tag)) {
                            stack.push(FrameAt::Switch(switch, vlan));
                        }
                    }
                }
                FrameAt::Hub(id, tag) => {
                    for &iface in &self.ethernet_hubs[id.0].attached {
                        if let Some(tag) = Preserve.traverse(tag) {
                            stack.push(FrameAt::Physical(iface, tag));
                        }
                    }
                }
                FrameAt::Switch(id, vlan) => {
                    let switch = &self.domains[id.0];
                    for (&iface, admission) in &switch.physical_interfaces {
                        if let Some(tag) = admission.egress(vlan) {
                            stack.push(FrameAt::Physical(iface, tag));
                        }
                    }
                    for (&l3, &svi_vlan) in &switch.svis {
                        if DeliverFromVlan(svi_vlan).traverse(vlan).is_some() {
                            stack.push(FrameAt::L3(l3));
                        }
                    }
                    for (&vni, &vni_vlan) in &switch.l2_vnis {
                        if DeliverFromVlan(vni_vlan).traverse(vlan).is_some() {
                            stack.push(FrameAt::Vni(vni));
                        }
                    }
                }
                FrameAt::L3(id) => {
                    domain.insert(id);
                }
                FrameAt::Vni(id) => {
                    let vni = &self.l2_vnis[id.0];
                    if let Some(hub) = vni.hub {
                        stack.push(FrameAt::VniHub(hub));
                    }
                    if let Some((switch, vlan)) = vni.switch {
                        if let Some(vlan) = OriginateInVlan(vlan).traverse(()) {
                            stack.push(FrameAt::Switch(switch, vlan));
                        }
                    }
                }
                FrameAt::VniHub(id) => {
                    for &vni in &self.l2_vni_hubs[id.0].vnis {
                        stack.push(FrameAt::Vni(vni));
                    }
                }
            }
        }

        trace!(
            "Broadcast from {} reaches {} L3 interfaces over {} hops",
            self.l3_interfaces[origin.0].iface(),
            domain.len(),
            visited.len()
        );
        domain
    }
}
