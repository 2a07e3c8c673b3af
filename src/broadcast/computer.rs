//! Builds the broadcast graph from device configurations and cabling, then
//! partitions L3 interfaces into broadcast domains.

use log::{debug, warn};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

use super::ethernet_tag::EthernetTag;
use super::graph::BroadcastGraph;
use super::nodes::{
    DeviceBroadcastDomainId, EthernetHubId, L2VniHubId, L2VniId, L3InterfaceId,
    PhysicalInterfaceId,
};
use crate::datamodel::{Configuration, Interface, InterfaceType, NodeInterfacePair, SwitchportMode};
use crate::topology::{Layer1Node, Layer1Topology, VxlanNode, VxlanTopology};

/// Name of the hub shared by every physical interface with unknown cabling.
pub const GLOBAL_HUB_NAME: &str = "Global Ethernet Hub";

/// One computation run over an immutable snapshot.
#[derive(Debug, Clone)]
pub struct L3AdjacencyComputer {
    graph: BroadcastGraph,
    physical_interfaces: BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
    ethernet_hubs: BTreeMap<String, EthernetHubId>,
    domains: BTreeMap<String, DeviceBroadcastDomainId>,
    l2_vnis: BTreeMap<VxlanNode, L2VniId>,
    l2_vni_hubs: BTreeMap<String, L2VniHubId>,
    l3_interfaces: BTreeMap<NodeInterfacePair, L3InterfaceId>,
}

impl L3AdjacencyComputer {
    /// Devices are named by their key in `configurations`.
    pub fn new(
        configurations: &BTreeMap<String, Configuration>,
        layer1_topology: &Layer1Topology,
        vxlan_topology: &VxlanTopology,
    ) -> Self {
        let mut graph = BroadcastGraph::new();
        let physical_interfaces = compute_physical_interfaces(&mut graph, configurations);
        let ethernet_hubs = compute_ethernet_hubs(
            &mut graph,
            configurations,
            &physical_interfaces,
            layer1_topology,
        );
        let domains =
            compute_device_broadcast_domains(&mut graph, configurations, &physical_interfaces);
        let l2_vnis = compute_l2_vnis(&mut graph, configurations, &domains);
        let l2_vni_hubs = compute_l2_vni_hubs(&mut graph, &l2_vnis, vxlan_topology);
        let l3_interfaces =
            compute_layer3_interfaces(&mut graph, configurations, &physical_interfaces, &domains);

        debug!(
            "Built broadcast graph: {} physical interfaces, {} hubs, {} devices, {} L2 VNIs, {} L3 interfaces",
            physical_interfaces.len(),
            ethernet_hubs.len(),
            domains.len(),
            l2_vnis.len(),
            l3_interfaces.len()
        );

        Self {
            graph,
            physical_interfaces,
            ethernet_hubs,
            domains,
            l2_vnis,
            l2_vni_hubs,
            l3_interfaces,
        }
    }

    /// Domain id of every L3 interface. Ids only mean anything compared with each other.
    pub fn find_all_broadcast_domains(&self) -> BTreeMap<NodeInterfacePair, usize> {
        let mut ret = BTreeMap::new();
        let mut next_id = 0;
        for (nip, &l3) in &self.l3_interfaces {
            if ret.contains_key(nip) {
                continue;
            }
            let domain_id = next_id;
            next_id += 1;
            for member in self.graph.broadcast_domain(l3) {
                ret.entry(self.graph.l3_interface(member).iface().clone())
                    .or_insert(domain_id);
            }
        }
        debug!(
            "Found {} broadcast domains across {} L3 interfaces",
            next_id,
            ret.len()
        );
        ret
    }

    pub fn graph(&self) -> &BroadcastGraph {
        &self.graph
    }

    pub fn physical_interface_id(&self, nip: &NodeInterfacePair) -> Option<PhysicalInterfaceId> {
        self.physical_interfaces.get(nip).copied()
    }

    pub fn l3_interface_id(&self, nip: &NodeInterfacePair) -> Option<L3InterfaceId> {
        self.l3_interfaces.get(nip).copied()
    }

    pub fn domain_id(&self, hostname: &str) -> Option<DeviceBroadcastDomainId> {
        self.domains.get(hostname).copied()
    }

    pub fn l2_vni_id(&self, node: &VxlanNode) -> Option<L2VniId> {
        self.l2_vnis.get(node).copied()
    }

    pub fn l3_interfaces(&self) -> impl Iterator<Item = (&NodeInterfacePair, L3InterfaceId)> + '_ {
        self.l3_interfaces.iter().map(|(nip, &id)| (nip, id))
    }

    pub fn ethernet_hubs(&self) -> &BTreeMap<String, EthernetHubId> {
        &self.ethernet_hubs
    }

    pub fn l2_vni_hubs(&self) -> &BTreeMap<String, L2VniHubId> {
        &self.l2_vni_hubs
    }
}

fn compute_physical_interfaces(
    graph: &mut BroadcastGraph,
    configurations: &BTreeMap<String, Configuration>,
) -> BTreeMap<NodeInterfacePair, PhysicalInterfaceId> {
    let mut ret = BTreeMap::new();
    for (hostname, c) in configurations {
        for i in c.interfaces.values() {
            if should_create_physical_interface(i) {
                let nip = NodeInterfacePair::new(hostname.clone(), i.name.clone());
                ret.insert(nip.clone(), graph.add_physical_interface(nip));
            }
        }
    }
    ret
}

/// Whether `i` is a wire-level port: an active physical or aggregated interface
/// that is not itself a member of an aggregate.
pub fn should_create_physical_interface(i: &Interface) -> bool {
    if !i.interface_type.is_physical_like() {
        debug!("Not creating physical interface {}: not a physical interface", i.name);
        false
    } else if i.is_aggregated() {
        debug!("Not creating physical interface {}: physical interface but aggregated", i.name);
        false
    } else if !i.active {
        debug!("Not creating physical interface {}: not active", i.name);
        false
    } else {
        true
    }
}

/// Whether `i` is an IP endpoint taking part in broadcast domains.
pub fn should_create_l3_interface(i: &Interface) -> bool {
    if !i.has_addresses() {
        debug!("Not creating L3 interface {}: no addresses", i.name);
        false
    } else if !i.active {
        debug!("Not creating L3 interface {}: not active", i.name);
        false
    } else if i.interface_type == InterfaceType::Loopback {
        debug!("Skipping L3 interface {}: loopback", i.name);
        false
    } else if i.switchport {
        warn!("Skipping L3 interface {}: has switchport set to true", i.name);
        false
    } else {
        true
    }
}

/// The port `i` sends on: its own, or its Bind parent's when that parent exists
/// on the device and is itself a port.
pub fn find_corresponding_physical_interface(
    i: &Interface,
    nip: &NodeInterfacePair,
    device_interfaces: &BTreeMap<String, Interface>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
) -> Option<PhysicalInterfaceId> {
    if let Some(&id) = physical_interfaces.get(nip) {
        return Some(id);
    }
    let Some(parent_name) = i.bind_parent() else {
        debug!("No corresponding physical interface found for {}", nip);
        return None;
    };
    let parent = NodeInterfacePair::new(nip.hostname.clone(), parent_name);
    if !device_interfaces.contains_key(parent_name) {
        warn!("Subinterface {}: missing parent {}, skipping", nip, parent);
        return None;
    }
    let found = physical_interfaces.get(&parent).copied();
    if found.is_none() {
        debug!("Subinterface {}: parent {} has no physical interface", nip, parent);
    }
    found
}

/// Groups ports into hubs by L1 reachability.
///
/// Ports never named in `layer1_topology` share the global hub. Ports that are
/// named form one hub per connected cluster, counting only edges whose both
/// ends are ports of this snapshot, so a port cabled only to unknown devices
/// sits alone in its own hub.
pub fn compute_ethernet_hubs(
    graph: &mut BroadcastGraph,
    configurations: &BTreeMap<String, Configuration>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
    layer1_topology: &Layer1Topology,
) -> BTreeMap<String, EthernetHubId> {
    let mentioned: BTreeSet<NodeInterfacePair> = layer1_topology
        .nodes()
        .into_iter()
        .map(Layer1Node::to_node_interface_pair)
        .collect();

    let mut ret = BTreeMap::new();

    let uncabled: Vec<&NodeInterfacePair> = physical_interfaces
        .keys()
        .filter(|nip| !mentioned.contains(*nip))
        .collect();
    if uncabled.is_empty() {
        debug!("Not creating a global Ethernet hub: all physical interfaces have L1 edges");
    } else {
        debug!(
            "Creating a global Ethernet hub with {} physical interfaces",
            uncabled.len()
        );
        let members: Vec<PhysicalInterfaceId> = uncabled
            .iter()
            .filter_map(|nip| physical_interfaces.get(*nip).copied())
            .collect();
        let hub = graph.add_ethernet_hub(GLOBAL_HUB_NAME);
        graph.connect_to_hub(hub, &members);
        ret.insert(GLOBAL_HUB_NAME.to_string(), hub);
    }

    if mentioned.is_empty() {
        debug!("L1 topology is empty, so only the global hub exists");
    } else {
        let cabled: Vec<&NodeInterfacePair> = mentioned
            .iter()
            .filter(|nip| physical_interfaces.contains_key(*nip))
            .collect();
        let index: BTreeMap<&NodeInterfacePair, usize> =
            cabled.iter().enumerate().map(|(i, nip)| (*nip, i)).collect();

        let mut clusters = UnionFind::<usize>::new(cabled.len());
        for edge in layer1_topology.edges() {
            let a = edge.node1.to_node_interface_pair();
            let b = edge.node2.to_node_interface_pair();
            if let (Some(&a), Some(&b)) = (index.get(&a), index.get(&b)) {
                clusters.union(a, b);
            }
        }

        let mut groups: BTreeMap<usize, Vec<&NodeInterfacePair>> = BTreeMap::new();
        for (i, nip) in cabled.iter().enumerate() {
            groups.entry(clusters.find_mut(i)).or_default().push(*nip);
        }
        for members in groups.values() {
            let Some(first) = members.first() else {
                continue;
            };
            let name = format!("Hub for {}", first);
            let ids: Vec<PhysicalInterfaceId> = members
                .iter()
                .filter_map(|nip| physical_interfaces.get(*nip).copied())
                .collect();
            let hub = graph.add_ethernet_hub(name.clone());
            graph.connect_to_hub(hub, &ids);
            ret.insert(name, hub);
        }
    }

    let is_switchport = |nip: &NodeInterfacePair| {
        configurations
            .get(&nip.hostname)
            .and_then(|c| c.interface(&nip.interface))
            .map_or(false, |i| i.switchport)
    };
    let l2_uncabled: Vec<&NodeInterfacePair> =
        uncabled.iter().copied().filter(|nip| is_switchport(nip)).collect();
    let l2_cabled = mentioned.iter().filter(|nip| is_switchport(nip)).count();
    if !l2_uncabled.is_empty() && l2_cabled > 0 {
        warn!(
            "Some L2 interfaces are mentioned in L1 ({}) but not all ({}): {:?} are not",
            l2_cabled,
            l2_uncabled.len(),
            l2_uncabled
        );
    }

    ret
}

fn compute_device_broadcast_domains(
    graph: &mut BroadcastGraph,
    configurations: &BTreeMap<String, Configuration>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
) -> BTreeMap<String, DeviceBroadcastDomainId> {
    let mut ret = BTreeMap::new();
    for (hostname, c) in configurations {
        let domain = graph.add_domain(hostname.clone());
        ret.insert(hostname.clone(), domain);
        for i in c.interfaces.values() {
            connect_l2_interface_to_broadcast_domain(
                graph,
                i,
                hostname,
                &c.interfaces,
                physical_interfaces,
                domain,
            );
        }
    }
    ret
}

/// Attaches the port under a switchport-mode interface to its device switch.
pub fn connect_l2_interface_to_broadcast_domain(
    graph: &mut BroadcastGraph,
    i: &Interface,
    hostname: &str,
    device_interfaces: &BTreeMap<String, Interface>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
    domain: DeviceBroadcastDomainId,
) {
    let nip = NodeInterfacePair::new(hostname, i.name.clone());
    if !i.switchport {
        debug!("Skipping non-L2 interface {}: switchport is not set", nip);
        return;
    }
    let Some(iface) =
        find_corresponding_physical_interface(i, &nip, device_interfaces, physical_interfaces)
    else {
        return;
    };
    if graph.physical_interface(iface).iface() != &nip {
        // TODO: model several L2 subinterfaces of one port separately instead of
        // bridging the whole parent.
        warn!(
            "Faking L2 connection for subinterface {} to parent {}",
            nip,
            graph.physical_interface(iface).iface()
        );
    }

    match i.switchport_mode {
        SwitchportMode::Access => match i.access_vlan {
            Some(vlan) => graph.connect_in_access_mode(iface, domain, vlan),
            None => warn!("Skipping L2 connection for {}: access mode vlan is missing", nip),
        },
        SwitchportMode::Trunk => {
            graph.connect_trunk(iface, domain, i.allowed_vlans.clone(), i.native_vlan)
        }
        mode => warn!("Surprised by L2 interface {} in mode {:?}: unsure how to connect", nip, mode),
    }
}

fn compute_l2_vnis(
    graph: &mut BroadcastGraph,
    configurations: &BTreeMap<String, Configuration>,
    domains: &BTreeMap<String, DeviceBroadcastDomainId>,
) -> BTreeMap<VxlanNode, L2VniId> {
    let mut ret = BTreeMap::new();
    for (hostname, c) in configurations {
        let Some(&domain) = domains.get(hostname) else {
            continue;
        };
        for settings in c.layer2_vnis() {
            let node = VxlanNode::layer2(hostname.clone(), settings.vni);
            let vni = graph.add_l2_vni(node.clone());
            graph.connect_l2_vni_to_vlan(vni, domain, settings.vlan);
            ret.insert(node, vni);
        }
    }
    ret
}

/// One flood hub per cluster of L2 VNIs joined by VXLAN edges.
pub fn compute_l2_vni_hubs(
    graph: &mut BroadcastGraph,
    l2_vnis: &BTreeMap<VxlanNode, L2VniId>,
    vxlan_topology: &VxlanTopology,
) -> BTreeMap<String, L2VniHubId> {
    let edges: Vec<&(VxlanNode, VxlanNode)> = vxlan_topology.layer2_vni_edges().collect();
    if l2_vnis.is_empty() || edges.is_empty() {
        return BTreeMap::new();
    }

    let nodes: BTreeSet<&VxlanNode> = edges.iter().flat_map(|(a, b)| [a, b]).collect();
    let index: BTreeMap<&VxlanNode, usize> =
        nodes.iter().enumerate().map(|(i, node)| (*node, i)).collect();
    let mut clusters = UnionFind::<usize>::new(nodes.len());
    for (a, b) in &edges {
        if let (Some(&a), Some(&b)) = (index.get(a), index.get(b)) {
            clusters.union(a, b);
        }
    }

    let mut groups: BTreeMap<usize, Vec<&VxlanNode>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        groups.entry(clusters.find_mut(i)).or_default().push(*node);
    }

    let mut ret = BTreeMap::new();
    for members in groups.values() {
        let Some(first) = members.first() else {
            continue;
        };
        let vnis: Vec<L2VniId> = members
            .iter()
            .filter_map(|node| {
                let vni = l2_vnis.get(*node).copied();
                if vni.is_none() {
                    debug!(
                        "VXLAN edge names VNI {} on {} which is not configured, skipping",
                        node.vni, node.hostname
                    );
                }
                vni
            })
            .collect();
        let name = format!("Hub for VNI {} on {}", first.vni, first.hostname);
        let hub = graph.add_l2_vni_hub(name.clone());
        graph.connect_to_l2_vni_hub(hub, &vnis);
        ret.insert(name, hub);
    }
    ret
}

fn compute_layer3_interfaces(
    graph: &mut BroadcastGraph,
    configurations: &BTreeMap<String, Configuration>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
    domains: &BTreeMap<String, DeviceBroadcastDomainId>,
) -> BTreeMap<NodeInterfacePair, L3InterfaceId> {
    let mut ret = BTreeMap::new();
    for (hostname, c) in configurations {
        for i in c.interfaces.values() {
            if !should_create_l3_interface(i) {
                continue;
            }
            let nip = NodeInterfacePair::new(hostname.clone(), i.name.clone());
            let l3 = graph.add_l3_interface(nip.clone());
            ret.insert(nip, l3);
            connect_l3_interface_to_physical_or_domain(
                graph,
                i,
                l3,
                &c.interfaces,
                physical_interfaces,
                domains,
            );
        }
    }
    ret
}

/// Connects an L3 interface to the port it rides on, or to its device switch for SVIs.
pub fn connect_l3_interface_to_physical_or_domain(
    graph: &mut BroadcastGraph,
    i: &Interface,
    l3: L3InterfaceId,
    device_interfaces: &BTreeMap<String, Interface>,
    physical_interfaces: &BTreeMap<NodeInterfacePair, PhysicalInterfaceId>,
    domains: &BTreeMap<String, DeviceBroadcastDomainId>,
) {
    let nip = graph.l3_interface(l3).iface().clone();

    if i.interface_type.is_physical_like() {
        let Some(&iface) = physical_interfaces.get(&nip) else {
            warn!("L3 interface {}: surprised not to find physical interface; skipping", nip);
            return;
        };
        let tag = EthernetTag::from_encapsulation(i.encapsulation_vlan);
        debug!("L3 interface {} connected to its physical interface {}", nip, tag);
        graph.connect_l3_to_physical(l3, iface, tag);
        return;
    }

    if let Some(parent_name) = i.bind_parent() {
        let parent = NodeInterfacePair::new(nip.hostname.clone(), parent_name);
        if !device_interfaces.contains_key(parent_name) {
            warn!("Not connecting L3 interface {} to parent: {} not found", nip, parent);
            return;
        }
        let Some(&parent_iface) = physical_interfaces.get(&parent) else {
            warn!(
                "Not connecting L3 interface {} to parent {}: physical interface not found",
                nip, parent
            );
            return;
        };
        let Some(vlan) = i.encapsulation_vlan else {
            warn!("Not connecting L3 interface {} to parent {}: no encapsulation vlan", nip, parent);
            return;
        };
        debug!(
            "Connecting L3 interface {} to physical interface {} in vlan {}",
            nip, parent, vlan
        );
        graph.connect_l3_to_physical(l3, parent_iface, EthernetTag::Tagged(vlan));
        return;
    }

    match i.interface_type {
        // Tunnels do not form adjacencies over L2 broadcast domains.
        InterfaceType::Tunnel => {}
        InterfaceType::Vlan => {
            let Some(vlan) = i.vlan else {
                warn!("Not connecting L3 interface {}: surprised vlan is not set", nip);
                return;
            };
            let Some(&domain) = domains.get(&nip.hostname) else {
                warn!(
                    "Not connecting L3 interface {}: surprised not to find device broadcast domain",
                    nip
                );
                return;
            };
            debug!(
                "Connecting L3 interface {} to broadcast domain {} in vlan {}",
                nip, nip.hostname, vlan
            );
            graph.connect_irb(l3, domain, vlan);
        }
        other => warn!(
            "Surprised by L3 interface {} of type {:?}: unsure how to connect",
            nip, other
        ),
    }
}
