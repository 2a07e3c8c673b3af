//! Pairwise L3 adjacency queries over broadcast domains.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::computer::{L3AdjacencyComputer, GLOBAL_HUB_NAME};
use crate::datamodel::{Configuration, NodeInterfacePair};
use crate::topology::{Layer1Topologies, Layer1Variant, VxlanTopology};

/// Topological adjacency predicates consumed by routing-protocol logic.
pub trait L3Adjacencies {
    /// Whether `a` and `b` can receive each other's L2 broadcasts.
    fn in_same_broadcast_domain(&self, a: &NodeInterfacePair, b: &NodeInterfacePair) -> bool;

    /// Whether `a` and `b` are the only two parties on one link.
    fn in_same_point_to_point_domain(&self, a: &NodeInterfacePair, b: &NodeInterfacePair)
        -> bool;

    /// The single L3 interface at the far end of `iface`'s point-to-point link, if any.
    fn paired_point_to_point_l3_interface(
        &self,
        iface: &NodeInterfacePair,
    ) -> Option<NodeInterfacePair>;
}

/// Which Layer-1 variant backs each predicate.
///
/// Both default to the logical variant: its endpoints are the ports the graph
/// is built from, so bundles can be point-to-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layer1VariantPolicy {
    pub broadcast: Layer1Variant,
    pub point_to_point: Layer1Variant,
}

impl Default for Layer1VariantPolicy {
    fn default() -> Self {
        Self {
            broadcast: Layer1Variant::Logical,
            point_to_point: Layer1Variant::Logical,
        }
    }
}

/// The port and hub an L3 interface rides on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HubAttachment {
    physical_interface: NodeInterfacePair,
    hub: String,
    /// Not the global hub, and exactly two ports on it
    exclusive: bool,
}

/// [`L3Adjacencies`] computed from broadcast-domain membership.
#[derive(Debug, Clone)]
pub struct BroadcastL3Adjacencies {
    domains: BTreeMap<NodeInterfacePair, usize>,
    attachments: BTreeMap<NodeInterfacePair, HubAttachment>,
}

impl BroadcastL3Adjacencies {
    pub fn create(
        layer1_topologies: &Layer1Topologies,
        vxlan_topology: &VxlanTopology,
        configurations: &BTreeMap<String, Configuration>,
    ) -> Self {
        Self::create_with_policy(
            layer1_topologies,
            vxlan_topology,
            configurations,
            Layer1VariantPolicy::default(),
        )
    }

    pub fn create_with_policy(
        layer1_topologies: &Layer1Topologies,
        vxlan_topology: &VxlanTopology,
        configurations: &BTreeMap<String, Configuration>,
        policy: Layer1VariantPolicy,
    ) -> Self {
        let (domains, attachments) = rayon::join(
            || {
                L3AdjacencyComputer::new(
                    configurations,
                    layer1_topologies.get(policy.broadcast),
                    vxlan_topology,
                )
                .find_all_broadcast_domains()
            },
            || {
                // Overlay edges never make a link point-to-point.
                hub_attachments(&L3AdjacencyComputer::new(
                    configurations,
                    layer1_topologies.get(policy.point_to_point),
                    &VxlanTopology::EMPTY,
                ))
            },
        );

        let adjacencies = Self {
            domains,
            attachments,
        };
        info!(
            "Computed {} broadcast domains over {} L3 interfaces ({:?} broadcast, {:?} point-to-point)",
            adjacencies.domain_members().len(),
            adjacencies.domains.len(),
            policy.broadcast,
            policy.point_to_point
        );
        adjacencies
    }

    pub fn domain_id(&self, iface: &NodeInterfacePair) -> Option<usize> {
        self.domains.get(iface).copied()
    }

    /// Interfaces grouped by broadcast domain, each group sorted.
    pub fn domain_members(&self) -> BTreeMap<usize, Vec<NodeInterfacePair>> {
        let mut members: BTreeMap<usize, Vec<NodeInterfacePair>> = BTreeMap::new();
        for (iface, &id) in &self.domains {
            members.entry(id).or_default().push(iface.clone());
        }
        members
    }

    /// Every unordered pair for which [`L3Adjacencies::in_same_point_to_point_domain`] holds.
    pub fn point_to_point_pairs(&self) -> Vec<(NodeInterfacePair, NodeInterfacePair)> {
        let mut by_hub: BTreeMap<&str, Vec<&NodeInterfacePair>> = BTreeMap::new();
        for (iface, attachment) in &self.attachments {
            if attachment.exclusive {
                by_hub.entry(&attachment.hub).or_default().push(iface);
            }
        }

        let mut pairs = Vec::new();
        for members in by_hub.values() {
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    if self.in_same_point_to_point_domain(a, b) {
                        pairs.push(((*a).clone(), (*b).clone()));
                    }
                }
            }
        }
        pairs
    }
}

impl L3Adjacencies for BroadcastL3Adjacencies {
    fn in_same_broadcast_domain(&self, a: &NodeInterfacePair, b: &NodeInterfacePair) -> bool {
        match (self.domains.get(a), self.domains.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn in_same_point_to_point_domain(
        &self,
        a: &NodeInterfacePair,
        b: &NodeInterfacePair,
    ) -> bool {
        let (Some(x), Some(y)) = (self.attachments.get(a), self.attachments.get(b)) else {
            return false;
        };
        x.exclusive
            && x.hub == y.hub
            && x.physical_interface != y.physical_interface
            && self.in_same_broadcast_domain(a, b)
    }

    fn paired_point_to_point_l3_interface(
        &self,
        iface: &NodeInterfacePair,
    ) -> Option<NodeInterfacePair> {
        let attachment = self.attachments.get(iface).filter(|a| a.exclusive)?;
        let mut peers = self
            .attachments
            .iter()
            .filter(|(other, a)| a.hub == attachment.hub && *other != iface)
            .map(|(other, _)| other)
            .filter(|other| self.in_same_point_to_point_domain(iface, other));
        match (peers.next(), peers.next()) {
            (Some(peer), None) => Some(peer.clone()),
            _ => None,
        }
    }
}

fn hub_attachments(
    computer: &L3AdjacencyComputer,
) -> BTreeMap<NodeInterfacePair, HubAttachment> {
    let graph = computer.graph();
    computer
        .l3_interfaces()
        .filter_map(|(iface, id)| {
            let (port, _) = graph.l3_interface(id).send_to_interface()?;
            let physical = graph.physical_interface(port);
            let hub = graph.ethernet_hub(physical.hub()?);
            Some((
                iface.clone(),
                HubAttachment {
                    physical_interface: physical.iface().clone(),
                    hub: hub.name().to_string(),
                    exclusive: hub.name() != GLOBAL_HUB_NAME && hub.attached().len() == 2,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{Dependency, Interface, InterfaceType};
    use crate::topology::{Layer1Edge, Layer1Topology};

    fn nip(hostname: &str, iface: &str) -> NodeInterfacePair {
        NodeInterfacePair::new(hostname, iface)
    }

    fn host(hostname: &str, iface: &str, address: &str) -> Configuration {
        let mut c = Configuration::new(hostname);
        c.add_interface(
            Interface::new(iface, InterfaceType::Physical).with_address(address.parse().unwrap()),
        );
        c
    }

    fn to_map(configs: Vec<Configuration>) -> BTreeMap<String, Configuration> {
        configs
            .into_iter()
            .map(|c| (c.hostname.clone(), c))
            .collect()
    }

    fn three_hosts() -> BTreeMap<String, Configuration> {
        to_map(vec![
            host("c1", "i1", "1.2.3.1/24"),
            host("c2", "i2", "1.2.3.2/24"),
            host("c3", "i3", "1.2.3.3/24"),
        ])
    }

    fn adjacencies(
        configs: &BTreeMap<String, Configuration>,
        edges: Vec<Layer1Edge>,
    ) -> BroadcastL3Adjacencies {
        let topologies =
            Layer1Topologies::create(&Layer1Topology::new(edges), &Layer1Topology::empty(), configs);
        BroadcastL3Adjacencies::create(&topologies, &VxlanTopology::EMPTY, configs)
    }

    #[test]
    fn test_no_l1_is_broadcast_not_point_to_point() {
        let configs = three_hosts();
        let adj = BroadcastL3Adjacencies::create(
            &Layer1Topologies::empty(),
            &VxlanTopology::EMPTY,
            &configs,
        );
        let all = [nip("c1", "i1"), nip("c2", "i2"), nip("c3", "i3")];
        for a in &all {
            for b in &all {
                assert!(adj.in_same_broadcast_domain(a, b));
                assert!(!adj.in_same_point_to_point_domain(a, b));
            }
        }
        assert_eq!(adj.domain_members().len(), 1);
        assert!(adj.point_to_point_pairs().is_empty());
    }

    #[test]
    fn test_exact_l1_edge_isolates_pair() {
        let configs = three_hosts();
        let adj = adjacencies(&configs, vec![Layer1Edge::new("c1", "i1", "c3", "i3")]);
        let (n1, n2, n3) = (nip("c1", "i1"), nip("c2", "i2"), nip("c3", "i3"));

        assert!(adj.in_same_broadcast_domain(&n1, &n3));
        assert!(adj.in_same_point_to_point_domain(&n1, &n3));
        assert!(adj.in_same_point_to_point_domain(&n3, &n1));
        for other in [&n1, &n3] {
            assert!(!adj.in_same_broadcast_domain(&n2, other));
            assert!(!adj.in_same_point_to_point_domain(&n2, other));
        }
        assert!(!adj.in_same_point_to_point_domain(&n1, &n1));
        assert_eq!(adj.point_to_point_pairs(), vec![(n1, n3)]);
    }

    #[test]
    fn test_shared_segment_is_not_point_to_point() {
        let configs = three_hosts();
        let adj = adjacencies(
            &configs,
            vec![
                Layer1Edge::new("c1", "i1", "c2", "i2"),
                Layer1Edge::new("c2", "i2", "c3", "i3"),
            ],
        );
        let (n1, n2, n3) = (nip("c1", "i1"), nip("c2", "i2"), nip("c3", "i3"));
        assert!(adj.in_same_broadcast_domain(&n1, &n3));
        assert!(!adj.in_same_point_to_point_domain(&n1, &n2));
        assert!(!adj.in_same_point_to_point_domain(&n1, &n3));
    }

    #[test]
    fn test_point_to_point_requires_matching_encapsulation() {
        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("e1", InterfaceType::Physical));
        r1.add_interface(
            Interface::new("e1.10", InterfaceType::Logical)
                .with_address("10.0.10.1/30".parse().unwrap())
                .with_dependency(Dependency::bind("e1"))
                .with_encapsulation_vlan(Some(10)),
        );
        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("e1", InterfaceType::Physical));
        for (name, vlan, address) in [("e1.10", 10, "10.0.10.2/30"), ("e1.20", 20, "10.0.20.2/30")] {
            r2.add_interface(
                Interface::new(name, InterfaceType::Logical)
                    .with_address(address.parse().unwrap())
                    .with_dependency(Dependency::bind("e1"))
                    .with_encapsulation_vlan(Some(vlan)),
            );
        }
        let configs = to_map(vec![r1, r2]);
        let adj = adjacencies(&configs, vec![Layer1Edge::new("r1", "e1", "r2", "e1")]);

        assert!(adj.in_same_point_to_point_domain(&nip("r1", "e1.10"), &nip("r2", "e1.10")));
        assert!(!adj.in_same_point_to_point_domain(&nip("r1", "e1.10"), &nip("r2", "e1.20")));
        // Same port, different tags.
        assert!(!adj.in_same_point_to_point_domain(&nip("r2", "e1.10"), &nip("r2", "e1.20")));
    }

    fn bundled_routers() -> (BTreeMap<String, Configuration>, Layer1Topologies) {
        let mut configs = Vec::new();
        for (hostname, bundle, address) in [
            ("r1", "Port-channel1", "10.1.1.1/30"),
            ("r2", "Port-channel7", "10.1.1.2/30"),
        ] {
            let mut c = Configuration::new(hostname);
            c.add_interface(
                Interface::new(bundle, InterfaceType::Aggregated)
                    .with_address(address.parse().unwrap()),
            );
            for member in ["e1", "e2"] {
                let mut i = Interface::new(member, InterfaceType::Physical);
                i.channel_group = Some(bundle.to_string());
                c.add_interface(i);
            }
            configs.push(c);
        }
        let configs = to_map(configs);
        let physical = Layer1Topology::new([
            Layer1Edge::new("r1", "e1", "r2", "e1"),
            Layer1Edge::new("r1", "e2", "r2", "e2"),
        ]);
        let topologies = Layer1Topologies::create(&physical, &Layer1Topology::empty(), &configs);
        (configs, topologies)
    }

    #[test]
    fn test_variant_policy_selects_topology_per_predicate() {
        let (configs, topologies) = bundled_routers();
        let (po1, po7) = (nip("r1", "Port-channel1"), nip("r2", "Port-channel7"));

        // Members are cabled, and the logical variant lifts them to the bundles.
        let default = BroadcastL3Adjacencies::create(&topologies, &VxlanTopology::EMPTY, &configs);
        assert!(default.in_same_broadcast_domain(&po1, &po7));
        assert!(default.in_same_point_to_point_domain(&po1, &po7));
        assert_eq!(default.paired_point_to_point_l3_interface(&po1), Some(po7.clone()));

        // The physical variant only names member ports, which have no node.
        let physical = BroadcastL3Adjacencies::create_with_policy(
            &topologies,
            &VxlanTopology::EMPTY,
            &configs,
            Layer1VariantPolicy {
                broadcast: Layer1Variant::Logical,
                point_to_point: Layer1Variant::ActivePhysical,
            },
        );
        assert!(physical.in_same_broadcast_domain(&po1, &po7));
        assert!(!physical.in_same_point_to_point_domain(&po1, &po7));
        assert_eq!(physical.paired_point_to_point_l3_interface(&po1), None);
    }

    #[test]
    fn test_default_policy_is_logical() {
        let policy = Layer1VariantPolicy::default();
        assert_eq!(policy.broadcast, Layer1Variant::Logical);
        assert_eq!(policy.point_to_point, Layer1Variant::Logical);
    }

    #[test]
    fn test_paired_point_to_point_l3_interface() {
        let configs = three_hosts();
        let (n1, n2, n3) = (nip("c1", "i1"), nip("c2", "i2"), nip("c3", "i3"));

        // Exclusive pair; c2 stays on the global hub.
        let adj = adjacencies(&configs, vec![Layer1Edge::new("c1", "i1", "c3", "i3")]);
        assert_eq!(adj.paired_point_to_point_l3_interface(&n1), Some(n3.clone()));
        assert_eq!(adj.paired_point_to_point_l3_interface(&n3), Some(n1.clone()));
        assert_eq!(adj.paired_point_to_point_l3_interface(&n2), None);

        // Shared segment of three.
        let shared = adjacencies(
            &configs,
            vec![
                Layer1Edge::new("c1", "i1", "c2", "i2"),
                Layer1Edge::new("c2", "i2", "c3", "i3"),
            ],
        );
        for n in [&n1, &n2, &n3] {
            assert_eq!(shared.paired_point_to_point_l3_interface(n), None);
        }

        // Global hub with exactly two ports is still not a link.
        let two = to_map(vec![host("c1", "i1", "1.2.3.1/24"), host("c2", "i2", "1.2.3.2/24")]);
        let global = adjacencies(&two, vec![]);
        assert!(global.in_same_broadcast_domain(&n1, &n2));
        assert_eq!(global.paired_point_to_point_l3_interface(&n1), None);

        assert_eq!(adj.paired_point_to_point_l3_interface(&nip("nope", "x")), None);
    }

    #[test]
    fn test_paired_point_to_point_l3_interface_matches_tag() {
        let mut r1 = Configuration::new("r1");
        r1.add_interface(Interface::new("e1", InterfaceType::Physical));
        r1.add_interface(
            Interface::new("e1.10", InterfaceType::Logical)
                .with_address("10.0.10.1/30".parse().unwrap())
                .with_dependency(Dependency::bind("e1"))
                .with_encapsulation_vlan(Some(10)),
        );
        let mut r2 = Configuration::new("r2");
        r2.add_interface(Interface::new("e1", InterfaceType::Physical));
        for (name, vlan, address) in [("e1.10", 10, "10.0.10.2/30"), ("e1.20", 20, "10.0.20.2/30")] {
            r2.add_interface(
                Interface::new(name, InterfaceType::Logical)
                    .with_address(address.parse().unwrap())
                    .with_dependency(Dependency::bind("e1"))
                    .with_encapsulation_vlan(Some(vlan)),
            );
        }
        let configs = to_map(vec![r1, r2]);
        let adj = adjacencies(&configs, vec![Layer1Edge::new("r1", "e1", "r2", "e1")]);

        assert_eq!(
            adj.paired_point_to_point_l3_interface(&nip("r1", "e1.10")),
            Some(nip("r2", "e1.10"))
        );
        assert_eq!(adj.paired_point_to_point_l3_interface(&nip("r2", "e1.20")), None);
    }

    #[test]
    fn test_unknown_interfaces_are_never_adjacent() {
        let configs = three_hosts();
        let adj = adjacencies(&configs, vec![]);
        let ghost = nip("nope", "x");
        assert!(!adj.in_same_broadcast_domain(&ghost, &ghost));
        assert!(!adj.in_same_point_to_point_domain(&ghost, &nip("c1", "i1")));
        assert_eq!(adj.domain_id(&ghost), None);
    }
}
