//! Layer-1 (physical cabling) topology.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::datamodel::{Configuration, NodeInterfacePair};

/// One end of a cable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Layer1Node {
    pub hostname: String,
    pub interface_name: String,
}

impl Layer1Node {
    pub fn new(hostname: impl Into<String>, interface_name: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            interface_name: interface_name.into(),
        }
    }

    pub fn to_node_interface_pair(&self) -> NodeInterfacePair {
        NodeInterfacePair::new(self.hostname.clone(), self.interface_name.clone())
    }
}

/// A cable between two interfaces. Treated as undirected everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Layer1Edge {
    pub node1: Layer1Node,
    pub node2: Layer1Node,
}

impl Layer1Edge {
    pub fn new(
        hostname1: impl Into<String>,
        interface1: impl Into<String>,
        hostname2: impl Into<String>,
        interface2: impl Into<String>,
    ) -> Self {
        Self {
            node1: Layer1Node::new(hostname1, interface1),
            node2: Layer1Node::new(hostname2, interface2),
        }
    }

    pub fn reverse(&self) -> Self {
        Self {
            node1: self.node2.clone(),
            node2: self.node1.clone(),
        }
    }
}

/// A set of Layer-1 edges. Edges may name hosts or interfaces that are not in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer1Topology {
    edges: BTreeSet<Layer1Edge>,
}

impl Layer1Topology {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(edges: impl IntoIterator<Item = Layer1Edge>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = &Layer1Edge> + '_ {
        self.edges.iter()
    }

    /// Every interface mentioned by at least one edge, sorted.
    pub fn nodes(&self) -> BTreeSet<&Layer1Node> {
        self.edges
            .iter()
            .flat_map(|e| [&e.node1, &e.node2])
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }
}

/// Named Layer-1 topology variants computed from the same raw cabling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer1Variant {
    /// User-supplied physical edges plus synthesized edges
    Combined,
    /// Combined minus edges touching a shut-down interface
    ActivePhysical,
    /// Active physical with aggregate members lifted to their aggregate interface
    Logical,
}

/// The bundle of Layer-1 topology variants handed to the adjacency facade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer1Topologies {
    combined: Layer1Topology,
    active_physical: Layer1Topology,
    logical: Layer1Topology,
}

impl Layer1Topologies {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derives every variant from user-supplied and synthesized cabling.
    ///
    /// Edges naming hosts or interfaces absent from `configurations` are kept: the
    /// adjacency computation decides what a dangling edge means.
    pub fn create(
        physical: &Layer1Topology,
        synthesized: &Layer1Topology,
        configurations: &BTreeMap<String, Configuration>,
    ) -> Self {
        let combined = Layer1Topology::new(physical.edges().chain(synthesized.edges()).cloned());

        let active_physical = Layer1Topology::new(
            combined
                .edges()
                .filter(|e| {
                    !is_known_inactive(&e.node1, configurations)
                        && !is_known_inactive(&e.node2, configurations)
                })
                .cloned(),
        );

        let logical = Layer1Topology::new(active_physical.edges().filter_map(|e| {
            let node1 = to_logical(&e.node1, configurations);
            let node2 = to_logical(&e.node2, configurations);
            if node1 == node2 {
                debug!("Dropping logical Layer-1 self edge on {:?}", node1);
                return None;
            }
            Some(Layer1Edge { node1, node2 })
        }));

        debug!(
            "Layer-1 topologies: {} combined, {} active physical, {} logical edges",
            combined.len(),
            active_physical.len(),
            logical.len()
        );

        Self {
            combined,
            active_physical,
            logical,
        }
    }

    pub fn combined(&self) -> &Layer1Topology {
        &self.combined
    }

    pub fn active_physical(&self) -> &Layer1Topology {
        &self.active_physical
    }

    pub fn logical(&self) -> &Layer1Topology {
        &self.logical
    }

    pub fn get(&self, variant: Layer1Variant) -> &Layer1Topology {
        match variant {
            Layer1Variant::Combined => &self.combined,
            Layer1Variant::ActivePhysical => &self.active_physical,
            Layer1Variant::Logical => &self.logical,
        }
    }
}

fn is_known_inactive(node: &Layer1Node, configurations: &BTreeMap<String, Configuration>) -> bool {
    configurations
        .get(&node.hostname)
        .and_then(|c| c.interface(&node.interface_name))
        .map_or(false, |i| !i.active)
}

/// Maps an aggregate member to its aggregate interface when the aggregate exists.
fn to_logical(node: &Layer1Node, configurations: &BTreeMap<String, Configuration>) -> Layer1Node {
    let Some(config) = configurations.get(&node.hostname) else {
        return node.clone();
    };
    match config
        .interface(&node.interface_name)
        .and_then(|i| i.channel_group.as_deref())
    {
        Some(parent) if config.interface(parent).is_some() => {
            Layer1Node::new(node.hostname.clone(), parent)
        }
        _ => node.clone(),
    }
}
