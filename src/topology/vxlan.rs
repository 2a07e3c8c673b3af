//! VXLAN overlay topology, consumed as a finished graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a VNI bridges (layer 2) or routes (layer 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VniLayer {
    Layer2,
    Layer3,
}

/// A VNI instantiated on one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VxlanNode {
    pub hostname: String,
    pub vni: u32,
    pub layer: VniLayer,
}

impl VxlanNode {
    pub fn new(hostname: impl Into<String>, vni: u32, layer: VniLayer) -> Self {
        Self {
            hostname: hostname.into(),
            vni,
            layer,
        }
    }

    pub fn layer2(hostname: impl Into<String>, vni: u32) -> Self {
        Self::new(hostname, vni, VniLayer::Layer2)
    }
}

/// Undirected edges between VTEP/VNI pairs that are compatible and reachable.
///
/// Edges are normalized so that `(a, b)` and `(b, a)` are the same edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(VxlanNode, VxlanNode)>",
    into = "Vec<(VxlanNode, VxlanNode)>"
)]
pub struct VxlanTopology {
    edges: BTreeSet<(VxlanNode, VxlanNode)>,
}

impl VxlanTopology {
    pub const EMPTY: Self = Self {
        edges: BTreeSet::new(),
    };

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(edges: impl IntoIterator<Item = (VxlanNode, VxlanNode)>) -> Self {
        Self {
            edges: edges
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
                .collect(),
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = &(VxlanNode, VxlanNode)> + '_ {
        self.edges.iter()
    }

    /// Edges whose both endpoints are layer-2 VNIs.
    pub fn layer2_vni_edges(&self) -> impl Iterator<Item = &(VxlanNode, VxlanNode)> + '_ {
        self.edges
            .iter()
            .filter(|(a, b)| a.layer == VniLayer::Layer2 && b.layer == VniLayer::Layer2)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl From<Vec<(VxlanNode, VxlanNode)>> for VxlanTopology {
    fn from(edges: Vec<(VxlanNode, VxlanNode)>) -> Self {
        Self::new(edges)
    }
}

impl From<VxlanTopology> for Vec<(VxlanNode, VxlanNode)> {
    fn from(topology: VxlanTopology) -> Self {
        topology.edges.into_iter().collect()
    }
}
