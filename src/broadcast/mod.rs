//! Broadcast-domain and L3 adjacency inference.
//!
//! The engine models Ethernet forwarding as a graph of ports, shared media
//! (hubs), per-device VLAN bridges, L3 endpoints and VXLAN L2 segments.
//! Edges are tag transformations; a broadcast domain is every L3 endpoint a
//! frame originated by one L3 interface can reach.

pub mod adjacencies;
pub mod computer;
pub mod ethernet_tag;
pub mod graph;
pub mod nodes;
pub mod traversal;

// Re-export key types for easier access
pub use adjacencies::{BroadcastL3Adjacencies, L3Adjacencies, Layer1VariantPolicy};
pub use computer::{
    compute_ethernet_hubs, compute_l2_vni_hubs, connect_l2_interface_to_broadcast_domain,
    connect_l3_interface_to_physical_or_domain, find_corresponding_physical_interface,
    should_create_l3_interface, should_create_physical_interface, L3AdjacencyComputer,
    GLOBAL_HUB_NAME,
};
pub use ethernet_tag::EthernetTag;
pub use graph::BroadcastGraph;
pub use nodes::{
    DeviceBroadcastDomain, DeviceBroadcastDomainId, EthernetHub, EthernetHubId, L2Vni, L2VniHub,
    L2VniHubId, L2VniId, L3Connection, L3Interface, L3InterfaceId, PhysicalInterface,
    PhysicalInterfaceId,
};
pub use traversal::{
    DeliverFromVlan, DeliverWithTag, OriginateInVlan, OriginateWithTag, Preserve,
    SwitchportAdmission, Traverse,
};
