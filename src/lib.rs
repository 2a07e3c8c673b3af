//! # l3adjacency - Broadcast-domain and L3 adjacency inference
//!
//! This library infers, from vendor-independent device configurations plus
//! optional (possibly incomplete) Layer-1 cabling and a VXLAN overlay
//! topology, which interfaces can exchange Ethernet frames and which pairs
//! share an exclusive point-to-point link.
//!
//! ## Overview
//!
//! The answers feed routing-protocol adjacency formation (which interfaces
//! could become OSPF or BGP neighbors), ARP scoping and dataplane simulation.
//! The engine models access and trunk ports, native and allowed VLANs, SVIs,
//! 802.1Q sub-interfaces, link aggregation and VXLAN-bridged VLANs as one
//! graph of tag transformations.
//!
//! ## Key Features
//!
//! - **Unknown cabling fallback**: un-cabled ports share one global hub
//! - **Tag-aware flooding**: mismatched encapsulations never merge domains
//! - **VXLAN bridging**: L2 VNI edges join VLANs across devices
//! - **Point-to-point detection**: exclusive two-port links
//! - **Injectable variant policy**: choose the Layer-1 variant per query
//!
//! ## Architecture
//!
//! - `datamodel`: configurations, interfaces, VLAN sets, interface identity
//! - `topology`: Layer-1 topology variants and the VXLAN topology
//! - `broadcast`: the node graph, the adjacency computer and the query facade
//! - `config_loader`: snapshot YAML loading and validation
//! - `report`: JSON and text reports
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use l3adjacency::broadcast::L3Adjacencies;
//! use l3adjacency::config_loader;
//! use l3adjacency::datamodel::NodeInterfacePair;
//! use std::path::Path;
//!
//! let snapshot = config_loader::load_snapshot(Path::new("snapshot.yaml"))?;
//! let adjacencies = snapshot.adjacencies();
//!
//! let a = NodeInterfacePair::new("r1", "Ethernet1");
//! let b = NodeInterfacePair::new("r2", "Ethernet1");
//! println!("broadcast: {}", adjacencies.in_same_broadcast_domain(&a, &b));
//! println!("point-to-point: {}", adjacencies.in_same_point_to_point_domain(&a, &b));
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! The engine itself is total: missing parents, VLANs or cabling simply omit
//! nodes or edges. Loading uses `color_eyre` with context at file boundaries
//! and `thiserror` enums for validation failures.

pub mod broadcast;
pub mod config_loader;
pub mod datamodel;
pub mod report;
pub mod topology;
