//! Interface identity shared by every layer of the topology graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (hostname, interface name) pair uniquely naming one interface in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeInterfacePair {
    pub hostname: String,
    pub interface: String,
}

impl NodeInterfacePair {
    pub fn new(hostname: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            interface: interface.into(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl fmt::Display for NodeInterfacePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.hostname, self.interface)
    }
}
