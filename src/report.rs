//! Adjacency reports.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::broadcast::BroadcastL3Adjacencies;
use crate::datamodel::NodeInterfacePair;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastDomainSummary {
    pub id: usize,
    pub members: Vec<NodeInterfacePair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointToPointLink {
    pub a: NodeInterfacePair,
    pub b: NodeInterfacePair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyReport {
    pub l3_interfaces: usize,
    pub broadcast_domains: Vec<BroadcastDomainSummary>,
    pub point_to_point_links: Vec<PointToPointLink>,
}

pub fn build_report(adjacencies: &BroadcastL3Adjacencies) -> AdjacencyReport {
    let broadcast_domains: Vec<BroadcastDomainSummary> = adjacencies
        .domain_members()
        .into_iter()
        .map(|(id, members)| BroadcastDomainSummary { id, members })
        .collect();
    AdjacencyReport {
        l3_interfaces: broadcast_domains.iter().map(|d| d.members.len()).sum(),
        broadcast_domains,
        point_to_point_links: adjacencies
            .point_to_point_pairs()
            .into_iter()
            .map(|(a, b)| PointToPointLink { a, b })
            .collect(),
    }
}

pub fn render_json_report(report: &AdjacencyReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

/// Generate JSON report
pub fn generate_json_report(report: &AdjacencyReport, output_path: &Path) -> Result<()> {
    let json = render_json_report(report)?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Human-readable summary, one domain per block
pub fn render_text_report(report: &AdjacencyReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(60));
    lines.push("L3 ADJACENCY REPORT".to_string());
    lines.push("=".repeat(60));
    lines.push(format!("L3 interfaces:        {}", report.l3_interfaces));
    lines.push(format!("Broadcast domains:    {}", report.broadcast_domains.len()));
    lines.push(format!("Point-to-point links: {}", report.point_to_point_links.len()));
    lines.push(String::new());

    for domain in &report.broadcast_domains {
        lines.push(format!("Domain {} ({} interfaces)", domain.id, domain.members.len()));
        for member in &domain.members {
            lines.push(format!("  {}", member));
        }
    }

    if !report.point_to_point_links.is_empty() {
        lines.push(String::new());
        lines.push("Point-to-point links:".to_string());
        for link in &report.point_to_point_links {
            lines.push(format!("  {} <-> {}", link.a, link.b));
        }
    }

    lines.join("\n")
}
