use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use l3adjacency::broadcast::L3Adjacencies;
use l3adjacency::config_loader;
use l3adjacency::datamodel::NodeInterfacePair;
use l3adjacency::report::{build_report, generate_json_report, render_json_report, render_text_report};
use l3adjacency::topology::Layer1Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    Combined,
    ActivePhysical,
    Logical,
}

impl From<VariantArg> for Layer1Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Combined => Layer1Variant::Combined,
            VariantArg::ActivePhysical => Layer1Variant::ActivePhysical,
            VariantArg::Logical => Layer1Variant::Logical,
        }
    }
}

/// Infer broadcast domains and point-to-point links from a network snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the snapshot YAML file
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a human-readable summary instead of JSON
    #[arg(long, conflicts_with = "output")]
    text: bool,

    /// Layer-1 variant backing broadcast-domain queries
    #[arg(long, value_enum)]
    broadcast_variant: Option<VariantArg>,

    /// Layer-1 variant backing point-to-point queries
    #[arg(long, value_enum)]
    point_to_point_variant: Option<VariantArg>,

    /// Answer both predicates for two interfaces, written host:interface
    #[arg(long, num_args = 2, value_names = ["A", "B"], value_parser = parse_interface)]
    pair: Option<Vec<NodeInterfacePair>>,
}

fn parse_interface(s: &str) -> std::result::Result<NodeInterfacePair, String> {
    match s.split_once(':') {
        Some((hostname, interface)) if !hostname.is_empty() && !interface.is_empty() => {
            Ok(NodeInterfacePair::new(hostname, interface))
        }
        _ => Err(format!("expected host:interface, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Snapshot: {:?}", args.snapshot);

    let mut snapshot = config_loader::load_snapshot(&args.snapshot)
        .wrap_err("Failed to load snapshot")?;

    // Command-line variants override the snapshot's policy
    if let Some(variant) = args.broadcast_variant {
        snapshot.policy.broadcast = variant.into();
    }
    if let Some(variant) = args.point_to_point_variant {
        snapshot.policy.point_to_point = variant.into();
    }

    let adjacencies = snapshot.adjacencies();

    if let Some(pair) = &args.pair {
        if let [a, b] = pair.as_slice() {
            println!("{} / {}", a, b);
            println!("  same broadcast domain:      {}", adjacencies.in_same_broadcast_domain(a, b));
            println!("  same point-to-point domain: {}", adjacencies.in_same_point_to_point_domain(a, b));
            for iface in [a, b] {
                match adjacencies.paired_point_to_point_l3_interface(iface) {
                    Some(peer) => println!("  {} is paired with {}", iface, peer),
                    None => println!("  {} has no point-to-point peer", iface),
                }
            }
        }
        return Ok(());
    }

    let report = build_report(&adjacencies);
    match &args.output {
        Some(path) => generate_json_report(&report, path)?,
        None if args.text => println!("{}", render_text_report(&report)),
        None => println!("{}", render_json_report(&report)?),
    }

    Ok(())
}
