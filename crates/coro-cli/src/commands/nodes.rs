//! Node kind listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use coro_core::{ParamDefault, ParamDomain, ParamSpec};
use coro_registry::{NodeCategory, NodeDescriptor, NodeRegistry};

#[derive(Args)]
pub struct NodesArgs {
    /// Show details for a specific node kind
    #[arg(value_name = "KIND")]
    kind: Option<String>,
}

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::new();

    match &args.kind {
        Some(kind) => {
            let desc = registry
                .descriptor(kind)
                .ok_or_else(|| anyhow::anyhow!("Unknown node kind: {kind}"))?;
            print_details(desc);
        }
        None => print_listing(&registry),
    }
    Ok(())
}

fn print_listing(registry: &NodeRegistry) {
    println!("Available Nodes");
    println!("===============");

    for category in NodeCategory::ALL {
        println!();
        println!("{} - {}", category.name(), category.description());
        for desc in registry.nodes_in_category(category) {
            println!("  {:15} - {}", desc.id, desc.description);
        }
    }

    println!();
    println!("Use 'coro nodes <kind>' for detailed parameter info.");
}

fn print_details(desc: &NodeDescriptor) {
    println!("{}", desc.name);
    println!("{}", "=".repeat(desc.name.len()));
    println!();
    println!("{}", desc.description);
    println!();

    println!("Parameters:");
    println!();
    println!(
        "  {:10}  {:40}  {:10}  {:16}  {}",
        "Name", "Description", "Default", "Range", "Notes"
    );
    println!(
        "  {:10}  {:40}  {:10}  {:16}  {}",
        "----", "-----------", "-------", "-----", "-----"
    );
    for spec in desc.params {
        println!(
            "  {:10}  {:40}  {:10}  {:16}  {}",
            spec.name,
            spec.description,
            default_text(spec),
            range_text(spec.domain),
            notes(spec)
        );
    }

    if !desc.aux.is_empty() {
        println!();
        let names: Vec<_> = desc.aux.iter().map(|k| k.name()).collect();
        println!("Streams: {}", names.join(", "));
    }
}

fn default_text(spec: &ParamSpec) -> String {
    match spec.default {
        ParamDefault::Required => "required".to_string(),
        ParamDefault::Number(v) => format!("{v}"),
        ParamDefault::Flag(b) => format!("{b}"),
    }
}

fn range_text(domain: ParamDomain) -> String {
    let bound = |v: f32| {
        if v.is_infinite() {
            "any".to_string()
        } else {
            format!("{v}")
        }
    };
    match domain {
        ParamDomain::Number { min, max } if min.is_infinite() && max.is_infinite() => {
            "any".to_string()
        }
        ParamDomain::Number { min, max } => format!("{} to {}", bound(min), bound(max)),
        ParamDomain::Integer { min, max } => format!("{min} to {max} (int)"),
        ParamDomain::Flag => "on/off".to_string(),
        ParamDomain::Input => "stream".to_string(),
        ParamDomain::Table => "table".to_string(),
        ParamDomain::Matrix => "matrix".to_string(),
        ParamDomain::List => "list".to_string(),
        ParamDomain::TableList => "table list".to_string(),
        ParamDomain::MatrixList => "matrix list".to_string(),
    }
}

fn notes(spec: &ParamSpec) -> String {
    let mut notes = Vec::new();
    if spec.is_fixed() {
        notes.push("fixed");
    }
    if spec.is_whole() {
        notes.push("whole");
    }
    if spec.is_ignored() {
        notes.push("ignored");
    }
    notes.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_text_formats_domains() {
        assert_eq!(
            range_text(ParamDomain::Number {
                min: f32::NEG_INFINITY,
                max: f32::INFINITY
            }),
            "any"
        );
        assert_eq!(
            range_text(ParamDomain::Number { min: 0.0, max: 60.0 }),
            "0 to 60"
        );
        assert_eq!(
            range_text(ParamDomain::Integer { min: 1, max: 4 }),
            "1 to 4 (int)"
        );
        assert_eq!(range_text(ParamDomain::TableList), "table list");
    }

    #[test]
    fn notes_list_flags() {
        let registry = NodeRegistry::new();
        let rec = registry.descriptor("tablerec").unwrap();
        let fadetime = rec.params.iter().find(|p| p.name == "fadetime").unwrap();
        assert_eq!(notes(fadetime), "fixed");
        let mul = rec.params.iter().find(|p| p.name == "mul").unwrap();
        assert_eq!(notes(mul), "ignored");
        assert_eq!(default_text(&rec.params[1]), "required");
    }
}
