//! `actions list` and `actions show`.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::actions::schema::ParamDefault;
use crate::actions::{ActionRegistry, ActionSignature};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct ActionsArgs {
    #[command(subcommand)]
    pub command: ActionsCommand,
}

#[derive(Subcommand)]
pub enum ActionsCommand {
    /// List available actions
    List,

    /// Show the inputs, parameters and outputs of an action
    Show {
        /// Action name, e.g. filter-reads
        name: String,
    },
}

/// # Errors
///
/// Returns an error if `show` names an unknown action.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ActionsArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let registry = ActionRegistry::new();
    match args.command {
        ActionsCommand::List => {
            list(&registry, format);
            Ok(())
        }
        ActionsCommand::Show { name } => {
            let Some(signature) = registry.get(&name) else {
                bail!("Unknown action '{name}'. Run `longread-qc actions list` to see the available actions.");
            };
            show(signature, format)
        }
    }
}

fn list(registry: &ActionRegistry, format: OutputFormat) {
    let signatures: Vec<_> = registry.signatures().collect();
    match format {
        OutputFormat::Text => {
            let width = signatures.iter().map(|s| s.name.len()).max().unwrap_or(0);
            println!("Available actions:");
            println!();
            for signature in &signatures {
                println!("  {:<width$}  {}", signature.name, signature.description);
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = signatures
                .iter()
                .map(|s| serde_json::json!({ "name": s.name, "description": s.description }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Tsv => {
            println!("name\tdescription");
            for signature in &signatures {
                println!("{}\t{}", signature.name, signature.description);
            }
        }
    }
}

fn default_label(default: ParamDefault) -> String {
    match default.value() {
        Some(value) => value.to_string(),
        None => "none".to_string(),
    }
}

fn show(signature: &ActionSignature, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let inputs: Vec<_> = signature
                .inputs
                .iter()
                .map(|i| {
                    serde_json::json!({
                        "name": i.name,
                        "types": i.types.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                        "required": i.required,
                        "description": i.description,
                    })
                })
                .collect();
            let parameters: Vec<_> = signature
                .parameters
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "kind": p.kind.to_string(),
                        "default": p.default.value(),
                        "description": p.description,
                    })
                })
                .collect();
            let outputs: Vec<_> = signature
                .outputs
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "name": o.name,
                        "type": o.output_type.to_string(),
                        "description": o.description,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "name": signature.name,
                "description": signature.description,
                "inputs": inputs,
                "parameters": parameters,
                "outputs": outputs,
                "exclusive_inputs": signature.exclusive_inputs,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("section\tname\ttype\tdefault\tdescription");
            for i in signature.inputs {
                let types: Vec<_> = i.types.iter().map(|t| t.as_str()).collect();
                let required = if i.required { "required" } else { "optional" };
                println!("input\t{}\t{}\t{}\t{}", i.name, types.join("|"), required, i.description);
            }
            for p in signature.parameters {
                println!(
                    "parameter\t{}\t{}\t{}\t{}",
                    p.name,
                    p.kind,
                    default_label(p.default),
                    p.description
                );
            }
            for o in signature.outputs {
                println!("output\t{}\t{}\t\t{}", o.name, o.output_type, o.description);
            }
        }
        OutputFormat::Text => {
            println!("{}: {}", signature.name, signature.description);
            println!();
            println!("Inputs:");
            for i in signature.inputs {
                let types: Vec<_> = i.types.iter().map(|t| t.as_str()).collect();
                let required = if i.required { "" } else { " (optional)" };
                println!("  --i-{}{}", i.name.replace('_', "-"), required);
                println!("      {} [{}]", i.description, types.join(" | "));
            }
            for (a, b) in signature.exclusive_inputs {
                println!("  Exactly one of {a} and {b} must be given.");
            }
            println!();
            println!("Parameters:");
            for p in signature.parameters {
                println!(
                    "  --p-{}  {}  [default: {}]",
                    p.name.replace('_', "-"),
                    p.kind,
                    default_label(p.default)
                );
                println!("      {}", p.description);
            }
            println!();
            println!("Outputs:");
            for o in signature.outputs {
                println!("  --o-{}  {}", o.name.replace('_', "-"), o.output_type);
                println!("      {}", o.description);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label() {
        assert_eq!(default_label(ParamDefault::None), "none");
        assert_eq!(default_label(ParamDefault::Float(0.51)), "0.51");
        assert_eq!(default_label(ParamDefault::Str("map-ont")), "map-ont");
        assert_eq!(default_label(ParamDefault::Bool(true)), "true");
    }
}
