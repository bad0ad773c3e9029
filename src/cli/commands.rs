use crate::config::{resolve_config, GeneratorConfig};
use crate::contract::load_contract;
use crate::definition::{ParameterBinding, ServiceDefinition};
use crate::generator::{service_file_name, write_service_file, WriteOptions, WriteOutcome};
use crate::introspect::ContractIntrospector;
use crate::resolve::compile_service;
use crate::validator::{format_issues, Diagnostic};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line interface for endpointgen
#[derive(Parser)]
#[command(name = "endpointgen")]
#[command(about = "Compile service contracts into Rust dispatch code", long_about = None)]
pub struct Cli {
    /// Log level override (trace/debug/info/warn/error)
    #[arg(long, global = true, env = "ENDPOINTGEN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the dispatch module for a contract
    Generate {
        /// Path to the service contract (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,

        /// Output file (default: <service_snake_case>.rs next to the contract)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to endpointgen.toml
        /// If not provided, will auto-detect alongside the contract
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file with different content
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Print the generated source instead of writing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Skip rustfmt even when the config enables it
        #[arg(long, default_value_t = false)]
        no_format: bool,
    },
    /// Validate a contract and print every diagnostic
    Check {
        #[arg(short, long)]
        contract: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print resolved endpoints, bindings and return classes
    Inspect {
        #[arg(short, long)]
        contract: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Parse arguments from the process and execute the command
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

/// Execute an already parsed command line
///
/// # Errors
///
/// Returns an error if the contract or config cannot be loaded, the contract
/// fails validation, or the output cannot be written.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            contract,
            output,
            config,
            force,
            dry_run,
            no_format,
        } => {
            let (config, def) = compile(&contract, config.as_deref())?;
            let def = def.map_err(|issues| anyhow::anyhow!(format_issues(&issues)))?;
            let path = output.unwrap_or_else(|| default_output(&contract, &def));
            let options = WriteOptions {
                force,
                dry_run,
                format: config.format && !no_format,
            };
            match write_service_file(&def, &config, &path, options)? {
                WriteOutcome::Written(path) => {
                    println!(
                        "✅ Generated {} endpoint(s) for {} → {}",
                        def.endpoints.len(),
                        def.name,
                        path.display()
                    );
                }
                WriteOutcome::Unchanged(path) => {
                    println!("✅ {} is up to date", path.display());
                }
                WriteOutcome::Skipped(path) => {
                    println!(
                        "⚠️  {} exists and was not generated (use --force to overwrite)",
                        path.display()
                    );
                }
                WriteOutcome::DryRun(source) => print!("{source}"),
            }
            Ok(())
        }
        Commands::Check { contract, config } => {
            let (_, def) = compile(&contract, config.as_deref())?;
            match def {
                Ok(def) => {
                    println!(
                        "✅ {} resolved: {} endpoint(s)",
                        def.name,
                        def.endpoints.len()
                    );
                    Ok(())
                }
                Err(issues) => {
                    print!("{}", format_issues(&issues));
                    anyhow::bail!("❌ {} issue(s) in {}", issues.len(), contract.display())
                }
            }
        }
        Commands::Inspect { contract, config } => {
            let (_, def) = compile(&contract, config.as_deref())?;
            let def = def.map_err(|issues| anyhow::anyhow!(format_issues(&issues)))?;
            print!("{}", inspect_table(&def));
            Ok(())
        }
    }
}

type Compiled = (GeneratorConfig, Result<ServiceDefinition, Vec<Diagnostic>>);

fn compile(contract_path: &Path, config_path: Option<&Path>) -> anyhow::Result<Compiled> {
    let config = resolve_config(config_path, contract_path)?;
    let contract = load_contract(contract_path)
        .with_context(|| format!("Failed to load contract: {}", contract_path.display()))?;
    debug!(
        contract = %contract_path.display(),
        methods = contract.methods.len(),
        "Loaded contract"
    );
    let introspector = ContractIntrospector::new(&contract);
    let def = compile_service(&contract, &introspector, &config);
    Ok((config, def))
}

fn default_output(contract: &Path, def: &ServiceDefinition) -> PathBuf {
    contract
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(service_file_name(def))
}

/// Render the resolved endpoint table printed by `inspect`
#[must_use]
pub fn inspect_table(def: &ServiceDefinition) -> String {
    let mut out = format!(
        "{} → {} ({} endpoint(s))\n",
        def.service_trait,
        def.endpoints_type,
        def.endpoints.len()
    );
    for endpoint in &def.endpoints {
        out.push_str(&format!(
            "  {:<7} {:<32} {} → {} {}\n",
            endpoint.method.as_str(),
            endpoint.path,
            endpoint.name,
            endpoint.returns.kind(),
            endpoint.declared_return
        ));
        if let Some(serializer) = endpoint.returns.serializer() {
            out.push_str(&format!(
                "      response  {} [{}]\n",
                serializer.factory, serializer.field_name
            ));
        }
        for arg in &endpoint.arguments {
            let source = match &arg.binding {
                ParameterBinding::QueryParam { wire_name, .. }
                | ParameterBinding::Header { wire_name, .. } => {
                    format!("{} '{wire_name}'", arg.binding.kind())
                }
                ParameterBinding::Body { serializer, .. } => format!("body via {serializer}"),
                other => other.kind().to_string(),
            };
            out.push_str(&format!("      {}: {}  {source}", arg.name, arg.ty));
            if let Some(decoder) = arg.binding.decoder() {
                out.push_str(&format!("  decoder={}", decoder.decoder_type));
            }
            if let Some(field) = arg.binding.field_name() {
                out.push_str(&format!(" [{field}]"));
            }
            out.push('\n');
        }
    }
    out
}
