use super::templates::render_service;
use super::write::service_file_name;
use crate::config::{resolve_config, GeneratorConfig};
use crate::contract::load_contract;
use crate::introspect::ContractIntrospector;
use crate::resolve::compile_service;
use crate::validator::format_issues;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Compile a contract from a `build.rs` script.
///
/// ```rust,no_run
/// // build.rs
/// fn main() -> anyhow::Result<()> {
///     endpointgen::Builder::new("contract/example_service.yaml").compile()?;
///     Ok(())
/// }
/// ```
///
/// The generated file lands in `$OUT_DIR` as `<service_snake_case>.rs` and is
/// pulled in with `include!(concat!(env!("OUT_DIR"), "/example_service.rs"))`.
#[derive(Debug, Clone)]
pub struct Builder {
    contract: PathBuf,
    config_path: Option<PathBuf>,
    config: Option<GeneratorConfig>,
    out_dir: Option<PathBuf>,
    emit_rerun: bool,
}

impl Builder {
    pub fn new(contract: impl AsRef<Path>) -> Self {
        Builder {
            contract: contract.as_ref().to_path_buf(),
            config_path: None,
            config: None,
            out_dir: None,
            emit_rerun: true,
        }
    }

    /// Load configuration from this file instead of auto-detecting it
    #[must_use]
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use this configuration and skip loading one
    #[must_use]
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Write here instead of `$OUT_DIR`
    #[must_use]
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Print `cargo:rerun-if-changed` lines (default on)
    #[must_use]
    pub fn emit_rerun_if_changed(mut self, emit: bool) -> Self {
        self.emit_rerun = emit;
        self
    }

    /// Compile the contract and write the dispatch module. Returns its path.
    pub fn compile(self) -> anyhow::Result<PathBuf> {
        let out_dir = match self.out_dir {
            Some(dir) => dir,
            None => std::env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .context("OUT_DIR is not set; call out_dir() outside build scripts")?,
        };
        if self.emit_rerun {
            println!("cargo:rerun-if-changed={}", self.contract.display());
        }

        let config = match self.config {
            Some(config) => config,
            None => {
                if self.emit_rerun {
                    let watched = self
                        .config_path
                        .clone()
                        .or_else(|| {
                            self.contract
                                .parent()
                                .map(|p| p.join(crate::config::CONFIG_FILE_NAME))
                        });
                    if let Some(path) = watched {
                        println!("cargo:rerun-if-changed={}", path.display());
                    }
                }
                resolve_config(self.config_path.as_deref(), &self.contract)?
            }
        };

        let contract = load_contract(&self.contract)?;
        let introspector = ContractIntrospector::new(&contract);
        let def = compile_service(&contract, &introspector, &config)
            .map_err(|issues| anyhow::anyhow!(format_issues(&issues)))
            .with_context(|| format!("Failed to compile contract: {}", self.contract.display()))?;

        let rendered = render_service(&def, &config)?;
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        let path = out_dir.join(service_file_name(&def));
        std::fs::write(&path, rendered)
            .with_context(|| format!("Failed to write generated code: {}", path.display()))?;
        Ok(path)
    }
}
