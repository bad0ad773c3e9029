use super::format::format_source;
use super::templates::render_service;
use crate::config::GeneratorConfig;
use crate::definition::{to_snake_case, ServiceDefinition};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to an output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// Content already matched; file left untouched
    Unchanged(PathBuf),
    /// File exists with other content and `force` was not set
    Skipped(PathBuf),
    /// Nothing written; the rendered source is returned
    DryRun(String),
}

/// Options for [`write_service_file`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Overwrite an existing file with different content
    pub force: bool,
    /// Render only
    pub dry_run: bool,
    /// Run rustfmt on the source before comparing and writing
    pub format: bool,
}

/// First line of every file the generator writes
pub const GENERATED_MARKER: &str = "// @generated by endpointgen";

/// Default output file name for a service, e.g. `example_service.rs`
#[must_use]
pub fn service_file_name(def: &ServiceDefinition) -> String {
    format!("{}.rs", to_snake_case(&def.name))
}

/// Render `def` and write it to `path`.
///
/// Writing is idempotent: when the (formatted) source matches the file on
/// disk the file is left untouched. A previously generated file is
/// regenerated in place; any other existing file is only replaced with
/// `force`. Formatting failures are logged, not fatal; the unformatted
/// source is valid Rust.
pub fn write_service_file(
    def: &ServiceDefinition,
    config: &GeneratorConfig,
    path: &Path,
    options: WriteOptions,
) -> anyhow::Result<WriteOutcome> {
    let rendered = render_service(def, config)
        .with_context(|| format!("Failed to render service {}", def.name))?;
    let source = if options.format {
        format_source(&rendered).unwrap_or_else(|err| {
            warn!(service = %def.name, error = %err, "Formatting generated code failed");
            rendered
        })
    } else {
        rendered
    };
    if options.dry_run {
        return Ok(WriteOutcome::DryRun(source));
    }

    if path.exists() {
        let existing = fs::read_to_string(path)
            .with_context(|| format!("Failed to read existing output: {}", path.display()))?;
        if existing == source {
            return Ok(WriteOutcome::Unchanged(path.to_path_buf()));
        }
        if !options.force && !existing.starts_with(GENERATED_MARKER) {
            return Ok(WriteOutcome::Skipped(path.to_path_buf()));
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for {}", path.display()))?;
    }
    fs::write(path, &source)
        .with_context(|| format!("Failed to write generated code: {}", path.display()))?;

    info!(
        service = %def.name,
        path = %path.display(),
        endpoints = def.endpoints.len(),
        "Generated dispatch code"
    );
    Ok(WriteOutcome::Written(path.to_path_buf()))
}
