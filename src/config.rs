//! Generator configuration
//!
//! Settings live in an optional `endpointgen.toml` next to the contract:
//!
//! ```toml
//! runtime_path = "::endpointgen::runtime"
//! default_serializer = "Json"
//! endpoints_suffix = "Endpoints"
//! format = true
//! ```
//!
//! Every key is optional; a missing file means defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up next to the contract
pub const CONFIG_FILE_NAME: &str = "endpointgen.toml";

/// Options controlling resolution and code generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Path under which generated code finds the dispatch runtime
    pub runtime_path: String,
    /// Serializer factory used when a body directive or method names none
    pub default_serializer: String,
    /// Appended to the service name to form the dispatch collection type
    pub endpoints_suffix: String,
    /// Run rustfmt on files written by the CLI
    pub format: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            runtime_path: "::endpointgen::runtime".to_string(),
            default_serializer: "Json".to_string(),
            endpoints_suffix: "Endpoints".to_string(),
            format: true,
        }
    }
}

/// Load configuration from a TOML file
///
/// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but fails
/// to parse.
pub fn load_generator_config(config_path: &Path) -> anyhow::Result<Option<GeneratorConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read generator config: {}", config_path.display()))?;

    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse generator config: {}", config_path.display()))?;

    Ok(Some(config))
}

/// Look for `endpointgen.toml` in the contract's directory.
pub fn auto_detect_config_path(contract_path: &Path) -> Option<PathBuf> {
    let config_path = contract_path.parent()?.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Resolve and load the configuration for a contract.
///
/// Priority:
/// 1. Explicitly provided path (must exist)
/// 2. Auto-detected alongside the contract
/// 3. Defaults
pub fn resolve_config(
    explicit_path: Option<&Path>,
    contract_path: &Path,
) -> anyhow::Result<GeneratorConfig> {
    if let Some(path) = explicit_path {
        return load_generator_config(path)?
            .with_context(|| format!("Generator config not found: {}", path.display()));
    }
    match auto_detect_config_path(contract_path) {
        Some(path) => Ok(load_generator_config(&path)?.unwrap_or_default()),
        None => Ok(GeneratorConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let loaded = load_generator_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "runtime_path = \"crate::rt\"\nformat = false\n").unwrap();
        let config = load_generator_config(&path).unwrap().unwrap();
        assert_eq!(config.runtime_path, "crate::rt");
        assert!(!config.format);
        assert_eq!(config.default_serializer, "Json");
        assert_eq!(config.endpoints_suffix, "Endpoints");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "runtime = \"x\"\n").unwrap();
        let err = load_generator_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse generator config"));
    }

    #[test]
    fn test_resolve_config_priority() {
        let dir = tempdir().unwrap();
        let contract = dir.path().join("svc.yaml");
        assert_eq!(
            resolve_config(None, &contract).unwrap(),
            GeneratorConfig::default()
        );

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "endpoints_suffix = \"Units\"\n")
            .unwrap();
        assert_eq!(
            resolve_config(None, &contract).unwrap().endpoints_suffix,
            "Units"
        );

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "default_serializer = \"Cbor\"\n").unwrap();
        let config = resolve_config(Some(&explicit), &contract).unwrap();
        assert_eq!(config.default_serializer, "Cbor");
        assert_eq!(config.endpoints_suffix, "Endpoints");

        assert!(resolve_config(Some(&dir.path().join("nope.toml")), &contract).is_err());
    }
}
