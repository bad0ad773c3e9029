use super::ServiceContract;
use anyhow::Context;
use std::path::Path;
use tracing::debug;

/// Load a service contract from a YAML (`.yaml`/`.yml`) or JSON file.
pub fn load_contract(path: &Path) -> anyhow::Result<ServiceContract> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contract: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false);
    let contract = if is_yaml {
        parse_contract_yaml(&content)
    } else {
        parse_contract_json(&content)
    }
    .with_context(|| format!("Failed to parse contract: {}", path.display()))?;

    debug!(
        contract = %path.display(),
        service = %contract.service,
        methods = contract.methods.len(),
        "Contract loaded"
    );
    Ok(contract)
}

pub fn parse_contract_yaml(content: &str) -> anyhow::Result<ServiceContract> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn parse_contract_json(content: &str) -> anyhow::Result<ServiceContract> {
    Ok(serde_json::from_str(content)?)
}
