fn main() -> anyhow::Result<()> {
    endpointgen::Builder::new("contract/example_service.yaml").compile()?;
    Ok(())
}
