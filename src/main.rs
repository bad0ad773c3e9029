use clap::Parser;
use endpointgen::cli::{run, Cli};
use endpointgen::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    run(cli)
}
