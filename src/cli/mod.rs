//! # CLI Module
//!
//! Command-line front end for the contract compiler.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Compile a contract and write the dispatch module:
//!
//! ```bash
//! endpointgen generate --contract contract/example_service.yaml --output src/generated.rs
//! ```
//!
//! Options:
//! - `--contract <FILE>` - Path to the service contract (required)
//! - `--output <FILE>` - Output file (default: `<service_snake_case>.rs` next to the contract)
//! - `--config <FILE>` - Generator config (default: `endpointgen.toml` next to the contract)
//! - `--force` - Overwrite an existing file with different content
//! - `--dry-run` - Print the generated source instead of writing it
//! - `--no-format` - Skip rustfmt
//!
//! ### `check`
//!
//! Resolve a contract and print every diagnostic. Exits non-zero on failure.
//!
//! ```bash
//! endpointgen check --contract contract/example_service.yaml
//! ```
//!
//! ### `inspect`
//!
//! Print the resolved endpoints with their bindings and return classes:
//!
//! ```bash
//! endpointgen inspect --contract contract/example_service.yaml
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{inspect_table, run, run_cli, Cli, Commands};
