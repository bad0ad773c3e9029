//! # endpointgen
//!
//! **endpointgen** compiles a declarative HTTP service contract into typed Rust
//! dispatch code, and ships the small runtime that code runs on.
//!
//! ## Overview
//!
//! A contract lists a service's methods, each with an HTTP verb, a path
//! template, a return type and a binding directive per parameter (`body`,
//! `path`, `query`, `header`). The compiler resolves every parameter to its
//! request source, picks a decoder, classifies the return type and emits one
//! *dispatch unit* per method: a struct that decodes the exchange, invokes the
//! user's implementation and writes the response.
//!
//! ## Architecture
//!
//! - **[`contract`]** - Contract model and YAML/JSON loading
//! - **[`introspect`]** - Marker-type questions (`is_same_type`, `is_assignable`)
//! - **[`resolve`]** - Parameter binding resolution, decoder selection, return classification
//! - **[`definition`]** - The resolved, immutable endpoint model
//! - **[`validator`]** - Diagnostics collected across the whole contract
//! - **[`generator`]** - Askama rendering, file writing, `build.rs` [`Builder`]
//! - **[`runtime`]** - `Endpoint`, `Exchange`, serializers, decoders, async registration
//! - **[`config`]** - `endpointgen.toml` generator settings
//! - **[`logging`]** - `tracing` subscriber setup for binaries
//! - **[`cli`]** - The `endpointgen` command
//!
//! ### Code Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(endpointgen)
//!     participant Load as contract::load_contract
//!     participant Resolve as resolve::compile_service
//!     participant Templates as generator::templates
//!     participant FS as File System
//!
//!     User->>CLI: endpointgen generate --contract svc.yaml
//!     CLI->>Load: load_contract("svc.yaml")
//!     Load-->>CLI: ServiceContract
//!     CLI->>Resolve: compile_service(&contract, &introspector, &config)
//!     Resolve->>Resolve: resolve_parameter per param<br/>classify_return per method
//!     Resolve-->>CLI: ServiceDefinition or Vec<Diagnostic>
//!     CLI->>Templates: render_service(&def, &config)
//!     Templates-->>CLI: Rust source
//!     CLI->>FS: write <service>.rs, rustfmt
//! ```
//!
//! ### Request Handling Flow
//!
//! ```text
//! Exchange ──▶ Endpoint::handle
//!                ├── decode arguments (pre-built deserializers)
//!                ├── delegate.method(args...)
//!                └── write: 204 | serializer | binary | register_async
//! ```
//!
//! A decode failure never reaches the delegate; [`runtime::handle_exchange`]
//! turns it into a 400 response.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! // build.rs
//! fn main() -> anyhow::Result<()> {
//!     endpointgen::Builder::new("contract/example_service.yaml").compile()?;
//!     Ok(())
//! }
//!
//! // src/lib.rs
//! include!(concat!(env!("OUT_DIR"), "/example_service.rs"));
//! ```
//!
//! See `demos/example_service` for a complete service.

pub mod cli;
pub mod config;
pub mod contract;
pub mod definition;
pub mod generator;
pub mod introspect;
pub mod logging;
pub mod resolve;
pub mod runtime;
pub mod validator;

pub use config::GeneratorConfig;
pub use contract::{load_contract, ServiceContract, TypeRef};
pub use definition::{EndpointDefinition, ParameterBinding, ReturnType, ServiceDefinition};
pub use generator::Builder;
pub use resolve::compile_service;
pub use validator::{Diagnostic, DiagnosticKind};
