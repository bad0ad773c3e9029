//! # Generator Module
//!
//! Turns a resolved [`ServiceDefinition`](crate::definition::ServiceDefinition)
//! into Rust source using Askama templates.
//!
//! ## Generated Structure
//!
//! One module per service containing:
//!
//! ```text
//! pub trait ExampleService            # one method per endpoint, implemented by the user
//! pub struct ExampleServiceEndpoints  # of(delegate) + runtime::Service
//! struct PingEndpoint                 # one dispatch unit per endpoint
//!   ├── pre-built serializers / decoders (constructed once)
//!   └── runtime::Endpoint::handle     # decode → invoke → write
//! ```
//!
//! ## Usage
//!
//! ### CLI Usage
//!
//! ```bash
//! endpointgen generate --contract contract/example_service.yaml --output src/generated.rs
//! ```
//!
//! ### Build Script Usage
//!
//! ```rust,ignore
//! endpointgen::Builder::new("contract/example_service.yaml").compile()?;
//! ```
//!
//! Rendering is deterministic, so regenerating from an unchanged contract
//! leaves the output byte-for-byte identical.

mod builder;
mod format;
mod templates;
mod write;


pub use builder::Builder;
pub use format::format_source;
pub use templates::{
    render_service, rust_type, service_template, EndpointView, EndpointsTemplateData, FieldView,
    ParamView,
};
pub use write::{
    service_file_name, write_service_file, WriteOptions, WriteOutcome, GENERATED_MARKER,
};
