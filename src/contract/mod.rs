//! # Contract Module
//!
//! Declarative service contracts: the input to the compiler.
//!
//! A contract names a service, lists the user types the resolver needs to know
//! about (so it can tell whether `CustomBinary` is a `BinaryResponseBody`), and
//! declares every method with its HTTP verb, path template, return type and the
//! binding directives attached to each parameter.
//!
//! ```yaml
//! service: ExampleService
//! types:
//!   - name: CustomBinary
//!     extends: [BinaryResponseBody]
//! methods:
//!   - name: getItem
//!     method: GET
//!     path: /items/{itemId}
//!     returns: String
//!     params:
//!       - name: itemId
//!         type: i64
//!         directives: [{ kind: path }]
//! ```
//!
//! Contracts are loaded from YAML or JSON with [`load_contract`]. Type
//! expressions stay as strings here; they are parsed into [`TypeRef`] during
//! resolution so that malformed types surface as diagnostics instead of load
//! failures.

mod load;
mod types;

pub use load::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// A whole service contract, as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceContract {
    /// Service name; also the name of the generated service trait
    pub service: String,
    /// Override for the generated dispatch-collection type name
    #[serde(default)]
    pub endpoints_type: Option<String>,
    /// User types referenced by methods that extend marker types
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Service methods, in declaration order
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// A user type and the marker types it is assignable to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
}

/// One service method and its HTTP binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    /// Endpoint name, unique within the service
    pub name: String,
    /// HTTP verb (`GET`, `POST`, ...)
    pub method: String,
    /// Path template, e.g. `/items/{itemId}`
    pub path: String,
    /// Declared return type; absent means `()`
    #[serde(default)]
    pub returns: Option<String>,
    /// Serializer factory for the return value
    #[serde(default)]
    pub produces: Option<String>,
    /// Free-form documentation copied onto the generated trait method
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
}

/// One method parameter with the directives attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// A binding directive attached to a parameter.
///
/// Several directives may be written on one parameter; the resolver rejects
/// that case with a diagnostic rather than the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Request body decoded by a deserializer factory
    Body {
        #[serde(default)]
        serializer: Option<String>,
    },
    /// Request header (may repeat)
    Header {
        name: String,
        #[serde(default)]
        decoder: Option<String>,
    },
    /// Path template segment
    Path {
        #[serde(default)]
        decoder: Option<String>,
        #[serde(default, alias = "list_encoder")]
        list_decoder: Option<String>,
    },
    /// Query string parameter (may repeat)
    Query {
        name: String,
        #[serde(default)]
        decoder: Option<String>,
    },
}

impl Directive {
    /// Directive kind as written in the contract
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Body { .. } => "body",
            Directive::Header { .. } => "header",
            Directive::Path { .. } => "path",
            Directive::Query { .. } => "query",
        }
    }
}
