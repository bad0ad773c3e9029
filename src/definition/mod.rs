//! # Definition Module
//!
//! The resolved intermediate representation handed from the resolver to the
//! generator. Everything here is built once per compile run and never mutated
//! afterwards; rendering back-ends only read it.
//!
//! ```text
//! ServiceDefinition
//! └── EndpointDefinition (one per method, declaration order)
//!     ├── ArgumentDefinition (declaration order == invocation order)
//!     │   └── ParameterBinding ─ Body | PathParam | QueryParam | Header | RawBody
//!     │                          └── ParameterDecoderType (explicit decoder only)
//!     └── ReturnType ─ Void | Primitive | Value | AsyncValue | AlreadySerializedBinary
//! ```

mod naming;

pub use naming::{join_snake_case, rust_identifier, to_pascal_case, to_snake_case};
pub(crate) use naming::unique_name;

use crate::contract::TypeRef;
use http::Method;
use std::fmt;

/// Endpoint name as declared in the contract, e.g. `pingAsync`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointName(String);

impl EndpointName {
    pub fn new(name: impl Into<String>) -> Self {
        EndpointName(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Delegate method name on the generated service trait
    #[must_use]
    pub fn method_ident(&self) -> String {
        rust_identifier(&self.0)
    }

    /// Name of the generated dispatch unit struct
    #[must_use]
    pub fn unit_struct_name(&self) -> String {
        format!("{}Endpoint", to_pascal_case(&self.0))
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully resolved service ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    /// Service name exposed by every dispatch unit
    pub name: String,
    /// Name of the generated service trait
    pub service_trait: String,
    /// Name of the generated dispatch collection type
    pub endpoints_type: String,
    pub endpoints: Vec<EndpointDefinition>,
}

/// One endpoint: HTTP binding, arguments and return classification.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    pub name: EndpointName,
    pub method: Method,
    /// Path template, e.g. `/items/{itemId}`
    pub path: String,
    pub arguments: Vec<ArgumentDefinition>,
    /// Return type exactly as declared
    pub declared_return: TypeRef,
    pub returns: ReturnType,
    pub docs: Option<String>,
}

/// One resolved method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    /// Name as declared in the contract
    pub name: String,
    /// Local/argument identifier used in generated code
    pub ident: String,
    pub ty: TypeRef,
    pub binding: ParameterBinding,
}

impl ArgumentDefinition {
    /// Field holding this argument's deserializer, if the binding needs one
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.binding.field_name()
    }
}

/// Where a parameter's value comes from on the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterBinding {
    /// Whole request body read through a deserializer factory
    Body {
        serializer: TypeRef,
        serializer_field: String,
    },
    /// Path template segment named after the parameter
    PathParam {
        decoder: Option<ParameterDecoderType>,
        field: String,
    },
    QueryParam {
        wire_name: String,
        decoder: Option<ParameterDecoderType>,
        field: String,
    },
    Header {
        wire_name: String,
        decoder: Option<ParameterDecoderType>,
        field: String,
    },
    /// Raw request body stream handed over undecoded
    RawBody,
}

impl ParameterBinding {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterBinding::Body { .. } => "body",
            ParameterBinding::PathParam { .. } => "path",
            ParameterBinding::QueryParam { .. } => "query",
            ParameterBinding::Header { .. } => "header",
            ParameterBinding::RawBody => "raw-body",
        }
    }

    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ParameterBinding::Body {
                serializer_field, ..
            } => Some(serializer_field),
            ParameterBinding::PathParam { field, .. }
            | ParameterBinding::QueryParam { field, .. }
            | ParameterBinding::Header { field, .. } => Some(field),
            ParameterBinding::RawBody => None,
        }
    }

    #[must_use]
    pub fn decoder(&self) -> Option<&ParameterDecoderType> {
        match self {
            ParameterBinding::PathParam { decoder, .. }
            | ParameterBinding::QueryParam { decoder, .. }
            | ParameterBinding::Header { decoder, .. } => decoder.as_ref(),
            ParameterBinding::Body { .. } | ParameterBinding::RawBody => None,
        }
    }

    /// Rename the generated field, keeping an explicit decoder's name in step.
    pub(crate) fn rename_field(&mut self, name: &str) {
        match self {
            ParameterBinding::Body {
                serializer_field, ..
            } => *serializer_field = name.to_string(),
            ParameterBinding::PathParam { decoder, field }
            | ParameterBinding::QueryParam { decoder, field, .. }
            | ParameterBinding::Header { decoder, field, .. } => {
                *field = name.to_string();
                if let Some(decoder) = decoder {
                    decoder.field_name = name.to_string();
                }
            }
            ParameterBinding::RawBody => {}
        }
    }
}

/// Decode strategy for wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    /// One wire string → value (`ParamDecoder::decode(&str)`)
    Param,
    /// Zero or more wire strings → value (`CollectionParamDecoder::decode(&[&str])`)
    List,
}

impl DecoderKind {
    /// The decode call shape emitted into generated code
    #[must_use]
    pub fn decode_method(self) -> &'static str {
        match self {
            DecoderKind::Param => "decode(&str)",
            DecoderKind::List => "decode(&[&str])",
        }
    }
}

/// An explicitly configured decoder for a path/query/header parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecoderType {
    pub kind: DecoderKind,
    /// User-supplied decoder type, instantiated through `Default`
    pub decoder_type: TypeRef,
    pub field_name: String,
    pub decode_method: &'static str,
}

/// Serializer constructed once per dispatch unit for the return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerBinding {
    pub field_name: String,
    /// Serializer factory type, instantiated through `Default`
    pub factory: TypeRef,
}

/// Classification of a method's declared return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// No value; dispatch answers 204
    Void,
    /// Rust primitive written through a serializer
    Primitive {
        ty: TypeRef,
        serializer: SerializerBinding,
    },
    /// Any other value written through a serializer
    Value {
        ty: TypeRef,
        serializer: SerializerBinding,
    },
    /// `Future<T>`: written on completion; `serializer` is `None` for `Future<()>`
    AsyncValue {
        inner: TypeRef,
        serializer: Option<SerializerBinding>,
    },
    /// Value that writes itself; `optional` for `Option<BinaryResponseBody>`
    AlreadySerializedBinary { ty: TypeRef, optional: bool },
}

impl ReturnType {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReturnType::Void => "void",
            ReturnType::Primitive { .. } => "primitive",
            ReturnType::Value { .. } => "value",
            ReturnType::AsyncValue { .. } => "async",
            ReturnType::AlreadySerializedBinary { .. } => "binary",
        }
    }

    #[must_use]
    pub fn serializer(&self) -> Option<&SerializerBinding> {
        match self {
            ReturnType::Primitive { serializer, .. } | ReturnType::Value { serializer, .. } => {
                Some(serializer)
            }
            ReturnType::AsyncValue { serializer, .. } => serializer.as_ref(),
            ReturnType::Void | ReturnType::AlreadySerializedBinary { .. } => None,
        }
    }

    pub(crate) fn serializer_mut(&mut self) -> Option<&mut SerializerBinding> {
        match self {
            ReturnType::Primitive { serializer, .. } | ReturnType::Value { serializer, .. } => {
                Some(serializer)
            }
            ReturnType::AsyncValue { serializer, .. } => serializer.as_mut(),
            ReturnType::Void | ReturnType::AlreadySerializedBinary { .. } => None,
        }
    }

    /// Type handed to the serializer, if any
    #[must_use]
    pub fn response_type(&self) -> Option<&TypeRef> {
        match self {
            ReturnType::Primitive { ty, .. } | ReturnType::Value { ty, .. } => Some(ty),
            ReturnType::AsyncValue {
                inner,
                serializer: Some(_),
            } => Some(inner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_name_derivations() {
        let name = EndpointName::new("pingAsync");
        assert_eq!(name.method_ident(), "ping_async");
        assert_eq!(name.unit_struct_name(), "PingAsyncEndpoint");
        assert_eq!(name.to_string(), "pingAsync");
    }

    #[test]
    fn test_rename_field_keeps_decoder_in_step() {
        let mut binding = ParameterBinding::QueryParam {
            wire_name: "limit".to_string(),
            decoder: Some(ParameterDecoderType {
                kind: DecoderKind::List,
                decoder_type: TypeRef::named("LimitDecoder"),
                field_name: "list_limit_decoder".to_string(),
                decode_method: DecoderKind::List.decode_method(),
            }),
            field: "list_limit_decoder".to_string(),
        };
        binding.rename_field("list_limit_decoder_1");
        assert_eq!(binding.field_name(), Some("list_limit_decoder_1"));
        assert_eq!(
            binding.decoder().map(|d| d.field_name.as_str()),
            Some("list_limit_decoder_1")
        );
    }
}
