//! Type introspection over contract metadata.
//!
//! The resolver only ever asks two questions about a type: is it one of the
//! well-known marker types, and is it assignable to one. [`TypeIntrospector`]
//! is that capability; [`ContractIntrospector`] answers it from the `types:`
//! section of a contract, where user types declare the markers they extend.

use crate::contract::{ServiceContract, TypeRef};
use std::collections::{HashMap, HashSet};

/// Marker types the resolver and classifier recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerType {
    /// Raw request body stream; binds without a directive
    RawStream,
    /// Credential header; binds to `Authorization` without a directive
    AuthHeader,
    /// Pre-serialized binary response written without a serializer
    BinaryResponseBody,
    /// Asynchronous result wrapper
    Future,
    /// Optional value wrapper
    Optional,
}

impl MarkerType {
    /// Name of the marker as written in contracts
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            MarkerType::RawStream => "RequestBody",
            MarkerType::AuthHeader => "AuthHeader",
            MarkerType::BinaryResponseBody => "BinaryResponseBody",
            MarkerType::Future => "Future",
            MarkerType::Optional => "Option",
        }
    }
}

/// Answers type questions for the resolver.
pub trait TypeIntrospector {
    /// True when `ty` is `marker`, ignoring generic arguments.
    fn is_same_type(&self, ty: &TypeRef, marker: MarkerType) -> bool;

    /// True when `ty` is `marker` or a declared subtype of it.
    fn is_assignable(&self, ty: &TypeRef, marker: MarkerType) -> bool;
}

/// [`TypeIntrospector`] backed by the user types declared in a contract.
#[derive(Debug, Clone, Default)]
pub struct ContractIntrospector {
    supertypes: HashMap<String, Vec<String>>,
}

impl ContractIntrospector {
    #[must_use]
    pub fn new(contract: &ServiceContract) -> Self {
        let supertypes = contract
            .types
            .iter()
            .map(|decl| (decl.name.clone(), decl.extends.clone()))
            .collect();
        ContractIntrospector { supertypes }
    }

    fn extends(&self, name: &str, marker: &str, visited: &mut HashSet<String>) -> bool {
        if !visited.insert(name.to_string()) {
            return false;
        }
        let Some(parents) = self.supertypes.get(name) else {
            return false;
        };
        parents.iter().any(|parent| {
            simple_name(parent) == marker || self.extends(parent, marker, visited)
        })
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

impl TypeIntrospector for ContractIntrospector {
    fn is_same_type(&self, ty: &TypeRef, marker: MarkerType) -> bool {
        ty.simple_name() == marker.type_name()
    }

    fn is_assignable(&self, ty: &TypeRef, marker: MarkerType) -> bool {
        if self.is_same_type(ty, marker) {
            return true;
        }
        let mut visited = HashSet::new();
        self.extends(&ty.name, marker.type_name(), &mut visited)
    }
}
