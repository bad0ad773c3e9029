//! Return type classification.

use super::EndpointScope;
use crate::contract::TypeRef;
use crate::definition::{join_snake_case, ReturnType, SerializerBinding};
use crate::introspect::{MarkerType, TypeIntrospector};
use crate::validator::{Diagnostic, DiagnosticKind, Diagnostics};

const PRIMITIVES: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// True for `()`, `void` and an absent return type.
#[must_use]
pub fn is_void(ty: &TypeRef) -> bool {
    ty.is_unit() || (ty.name == "void" && ty.args.is_empty())
}

#[must_use]
pub fn is_primitive(ty: &TypeRef) -> bool {
    ty.args.is_empty() && PRIMITIVES.contains(&ty.name.as_str())
}

/// Classify the declared return type of one endpoint.
///
/// `factory` is the serializer factory used for any serialized classification.
pub fn classify_return(
    scope: &EndpointScope<'_>,
    ty: &TypeRef,
    factory: &TypeRef,
    introspector: &dyn TypeIntrospector,
    diagnostics: &mut Diagnostics,
) -> Option<ReturnType> {
    let serializer = || SerializerBinding {
        field_name: join_snake_case(&[scope.endpoint, "response", "serializer"]),
        factory: factory.clone(),
    };

    if is_void(ty) {
        return Some(ReturnType::Void);
    }
    if is_primitive(ty) {
        return Some(ReturnType::Primitive {
            ty: ty.clone(),
            serializer: serializer(),
        });
    }
    if introspector.is_same_type(ty, MarkerType::Future) {
        let Some(inner) = ty.single_arg() else {
            report(scope, ty, "Future takes exactly one type argument", diagnostics);
            return None;
        };
        if is_void(inner) {
            return Some(ReturnType::AsyncValue {
                inner: TypeRef::unit(),
                serializer: None,
            });
        }
        if binary_shape(inner, introspector).is_some()
            || introspector.is_same_type(inner, MarkerType::Future)
        {
            report(
                scope,
                ty,
                "asynchronous results must resolve to a serializable value",
                diagnostics,
            );
            return None;
        }
        return Some(ReturnType::AsyncValue {
            inner: inner.clone(),
            serializer: Some(serializer()),
        });
    }
    if let Some(optional) = binary_shape(ty, introspector) {
        return Some(ReturnType::AlreadySerializedBinary {
            ty: ty.clone(),
            optional,
        });
    }
    Some(ReturnType::Value {
        ty: ty.clone(),
        serializer: serializer(),
    })
}

/// `Some(false)` for a binary body type, `Some(true)` for an `Option` of one.
fn binary_shape(ty: &TypeRef, introspector: &dyn TypeIntrospector) -> Option<bool> {
    if introspector.is_assignable(ty, MarkerType::BinaryResponseBody) {
        return Some(false);
    }
    if introspector.is_same_type(ty, MarkerType::Optional) {
        if let Some(inner) = ty.single_arg() {
            if introspector.is_assignable(inner, MarkerType::BinaryResponseBody) {
                return Some(true);
            }
        }
    }
    None
}

fn report(scope: &EndpointScope<'_>, ty: &TypeRef, message: &str, diagnostics: &mut Diagnostics) {
    diagnostics.report(
        Diagnostic::new(scope.location(), DiagnosticKind::InvalidType, message)
            .with_arg("returns", ty),
    );
}
