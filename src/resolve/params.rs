//! Parameter binding resolution.
//!
//! Maps one contract parameter and its directives onto a [`ParameterBinding`].
//! Only two types bind without a directive: anything assignable to the raw
//! request stream, and the credential header type itself.

use super::decoder::{path_decoder, select_decoder};
use super::{EndpointScope, Reported};
use crate::contract::{Directive, ParamDecl, TypeRef};
use crate::definition::{join_snake_case, DecoderKind, ParameterBinding};
use crate::introspect::{MarkerType, TypeIntrospector};
use crate::validator::{Diagnostic, DiagnosticKind, Diagnostics};
use http::HeaderName;

/// Wire name used for the implicit credential header binding
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Resolve the binding for one parameter, reporting failures to `diagnostics`.
///
/// Returns `None` when the parameter could not be bound; the failure has
/// already been reported.
pub fn resolve_parameter(
    scope: &EndpointScope<'_>,
    param: &ParamDecl,
    ty: &TypeRef,
    introspector: &dyn TypeIntrospector,
    default_serializer: &TypeRef,
    diagnostics: &mut Diagnostics,
) -> Option<ParameterBinding> {
    let location = scope.param_location(&param.name);
    match param.directives.as_slice() {
        [] => {
            if introspector.is_assignable(ty, MarkerType::RawStream) {
                return Some(ParameterBinding::RawBody);
            }
            if introspector.is_same_type(ty, MarkerType::AuthHeader) {
                return Some(ParameterBinding::Header {
                    wire_name: AUTHORIZATION_HEADER.to_string(),
                    decoder: None,
                    field: decoder_field(scope, param),
                });
            }
            diagnostics.report(
                Diagnostic::new(
                    location,
                    DiagnosticKind::MissingDirective,
                    "at least one binding directive required",
                )
                .with_arg("parameter", &param.name)
                .with_arg("type", ty),
            );
            None
        }
        [directive] => {
            resolve_directive(scope, param, directive, default_serializer, diagnostics).ok()
        }
        many => {
            let kinds: Vec<&str> = many.iter().map(Directive::kind).collect();
            diagnostics.report(
                Diagnostic::new(
                    location,
                    DiagnosticKind::MultipleDirectives,
                    "only one directive permitted per parameter",
                )
                .with_arg("parameter", &param.name)
                .with_arg("directives", kinds.join(",")),
            );
            None
        }
    }
}

fn resolve_directive(
    scope: &EndpointScope<'_>,
    param: &ParamDecl,
    directive: &Directive,
    default_serializer: &TypeRef,
    diagnostics: &mut Diagnostics,
) -> Result<ParameterBinding, Reported> {
    let location = scope.param_location(&param.name);
    match directive {
        Directive::Body { serializer } => {
            let serializer =
                explicit_type(serializer.as_deref(), &location, "serializer", diagnostics)?
                    .unwrap_or_else(|| default_serializer.clone());
            Ok(ParameterBinding::Body {
                serializer,
                serializer_field: join_snake_case(&[scope.endpoint, "serializer"]),
            })
        }
        Directive::Header { name, decoder } => {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                diagnostics.report(
                    Diagnostic::new(location, DiagnosticKind::InvalidDirective, "invalid header name")
                        .with_arg("name", name),
                );
                return Err(Reported);
            }
            let field = decoder_field(scope, param);
            let decoder = explicit_type(decoder.as_deref(), &location, "decoder", diagnostics)?;
            Ok(ParameterBinding::Header {
                wire_name: name.clone(),
                decoder: select_decoder(decoder, DecoderKind::List, &field),
                field,
            })
        }
        Directive::Path {
            decoder,
            list_decoder,
        } => {
            let Ok(explicit) = path_decoder(decoder.as_deref(), list_decoder.as_deref()) else {
                diagnostics.report(
                    Diagnostic::new(
                        location,
                        DiagnosticKind::ConflictingPathDecoders,
                        "only one of decoder and listEncoder may be set",
                    )
                    .with_arg("parameter", &param.name),
                );
                return Err(Reported);
            };
            if !scope.has_path_var(&param.name) {
                diagnostics.report(
                    Diagnostic::new(
                        location,
                        DiagnosticKind::InvalidDirective,
                        "path parameter not found in path template",
                    )
                    .with_arg("template", scope.path),
                );
                return Err(Reported);
            }
            let field = decoder_field(scope, param);
            let decoder = match explicit {
                Some((raw, kind)) => {
                    let field_label = match kind {
                        DecoderKind::Param => "decoder",
                        DecoderKind::List => "list_decoder",
                    };
                    let ty = explicit_type(Some(raw), &location, field_label, diagnostics)?;
                    select_decoder(ty, kind, &field)
                }
                None => None,
            };
            Ok(ParameterBinding::PathParam { decoder, field })
        }
        Directive::Query { name, decoder } => {
            if name.trim().is_empty() {
                diagnostics.report(Diagnostic::new(
                    location,
                    DiagnosticKind::InvalidDirective,
                    "query parameter name must not be empty",
                ));
                return Err(Reported);
            }
            let field = decoder_field(scope, param);
            let decoder = explicit_type(decoder.as_deref(), &location, "decoder", diagnostics)?;
            Ok(ParameterBinding::QueryParam {
                wire_name: name.clone(),
                decoder: select_decoder(decoder, DecoderKind::List, &field),
                field,
            })
        }
    }
}

fn decoder_field(scope: &EndpointScope<'_>, param: &ParamDecl) -> String {
    join_snake_case(&[scope.endpoint, &param.name, "decoder"])
}

/// Parse an optional type reference written in a directive field.
fn explicit_type(
    raw: Option<&str>,
    location: &str,
    field: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Option<TypeRef>, Reported> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match TypeRef::parse(raw) {
        Ok(ty) => Ok(Some(ty)),
        Err(err) => {
            diagnostics.report(
                Diagnostic::new(location, DiagnosticKind::InvalidType, err.to_string())
                    .with_arg("field", field),
            );
            Err(Reported)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::introspect::ContractIntrospector;

    const PATH_VARS: &[&str] = &["itemId"];

    fn scope() -> EndpointScope<'static> {
        EndpointScope {
            service: "ExampleService",
            endpoint: "getItem",
            path: "/items/{itemId}",
            path_vars: PATH_VARS,
        }
    }

    fn param(name: &str, ty: &str, directives: Vec<Directive>) -> ParamDecl {
        ParamDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            directives,
        }
    }

    fn resolve(p: &ParamDecl) -> (Option<ParameterBinding>, Vec<Diagnostic>) {
        let mut diagnostics = Diagnostics::new();
        let ty = TypeRef::parse(&p.ty).unwrap();
        let binding = resolve_parameter(
            &scope(),
            p,
            &ty,
            &ContractIntrospector::default(),
            &TypeRef::named("Json"),
            &mut diagnostics,
        );
        (binding, diagnostics.into_vec())
    }

    #[test]
    fn test_missing_directive_names_parameter() {
        let (binding, issues) = resolve(&param("limit", "i32", vec![]));
        assert!(binding.is_none());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DiagnosticKind::MissingDirective);
        assert_eq!(issues[0].location, "ExampleService.getItem(limit)");
        assert!(issues[0].to_string().contains("parameter=limit"));
    }

    #[test]
    fn test_implicit_bindings() {
        let (binding, issues) = resolve(&param("body", "RequestBody", vec![]));
        assert!(issues.is_empty());
        assert_eq!(binding, Some(ParameterBinding::RawBody));

        let (binding, _) = resolve(&param("auth", "AuthHeader", vec![]));
        assert_eq!(
            binding,
            Some(ParameterBinding::Header {
                wire_name: "Authorization".to_string(),
                decoder: None,
                field: "get_item_auth_decoder".to_string(),
            })
        );
    }

    #[test]
    fn test_auth_header_subtype_is_not_implicit() {
        let contract = crate::contract::parse_contract_yaml(
            "service: S\ntypes:\n  - name: MyAuth\n    extends: [AuthHeader]\n",
        )
        .unwrap();
        let introspector = ContractIntrospector::new(&contract);
        let mut diagnostics = Diagnostics::new();
        let binding = resolve_parameter(
            &scope(),
            &param("auth", "MyAuth", vec![]),
            &TypeRef::named("MyAuth"),
            &introspector,
            &TypeRef::named("Json"),
            &mut diagnostics,
        );
        assert!(binding.is_none());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_every_directive_pair_is_rejected() {
        let all = [
            Directive::Body { serializer: None },
            Directive::Header {
                name: "X-Id".to_string(),
                decoder: None,
            },
            Directive::Path {
                decoder: None,
                list_decoder: None,
            },
            Directive::Query {
                name: "id".to_string(),
                decoder: None,
            },
        ];
        for first in &all {
            for second in &all {
                let p = param("itemId", "String", vec![first.clone(), second.clone()]);
                let (binding, issues) = resolve(&p);
                assert!(binding.is_none(), "{} + {}", first.kind(), second.kind());
                assert_eq!(issues[0].kind, DiagnosticKind::MultipleDirectives);
                assert_eq!(issues[0].message, "only one directive permitted per parameter");
            }
        }
    }

    #[test]
    fn test_path_decoder_conflict() {
        let p = param(
            "itemId",
            "i64",
            vec![Directive::Path {
                decoder: Some("IdDecoder".to_string()),
                list_decoder: Some("IdsDecoder".to_string()),
            }],
        );
        let (binding, issues) = resolve(&p);
        assert!(binding.is_none());
        assert_eq!(issues[0].kind, DiagnosticKind::ConflictingPathDecoders);
        assert_eq!(
            issues[0].message,
            "only one of decoder and listEncoder may be set"
        );
    }

    #[test]
    fn test_path_list_decoder() {
        let p = param(
            "itemId",
            "Vec<i64>",
            vec![Directive::Path {
                decoder: None,
                list_decoder: Some("IdsDecoder".to_string()),
            }],
        );
        let (binding, issues) = resolve(&p);
        assert!(issues.is_empty());
        let binding = binding.unwrap();
        let decoder = binding.decoder().unwrap();
        assert_eq!(decoder.kind, DecoderKind::List);
        assert_eq!(decoder.decoder_type, TypeRef::named("IdsDecoder"));
        assert_eq!(decoder.field_name, "get_item_item_id_decoder");
    }

    #[test]
    fn test_path_param_must_appear_in_template() {
        let p = param(
            "other",
            "i64",
            vec![Directive::Path {
                decoder: None,
                list_decoder: None,
            }],
        );
        let (_, issues) = resolve(&p);
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidDirective);
    }

    #[test]
    fn test_query_and_header_use_list_strategy() {
        let q = param(
            "tags",
            "Vec<String>",
            vec![Directive::Query {
                name: "tag".to_string(),
                decoder: Some("TagDecoder".to_string()),
            }],
        );
        let (binding, _) = resolve(&q);
        match binding.unwrap() {
            ParameterBinding::QueryParam {
                wire_name, decoder, ..
            } => {
                assert_eq!(wire_name, "tag");
                assert_eq!(decoder.unwrap().kind, DecoderKind::List);
            }
            other => panic!("unexpected binding {other:?}"),
        }

        let h = param(
            "trace",
            "String",
            vec![Directive::Header {
                name: "X-Trace-Id".to_string(),
                decoder: None,
            }],
        );
        let (binding, _) = resolve(&h);
        match binding.unwrap() {
            ParameterBinding::Header {
                wire_name, decoder, ..
            } => {
                assert_eq!(wire_name, "X-Trace-Id");
                assert!(decoder.is_none());
            }
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn test_invalid_header_name() {
        let h = param(
            "trace",
            "String",
            vec![Directive::Header {
                name: "bad header".to_string(),
                decoder: None,
            }],
        );
        let (binding, issues) = resolve(&h);
        assert!(binding.is_none());
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidDirective);
    }

    #[test]
    fn test_body_serializer_defaults_and_override() {
        let (binding, _) = resolve(&param(
            "payload",
            "Item",
            vec![Directive::Body { serializer: None }],
        ));
        assert_eq!(
            binding,
            Some(ParameterBinding::Body {
                serializer: TypeRef::named("Json"),
                serializer_field: "get_item_serializer".to_string(),
            })
        );

        let (binding, _) = resolve(&param(
            "payload",
            "Item",
            vec![Directive::Body {
                serializer: Some("crate::codec::Cbor".to_string()),
            }],
        ));
        match binding.unwrap() {
            ParameterBinding::Body { serializer, .. } => {
                assert_eq!(serializer.simple_name(), "Cbor");
            }
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_decoder_type() {
        let (binding, issues) = resolve(&param(
            "limit",
            "i32",
            vec![Directive::Query {
                name: "limit".to_string(),
                decoder: Some("Bad<".to_string()),
            }],
        ));
        assert!(binding.is_none());
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidType);
    }
}
