//! # Resolve Module
//!
//! Compiles a [`ServiceContract`] into a [`ServiceDefinition`].
//!
//! For every method the resolver binds each parameter ([`params`]), selects
//! decoders ([`decoder`]) and classifies the return type ([`returns`]).
//! Problems are collected in a [`Diagnostics`] sink; compilation only fails
//! after every method and parameter has been checked, so one run reports
//! everything that is wrong with a contract.
//!
//! Once the whole service resolves, generated field names are made unique
//! across the service (`name`, `name_1`, ...).

pub mod decoder;
pub mod params;
pub mod returns;

use crate::config::GeneratorConfig;
use crate::contract::{MethodDecl, ServiceContract, TypeRef};
use crate::definition::{
    rust_identifier, to_pascal_case, unique_name, ArgumentDefinition, EndpointDefinition, EndpointName,
    ParameterBinding, ServiceDefinition,
};
use crate::introspect::TypeIntrospector;
use crate::validator::{Diagnostic, DiagnosticKind, Diagnostics};
use http::Method;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

/// HTTP verbs a contract may bind
pub const SUPPORTED_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS",
];

/// Marker for a failure that has already been reported to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reported;

/// Where resolution currently is, for diagnostics and naming.
#[derive(Debug, Clone, Copy)]
pub struct EndpointScope<'a> {
    pub service: &'a str,
    pub endpoint: &'a str,
    pub path: &'a str,
    /// Variables named in the path template, in order
    pub path_vars: &'a [&'a str],
}

impl EndpointScope<'_> {
    /// `Service.endpoint`
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}.{}", self.service, self.endpoint)
    }

    /// `Service.endpoint(param)`
    #[must_use]
    pub fn param_location(&self, param: &str) -> String {
        format!("{}.{}({})", self.service, self.endpoint, param)
    }

    #[must_use]
    pub fn has_path_var(&self, name: &str) -> bool {
        self.path_vars.contains(&name)
    }
}

#[allow(clippy::expect_used)]
fn path_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}/]+)\}").expect("path variable regex is valid"))
}

/// Extract `{name}` variables from a path template, in order.
#[must_use]
pub fn path_variables(template: &str) -> Vec<&str> {
    path_var_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Compile a contract into a resolved service definition.
///
/// Returns every diagnostic found when the contract does not resolve.
pub fn compile_service(
    contract: &ServiceContract,
    introspector: &dyn TypeIntrospector,
    config: &GeneratorConfig,
) -> Result<ServiceDefinition, Vec<Diagnostic>> {
    let mut diagnostics = Diagnostics::new();
    let service = contract.service.as_str();

    if !is_type_name(service) {
        diagnostics.report(
            Diagnostic::new(service, DiagnosticKind::InvalidName, "invalid service name")
                .with_arg("service", service),
        );
    }
    let endpoints_type = contract
        .endpoints_type
        .clone()
        .unwrap_or_else(|| format!("{service}{}", config.endpoints_suffix));
    if !is_type_name(&endpoints_type) {
        diagnostics.report(
            Diagnostic::new(
                service,
                DiagnosticKind::InvalidName,
                "invalid endpoints type name",
            )
            .with_arg("endpoints_type", &endpoints_type),
        );
    }
    let default_serializer = parse_type(
        &config.default_serializer,
        service,
        "default_serializer",
        &mut diagnostics,
    );

    let mut seen_names = HashSet::new();
    // Dispatch unit structs share the module namespace with these
    let mut seen_types: HashSet<String> = [service.to_string(), endpoints_type.clone()].into();
    let mut endpoints = Vec::with_capacity(contract.methods.len());
    for method in &contract.methods {
        let location = format!("{service}.{}", method.name);
        if method.name.is_empty() || !seen_names.insert(rust_identifier(&method.name)) {
            diagnostics.report(
                Diagnostic::new(
                    location,
                    DiagnosticKind::InvalidName,
                    "endpoint names must be non-empty and unique",
                )
                .with_arg("endpoint", &method.name),
            );
            continue;
        }
        if !is_type_name(&to_pascal_case(&method.name)) {
            diagnostics.report(
                Diagnostic::new(
                    location,
                    DiagnosticKind::InvalidName,
                    "endpoint name must start with a letter",
                )
                .with_arg("endpoint", &method.name),
            );
            continue;
        }
        let unit = EndpointName::new(method.name.as_str()).unit_struct_name();
        if !seen_types.insert(unit.clone()) {
            diagnostics.report(
                Diagnostic::new(
                    location,
                    DiagnosticKind::InvalidName,
                    "dispatch unit name collides with another generated type",
                )
                .with_arg("endpoint", &method.name)
                .with_arg("type", &unit),
            );
            continue;
        }
        if let Some(endpoint) = compile_endpoint(
            service,
            method,
            default_serializer.as_ref(),
            introspector,
            &mut diagnostics,
        ) {
            endpoints.push(endpoint);
        }
    }

    if !diagnostics.is_empty() {
        info!(
            service = %service,
            issues = diagnostics.len(),
            "Contract failed to resolve"
        );
        return Err(diagnostics.into_vec());
    }

    assign_unique_field_names(&mut endpoints);

    debug!(
        service = %service,
        endpoints = endpoints.len(),
        "Service resolved"
    );
    Ok(ServiceDefinition {
        name: service.to_string(),
        service_trait: service.to_string(),
        endpoints_type,
        endpoints,
    })
}

fn compile_endpoint(
    service: &str,
    method: &MethodDecl,
    default_serializer: Option<&TypeRef>,
    introspector: &dyn TypeIntrospector,
    diagnostics: &mut Diagnostics,
) -> Option<EndpointDefinition> {
    let path_vars = path_variables(&method.path);
    let scope = EndpointScope {
        service,
        endpoint: &method.name,
        path: &method.path,
        path_vars: &path_vars,
    };
    let location = scope.location();
    let before = diagnostics.len();

    let http_method = parse_method(&method.method, &location, diagnostics);
    check_path(&scope, diagnostics);

    let produces = match &method.produces {
        Some(raw) => parse_type(raw, &location, "produces", diagnostics),
        None => default_serializer.cloned(),
    };

    let mut seen_params = HashSet::new();
    let mut arguments = Vec::with_capacity(method.params.len());
    for param in &method.params {
        let ident = argument_ident(&param.name);
        if param.name.is_empty() || !seen_params.insert(ident.clone()) {
            diagnostics.report(
                Diagnostic::new(
                    scope.param_location(&param.name),
                    DiagnosticKind::InvalidName,
                    "parameter names must be non-empty and unique",
                )
                .with_arg("parameter", &param.name),
            );
            continue;
        }
        let Some(ty) = parse_type(
            &param.ty,
            &scope.param_location(&param.name),
            "type",
            diagnostics,
        ) else {
            continue;
        };
        // Body directives without an explicit serializer use `produces`
        let Some(serializer) = produces.as_ref() else {
            continue;
        };
        if let Some(binding) =
            params::resolve_parameter(&scope, param, &ty, introspector, serializer, diagnostics)
        {
            arguments.push(ArgumentDefinition {
                name: param.name.clone(),
                ident,
                ty,
                binding,
            });
        }
    }

    let body_consumers: Vec<&str> = arguments
        .iter()
        .filter(|arg| {
            matches!(
                arg.binding,
                ParameterBinding::Body { .. } | ParameterBinding::RawBody
            )
        })
        .map(|arg| arg.name.as_str())
        .collect();
    if body_consumers.len() > 1 {
        diagnostics.report(
            Diagnostic::new(
                location.as_str(),
                DiagnosticKind::InvalidDirective,
                "only one parameter may consume the request body",
            )
            .with_arg("parameters", body_consumers.join(",")),
        );
    }
    let raw_return = method.returns.as_deref().unwrap_or("()");
    let declared_return = parse_type(raw_return, &location, "returns", diagnostics)?;
    let produces = produces?;
    let returns = returns::classify_return(
        &scope,
        &declared_return,
        &produces,
        introspector,
        diagnostics,
    )?;

    if diagnostics.len() > before {
        return None;
    }
    let http_method = http_method?;
    debug!(
        endpoint = %method.name,
        method = %http_method,
        path = %method.path,
        arguments = arguments.len(),
        returns = returns.kind(),
        "Endpoint resolved"
    );
    Some(EndpointDefinition {
        name: EndpointName::new(method.name.as_str()),
        method: http_method,
        path: method.path.clone(),
        arguments,
        declared_return,
        returns,
        docs: method.docs.clone(),
    })
}

/// Locals used by generated `handle` bodies
const RESERVED_LOCALS: &[&str] = &["exchange", "result", "future", "serializer", "value"];

fn argument_ident(name: &str) -> String {
    let ident = rust_identifier(name);
    if RESERVED_LOCALS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

fn parse_method(raw: &str, location: &str, diagnostics: &mut Diagnostics) -> Option<Method> {
    let upper = raw.to_ascii_uppercase();
    if SUPPORTED_METHODS.contains(&upper.as_str()) {
        if let Ok(method) = Method::from_bytes(upper.as_bytes()) {
            return Some(method);
        }
    }
    diagnostics.report(
        Diagnostic::new(location, DiagnosticKind::InvalidMethod, "unsupported HTTP method")
            .with_arg("method", raw),
    );
    None
}

fn check_path(scope: &EndpointScope<'_>, diagnostics: &mut Diagnostics) {
    if !scope.path.starts_with('/') {
        diagnostics.report(
            Diagnostic::new(
                scope.location(),
                DiagnosticKind::InvalidPath,
                "path template must start with '/'",
            )
            .with_arg("path", scope.path),
        );
    }
    let stripped = path_var_regex().replace_all(scope.path, "");
    if stripped.contains('{') || stripped.contains('}') {
        diagnostics.report(
            Diagnostic::new(
                scope.location(),
                DiagnosticKind::InvalidPath,
                "unbalanced braces in path template",
            )
            .with_arg("path", scope.path),
        );
    }
    let mut seen = HashSet::new();
    for var in scope.path_vars {
        if !seen.insert(*var) {
            diagnostics.report(
                Diagnostic::new(
                    scope.location(),
                    DiagnosticKind::InvalidPath,
                    "path variable appears more than once",
                )
                .with_arg("variable", var),
            );
        }
    }
}

fn parse_type(
    raw: &str,
    location: &str,
    field: &str,
    diagnostics: &mut Diagnostics,
) -> Option<TypeRef> {
    match TypeRef::parse(raw) {
        Ok(ty) => Some(ty),
        Err(err) => {
            diagnostics.report(
                Diagnostic::new(location, DiagnosticKind::InvalidType, err.to_string())
                    .with_arg("field", field),
            );
            None
        }
    }
}

fn is_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Make every generated field name unique across the service.
fn assign_unique_field_names(endpoints: &mut [EndpointDefinition]) {
    let mut seen = HashSet::new();
    for endpoint in endpoints {
        for arg in &mut endpoint.arguments {
            if let Some(field) = arg.binding.field_name().map(str::to_string) {
                let unique = unique_name(&mut seen, &field);
                if unique != field {
                    arg.binding.rename_field(&unique);
                }
            }
        }
        if let Some(serializer) = endpoint.returns.serializer_mut() {
            serializer.field_name = unique_name(&mut seen, &serializer.field_name);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::contract::parse_contract_yaml;
    use crate::definition::ReturnType;
    use crate::introspect::ContractIntrospector;

    fn compile(yaml: &str) -> Result<ServiceDefinition, Vec<Diagnostic>> {
        let contract = parse_contract_yaml(yaml).unwrap();
        compile_service(
            &contract,
            &ContractIntrospector::new(&contract),
            &GeneratorConfig::default(),
        )
    }

    #[test]
    fn test_path_variables() {
        assert_eq!(
            path_variables("/orgs/{orgId}/items/{itemId}"),
            vec!["orgId", "itemId"]
        );
        assert!(path_variables("/ping").is_empty());
    }

    #[test]
    fn test_compile_simple_service() {
        let def = compile(
            r#"
service: ExampleService
methods:
  - name: simple
    method: get
    path: /simple
  - name: ping
    method: GET
    path: /ping
    returns: String
"#,
        )
        .unwrap();
        assert_eq!(def.endpoints_type, "ExampleServiceEndpoints");
        assert_eq!(def.endpoints.len(), 2);
        assert_eq!(def.endpoints[0].method, Method::GET);
        assert_eq!(def.endpoints[0].returns, ReturnType::Void);
        assert_eq!(def.endpoints[1].returns.kind(), "value");
    }

    #[test]
    fn test_all_failures_are_collected() {
        let issues = compile(
            r#"
service: S
methods:
  - name: a
    method: FETCH
    path: nope
    params:
      - name: x
        type: i32
  - name: b
    method: GET
    path: /b
    params:
      - name: y
        type: i32
        directives: [{ kind: query, name: y }, { kind: header, name: y }]
"#,
        )
        .unwrap_err();
        let kinds: Vec<DiagnosticKind> = issues.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::InvalidMethod,
                DiagnosticKind::InvalidPath,
                DiagnosticKind::MissingDirective,
                DiagnosticKind::MultipleDirectives,
            ]
        );
    }

    #[test]
    fn test_duplicate_endpoint_names() {
        let issues = compile(
            r#"
service: S
methods:
  - { name: ping, method: GET, path: /a }
  - { name: ping, method: GET, path: /b }
"#,
        )
        .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidName);
    }

    #[test]
    fn test_template_variable_without_parameter_is_allowed() {
        let def = compile(
            r#"
service: S
methods:
  - { name: get, method: GET, path: "/tenants/{tenant}/items" }
"#,
        )
        .unwrap();
        assert_eq!(def.endpoints[0].path, "/tenants/{tenant}/items");
        assert!(def.endpoints[0].arguments.is_empty());
    }

    #[test]
    fn test_endpoint_name_must_form_a_type_name() {
        let issues = compile(
            r#"
service: S
methods:
  - { name: 2fa, method: GET, path: /a }
  - { name: _, method: GET, path: /b }
  - { name: ok, method: GET, path: /c }
"#,
        )
        .unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|d| d.kind == DiagnosticKind::InvalidName));
        assert_eq!(issues[0].location, "S.2fa");
        assert_eq!(issues[1].location, "S._");
    }

    #[test]
    fn test_unit_struct_collisions_are_rejected() {
        let issues = compile(
            r#"
service: PingEndpoint
methods:
  - { name: ping, method: GET, path: /ping }
"#,
        )
        .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidName);
        assert!(issues[0].to_string().contains("type=PingEndpoint"));

        let issues = compile(
            r#"
service: S
endpoints_type: ListEndpoint
methods:
  - { name: list, method: GET, path: /list }
"#,
        )
        .unwrap_err();
        assert_eq!(issues[0].location, "S.list");

        // `a1` and `a_1` are distinct methods but both become `A1Endpoint`
        let issues = compile(
            r#"
service: S
methods:
  - { name: a1, method: GET, path: /a }
  - { name: a_1, method: GET, path: /b }
"#,
        )
        .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "S.a_1");
        assert!(issues[0].to_string().contains("type=A1Endpoint"));
    }

    #[test]
    fn test_two_body_parameters() {
        let issues = compile(
            r#"
service: S
methods:
  - name: upload
    method: POST
    path: /upload
    params:
      - { name: raw, type: RequestBody }
      - { name: item, type: Item, directives: [{ kind: body }] }
"#,
        )
        .unwrap_err();
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidDirective);
    }

    #[test]
    fn test_field_names_are_unique_service_wide() {
        let def = compile(
            r#"
service: S
methods:
  - name: getItem
    method: GET
    path: "/items/{itemId}"
    returns: String
    params:
      - { name: itemId, type: i64, directives: [{ kind: path }] }
  - name: getItemItem
    method: GET
    path: /other
    returns: String
    params:
      - { name: id, type: i64, directives: [{ kind: query, name: id }] }
"#,
        )
        .unwrap();
        let mut fields = Vec::new();
        for endpoint in &def.endpoints {
            for arg in &endpoint.arguments {
                fields.extend(arg.field_name().map(str::to_string));
            }
            fields.extend(endpoint.returns.serializer().map(|s| s.field_name.clone()));
        }
        assert_eq!(
            fields,
            vec![
                "get_item_item_id_decoder",
                "get_item_response_serializer",
                "get_item_item_id_decoder_1",
                "get_item_item_response_serializer",
            ]
        );
        let unique: HashSet<&String> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let yaml = r#"
service: S
methods:
  - name: find
    method: GET
    path: "/items/{id}"
    returns: Vec<String>
    params:
      - { name: id, type: i64, directives: [{ kind: path }] }
      - { name: tags, type: Vec<String>, directives: [{ kind: query, name: tag }] }
"#;
        assert_eq!(compile(yaml).unwrap(), compile(yaml).unwrap());
    }

    #[test]
    fn test_produces_feeds_body_and_response() {
        let def = compile(
            r#"
service: S
methods:
  - name: post
    method: POST
    path: /post
    returns: String
    produces: crate::Cbor
    params:
      - { name: item, type: Item, directives: [{ kind: body }] }
"#,
        )
        .unwrap();
        let endpoint = &def.endpoints[0];
        assert_eq!(
            endpoint.returns.serializer().unwrap().factory,
            TypeRef::named("crate::Cbor")
        );
        match &endpoint.arguments[0].binding {
            ParameterBinding::Body { serializer, .. } => {
                assert_eq!(serializer, &TypeRef::named("crate::Cbor"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
