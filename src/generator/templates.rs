use askama::Template;

use crate::config::GeneratorConfig;
use crate::contract::TypeRef;
use crate::definition::{
    ArgumentDefinition, DecoderKind, EndpointDefinition, ParameterBinding, ReturnType,
    ServiceDefinition,
};

/// Marker and default types that live in the dispatch runtime.
const RUNTIME_TYPES: &[&str] = &["RequestBody", "AuthHeader", "Json"];

/// Template data for the generated dispatch module
#[derive(Template)]
#[template(path = "endpoints.rs.txt", escape = "none")]
pub struct EndpointsTemplateData {
    /// Generator version stamped into the header
    pub version: String,
    pub service: String,
    pub service_literal: String,
    pub service_trait: String,
    pub endpoints_type: String,
    /// Path to the dispatch runtime module
    pub rt: String,
    pub endpoints: Vec<EndpointView>,
}

/// One delegate method argument
#[derive(Debug, Clone)]
pub struct ParamView {
    pub ident: String,
    pub ty: String,
}

/// One pre-built field of a dispatch unit
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: String,
    pub ty: String,
    pub init: String,
}

/// Everything the template needs for one endpoint
#[derive(Debug, Clone)]
pub struct EndpointView {
    pub name_literal: String,
    pub struct_name: String,
    pub method_ident: String,
    pub http_method: String,
    pub template: String,
    pub template_literal: String,
    /// Doc lines, each starting with a space unless empty
    pub docs: Vec<String>,
    pub params: Vec<ParamView>,
    /// ` -> T`, or empty for unit
    pub returns: String,
    pub fields: Vec<FieldView>,
    /// Statements of `handle`, in order
    pub body: Vec<String>,
}

/// Render a type reference as Rust source, mapping runtime marker types.
#[must_use]
pub fn rust_type(ty: &TypeRef, rt: &str) -> String {
    if ty.is_unit() || (ty.name == "void" && ty.args.is_empty()) {
        return "()".to_string();
    }
    let args: Vec<String> = ty.args.iter().map(|arg| rust_type(arg, rt)).collect();
    let generic = |name: &str| {
        if args.is_empty() {
            name.to_string()
        } else {
            format!("{name}<{}>", args.join(", "))
        }
    };
    match ty.name.as_str() {
        "Future" => generic(&format!("{rt}::AsyncResult")),
        "BinaryResponseBody" => format!("::std::boxed::Box<dyn {rt}::BinaryResponseBody>"),
        name if RUNTIME_TYPES.contains(&name) => generic(&format!("{rt}::{name}")),
        name => generic(name),
    }
}

fn default_of(ty: &str) -> String {
    format!("<{ty} as ::std::default::Default>::default()")
}

fn build_argument(
    arg: &ArgumentDefinition,
    rt: &str,
    fields: &mut Vec<FieldView>,
    body: &mut Vec<String>,
) {
    let ty = rust_type(&arg.ty, rt);
    let ident = &arg.ident;
    let (deserializer, wire_name) = match &arg.binding {
        ParameterBinding::RawBody => {
            body.push(format!(
                "let {ident}: {ty} = ::std::convert::From::from({rt}::RequestBody::from_exchange(&exchange));"
            ));
            return;
        }
        ParameterBinding::Body {
            serializer,
            serializer_field,
        } => {
            let factory = rust_type(serializer, rt);
            fields.push(FieldView {
                name: serializer_field.clone(),
                ty: format!("::std::sync::Arc<dyn {rt}::Deserializer<{ty}>>"),
                init: format!(
                    "<{factory} as {rt}::DeserializerFactory>::deserializer::<{ty}>(&{}, runtime)",
                    default_of(&factory)
                ),
            });
            body.push(deserialize_line(ident, &ty, serializer_field, rt));
            return;
        }
        ParameterBinding::PathParam { .. } => ("PathParamDeserializer", arg.name.as_str()),
        ParameterBinding::QueryParam { wire_name, .. } => {
            ("QueryParamDeserializer", wire_name.as_str())
        }
        ParameterBinding::Header { wire_name, .. } => {
            ("HeaderParamDeserializer", wire_name.as_str())
        }
    };

    let Some(field) = arg.field_name() else {
        return;
    };
    let wire = format!("{wire_name:?}");
    let init = match arg.binding.decoder() {
        Some(decoder) => {
            let decoder_ty = rust_type(&decoder.decoder_type, rt);
            let constructor = match decoder.kind {
                DecoderKind::Param => "single",
                DecoderKind::List => "new",
            };
            format!(
                "::std::sync::Arc::new({rt}::{deserializer}::<{ty}>::{constructor}({wire}, {}))",
                default_of(&decoder_ty)
            )
        }
        None => default_decoding(&arg.ty, &ty, rt, deserializer, &wire),
    };
    fields.push(FieldView {
        name: field.to_string(),
        ty: format!("::std::sync::Arc<dyn {rt}::Deserializer<{ty}>>"),
        init,
    });
    body.push(deserialize_line(ident, &ty, field, rt));
}

/// `FromStr` based decoding chosen by the parameter's shape.
fn default_decoding(ty: &TypeRef, rendered: &str, rt: &str, deserializer: &str, wire: &str) -> String {
    let element = ty.single_arg().map(|inner| rust_type(inner, rt));
    match (ty.simple_name(), element) {
        ("Option", Some(inner)) => format!(
            "::std::sync::Arc::new({rt}::{deserializer}::<{rendered}>::new({wire}, {rt}::OptionalParamDecoder::new({rt}::FromStrDecoder::<{inner}>::new())))"
        ),
        ("Vec", Some(inner)) => format!(
            "::std::sync::Arc::new({rt}::{deserializer}::<{rendered}>::new({wire}, {rt}::ListParamDecoder::new({rt}::FromStrDecoder::<{inner}>::new())))"
        ),
        _ => format!(
            "::std::sync::Arc::new({rt}::{deserializer}::<{rendered}>::single({wire}, {rt}::FromStrDecoder::<{rendered}>::new()))"
        ),
    }
}

fn deserialize_line(ident: &str, ty: &str, field: &str, rt: &str) -> String {
    format!("let {ident}: {ty} = {rt}::Deserializer::deserialize(&*self.{field}, &exchange)?;")
}

fn build_endpoint(endpoint: &EndpointDefinition, rt: &str) -> EndpointView {
    let method_ident = endpoint.name.method_ident();
    let mut fields = Vec::new();
    let mut body = Vec::new();
    for arg in &endpoint.arguments {
        build_argument(arg, rt, &mut fields, &mut body);
    }

    let call_args: Vec<&str> = endpoint.arguments.iter().map(|a| a.ident.as_str()).collect();
    let call = format!("self.delegate.{method_ident}({})", call_args.join(", "));

    if let Some(serializer) = endpoint.returns.serializer() {
        if let Some(response_ty) = endpoint.returns.response_type() {
            let ty = rust_type(response_ty, rt);
            let factory = rust_type(&serializer.factory, rt);
            fields.push(FieldView {
                name: serializer.field_name.clone(),
                ty: format!("::std::sync::Arc<dyn {rt}::Serializer<{ty}>>"),
                init: format!(
                    "<{factory} as {rt}::SerializerFactory>::serializer::<{ty}>(&{}, runtime)",
                    default_of(&factory)
                ),
            });
        }
    }

    match &endpoint.returns {
        ReturnType::Void => {
            body.push(format!("{call};"));
            body.push("exchange.no_content()".to_string());
        }
        ReturnType::Primitive { serializer, .. } | ReturnType::Value { serializer, .. } => {
            body.push(format!("let result = {call};"));
            body.push(format!(
                "{rt}::Serializer::serialize(&*self.{}, &result, &exchange)?;",
                serializer.field_name
            ));
            body.push("Ok(())".to_string());
        }
        ReturnType::AsyncValue {
            serializer: Some(serializer),
            ..
        } => {
            body.push(format!("let future = {call};"));
            body.push(format!(
                "let serializer = ::std::sync::Arc::clone(&self.{});",
                serializer.field_name
            ));
            body.push(
                "self.runtime.register_async(future, exchange, move |value, exchange| {".to_string(),
            );
            body.push(format!(
                "    {rt}::Serializer::serialize(&*serializer, &value, exchange).map_err(::std::convert::Into::into)"
            ));
            body.push("});".to_string());
            body.push("Ok(())".to_string());
        }
        ReturnType::AsyncValue {
            serializer: None, ..
        } => {
            body.push(format!("let future = {call};"));
            body.push(
                "self.runtime.register_async(future, exchange, |(), exchange| exchange.no_content());"
                    .to_string(),
            );
            body.push("Ok(())".to_string());
        }
        ReturnType::AlreadySerializedBinary { optional, .. } => {
            body.push(format!("let result = {call};"));
            let writer = if *optional {
                "write_optional_binary"
            } else {
                "write_binary"
            };
            body.push(format!("{rt}::{writer}(result, &exchange)"));
        }
    }

    let mut docs: Vec<String> = endpoint
        .docs
        .as_deref()
        .map(|d| {
            d.trim_end()
                .lines()
                .map(|line| {
                    if line.trim().is_empty() {
                        String::new()
                    } else {
                        format!(" {}", line.trim_end())
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    if !docs.is_empty() {
        docs.push(String::new());
    }
    docs.push(format!(" `{} {}`", endpoint.method, endpoint.path));

    let returns = if matches!(endpoint.returns, ReturnType::Void) {
        String::new()
    } else {
        format!(" -> {}", rust_type(&endpoint.declared_return, rt))
    };

    EndpointView {
        name_literal: format!("{:?}", endpoint.name.as_str()),
        struct_name: endpoint.name.unit_struct_name(),
        method_ident,
        http_method: endpoint.method.as_str().to_string(),
        template: endpoint.path.clone(),
        template_literal: format!("{:?}", endpoint.path),
        docs,
        params: endpoint
            .arguments
            .iter()
            .map(|a| ParamView {
                ident: a.ident.clone(),
                ty: rust_type(&a.ty, rt),
            })
            .collect(),
        returns,
        fields,
        body,
    }
}

/// Build template data for a resolved service.
#[must_use]
pub fn service_template(def: &ServiceDefinition, config: &GeneratorConfig) -> EndpointsTemplateData {
    let rt = config.runtime_path.trim_end_matches("::").to_string();
    EndpointsTemplateData {
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: def.name.clone(),
        service_literal: format!("{:?}", def.name),
        service_trait: def.service_trait.clone(),
        endpoints_type: def.endpoints_type.clone(),
        endpoints: def
            .endpoints
            .iter()
            .map(|e| build_endpoint(e, &rt))
            .collect(),
        rt,
    }
}

/// Render the dispatch module for a resolved service.
///
/// Rendering is deterministic: the same definition always yields the same
/// source text.
pub fn render_service(def: &ServiceDefinition, config: &GeneratorConfig) -> anyhow::Result<String> {
    let mut rendered = service_template(def, config).render()?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}
