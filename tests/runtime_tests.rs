#![allow(clippy::unwrap_used, clippy::expect_used)]

use endpointgen::runtime::{
    handle_exchange, AuthHeader, Deserializer, DeserializerFactory, Endpoint, EndpointError,
    Exchange, ExchangeRequest, FromStrDecoder, HeaderParamDeserializer, Json, ListParamDecoder,
    Method, OptionalParamDecoder, PathParamDeserializer, QueryParamDeserializer, RequestBody,
    Runtime, Serializer, SerializerFactory, StatusCode, ThreadAsyncRegistry,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Greeting {
    to: String,
    times: u32,
}

/// A dispatch unit written by hand in the shape the generator emits.
struct GreetEndpoint {
    calls: Arc<AtomicUsize>,
    name_decoder: Arc<dyn Deserializer<String>>,
    times_decoder: Arc<dyn Deserializer<Option<u32>>>,
    response_serializer: Arc<dyn Serializer<Greeting>>,
}

impl GreetEndpoint {
    fn new(runtime: &Runtime, calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            name_decoder: Arc::new(PathParamDeserializer::<String>::single(
                "name",
                FromStrDecoder::<String>::new(),
            )),
            times_decoder: Arc::new(QueryParamDeserializer::<Option<u32>>::new(
                "times",
                OptionalParamDecoder::new(FromStrDecoder::<u32>::new()),
            )),
            response_serializer: Json.serializer::<Greeting>(runtime),
        }
    }
}

impl Endpoint for GreetEndpoint {
    fn method(&self) -> Method {
        Method::GET
    }

    fn template(&self) -> &'static str {
        "/greet/{name}"
    }

    fn service_name(&self) -> &'static str {
        "GreetService"
    }

    fn name(&self) -> &'static str {
        "greet"
    }

    fn handle(&self, exchange: Exchange) -> Result<(), EndpointError> {
        let name: String = self.name_decoder.deserialize(&exchange)?;
        let times: Option<u32> = self.times_decoder.deserialize(&exchange)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = Greeting {
            to: name,
            times: times.unwrap_or(1),
        };
        self.response_serializer.serialize(&result, &exchange)?;
        Ok(())
    }
}

fn greet(request: ExchangeRequest) -> (endpointgen::runtime::ExchangeResponse, usize) {
    let calls = Arc::new(AtomicUsize::new(0));
    let runtime = Runtime::builder().async_registry(ThreadAsyncRegistry).build();
    let endpoint = GreetEndpoint::new(&runtime, Arc::clone(&calls));
    let (exchange, pending) = Exchange::new(request);
    handle_exchange(&endpoint, exchange);
    (pending.wait().unwrap(), calls.load(Ordering::SeqCst))
}

#[test]
fn test_decoded_request_is_serialized_as_json() {
    let request =
        ExchangeRequest::new(Method::GET, "/greet/ada?times=3").with_path_param("name", "ada");
    let (response, calls) = greet(request);
    assert_eq!(calls, 1);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: Greeting = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(
        body,
        Greeting {
            to: "ada".to_string(),
            times: 3
        }
    );
}

#[test]
fn test_optional_query_may_be_absent() {
    let request = ExchangeRequest::new(Method::GET, "/greet/bo").with_path_param("name", "bo");
    let (response, _) = greet(request);
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body_text().contains("\"times\":1"));
}

#[test]
fn test_decode_failure_skips_delegate() {
    let request =
        ExchangeRequest::new(Method::GET, "/greet/ada?times=lots").with_path_param("name", "ada");
    let (response, calls) = greet(request);
    assert_eq!(calls, 0);
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("query parameter 'times'"), "{message}");
}

#[test]
fn test_missing_path_param_is_bad_request() {
    let (response, calls) = greet(ExchangeRequest::new(Method::GET, "/greet/"));
    assert_eq!(calls, 0);
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body_text().contains("path parameter 'name'"));
}

#[test]
fn test_repeated_query_values_decode_in_order() {
    let request = ExchangeRequest::new(Method::GET, "/items?tag=a&tag=b+c&tag=d%2Fe");
    let (exchange, _pending) = Exchange::new(request);
    let tags = QueryParamDeserializer::<Vec<String>>::new(
        "tag",
        ListParamDecoder::new(FromStrDecoder::<String>::new()),
    );
    assert_eq!(
        tags.deserialize(&exchange).unwrap(),
        vec!["a".to_string(), "b c".to_string(), "d/e".to_string()]
    );
}

#[test]
fn test_auth_header_binds_case_insensitively() {
    let request =
        ExchangeRequest::new(Method::GET, "/secure").with_header("authorization", "Bearer s3cret");
    let (exchange, _pending) = Exchange::new(request);
    let auth = HeaderParamDeserializer::<AuthHeader>::single(
        "Authorization",
        FromStrDecoder::<AuthHeader>::new(),
    );
    let header = auth.deserialize(&exchange).unwrap();
    assert_eq!(header.token(), "s3cret");
    assert!(!format!("{header:?}").contains("s3cret"));
}

#[test]
fn test_json_body_round_trip_through_factories() {
    let runtime = Runtime::new();
    let deserializer = Json.deserializer::<Greeting>(&runtime);
    let request = ExchangeRequest::new(Method::POST, "/greet")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"to":"cy","times":2}"#);
    let (exchange, _pending) = Exchange::new(request);
    let greeting = deserializer.deserialize(&exchange).unwrap();
    assert_eq!(greeting.to, "cy");

    let request = ExchangeRequest::new(Method::POST, "/greet")
        .with_header("Content-Type", "text/plain")
        .with_body("hi");
    let (exchange, _pending) = Exchange::new(request);
    let err = deserializer.deserialize(&exchange).unwrap_err();
    assert_eq!(err.target, "request body");
}

#[test]
fn test_raw_body_is_handed_over_undecoded() {
    let request = ExchangeRequest::new(Method::PUT, "/upload")
        .with_header("content-type", "image/png")
        .with_body(vec![0x89, b'P', b'N', b'G']);
    let (exchange, _pending) = Exchange::new(request);
    let body = RequestBody::from_exchange(&exchange);
    assert_eq!(body.content_type(), Some("image/png"));
    assert_eq!(body.into_bytes(), vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_async_completion_happens_after_handle_returns() {
    let runtime = Runtime::builder().async_registry(ThreadAsyncRegistry).build();
    let serializer = Json.serializer::<String>(&runtime);
    let (release_tx, release_rx) = futures::channel::oneshot::channel::<()>();
    let (exchange, mut pending) = Exchange::new(ExchangeRequest::new(Method::GET, "/ping-async"));

    let future = async move {
        release_rx.await?;
        Ok::<_, anyhow::Error>("pong".to_string())
    }
    .boxed();
    runtime.register_async(future, exchange.clone(), move |value, exchange| {
        serializer.serialize(&value, exchange).map_err(Into::into)
    });

    assert!(!exchange.is_complete());
    assert!(pending.try_recv().is_none());

    release_tx.send(()).unwrap();
    let response = pending.wait().unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body_text(), "\"pong\"");
}

#[test]
fn test_second_response_is_rejected() {
    let (exchange, pending) = Exchange::new(ExchangeRequest::new(Method::GET, "/"));
    exchange.no_content().unwrap();
    assert!(matches!(
        exchange.no_content(),
        Err(EndpointError::AlreadyCompleted)
    ));
    assert_eq!(pending.wait().unwrap().status, StatusCode::NO_CONTENT);
}

#[test]
fn test_request_id_header_is_adopted() {
    let id = ulid::Ulid::new().to_string();
    let request = ExchangeRequest::new(Method::GET, "/").with_header("X-Request-Id", id.as_str());
    assert_eq!(request.request_id.to_string(), id);
}
