//! Request/response body handling: serializer contracts, the JSON default,
//! binary response bodies and the raw request stream.

use super::core::Runtime;
use super::error::{DecodeError, EndpointError, SerializationError};
use super::exchange::{Exchange, ExchangeResponse};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Cursor, Read};
use std::marker::PhantomData;
use std::sync::Arc;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Writes a response value onto an exchange.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T, exchange: &Exchange) -> Result<(), SerializationError>;
}

/// Reads a value from an exchange's request body.
pub trait Deserializer<T>: Send + Sync {
    fn deserialize(&self, exchange: &Exchange) -> Result<T, DecodeError>;
}

/// Builds serializers once per dispatch unit.
pub trait SerializerFactory {
    fn serializer<T>(&self, runtime: &Runtime) -> Arc<dyn Serializer<T>>
    where
        T: Serialize + 'static;
}

/// Builds body deserializers once per dispatch unit.
pub trait DeserializerFactory {
    fn deserializer<T>(&self, runtime: &Runtime) -> Arc<dyn Deserializer<T>>
    where
        T: DeserializeOwned + 'static;
}

/// JSON serializer factory; the default wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl SerializerFactory for Json {
    fn serializer<T>(&self, _runtime: &Runtime) -> Arc<dyn Serializer<T>>
    where
        T: Serialize + 'static,
    {
        Arc::new(JsonSerializer::<T>::default())
    }
}

impl DeserializerFactory for Json {
    fn deserializer<T>(&self, _runtime: &Runtime) -> Arc<dyn Deserializer<T>>
    where
        T: DeserializeOwned + 'static,
    {
        Arc::new(JsonDeserializer::<T>::default())
    }
}

/// Writes `200 application/json`.
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn(&T)>,
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        JsonSerializer {
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize> Serializer<T> for JsonSerializer<T> {
    fn serialize(&self, value: &T, exchange: &Exchange) -> Result<(), SerializationError> {
        let body = serde_json::to_vec(value).map_err(|e| SerializationError::new(e.to_string()))?;
        exchange
            .respond(
                ExchangeResponse::new(StatusCode::OK)
                    .with_header("content-type", APPLICATION_JSON)
                    .with_body(body),
            )
            .map_err(|e| SerializationError::new(e.to_string()))
    }
}

/// Reads a JSON request body.
pub struct JsonDeserializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for JsonDeserializer<T> {
    fn default() -> Self {
        JsonDeserializer {
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Deserializer<T> for JsonDeserializer<T> {
    fn deserialize(&self, exchange: &Exchange) -> Result<T, DecodeError> {
        let request = exchange.request();
        if let Some(content_type) = request.header("content-type") {
            if !content_type.to_ascii_lowercase().contains("json") {
                return Err(DecodeError::new(
                    "request body",
                    format!("unsupported content type '{content_type}'"),
                ));
            }
        }
        serde_json::from_slice(&request.body)
            .map_err(|e| DecodeError::new("request body", e.to_string()))
    }
}

/// A response body that writes itself, bypassing serializers.
pub trait BinaryResponseBody: Send {
    fn write_to(&mut self, out: &mut dyn io::Write) -> io::Result<()>;

    fn content_type(&self) -> &str {
        APPLICATION_OCTET_STREAM
    }
}

impl BinaryResponseBody for Vec<u8> {
    fn write_to(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(self)
    }
}

impl<B: BinaryResponseBody + ?Sized> BinaryResponseBody for Box<B> {
    fn write_to(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        (**self).write_to(out)
    }

    fn content_type(&self) -> &str {
        (**self).content_type()
    }
}

/// Write a binary body as `200` with its own content type.
pub fn write_binary<B: BinaryResponseBody>(
    mut body: B,
    exchange: &Exchange,
) -> Result<(), EndpointError> {
    let mut buf = Vec::new();
    body.write_to(&mut buf)
        .map_err(|e| SerializationError::new(e.to_string()))?;
    let content_type = body.content_type().to_string();
    exchange.respond(
        ExchangeResponse::new(StatusCode::OK)
            .with_header("content-type", content_type)
            .with_body(buf),
    )
}

/// Write an optional binary body; `None` answers 204.
pub fn write_optional_binary<B: BinaryResponseBody>(
    body: Option<B>,
    exchange: &Exchange,
) -> Result<(), EndpointError> {
    match body {
        Some(body) => write_binary(body, exchange),
        None => exchange.no_content(),
    }
}

/// The raw request body, handed to the delegate undecoded.
#[derive(Debug)]
pub struct RequestBody {
    content_type: Option<String>,
    inner: Cursor<Vec<u8>>,
}

impl RequestBody {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<String>) -> Self {
        RequestBody {
            content_type,
            inner: Cursor::new(bytes.into()),
        }
    }

    #[must_use]
    pub fn from_exchange(exchange: &Exchange) -> Self {
        let request = exchange.request();
        RequestBody::new(
            request.body.clone(),
            request.header("content-type").map(str::to_string),
        )
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Read for RequestBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
