//! Parameter decoders and the deserializers that pull path, query and header
//! values off an exchange.
//!
//! Header and query parameters may repeat on the wire, so their deserializers
//! always hand a decoder every value ([`CollectionParamDecoder`]). A
//! single-value [`ParamDecoder`] is lifted into that shape with
//! [`SingleParamDecoder`]. Path parameters use the same machinery with a
//! zero- or one-element slice.

use super::body::Deserializer;
use super::error::DecodeError;
use super::exchange::Exchange;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// Decodes one wire string.
pub trait ParamDecoder<T>: Send + Sync {
    fn decode(&self, value: &str) -> Result<T, DecodeError>;
}

/// Decodes every wire value of a repeatable parameter.
pub trait CollectionParamDecoder<T>: Send + Sync {
    fn decode(&self, values: &[&str]) -> Result<T, DecodeError>;
}

/// Default single-value decoder over [`FromStr`].
pub struct FromStrDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        FromStrDecoder {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FromStrDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParamDecoder<T> for FromStrDecoder<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn decode(&self, value: &str) -> Result<T, DecodeError> {
        value
            .parse::<T>()
            .map_err(|e| DecodeError::new("value", format!("'{value}': {e}")))
    }
}

/// Exactly one value is required.
pub struct SingleParamDecoder<T> {
    inner: Arc<dyn ParamDecoder<T>>,
}

impl<T> SingleParamDecoder<T> {
    pub fn new(inner: impl ParamDecoder<T> + 'static) -> Self {
        SingleParamDecoder {
            inner: Arc::new(inner),
        }
    }
}

impl<T> CollectionParamDecoder<T> for SingleParamDecoder<T> {
    fn decode(&self, values: &[&str]) -> Result<T, DecodeError> {
        match values {
            [value] => self.inner.decode(value),
            [] => Err(DecodeError::missing("value")),
            _ => Err(DecodeError::new(
                "value",
                format!("expected a single value, got {}", values.len()),
            )),
        }
    }
}

/// Zero or one value.
pub struct OptionalParamDecoder<T> {
    inner: Arc<dyn ParamDecoder<T>>,
}

impl<T> OptionalParamDecoder<T> {
    pub fn new(inner: impl ParamDecoder<T> + 'static) -> Self {
        OptionalParamDecoder {
            inner: Arc::new(inner),
        }
    }
}

impl<T> CollectionParamDecoder<Option<T>> for OptionalParamDecoder<T> {
    fn decode(&self, values: &[&str]) -> Result<Option<T>, DecodeError> {
        match values {
            [] => Ok(None),
            [value] => self.inner.decode(value).map(Some),
            _ => Err(DecodeError::new(
                "value",
                format!("expected at most one value, got {}", values.len()),
            )),
        }
    }
}

/// Every value, in wire order.
pub struct ListParamDecoder<T> {
    inner: Arc<dyn ParamDecoder<T>>,
}

impl<T> ListParamDecoder<T> {
    pub fn new(inner: impl ParamDecoder<T> + 'static) -> Self {
        ListParamDecoder {
            inner: Arc::new(inner),
        }
    }
}

impl<T> CollectionParamDecoder<Vec<T>> for ListParamDecoder<T> {
    fn decode(&self, values: &[&str]) -> Result<Vec<T>, DecodeError> {
        values.iter().map(|v| self.inner.decode(v)).collect()
    }
}

macro_rules! param_deserializer {
    ($(#[$doc:meta])* $name:ident, $label:literal, |$exchange:ident, $param:ident| $values:expr) => {
        $(#[$doc])*
        pub struct $name<T> {
            name: String,
            decoder: Arc<dyn CollectionParamDecoder<T>>,
        }

        impl<T: 'static> $name<T> {
            /// Decode with a collection decoder that sees every wire value
            pub fn new(
                name: impl Into<String>,
                decoder: impl CollectionParamDecoder<T> + 'static,
            ) -> Self {
                $name {
                    name: name.into(),
                    decoder: Arc::new(decoder),
                }
            }

            /// Decode with a single-value decoder; exactly one value is required
            pub fn single(name: impl Into<String>, decoder: impl ParamDecoder<T> + 'static) -> Self {
                Self::new(name, SingleParamDecoder::new(decoder))
            }

            #[must_use]
            pub fn name(&self) -> &str {
                &self.name
            }
        }

        impl<T> Deserializer<T> for $name<T> {
            fn deserialize(&self, $exchange: &Exchange) -> Result<T, DecodeError> {
                let $param = self.name.as_str();
                let values = $values;
                self.decoder
                    .decode(&values)
                    .map_err(|e| e.with_target(format!(concat!($label, " '{}'"), self.name)))
            }
        }
    };
}

param_deserializer!(
    /// Reads a path template variable
    PathParamDeserializer,
    "path parameter",
    |exchange, name| exchange.request().path_param(name).into_iter().collect::<Vec<_>>()
);

param_deserializer!(
    /// Reads every value of a query parameter
    QueryParamDeserializer,
    "query parameter",
    |exchange, name| exchange.request().query_values(name)
);

param_deserializer!(
    /// Reads every value of a header, matched case-insensitively
    HeaderParamDeserializer,
    "header",
    |exchange, name| exchange.request().header_values(name)
);

/// Credential from an `Authorization: Bearer <token>` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    token: String,
}

impl AuthHeader {
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthHeader {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keep tokens out of logs
impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader").field("token", &"<redacted>").finish()
    }
}

impl Display for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bearer {}", self.token)
    }
}

impl FromStr for AuthHeader {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, token) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| DecodeError::new("authorization", "expected '<scheme> <token>'"))?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(DecodeError::new(
                "authorization",
                format!("unsupported scheme '{scheme}'"),
            ));
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::new("authorization", "empty token"));
        }
        Ok(AuthHeader::bearer(token))
    }
}
