//! # Runtime Module
//!
//! Everything generated dispatch code links against.
//!
//! The server and router that own sockets and match requests are not part of
//! this crate; they only need to build an [`Exchange`] for each request, pick
//! the matching [`Endpoint`] by method and template, and call
//! [`handle_exchange`]. Generated code uses the rest: the [`Runtime`] handle,
//! serializer and decoder contracts with their defaults ([`Json`],
//! [`FromStrDecoder`]), and asynchronous completion through
//! [`Runtime::register_async`].
//!
//! ```rust,no_run
//! use endpointgen::runtime::{handle_exchange, Exchange, ExchangeRequest, Method, Runtime, Service};
//!
//! fn dispatch(service: &dyn Service, request: ExchangeRequest) {
//!     let runtime = Runtime::new();
//!     let endpoints = service.endpoints(&runtime);
//!     let (exchange, pending) = Exchange::new(request);
//!     if let Some(endpoint) = endpoints.iter().find(|e| e.method() == Method::GET) {
//!         handle_exchange(endpoint.as_ref(), exchange);
//!     }
//!     let _response = pending.wait();
//! }
//! ```

mod body;
mod core;
mod decoders;
mod error;
mod exchange;
mod handler;

pub use self::body::*;
pub use self::core::*;
pub use self::decoders::*;
pub use self::error::*;
pub use self::exchange::*;
pub use self::handler::handle_exchange;
pub use http::{Method, StatusCode};

/// One generated dispatch unit: decode, invoke, write.
pub trait Endpoint: Send + Sync {
    fn method(&self) -> Method;

    /// Path template, e.g. `/items/{itemId}`
    fn template(&self) -> &'static str;

    fn service_name(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Handle one request.
    ///
    /// Returns once the response is written, or once an asynchronous result
    /// has been registered for completion.
    fn handle(&self, exchange: Exchange) -> Result<(), EndpointError>;
}

/// A collection of dispatch units, one per service method.
pub trait Service: Send + Sync {
    fn endpoints(&self, runtime: &Runtime) -> Vec<Box<dyn Endpoint>>;
}
