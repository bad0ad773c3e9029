use super::error::EndpointError;
use super::exchange::{Exchange, ExchangeResponse};
use super::Endpoint;
use http::StatusCode;
use tracing::{error, warn};

/// Run `endpoint` on `exchange`, answering request-time failures.
///
/// Decode failures become 400; serialization and completion failures
/// become 500. A failure after the response was written is only logged.
pub fn handle_exchange(endpoint: &dyn Endpoint, exchange: Exchange) {
    if let Err(err) = endpoint.handle(exchange.clone()) {
        warn!(
            request_id = %exchange.request_id(),
            service = endpoint.service_name(),
            endpoint = endpoint.name(),
            error = %err,
            "Endpoint failed"
        );
        respond_with_error(&exchange, &err);
    }
}

pub(crate) fn respond_with_error(exchange: &Exchange, err: &EndpointError) {
    let status = err.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(request_id = %exchange.request_id(), error = %err, "Request failed");
    }
    if exchange.is_complete() {
        return;
    }
    if let Err(write_err) = exchange.respond(ExchangeResponse::error(status, &err.to_string())) {
        warn!(
            request_id = %exchange.request_id(),
            error = %write_err,
            "Could not write error response"
        );
    }
}
