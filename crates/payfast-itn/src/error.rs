use std::time::Duration;

use thiserror::Error;

use crate::fields::RequiredField;

/// Errors raised while verifying an ITN.
///
/// Only [`ItnError::MissingFields`] stops processing. The check failures are
/// logged and recorded on the outcome; none of them changes the response sent
/// to the gateway.
#[derive(Debug, Error)]
pub enum ItnError {
    #[error("missing required order data: {}", join_params(.0))]
    MissingFields(Vec<RequiredField>),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("untrusted origin: {host}")]
    UntrustedOrigin { host: String },

    #[error("server confirmation failed: {0}")]
    ConfirmationFailed(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Network-level failures from DNS lookups or the confirmation call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("DNS resolution failed for {host}: {source}")]
    Dns {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

fn join_params(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.param())
        .collect::<Vec<_>>()
        .join(", ")
}
