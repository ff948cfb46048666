use std::time::Duration;

use crate::canonical::CanonicalString;
use crate::config::VerifierConfig;
use crate::constants::{VALIDATE_PATH, VALID_TOKEN};
use crate::error::{ItnError, TransportError};

/// Replays a notification to the gateway's validation endpoint.
///
/// The gateway answers `VALID` only for notifications it actually sent. There
/// is no retry: a failed round-trip is reported as not confirmed.
#[derive(Debug, Clone)]
pub struct ConfirmationClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ConfirmationClient {
    /// Client for `https://{gateway_host}/eng/query/validate`.
    pub fn new(config: &VerifierConfig) -> Self {
        Self::with_endpoint(
            format!("https://{}{VALIDATE_PATH}", config.gateway_host),
            config.check_timeout,
        )
    }

    /// Client for an explicit validation URL.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Reuse an existing connection pool.
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post the canonical payload and require a 2xx `VALID` response.
    pub async fn confirm(&self, canonical: &CanonicalString) -> Result<(), ItnError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("content-type", "application/x-www-form-urlencoded")
            .timeout(self.timeout)
            .body(canonical.payload().to_owned())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()).into());
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        if body == VALID_TOKEN {
            Ok(())
        } else {
            Err(ItnError::ConfirmationFailed(describe_body(&body)))
        }
    }

    /// Like [`confirm`](Self::confirm) but logs the cause and returns a flag.
    pub async fn is_confirmed(&self, canonical: &CanonicalString) -> bool {
        match self.confirm(canonical).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "server confirmation failed");
                false
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                operation: "server confirmation",
                after: self.timeout,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

fn describe_body(body: &str) -> String {
    const MAX: usize = 32;
    if body.len() <= MAX {
        format!("gateway answered {body:?}")
    } else {
        format!("gateway answered {} bytes", body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_targets_validate_path_on_gateway_host() {
        let config = VerifierConfig::default().with_gateway_host("www.payfast.co.za");
        let client = ConfirmationClient::new(&config);
        assert_eq!(client.endpoint(), "https://www.payfast.co.za/eng/query/validate");
    }

    #[test]
    fn long_bodies_are_summarised() {
        assert_eq!(describe_body("INVALID"), "gateway answered \"INVALID\"");
        assert_eq!(describe_body(&"x".repeat(100)), "gateway answered 100 bytes");
    }
}
