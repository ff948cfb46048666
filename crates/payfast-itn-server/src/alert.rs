use itn::{FailureHook, VerificationOutcome};
use serde::Serialize;

use crate::config::ConfigError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationAlert {
    pub event: String,
    pub order_reference: String,
    pub gateway_payment_id: String,
    pub payment_status: String,
    pub origin_host: String,
    pub failed_checks: Vec<String>,
    pub timestamp: u64,
}

impl VerificationAlert {
    /// Summary of a failed outcome. The canonical string is never included.
    pub fn from_outcome(outcome: &VerificationOutcome) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            event: "itn.verification_failed".to_string(),
            order_reference: outcome.fields.order_reference().to_string(),
            gateway_payment_id: outcome.fields.gateway_payment_id().to_string(),
            payment_status: outcome.fields.payment_status().to_string(),
            origin_host: outcome.origin_host.clone(),
            failed_checks: outcome
                .failed_checks()
                .map(|c| c.as_str().to_string())
                .collect(),
            timestamp,
        }
    }
}

/// Validate alert URLs at startup. Malformed URLs are rejected; plain HTTP is
/// allowed with a warning.
pub fn validate_alert_urls(urls: &[String]) -> Result<(), ConfigError> {
    for url in urls {
        let parsed = url::Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        match parsed.scheme() {
            "https" => {}
            "http" => tracing::warn!(
                url = %url,
                "alert URL does not use HTTPS — payloads will be sent in cleartext"
            ),
            _ => return Err(ConfigError::InvalidUrl(url.clone())),
        }
    }
    Ok(())
}

/// Fire-and-forget POST to each alert URL.
/// If `hmac_secret` is provided, includes an `X-Webhook-Signature` HMAC header.
pub fn fire_alerts(
    client: &reqwest::Client,
    urls: &[String],
    alert: VerificationAlert,
    hmac_secret: Option<&[u8]>,
) {
    let body_bytes = match serde_json::to_vec(&alert) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize alert payload");
            return;
        }
    };

    for url in urls {
        let client = client.clone();
        let url = url.clone();
        let body = body_bytes.clone();
        let hmac_sig = hmac_secret.map(|secret| itn::hmac::compute_hmac(secret, &body));

        tokio::spawn(async move {
            let mut req = client
                .post(&url)
                .header("content-type", "application/json")
                .timeout(std::time::Duration::from_secs(5));

            if let Some(ref sig) = hmac_sig {
                req = req.header("X-Webhook-Signature", sig.as_str());
            }

            match req.body(body).send().await {
                Ok(resp) => {
                    tracing::debug!(url = %url, status = %resp.status(), "alert delivered")
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "alert delivery failed"),
            }
        });
    }
}

/// Failure hook that logs the outcome and posts an alert to each configured URL.
pub struct AlertWebhookHook {
    client: reqwest::Client,
    urls: Vec<String>,
    hmac_secret: Option<Vec<u8>>,
}

impl AlertWebhookHook {
    pub fn new(client: reqwest::Client, urls: Vec<String>, hmac_secret: Option<Vec<u8>>) -> Self {
        Self {
            client,
            urls,
            hmac_secret,
        }
    }
}

impl FailureHook for AlertWebhookHook {
    fn on_failure(&self, outcome: &VerificationOutcome) {
        itn::LoggingHook.on_failure(outcome);
        if self.urls.is_empty() {
            return;
        }
        fire_alerts(
            &self.client,
            &self.urls,
            VerificationAlert::from_outcome(outcome),
            self.hmac_secret.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_and_http_urls_are_accepted() {
        let urls = vec![
            "https://alerts.example.com/itn".to_string(),
            "http://localhost:9000/itn".to_string(),
        ];
        assert!(validate_alert_urls(&urls).is_ok());
    }

    #[test]
    fn other_schemes_are_rejected() {
        let urls = vec!["ftp://alerts.example.com".to_string()];
        assert!(matches!(
            validate_alert_urls(&urls),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn alert_serializes_camel_case() {
        let alert = VerificationAlert {
            event: "itn.verification_failed".to_string(),
            order_reference: "1001".to_string(),
            gateway_payment_id: "pf123".to_string(),
            payment_status: "COMPLETE".to_string(),
            origin_host: "evil.example.com".to_string(),
            failed_checks: vec!["signature".to_string()],
            timestamp: 0,
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["orderReference"], "1001");
        assert_eq!(json["gatewayPaymentId"], "pf123");
        assert_eq!(json["failedChecks"][0], "signature");
    }
}
