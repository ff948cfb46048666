use std::env;
use std::time::Duration;

use itn::constants::DEFAULT_GATEWAY_HOST;
use itn::VerifierConfig;

const DEFAULT_PORT: u16 = 4024;
const DEFAULT_RATE_LIMIT_RPM: u64 = 120;
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct ServerConfig {
    /// Passphrase, gateway host, trusted hosts and check deadline
    pub verifier: VerifierConfig,
    /// Server port
    pub port: u16,
    /// Rate limit requests per minute per IP
    pub rate_limit_rpm: u64,
    /// URLs notified when a notification fails verification
    pub alert_webhook_urls: Vec<String>,
    /// HMAC key for the `X-Webhook-Signature` header on alerts
    pub alert_webhook_secret: Option<Vec<u8>>,
    /// Bearer token required for /metrics
    pub metrics_token: Option<Vec<u8>>,
    /// Serve /metrics without a token
    pub public_metrics: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("verifier", &self.verifier)
            .field("port", &self.port)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("alert_webhook_urls", &self.alert_webhook_urls)
            .field(
                "alert_webhook_secret",
                &self.alert_webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_metrics", &self.public_metrics)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source (the environment in production).
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // Optional: merchant passphrase
        let passphrase = non_empty("PASSPHRASE");
        if passphrase.is_none() {
            tracing::warn!("PASSPHRASE not set — signatures are checked without a passphrase");
        }

        // Optional: gateway host (a full URL is reduced to its host)
        let pf_host = non_empty("PFHOST").unwrap_or_else(|| DEFAULT_GATEWAY_HOST.to_string());
        let gateway_host = itn::network::normalize_host(&pf_host);
        if gateway_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "PFHOST",
                value: pf_host,
            });
        }

        let port = parse_or("PORT", non_empty("PORT"), DEFAULT_PORT)?;
        let rate_limit_rpm =
            parse_or("RATE_LIMIT_RPM", non_empty("RATE_LIMIT_RPM"), DEFAULT_RATE_LIMIT_RPM)?;
        let check_timeout_secs = parse_or(
            "CHECK_TIMEOUT_SECS",
            non_empty("CHECK_TIMEOUT_SECS"),
            DEFAULT_CHECK_TIMEOUT_SECS,
        )?;
        if check_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHECK_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        // Optional: alert webhooks
        let alert_webhook_urls: Vec<String> = non_empty("ALERT_WEBHOOK_URLS")
            .map(|urls| {
                urls.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        crate::alert::validate_alert_urls(&alert_webhook_urls)?;

        let alert_webhook_secret = non_empty("ALERT_WEBHOOK_SECRET").map(String::into_bytes);
        if !alert_webhook_urls.is_empty() && alert_webhook_secret.is_none() {
            tracing::warn!("ALERT_WEBHOOK_SECRET not set — alerts will be sent unsigned");
        }

        // Optional: metrics token
        let metrics_token = non_empty("METRICS_TOKEN").map(String::into_bytes);
        let public_metrics = var("ITN_PUBLIC_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let mut verifier = VerifierConfig::default()
            .with_gateway_host(&gateway_host)
            .with_check_timeout(Duration::from_secs(check_timeout_secs));
        if let Some(passphrase) = passphrase {
            verifier = verifier.with_passphrase(passphrase);
        }

        Ok(Self {
            verifier,
            port,
            rate_limit_rpm,
            alert_webhook_urls,
            alert_webhook_secret,
            metrics_token,
            public_metrics,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: v }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 4024);
        assert_eq!(config.rate_limit_rpm, 120);
        assert_eq!(config.verifier.gateway_host, "sandbox.payfast.co.za");
        assert_eq!(config.verifier.check_timeout, Duration::from_secs(10));
        assert!(config.verifier.passphrase().is_none());
        assert!(config.alert_webhook_urls.is_empty());
        assert!(!config.public_metrics);
    }

    #[test]
    fn pfhost_url_is_reduced_to_host() {
        let config = config_from(&[
            ("PFHOST", "https://www.payfast.co.za/eng/process"),
            ("PASSPHRASE", "jt7NOE43FZPnf"),
        ])
        .unwrap();
        assert_eq!(config.verifier.gateway_host, "www.payfast.co.za");
        assert_eq!(config.verifier.passphrase(), Some("jt7NOE43FZPnf"));
    }

    #[test]
    fn alert_urls_are_split_and_trimmed() {
        let config = config_from(&[(
            "ALERT_WEBHOOK_URLS",
            "https://alerts.example.com/a, https://ops.example.com/b,",
        )])
        .unwrap();
        assert_eq!(
            config.alert_webhook_urls,
            vec!["https://alerts.example.com/a", "https://ops.example.com/b"]
        );
    }

    #[test]
    fn malformed_alert_url_is_rejected() {
        let err = config_from(&[("ALERT_WEBHOOK_URLS", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: \"eighty\"");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(config_from(&[("CHECK_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = config_from(&[
            ("PASSPHRASE", "pp-secret"),
            ("ALERT_WEBHOOK_SECRET", "alert-secret"),
            ("METRICS_TOKEN", "metrics-secret"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("pp-secret"));
        assert!(!debug.contains("alert-secret"));
        assert!(!debug.contains("metrics-secret"));
    }
}
