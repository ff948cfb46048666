use std::fmt;
use std::time::Duration;

use crate::constants::{DEFAULT_CHECK_TIMEOUT, DEFAULT_GATEWAY_HOST, TRUSTED_HOSTS};
use crate::network::normalize_host;

/// Immutable settings shared by every notification.
///
/// Built once at startup and handed to the components at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Merchant passphrase. `None` (or empty) disables the signature suffix.
    pub passphrase: Option<String>,
    /// Host the server confirmation is sent to, without scheme or path.
    pub gateway_host: String,
    /// Hostnames whose addresses may originate notifications.
    pub trusted_hosts: Vec<String>,
    /// Deadline for each DNS lookup and for the confirmation call.
    pub check_timeout: Duration,
}

impl Default for VerifierConfig {
    /// PayFast sandbox, no passphrase.
    fn default() -> Self {
        Self {
            passphrase: None,
            gateway_host: DEFAULT_GATEWAY_HOST.to_string(),
            trusted_hosts: TRUSTED_HOSTS.iter().map(|h| h.to_string()).collect(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }
}

impl VerifierConfig {
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        let passphrase = passphrase.into();
        self.passphrase = (!passphrase.is_empty()).then_some(passphrase);
        self
    }

    /// Set the confirmation host. Accepts a bare host or a full URL such as
    /// `https://sandbox.payfast.co.za/eng/process`; only the host is kept.
    pub fn with_gateway_host(mut self, host: &str) -> Self {
        self.gateway_host = normalize_host(host);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("gateway_host", &self.gateway_host)
            .field("trusted_hosts", &self.trusted_hosts)
            .field("check_timeout", &self.check_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_sandbox_and_payfast_hosts() {
        let config = VerifierConfig::default();
        assert_eq!(config.gateway_host, "sandbox.payfast.co.za");
        assert_eq!(config.trusted_hosts.len(), 4);
        assert!(config.passphrase().is_none());
    }

    #[test]
    fn gateway_url_is_reduced_to_host() {
        let config =
            VerifierConfig::default().with_gateway_host("https://sandbox.payfast.co.za/eng/process");
        assert_eq!(config.gateway_host, "sandbox.payfast.co.za");
    }

    #[test]
    fn empty_passphrase_is_none() {
        let config = VerifierConfig::default().with_passphrase("");
        assert!(config.passphrase.is_none());
    }

    #[test]
    fn debug_redacts_passphrase() {
        let config = VerifierConfig::default().with_passphrase("jt7NOE43FZPnf");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("jt7NOE43FZPnf"));
    }
}
