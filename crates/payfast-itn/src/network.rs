//! Source-network validation.
//!
//! The claimed origin host of a notification must resolve to one of the
//! addresses PayFast's own hostnames currently resolve to. The trusted set is
//! rebuilt on every call so DNS changes on the gateway side are picked up
//! immediately.
//!
//! This validates where the request says it came from, not who sent it. The
//! `Host` header is client-controlled, so this check is only meaningful
//! together with the signature and server confirmation.

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt};

use crate::config::VerifierConfig;
use crate::error::{ItnError, TransportError};

/// Resolves a hostname to its addresses, in resolver order.
pub trait HostResolver: Send + Sync {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>>;
}

/// Resolver backed by the operating system (`getaddrinfo` via tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        async move {
            let addrs = tokio::net::lookup_host((host, 0)).await?;
            Ok(addrs.map(|addr| addr.ip()).collect())
        }
        .boxed()
    }
}

/// Fixed hostname table. Unknown hosts fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, addrs: &[IpAddr]) -> Self {
        self.entries.insert(host.to_string(), addrs.to_vec());
        self
    }
}

impl HostResolver for StaticResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        let result = self.entries.get(host).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such host: {host}"))
        });
        futures::future::ready(result).boxed()
    }
}

/// Addresses currently published for the trusted gateway hostnames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedHostSet(HashSet<IpAddr>);

impl TrustedHostSet {
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<IpAddr> for TrustedHostSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Checks that a notification's origin host resolves into the trusted set.
#[derive(Clone)]
pub struct SourceNetworkValidator {
    resolver: Arc<dyn HostResolver>,
    trusted_hosts: Vec<String>,
    timeout: Duration,
}

impl SourceNetworkValidator {
    pub fn new(config: &VerifierConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    pub fn with_resolver(config: &VerifierConfig, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            resolver,
            trusted_hosts: config.trusted_hosts.clone(),
            timeout: config.check_timeout,
        }
    }

    /// Resolve every trusted hostname and merge the results.
    /// A hostname that fails to resolve is skipped.
    pub async fn trusted_set(&self) -> TrustedHostSet {
        let lookups = self.trusted_hosts.iter().map(|host| async move {
            match self.resolve(host).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    tracing::debug!(host = %host, error = %e, "skipping trusted host");
                    Vec::new()
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Check `claimed_host` (a `Host` header value, optionally with scheme,
    /// port or path). Only the first resolved address is tested.
    pub async fn verify(&self, claimed_host: &str) -> Result<(), ItnError> {
        let host = normalize_host(claimed_host);
        if host.is_empty() {
            return Err(ItnError::UntrustedOrigin { host });
        }

        let (trusted, origin) = tokio::join!(self.trusted_set(), self.resolve(&host));
        let first = origin?.into_iter().next();

        match first {
            Some(ip) if trusted.contains(&ip) => Ok(()),
            Some(ip) => {
                tracing::debug!(host = %host, ip = %ip, trusted = trusted.len(), "origin not in trusted set");
                Err(ItnError::UntrustedOrigin { host })
            }
            None => Err(ItnError::UntrustedOrigin { host }),
        }
    }

    pub async fn is_trusted(&self, claimed_host: &str) -> bool {
        self.verify(claimed_host).await.is_ok()
    }

    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, TransportError> {
        match tokio::time::timeout(self.timeout, self.resolver.lookup(host)).await {
            Ok(Ok(addrs)) => Ok(addrs),
            Ok(Err(source)) => Err(TransportError::Dns {
                host: host.to_string(),
                source,
            }),
            Err(_) => Err(TransportError::Timeout {
                operation: "dns lookup",
                after: self.timeout,
            }),
        }
    }
}

/// Reduce a `Host` header or URL to a bare hostname: drops an `http://` or
/// `https://` prefix, anything from the first `/`, and a trailing `:port`.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let authority = without_scheme.split('/').next().unwrap_or_default();

    // [v6]:port
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default().to_string();
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => {
            host.to_string()
        }
        _ => authority.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYFAST_IP: &str = "197.97.145.144";
    const SANDBOX_IP: &str = "197.97.145.145";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn validator(resolver: StaticResolver) -> SourceNetworkValidator {
        let config = VerifierConfig::default().with_check_timeout(Duration::from_millis(200));
        SourceNetworkValidator::with_resolver(&config, Arc::new(resolver))
    }

    fn payfast_resolver() -> StaticResolver {
        StaticResolver::new()
            .with_host("www.payfast.co.za", &[ip(PAYFAST_IP)])
            .with_host("w1w.payfast.co.za", &[ip(PAYFAST_IP)])
            .with_host("sandbox.payfast.co.za", &[ip(SANDBOX_IP)])
    }

    #[test]
    fn normalize_strips_scheme_path_and_port() {
        assert_eq!(normalize_host("https://www.payfast.co.za/eng/process"), "www.payfast.co.za");
        assert_eq!(normalize_host("http://example.com"), "example.com");
        assert_eq!(normalize_host("example.com:8080"), "example.com");
        assert_eq!(normalize_host("example.com/notify?x=1"), "example.com");
        assert_eq!(normalize_host("[::1]:443"), "::1");
        assert_eq!(normalize_host("::1"), "::1");
        assert_eq!(normalize_host(""), "");
    }

    #[tokio::test]
    async fn trusted_set_is_deduplicated_and_skips_failures() {
        // w2w is not in the table and must be skipped
        let set = validator(payfast_resolver()).trusted_set().await;
        assert_eq!(set.len(), 2);
        assert!(set.contains(&ip(PAYFAST_IP)));
        assert!(set.contains(&ip(SANDBOX_IP)));
    }

    #[tokio::test]
    async fn origin_resolving_into_set_is_trusted() {
        let resolver = payfast_resolver().with_host("itn.payfast.co.za", &[ip(SANDBOX_IP)]);
        assert!(validator(resolver).is_trusted("itn.payfast.co.za:443").await);
    }

    #[tokio::test]
    async fn origin_outside_set_is_untrusted() {
        let resolver = payfast_resolver().with_host("evil.example.com", &[ip("203.0.113.9")]);
        let err = validator(resolver)
            .verify("https://evil.example.com/notify")
            .await
            .unwrap_err();
        assert!(matches!(err, ItnError::UntrustedOrigin { ref host } if host == "evil.example.com"));
    }

    #[tokio::test]
    async fn only_first_origin_address_counts() {
        let resolver = payfast_resolver()
            .with_host("mixed.example.com", &[ip("203.0.113.9"), ip(PAYFAST_IP)]);
        assert!(!validator(resolver).is_trusted("mixed.example.com").await);
    }

    #[tokio::test]
    async fn unresolvable_origin_is_untrusted_not_a_panic() {
        let err = validator(payfast_resolver())
            .verify("nowhere.invalid")
            .await
            .unwrap_err();
        assert!(matches!(err, ItnError::Transport(TransportError::Dns { .. })));
    }

    #[tokio::test]
    async fn empty_host_is_untrusted() {
        assert!(!validator(payfast_resolver()).is_trusted("").await);
    }

    struct StalledResolver;

    impl HostResolver for StalledResolver {
        fn lookup<'a>(&'a self, _host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
            futures::future::pending().boxed()
        }
    }

    #[tokio::test]
    async fn lookup_deadline_surfaces_as_timeout() {
        let config = VerifierConfig::default().with_check_timeout(Duration::from_millis(20));
        let validator = SourceNetworkValidator::with_resolver(&config, Arc::new(StalledResolver));
        let err = validator.verify("www.payfast.co.za").await.unwrap_err();
        assert!(matches!(
            err,
            ItnError::Transport(TransportError::Timeout { operation: "dns lookup", .. })
        ));
    }
}
