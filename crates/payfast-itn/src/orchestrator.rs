//! Sequencing of extraction, canonicalization and the three trust checks.
//!
//! The HTTP acknowledgement is the caller's job and happens before
//! [`NotificationOrchestrator::handle`] runs. Nothing here feeds back into the
//! response; failed outcomes go to the configured [`FailureHook`].

use std::fmt;
use std::sync::Arc;

use crate::canonical::CanonicalString;
use crate::config::VerifierConfig;
use crate::confirm::ConfirmationClient;
use crate::error::ItnError;
use crate::fields::NotificationFields;
use crate::network::SourceNetworkValidator;
use crate::signature::SignatureVerifier;

/// One of the three independent trust checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Signature,
    SourceNetwork,
    ServerConfirmation,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Signature => "signature",
            CheckKind::SourceNetwork => "source_network",
            CheckKind::ServerConfirmation => "server_confirmation",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the three checks on one notification.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub fields: NotificationFields,
    pub origin_host: String,
    pub signature_valid: bool,
    pub origin_trusted: bool,
    pub gateway_confirmed: bool,
    /// Failure cause per failed check, in check order.
    pub failures: Vec<(CheckKind, String)>,
}

impl VerificationOutcome {
    /// All three checks passed.
    pub fn is_verified(&self) -> bool {
        self.signature_valid && self.origin_trusted && self.gateway_confirmed
    }

    pub fn passed(&self, check: CheckKind) -> bool {
        match check {
            CheckKind::Signature => self.signature_valid,
            CheckKind::SourceNetwork => self.origin_trusted,
            CheckKind::ServerConfirmation => self.gateway_confirmed,
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = CheckKind> + '_ {
        self.failures.iter().map(|(check, _)| *check)
    }
}

/// Reaction to a notification that failed at least one check.
///
/// Called on the task that ran the checks; implementations doing I/O should
/// spawn rather than block.
pub trait FailureHook: Send + Sync {
    fn on_failure(&self, outcome: &VerificationOutcome);
}

/// Default hook: one warning line per failed notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook;

impl FailureHook for LoggingHook {
    fn on_failure(&self, outcome: &VerificationOutcome) {
        let failed: Vec<&str> = outcome.failed_checks().map(CheckKind::as_str).collect();
        tracing::warn!(
            order_reference = outcome.fields.order_reference(),
            pf_payment_id = outcome.fields.gateway_payment_id(),
            payment_status = outcome.fields.payment_status(),
            failed = ?failed,
            "notification failed verification"
        );
    }
}

/// Runs a notification through extraction, canonicalization and the checks.
pub struct NotificationOrchestrator {
    passphrase: Option<String>,
    signature: SignatureVerifier,
    network: SourceNetworkValidator,
    confirmation: ConfirmationClient,
    hook: Arc<dyn FailureHook>,
}

impl NotificationOrchestrator {
    /// Orchestrator using system DNS and the configured gateway host.
    pub fn new(config: VerifierConfig) -> Self {
        let network = SourceNetworkValidator::new(&config);
        let confirmation = ConfirmationClient::new(&config);
        Self::with_parts(&config, network, confirmation)
    }

    pub fn with_parts(
        config: &VerifierConfig,
        network: SourceNetworkValidator,
        confirmation: ConfirmationClient,
    ) -> Self {
        Self {
            passphrase: config.passphrase().map(str::to_owned),
            signature: SignatureVerifier::new(),
            network,
            confirmation,
            hook: Arc::new(LoggingHook),
        }
    }

    /// Replace the failure hook.
    pub fn with_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Process a notification whose acknowledgement has already been sent.
    ///
    /// Fails only when required fields are missing, in which case no check
    /// runs. Otherwise returns the outcome, whatever the checks decided.
    pub async fn handle(
        &self,
        params: &[(String, String)],
        origin_host: &str,
    ) -> Result<VerificationOutcome, ItnError> {
        let fields = match NotificationFields::extract(params) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(error = %e, "post payment check: extracting order data failed");
                return Err(e);
            }
        };
        tracing::info!(
            order_reference = fields.order_reference(),
            item = fields.item_reference(),
            payment_status = fields.payment_status(),
            "notification received"
        );

        Ok(self.verify(fields, origin_host).await)
    }

    /// Run the three checks concurrently and report each failure.
    pub async fn verify(&self, fields: NotificationFields, origin_host: &str) -> VerificationOutcome {
        let canonical = CanonicalString::from_fields(&fields, self.passphrase.as_deref());
        tracing::debug!(order_reference = fields.order_reference(), ?canonical, "canonicalized");

        let signature = async { self.signature.verify(&canonical, fields.signature()) };
        let (signature, origin, confirmation) = tokio::join!(
            signature,
            self.network.verify(origin_host),
            self.confirmation.confirm(&canonical),
        );

        let mut failures = Vec::new();
        for (check, result) in [
            (CheckKind::Signature, signature),
            (CheckKind::SourceNetwork, origin),
            (CheckKind::ServerConfirmation, confirmation),
        ] {
            if let Err(e) = result {
                tracing::warn!(
                    check = %check,
                    order_reference = fields.order_reference(),
                    pf_payment_id = fields.gateway_payment_id(),
                    payment_status = fields.payment_status(),
                    origin_host = %origin_host,
                    error = %e,
                    "post payment check failed"
                );
                failures.push((check, e.to_string()));
            }
        }

        let passed = |check| !failures.iter().any(|(c, _)| *c == check);
        let signature_valid = passed(CheckKind::Signature);
        let origin_trusted = passed(CheckKind::SourceNetwork);
        let gateway_confirmed = passed(CheckKind::ServerConfirmation);

        let outcome = VerificationOutcome {
            fields,
            origin_host: origin_host.to_string(),
            signature_valid,
            origin_trusted,
            gateway_confirmed,
            failures,
        };

        if outcome.is_verified() {
            tracing::info!(
                order_reference = outcome.fields.order_reference(),
                pf_payment_id = outcome.fields.gateway_payment_id(),
                "notification verified"
            );
        } else {
            self.hook.on_failure(&outcome);
        }
        outcome
    }
}
