//! PayFast Instant Transaction Notification (ITN) verification.
//!
//! An ITN is the asynchronous callback PayFast sends after a payment changes
//! state. Before a notification can be trusted it has to pass three independent
//! checks, all driven from the same canonical parameter string:
//!
//! - **Signature** ([`signature`]) — MD5 over the canonical string, salted with
//!   the merchant passphrase when one is configured
//! - **Source network** ([`network`]) — the claimed origin host must resolve into
//!   the addresses currently published for PayFast's own hostnames
//! - **Server confirmation** ([`confirm`]) — PayFast's `/eng/query/validate`
//!   endpoint must answer `VALID` for the same parameter string
//!
//! [`NotificationOrchestrator`] sequences extraction, canonicalization and the
//! three checks, and hands failed outcomes to a pluggable [`FailureHook`].
//!
//! # Example
//!
//! ```no_run
//! use itn::{NotificationOrchestrator, VerifierConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let orchestrator = NotificationOrchestrator::new(VerifierConfig::default());
//! let params = itn::fields::parse_params("m_payment_id=1001&pf_payment_id=pf123");
//! orchestrator.handle(&params, "www.payfast.co.za").await;
//! # }
//! ```

// Core types
pub mod config;
pub mod constants;
pub mod error;
pub mod security;

// Notification pipeline
pub mod canonical;
pub mod confirm;
pub mod fields;
pub mod network;
pub mod orchestrator;
pub mod signature;

// Alert signing
pub mod hmac;

// Re-exports
pub use canonical::CanonicalString;
pub use config::VerifierConfig;
pub use confirm::ConfirmationClient;
pub use error::{ItnError, TransportError};
pub use fields::{NotificationFields, RequiredField};
pub use network::{HostResolver, SourceNetworkValidator, SystemResolver, TrustedHostSet};
pub use orchestrator::{
    CheckKind, FailureHook, LoggingHook, NotificationOrchestrator, VerificationOutcome,
};
pub use signature::SignatureVerifier;
