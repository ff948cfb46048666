//! Canonical parameter string shared by the signature and confirmation checks.

use std::fmt;

use crate::constants::{PASSPHRASE_FIELD, SIGNATURE_FIELD};
use crate::fields::NotificationFields;

/// The deterministic `key=value&...` rendering of a notification.
///
/// Holds two forms: the payload replayed to the gateway's validation endpoint,
/// and the signable form, which carries the passphrase suffix when one is
/// configured. Neither is ever written to logs; `Debug` only reports lengths.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalString {
    payload: String,
    signable: String,
}

impl CanonicalString {
    /// Build the canonical string from ordered parameters.
    ///
    /// Fields are rendered in received order until the first one named
    /// `signature`; that field and everything after it are left out. An empty
    /// passphrase is treated as no passphrase.
    pub fn build(params: &[(String, String)], passphrase: Option<&str>) -> Self {
        let mut payload = String::new();
        for (key, value) in params {
            if key == SIGNATURE_FIELD {
                break;
            }
            payload.push_str(key);
            payload.push('=');
            payload.push_str(&query_escape(value));
            payload.push('&');
        }
        if payload.ends_with('&') {
            payload.pop();
        }

        let signable = match passphrase.filter(|p| !p.is_empty()) {
            Some(secret) => format!("{payload}&{PASSPHRASE_FIELD}={}", query_escape(secret)),
            None => payload.clone(),
        };

        Self { payload, signable }
    }

    pub fn from_fields(fields: &NotificationFields, passphrase: Option<&str>) -> Self {
        Self::build(fields.params(), passphrase)
    }

    /// Parameter string without the passphrase, as posted back to the gateway.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Parameter string the gateway signed (passphrase included when set).
    pub fn signable(&self) -> &str {
        &self.signable
    }
}

impl fmt::Debug for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalString")
            .field("payload_len", &self.payload.len())
            .field("signable_len", &self.signable.len())
            .finish()
    }
}

/// Escape a value for use in a query component.
///
/// Alphanumerics and `-_.~` pass through, space becomes `+`, everything else
/// is `%XX` with uppercase hex. This matches the encoding PayFast applies when
/// it signs the notification.
pub fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
