use md5::{Digest, Md5};

use crate::canonical::CanonicalString;
use crate::error::ItnError;
use crate::hmac::hex;
use crate::security::constant_time_eq;

/// Checks the gateway-supplied `signature` against the canonical string.
///
/// PayFast signs with MD5. That is weak on its own; the source-network and
/// server-confirmation checks are what make the notification trustworthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Compare `supplied` with the digest of the signable canonical string.
    /// A missing signature is a mismatch.
    pub fn verify(
        &self,
        canonical: &CanonicalString,
        supplied: Option<&str>,
    ) -> Result<(), ItnError> {
        let expected = compute_signature(canonical.signable());
        match supplied {
            Some(sig) if constant_time_eq(sig.as_bytes(), expected.as_bytes()) => Ok(()),
            _ => Err(ItnError::SignatureMismatch),
        }
    }

    pub fn is_valid(&self, canonical: &CanonicalString, supplied: Option<&str>) -> bool {
        self.verify(canonical, supplied).is_ok()
    }
}

/// Lowercase hex MD5 of `input`.
pub fn compute_signature(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}
