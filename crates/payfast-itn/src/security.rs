//! Constant-time comparison shared by signature checks and bearer-token auth.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Byte comparison whose timing reveals neither content nor length.
///
/// Both inputs are hashed to fixed-length SHA-256 digests and the digests are
/// compared with `subtle::ConstantTimeEq`. The result is plain equality:
/// case-sensitive, no trimming.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}
