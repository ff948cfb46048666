use std::time::Duration;

/// PayFast hostnames whose addresses are allowed to originate notifications.
/// Covers production and sandbox.
pub const TRUSTED_HOSTS: [&str; 4] = [
    "www.payfast.co.za",
    "sandbox.payfast.co.za",
    "w1w.payfast.co.za",
    "w2w.payfast.co.za",
];

/// Gateway host used for server confirmation when none is configured.
pub const DEFAULT_GATEWAY_HOST: &str = "sandbox.payfast.co.za";

/// Path of the server-side validation endpoint on the gateway host.
pub const VALIDATE_PATH: &str = "/eng/query/validate";

/// Literal body the validation endpoint returns for a genuine notification.
pub const VALID_TOKEN: &str = "VALID";

/// Name of the gateway-supplied signature parameter. Nothing at or after it
/// takes part in the canonical string.
pub const SIGNATURE_FIELD: &str = "signature";

/// Name under which the merchant passphrase is appended before signing.
pub const PASSPHRASE_FIELD: &str = "passphrase";

/// Prefix the merchant puts in front of the order id in `item_name`.
pub const ITEM_NAME_PREFIX: &str = "Order";

/// Upper bound on each DNS lookup and on the confirmation round-trip.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
