//! Extraction of the required order fields from an inbound notification.
//!
//! Parameters are kept as an ordered list of pairs for the whole lifetime of a
//! notification. The signature is computed over the fields in submission
//! order, so they must never pass through a hash map.

use crate::constants::ITEM_NAME_PREFIX;
use crate::error::ItnError;

/// The four fields every notification must carry, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    OrderReference,
    GatewayPaymentId,
    PaymentStatus,
    ItemName,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [
        RequiredField::OrderReference,
        RequiredField::GatewayPaymentId,
        RequiredField::PaymentStatus,
        RequiredField::ItemName,
    ];

    /// Parameter name as PayFast sends it.
    pub fn param(self) -> &'static str {
        match self {
            RequiredField::OrderReference => "m_payment_id",
            RequiredField::GatewayPaymentId => "pf_payment_id",
            RequiredField::PaymentStatus => "payment_status",
            RequiredField::ItemName => "item_name",
        }
    }
}

/// A notification whose required fields have all been found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFields {
    params: Vec<(String, String)>,
    order_reference: String,
    gateway_payment_id: String,
    payment_status: String,
    item_name: String,
}

impl NotificationFields {
    /// Pull the required fields out of `params`.
    ///
    /// An empty value counts as missing. If a parameter repeats, the first
    /// occurrence wins. Every missing field is reported, not just the first.
    pub fn extract(params: &[(String, String)]) -> Result<Self, ItnError> {
        let mut values: [Option<&str>; 4] = [None; 4];
        let mut missing = Vec::new();

        for (slot, field) in values.iter_mut().zip(RequiredField::ALL) {
            match first_value(params, field.param()) {
                Some(v) if !v.is_empty() => *slot = Some(v),
                _ => missing.push(field),
            }
        }

        match values {
            [Some(order), Some(payment_id), Some(status), Some(item)] => Ok(Self {
                params: params.to_vec(),
                order_reference: order.to_string(),
                gateway_payment_id: payment_id.to_string(),
                payment_status: status.to_string(),
                item_name: item.to_string(),
            }),
            _ => Err(ItnError::MissingFields(missing)),
        }
    }

    /// All parameters in the order they were received, including `signature`
    /// and anything after it.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value received for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        first_value(&self.params, name)
    }

    pub fn order_reference(&self) -> &str {
        &self.order_reference
    }

    pub fn gateway_payment_id(&self) -> &str {
        &self.gateway_payment_id
    }

    pub fn payment_status(&self) -> &str {
        &self.payment_status
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Item name with the merchant's `Order` prefix stripped.
    pub fn item_reference(&self) -> &str {
        self.item_name
            .strip_prefix(ITEM_NAME_PREFIX)
            .unwrap_or(&self.item_name)
    }

    /// The gateway-supplied signature, if the notification carried one.
    pub fn signature(&self) -> Option<&str> {
        self.get(crate::constants::SIGNATURE_FIELD)
    }
}

/// Decode `application/x-www-form-urlencoded` input (a query string or a raw
/// form body) into ordered pairs. Invalid UTF-8 is replaced, not rejected.
pub fn parse_params(raw: impl AsRef<[u8]>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_ref())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn first_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extracts_all_required_fields() {
        let params = pairs(&[
            ("m_payment_id", "1001"),
            ("pf_payment_id", "pf123"),
            ("payment_status", "COMPLETE"),
            ("item_name", "Order1001"),
            ("signature", "abc"),
        ]);
        let fields = NotificationFields::extract(&params).unwrap();
        assert_eq!(fields.order_reference(), "1001");
        assert_eq!(fields.gateway_payment_id(), "pf123");
        assert_eq!(fields.payment_status(), "COMPLETE");
        assert_eq!(fields.item_name(), "Order1001");
        assert_eq!(fields.item_reference(), "1001");
        assert_eq!(fields.signature(), Some("abc"));
        assert_eq!(fields.params().len(), 5);
    }

    #[test]
    fn reports_every_missing_field_in_fixed_order() {
        let params = pairs(&[("payment_status", "COMPLETE")]);
        let err = NotificationFields::extract(&params).unwrap_err();
        match &err {
            ItnError::MissingFields(missing) => assert_eq!(
                missing,
                &vec![
                    RequiredField::OrderReference,
                    RequiredField::GatewayPaymentId,
                    RequiredField::ItemName,
                ]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "missing required order data: m_payment_id, pf_payment_id, item_name"
        );
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let params = pairs(&[
            ("m_payment_id", ""),
            ("pf_payment_id", "pf123"),
            ("payment_status", "COMPLETE"),
            ("item_name", "Widget"),
        ]);
        let err = NotificationFields::extract(&params).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required order data: m_payment_id"
        );
    }

    #[test]
    fn nothing_present_names_all_four() {
        let err = NotificationFields::extract(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required order data: m_payment_id, pf_payment_id, payment_status, item_name"
        );
    }

    #[test]
    fn repeated_param_uses_first_occurrence() {
        let params = pairs(&[
            ("m_payment_id", "first"),
            ("m_payment_id", "second"),
            ("pf_payment_id", "pf123"),
            ("payment_status", "COMPLETE"),
            ("item_name", "Widget"),
        ]);
        let fields = NotificationFields::extract(&params).unwrap();
        assert_eq!(fields.order_reference(), "first");
        assert_eq!(fields.item_reference(), "Widget");
    }

    #[test]
    fn parse_params_preserves_order_and_decodes() {
        let params = parse_params("b=2&a=hello+world&c=%26amp");
        assert_eq!(
            params,
            pairs(&[("b", "2"), ("a", "hello world"), ("c", "&amp")])
        );
    }

    #[test]
    fn parse_params_reads_raw_body_bytes() {
        let body: &[u8] = b"m_payment_id=1001&item_name=Caf%C3%A9+Order&note=\xff";
        let params = parse_params(body);
        assert_eq!(params[0], ("m_payment_id".to_string(), "1001".to_string()));
        assert_eq!(params[1], ("item_name".to_string(), "Caf\u{e9} Order".to_string()));
        assert_eq!(params[2], ("note".to_string(), "\u{fffd}".to_string()));
    }
}
