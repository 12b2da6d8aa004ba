//! Payment session status as reported by the checkout integration.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{CheckoutStatus, PaymentSessionId, PaymentStatus};

/// Status object returned by the checkout status endpoint.
///
/// Owned entirely by the payment provider; the client only reads it. A
/// missing or `null` status reads as `unpaid`/`open`, which keeps a poller
/// waiting rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    #[serde(default)]
    pub session_id: Option<PaymentSessionId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: CheckoutStatus,
    /// Amount as reported by the provider, in its own units.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount_total: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl PaymentSession {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.status == CheckoutStatus::Expired
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_status_object() {
        let session: PaymentSession = serde_json::from_str(
            r#"{"payment_status": "unpaid", "status": "open"}"#,
        )
        .unwrap();

        assert!(!session.is_paid());
        assert!(!session.is_expired());
        assert!(session.amount_total.is_none());
    }

    #[test]
    fn test_paid_with_amount() {
        let session: PaymentSession = serde_json::from_str(
            r#"{"session_id": "cs_1", "payment_status": "paid", "status": "complete",
                "amount_total": 24000, "currency": "inr"}"#,
        )
        .unwrap();

        assert!(session.is_paid());
        assert_eq!(session.amount_total, Some(Decimal::new(24_000, 0)));
    }

    #[test]
    fn test_paid_without_checkout_status() {
        let session: PaymentSession =
            serde_json::from_str(r#"{"payment_status": "paid"}"#).unwrap();

        assert!(session.is_paid());
        assert_eq!(session.status, CheckoutStatus::Open);
    }

    #[test]
    fn test_null_statuses_read_as_pending() {
        let session: PaymentSession =
            serde_json::from_str(r#"{"payment_status": null, "status": "open"}"#).unwrap();
        assert_eq!(session.payment_status, PaymentStatus::Unpaid);
        assert!(!session.is_paid());
        assert!(!session.is_expired());

        let session: PaymentSession =
            serde_json::from_str(r#"{"payment_status": "unpaid", "status": null}"#).unwrap();
        assert_eq!(session.status, CheckoutStatus::Open);

        let session: PaymentSession = serde_json::from_str("{}").unwrap();
        assert!(!session.is_paid());
        assert!(!session.is_expired());
    }
}
