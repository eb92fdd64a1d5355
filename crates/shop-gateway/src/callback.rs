//! # Gateway Callbacks
//!
//! After a customer settles (or abandons) an invoice, the gateway POSTs a
//! form-encoded transaction-completed callback. The payload carries its own
//! `merchantSignature`; only a payload whose signature verifies is trusted,
//! and a mismatch rejects the callback outright with no order lookup.
//!
//! The signed field set is fixed by the wire contract:
//! `merchantAccount;orderReference;amount;currency;authCode;cardPan;
//! transactionStatus;reasonCode`, in that order.

use crate::config::GatewayConfig;
use crate::signature::{constant_time_compare, generate_signature};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shop_core::{ShopError, ShopResult};

/// Transaction status value the gateway uses for a successful payment
pub const STATUS_APPROVED: &str = "Approved";

/// Inbound transaction-completed callback payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    #[serde(rename = "merchantAccount")]
    pub merchant_account: String,

    #[serde(rename = "orderReference")]
    pub order_reference: String,

    pub amount: String,

    pub currency: String,

    #[serde(rename = "authCode", default)]
    pub auth_code: String,

    #[serde(rename = "cardPan", default)]
    pub card_pan: String,

    #[serde(rename = "transactionStatus")]
    pub transaction_status: String,

    #[serde(rename = "reasonCode", default)]
    pub reason_code: String,

    #[serde(rename = "merchantSignature")]
    pub merchant_signature: String,
}

impl CallbackPayload {
    /// Recompute the signature over the eight contract fields and compare
    /// against the claimed one in constant time.
    pub fn verify(&self, config: &GatewayConfig) -> ShopResult<()> {
        let expected = generate_signature(
            &config.secret_key,
            &[
                &self.merchant_account,
                &self.order_reference,
                &self.amount,
                &self.currency,
                &self.auth_code,
                &self.card_pan,
                &self.transaction_status,
                &self.reason_code,
            ],
        );

        if !constant_time_compare(&expected, &self.merchant_signature) {
            return Err(ShopError::Security(
                "callback signature mismatch".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the (already verified) callback reports an approval
    pub fn is_approved(&self) -> bool {
        self.transaction_status == STATUS_APPROVED
    }
}

/// Signed acknowledgement the gateway expects back for every callback,
/// regardless of the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    #[serde(rename = "orderReference")]
    pub order_reference: String,

    pub status: String,

    pub time: i64,

    pub signature: String,
}

impl CallbackAck {
    /// Accept receipt of a callback for `order_reference`
    pub fn accept(config: &GatewayConfig, order_reference: &str) -> Self {
        let time = Utc::now().timestamp();
        let time_str = time.to_string();
        let signature = generate_signature(
            &config.secret_key,
            &[order_reference, "accept", &time_str],
        );
        Self {
            order_reference: order_reference.to_string(),
            status: "accept".to_string(),
            time,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig::new("s3cret", "m1", "shop.example")
    }

    pub(crate) fn signed_payload(config: &GatewayConfig, status: &str) -> CallbackPayload {
        let mut payload = CallbackPayload {
            merchant_account: "m1".to_string(),
            order_reference: "DH1234567890".to_string(),
            amount: "150.00".to_string(),
            currency: "UAH".to_string(),
            auth_code: "123456".to_string(),
            card_pan: "41****1234".to_string(),
            transaction_status: status.to_string(),
            reason_code: "1100".to_string(),
            merchant_signature: String::new(),
        };
        payload.merchant_signature = generate_signature(
            &config.secret_key,
            &[
                &payload.merchant_account,
                &payload.order_reference,
                &payload.amount,
                &payload.currency,
                &payload.auth_code,
                &payload.card_pan,
                &payload.transaction_status,
                &payload.reason_code,
            ],
        );
        payload
    }

    #[test]
    fn test_valid_signature_verifies() {
        let config = config();
        let payload = signed_payload(&config, STATUS_APPROVED);
        assert!(payload.verify(&config).is_ok());
        assert!(payload.is_approved());
    }

    #[test]
    fn test_tampered_field_rejected() {
        let config = config();
        let mut payload = signed_payload(&config, "Declined");

        // Attacker flips the status but cannot re-sign
        payload.transaction_status = STATUS_APPROVED.to_string();

        assert!(matches!(
            payload.verify(&config),
            Err(ShopError::Security(_))
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let payload = signed_payload(&config(), STATUS_APPROVED);
        let other = GatewayConfig::new("different-key", "m1", "shop.example");
        assert!(payload.verify(&other).is_err());
    }

    #[test]
    fn test_form_decoding_uses_wire_names() {
        let form = "merchantAccount=m1&orderReference=DH1&amount=10.00&currency=UAH\
                    &authCode=1&cardPan=41****1&transactionStatus=Approved&reasonCode=1100\
                    &merchantSignature=abc";
        let payload: CallbackPayload = serde_urlencoded::from_str(form).unwrap();
        assert_eq!(payload.order_reference, "DH1");
        assert_eq!(payload.transaction_status, "Approved");
    }

    #[test]
    fn test_ack_is_signed_over_three_fields() {
        let config = config();
        let ack = CallbackAck::accept(&config, "DH1234567890");
        let expected = generate_signature(
            &config.secret_key,
            &["DH1234567890", "accept", &ack.time.to_string()],
        );
        assert_eq!(ack.signature, expected);
        assert_eq!(ack.status, "accept");
    }
}
