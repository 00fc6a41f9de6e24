use crate::gateway::client::GatewayHttpClient;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::provider::PaymentGateway;
use crate::gateway::signature::verify_signature;
use crate::gateway::types::{
    to_minor_units, Money, OrderDescriptor, PaymentConfirmation, SignatureVerification,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            base_url: "https://api.razorpay.com".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl RazorpayConfig {
    pub fn from_env() -> GatewayResult<Self> {
        let key_id =
            std::env::var("RAZORPAY_KEY_ID").map_err(|_| GatewayError::ValidationError {
                message: "RAZORPAY_KEY_ID environment variable is required".to_string(),
                field: Some("RAZORPAY_KEY_ID".to_string()),
            })?;
        let key_secret =
            std::env::var("RAZORPAY_KEY_SECRET").map_err(|_| GatewayError::ValidationError {
                message: "RAZORPAY_KEY_SECRET environment variable is required".to_string(),
                field: Some("RAZORPAY_KEY_SECRET".to_string()),
            })?;

        Ok(Self {
            key_id,
            key_secret,
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            timeout_secs: std::env::var("RAZORPAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            max_retries: std::env::var("RAZORPAY_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
        })
    }
}

/// Razorpay order API client. Constructed once per process and passed in
/// explicitly; configuration is never read from globals at request time.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http: GatewayHttpClient,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> GatewayResult<Self> {
        let http =
            GatewayHttpClient::new(Duration::from_secs(config.timeout_secs), config.max_retries)?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> GatewayResult<Self> {
        Self::new(RazorpayConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Receipt tag for gateway-dashboard correlation. Timestamp-derived,
    /// human-readable; uniqueness is not enforced on our side.
    fn receipt_tag() -> String {
        format!("receipt_order_{}", Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount: Money) -> GatewayResult<OrderDescriptor> {
        let major = amount.validate_positive("amount")?;
        // The one major-to-minor conversion in the whole pipeline.
        let minor = to_minor_units(&major)?;
        let receipt = Self::receipt_tag();

        let payload = serde_json::json!({
            "amount": minor,
            "currency": amount.currency,
            "receipt": receipt,
            "payment_capture": 1,
        });

        let order: RazorpayOrderData = self
            .http
            .request_json(
                reqwest::Method::POST,
                &self.endpoint("/v1/orders"),
                Some((&self.config.key_id, &self.config.key_secret)),
                Some(&payload),
            )
            .await?;

        info!(
            order_id = %order.id,
            amount_minor = minor,
            currency = %order.currency,
            "razorpay order created"
        );

        Ok(OrderDescriptor {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or(receipt),
            status: order.status,
        })
    }

    fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> GatewayResult<SignatureVerification> {
        let valid = verify_signature(
            &confirmation.razorpay_order_id,
            &confirmation.razorpay_payment_id,
            &confirmation.razorpay_signature,
            &self.config.key_secret,
        )?;
        Ok(SignatureVerification {
            valid,
            reason: if valid {
                None
            } else {
                Some("Invalid signature".to_string())
            },
        })
    }

    fn name(&self) -> &'static str {
        "razorpay"
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderData {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::signature::compute_signature;

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "rzp_test_secret".to_string(),
            base_url: "https://api.razorpay.com".to_string(),
            timeout_secs: 5,
            max_retries: 1,
        })
        .expect("gateway init should succeed")
    }

    #[tokio::test]
    async fn create_order_rejects_invalid_amount() {
        let gateway = gateway();
        let err = gateway
            .create_order(Money {
                amount: "0".to_string(),
                currency: "INR".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn verify_payment_accepts_matching_signature() {
        let gateway = gateway();
        let sig = compute_signature("order_1", "pay_1", "rzp_test_secret");
        let result = gateway
            .verify_payment(&PaymentConfirmation {
                razorpay_order_id: "order_1".to_string(),
                razorpay_payment_id: "pay_1".to_string(),
                razorpay_signature: sig,
            })
            .expect("verification should not error");
        assert!(result.valid);
    }

    #[test]
    fn verify_payment_flags_mismatch_without_error() {
        let gateway = gateway();
        let result = gateway
            .verify_payment(&PaymentConfirmation {
                razorpay_order_id: "order_1".to_string(),
                razorpay_payment_id: "pay_1".to_string(),
                razorpay_signature: "deadbeef".to_string(),
            })
            .expect("mismatch is not an error");
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("Invalid signature"));
    }

    #[test]
    fn receipt_tags_are_timestamp_derived() {
        let tag = RazorpayGateway::receipt_tag();
        assert!(tag.starts_with("receipt_order_"));
    }
}
