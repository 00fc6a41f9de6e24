use crate::gateway::error::GatewayError;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Monetary amount in major currency units (rupees, dollars), as the rest of
/// the system sees fares. Conversion to gateway minor units happens once, in
/// [`to_minor_units`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn validate_positive(&self, field: &str) -> Result<BigDecimal, GatewayError> {
        let parsed =
            BigDecimal::from_str(&self.amount).map_err(|_| GatewayError::ValidationError {
                message: format!("invalid decimal amount: {}", self.amount),
                field: Some(field.to_string()),
            })?;
        if parsed <= BigDecimal::from(0) {
            return Err(GatewayError::ValidationError {
                message: "amount must be greater than zero".to_string(),
                field: Some(field.to_string()),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(GatewayError::ValidationError {
                message: "currency is required".to_string(),
                field: Some("currency".to_string()),
            });
        }
        Ok(parsed)
    }
}

/// Convert a major-unit amount to gateway minor units (paise, cents).
///
/// The gateway wire format is integral minor units; amounts with sub-minor
/// precision (e.g. 10.005) are rejected rather than silently rounded.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, GatewayError> {
    use bigdecimal::ToPrimitive;

    let minor = amount * BigDecimal::from(100);
    if !minor.is_integer() {
        return Err(GatewayError::ValidationError {
            message: format!("amount {} has sub-minor-unit precision", amount),
            field: Some("amount".to_string()),
        });
    }
    minor.to_i64().ok_or_else(|| GatewayError::ValidationError {
        message: format!("amount {} overflows minor units", amount),
        field: Some("amount".to_string()),
    })
}

/// Order descriptor returned by the gateway after order creation.
/// Referenced within the current request lifecycle only, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDescriptor {
    pub id: String,
    /// Minor units, as the gateway holds it.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

/// The triple the gateway-hosted checkout hands back after the user pays.
/// Transient: verified and discarded, never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureVerification {
    pub valid: bool,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rejects_zero_and_negative() {
        let zero = Money {
            amount: "0".to_string(),
            currency: "INR".to_string(),
        };
        assert!(zero.validate_positive("amount").is_err());

        let negative = Money {
            amount: "-25.50".to_string(),
            currency: "INR".to_string(),
        };
        assert!(negative.validate_positive("amount").is_err());
    }

    #[test]
    fn money_rejects_missing_currency() {
        let money = Money {
            amount: "100".to_string(),
            currency: "  ".to_string(),
        };
        assert!(money.validate_positive("amount").is_err());
    }

    #[test]
    fn minor_unit_conversion_is_exact() {
        let amount = BigDecimal::from_str("25.50").unwrap();
        assert_eq!(to_minor_units(&amount).unwrap(), 2550);

        let whole = BigDecimal::from(100);
        assert_eq!(to_minor_units(&whole).unwrap(), 10000);
    }

    #[test]
    fn minor_unit_conversion_rejects_sub_paise() {
        let amount = BigDecimal::from_str("10.005").unwrap();
        assert!(to_minor_units(&amount).is_err());
    }
}
