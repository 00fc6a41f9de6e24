//! Razorpay payment-signature verification.
//!
//! After checkout the gateway returns (order_id, payment_id, signature) where
//! signature = HMAC-SHA256(key_secret, "order_id|payment_id") as lowercase
//! hex. Recomputing and comparing that digest is the sole authentication
//! boundary between "payment claimed by the client" and "payment treated as
//! real"; a ride is never marked paid unless this returns true.

use crate::gateway::error::{GatewayError, GatewayResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected signature for an (order_id, payment_id) pair.
pub fn compute_signature(order_id: &str, payment_id: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key of any length is valid");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a gateway-supplied signature against the shared secret.
///
/// Mismatch is a normal `Ok(false)` outcome. Errors are reserved for absent
/// inputs, which indicate a malformed verification request rather than a
/// forged payment.
pub fn verify_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> GatewayResult<bool> {
    for (name, value) in [
        ("razorpay_order_id", order_id),
        ("razorpay_payment_id", payment_id),
        ("razorpay_signature", signature),
    ] {
        if value.trim().is_empty() {
            return Err(GatewayError::VerificationError {
                message: format!("{} is required", name),
            });
        }
    }
    if secret.is_empty() {
        return Err(GatewayError::VerificationError {
            message: "signing secret is not configured".to_string(),
        });
    }

    let computed = compute_signature(order_id, payment_id, secret);
    Ok(secure_eq(computed.as_bytes(), signature.trim().as_bytes()))
}

pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_key_secret";

    #[test]
    fn correct_signature_verifies() {
        let sig = compute_signature("order_1", "pay_1", SECRET);
        assert!(verify_signature("order_1", "pay_1", &sig, SECRET).unwrap());
    }

    #[test]
    fn single_bit_flip_is_rejected() {
        let sig = compute_signature("order_1", "pay_1", SECRET);
        let mut bytes = sig.into_bytes();
        bytes[0] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(!verify_signature("order_1", "pay_1", &tampered, SECRET).unwrap());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let sig = compute_signature("order_1", "pay_1", SECRET);
        assert!(!verify_signature("order_1", "pay_1", &sig, "other_secret").unwrap());
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let sig = compute_signature("order_1", "pay_1", SECRET).to_uppercase();
        assert!(!verify_signature("order_1", "pay_1", &sig, SECRET).unwrap());
    }

    #[test]
    fn verification_is_idempotent() {
        let sig = compute_signature("order_1", "pay_1", SECRET);
        let first = verify_signature("order_1", "pay_1", &sig, SECRET).unwrap();
        let second = verify_signature("order_1", "pay_1", &sig, SECRET).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_fields_error_instead_of_false() {
        assert!(verify_signature("", "pay_1", "sig", SECRET).is_err());
        assert!(verify_signature("order_1", "", "sig", SECRET).is_err());
        assert!(verify_signature("order_1", "pay_1", "", SECRET).is_err());
        assert!(verify_signature("order_1", "pay_1", "sig", "").is_err());
    }

    #[test]
    fn secure_eq_behaves_correctly() {
        assert!(secure_eq(b"abc", b"abc"));
        assert!(!secure_eq(b"abc", b"abd"));
        assert!(!secure_eq(b"abc", b"ab"));
    }
}
