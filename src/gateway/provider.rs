use crate::gateway::error::GatewayResult;
use crate::gateway::types::{Money, OrderDescriptor, PaymentConfirmation, SignatureVerification};
use async_trait::async_trait;

/// Seam between the checkout orchestrator and the upstream payment gateway.
/// Order creation is a network call; signature verification is pure local
/// computation against the shared secret, so it stays synchronous.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount: Money) -> GatewayResult<OrderDescriptor>;

    fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> GatewayResult<SignatureVerification>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockGateway;

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_order(&self, amount: Money) -> GatewayResult<OrderDescriptor> {
            let major = amount.validate_positive("amount")?;
            let minor = crate::gateway::types::to_minor_units(&major)?;
            Ok(OrderDescriptor {
                id: "order_mock".to_string(),
                amount: minor,
                currency: amount.currency,
                receipt: "receipt_order_0".to_string(),
                status: "created".to_string(),
            })
        }

        fn verify_payment(
            &self,
            _confirmation: &PaymentConfirmation,
        ) -> GatewayResult<SignatureVerification> {
            Ok(SignatureVerification {
                valid: true,
                reason: None,
            })
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn trait_can_be_implemented_by_mock_gateway() {
        let gateway: Box<dyn PaymentGateway> = Box::new(MockGateway);
        let order = gateway
            .create_order(Money {
                amount: "100".to_string(),
                currency: "INR".to_string(),
            })
            .await
            .expect("order creation should succeed");
        assert_eq!(order.amount, 10000);
        assert_eq!(order.currency, "INR");
    }
}
