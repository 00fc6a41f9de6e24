pub mod client;
pub mod error;
pub mod provider;
pub mod razorpay;
pub mod signature;
pub mod types;

pub use error::{GatewayError, GatewayResult};
pub use provider::PaymentGateway;
pub use razorpay::{RazorpayConfig, RazorpayGateway};
