pub mod checkout;

pub use checkout::{CheckoutOrchestrator, CheckoutState, CheckoutTimeouts, RideSink};
