//! Checkout Orchestrator Service
//!
//! Drives a rider's payment from order creation through signature
//! verification to ride persistence. Enforces one in-flight checkout
//! per user and keeps the "paid but unrecorded" failure distinct from
//! an ordinary rejection.

use crate::database::error::DatabaseError;
use crate::database::ride_repository::{NewRide, Ride, RideRepository};
use crate::error::{AppError, AppErrorKind, AppResult, DomainError, ExternalError, ValidationError};
use crate::gateway::types::{Money, OrderDescriptor, PaymentConfirmation};
use crate::gateway::PaymentGateway;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Checkout lifecycle states. A user has at most one non-terminal
/// session at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No active checkout
    Idle,
    /// Gateway order created
    OrderCreated,
    /// Order handed to the client, waiting for payment confirmation
    AwaitingUserCheckout,
    /// Confirmation received, signature check in progress
    Verifying,
    /// Signature valid, ride not yet recorded
    Verified,
    /// Signature invalid, checkout over
    Rejected,
    /// Ride recorded, checkout over
    Persisted,
    /// Signature valid but the ride could not be recorded
    PersistFailed,
    /// Gateway failure or user cancellation
    Failed,
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutState::Idle => write!(f, "idle"),
            CheckoutState::OrderCreated => write!(f, "order_created"),
            CheckoutState::AwaitingUserCheckout => write!(f, "awaiting_user_checkout"),
            CheckoutState::Verifying => write!(f, "verifying"),
            CheckoutState::Verified => write!(f, "verified"),
            CheckoutState::Rejected => write!(f, "rejected"),
            CheckoutState::Persisted => write!(f, "persisted"),
            CheckoutState::PersistFailed => write!(f, "persist_failed"),
            CheckoutState::Failed => write!(f, "failed"),
        }
    }
}

impl CheckoutState {
    /// States reachable from this one
    pub fn valid_transitions(&self) -> Vec<CheckoutState> {
        match self {
            CheckoutState::Idle => vec![CheckoutState::OrderCreated, CheckoutState::Failed],
            CheckoutState::OrderCreated => {
                vec![CheckoutState::AwaitingUserCheckout, CheckoutState::Failed]
            }
            CheckoutState::AwaitingUserCheckout => {
                vec![CheckoutState::Verifying, CheckoutState::Failed]
            }
            CheckoutState::Verifying => vec![CheckoutState::Verified, CheckoutState::Rejected],
            CheckoutState::Verified => {
                vec![CheckoutState::Persisted, CheckoutState::PersistFailed]
            }
            // Terminal states - no valid transitions
            CheckoutState::Rejected => vec![],
            CheckoutState::Persisted => vec![],
            CheckoutState::PersistFailed => vec![],
            CheckoutState::Failed => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

/// Active checkout session for a user
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub user_id: String,
    pub state: CheckoutState,
    pub order: Option<OrderDescriptor>,
}

/// Persistence seam for recorded rides. Lets the orchestrator be
/// exercised without a live database.
#[async_trait]
pub trait RideSink: Send + Sync {
    async fn record_ride(&self, ride: &NewRide) -> Result<Ride, DatabaseError>;
}

#[async_trait]
impl RideSink for RideRepository {
    async fn record_ride(&self, ride: &NewRide) -> Result<Ride, DatabaseError> {
        self.create_ride(ride).await
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutTimeouts {
    /// Upper bound on gateway order creation, retries included
    pub order: Duration,
    pub persist: Duration,
}

impl Default for CheckoutTimeouts {
    fn default() -> Self {
        Self {
            order: Duration::from_secs(30),
            persist: Duration::from_secs(10),
        }
    }
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    rides: Arc<dyn RideSink>,
    timeouts: CheckoutTimeouts,
    sessions: RwLock<HashMap<String, CheckoutSession>>,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        rides: Arc<dyn RideSink>,
        timeouts: CheckoutTimeouts,
    ) -> Self {
        Self {
            gateway,
            rides,
            timeouts,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a checkout for a user: fails fast with a conflict when a
    /// non-terminal session already exists, otherwise creates a gateway
    /// order and moves the session to awaiting_user_checkout.
    pub async fn begin_checkout(&self, user_id: &str, amount: Money) -> AppResult<OrderDescriptor> {
        {
            let mut sessions = self.sessions.write().await;
            if let Some(existing) = sessions.get(user_id) {
                if !existing.state.is_terminal() {
                    warn!(user_id, state = %existing.state, "checkout already in flight");
                    return Err(DomainError::CheckoutInProgress {
                        user_id: user_id.to_string(),
                    }
                    .into());
                }
            }
            // Reserve the slot before calling out to the gateway.
            sessions.insert(
                user_id.to_string(),
                CheckoutSession {
                    user_id: user_id.to_string(),
                    state: CheckoutState::Idle,
                    order: None,
                },
            );
        }

        let created = tokio::time::timeout(self.timeouts.order, self.gateway.create_order(amount))
            .await
            .map_err(|_| {
                AppError::from(ExternalError::Timeout {
                    service: self.gateway.name().to_string(),
                    timeout_secs: self.timeouts.order.as_secs(),
                })
            })
            .and_then(|r| r.map_err(AppError::from));

        let order = match created {
            Ok(order) => order,
            Err(e) => {
                self.transition(user_id, CheckoutState::Failed).await?;
                return Err(e);
            }
        };

        self.transition(user_id, CheckoutState::OrderCreated).await?;
        self.set_order(user_id, order.clone()).await;
        self.transition(user_id, CheckoutState::AwaitingUserCheckout)
            .await?;

        info!(user_id, order_id = %order.id, "checkout started");
        Ok(order)
    }

    /// Complete a checkout: verify the payment signature, then record
    /// the ride. A bad signature terminates in rejected; a persistence
    /// failure after a valid signature terminates in persist_failed and
    /// is surfaced as a payment-unrecorded error.
    pub async fn complete_checkout(
        &self,
        user_id: &str,
        confirmation: &PaymentConfirmation,
        ride: &NewRide,
    ) -> AppResult<Ride> {
        self.transition(user_id, CheckoutState::Verifying).await?;

        let verification = match self.gateway.verify_payment(confirmation) {
            Ok(v) => v,
            Err(e) => {
                // Verifying has no path back to awaiting, so a
                // confirmation we cannot even check ends the session.
                self.transition(user_id, CheckoutState::Rejected).await?;
                return Err(e.into());
            }
        };

        if !verification.valid {
            self.transition(user_id, CheckoutState::Rejected).await?;
            warn!(user_id, order_id = %confirmation.razorpay_order_id, "payment signature rejected");
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidField {
                    field: "razorpay_signature".to_string(),
                    reason: verification
                        .reason
                        .unwrap_or_else(|| "Invalid signature".to_string()),
                },
            )));
        }

        self.transition(user_id, CheckoutState::Verified).await?;

        // The verified flow is the only writer of a paid ride.
        let mut ride = ride.clone();
        ride.payment_status = "paid".to_string();

        let persisted = tokio::time::timeout(self.timeouts.persist, self.rides.record_ride(&ride))
            .await
            .map_err(|_| DatabaseError::from_sqlx(sqlx::Error::PoolTimedOut))
            .and_then(|r| r);

        match persisted {
            Ok(ride) => {
                self.transition(user_id, CheckoutState::Persisted).await?;
                info!(user_id, ride_id = %ride.ride_id, "ride recorded");
                Ok(ride)
            }
            Err(e) => {
                self.transition(user_id, CheckoutState::PersistFailed)
                    .await?;
                error!(
                    user_id,
                    order_id = %confirmation.razorpay_order_id,
                    payment_id = %confirmation.razorpay_payment_id,
                    error = %e,
                    "payment captured but ride not recorded"
                );
                Err(DomainError::PaymentUnrecorded {
                    order_id: confirmation.razorpay_order_id.clone(),
                    payment_id: confirmation.razorpay_payment_id.clone(),
                }
                .into())
            }
        }
    }

    /// Abort an in-flight checkout. Terminal, frees the user's slot
    /// for a new attempt.
    pub async fn cancel_checkout(&self, user_id: &str) -> AppResult<()> {
        self.transition(user_id, CheckoutState::Failed).await?;
        info!(user_id, "checkout cancelled");
        Ok(())
    }

    /// Current state for a user, idle when no session exists
    pub async fn state_of(&self, user_id: &str) -> CheckoutState {
        self.sessions
            .read()
            .await
            .get(user_id)
            .map(|s| s.state)
            .unwrap_or(CheckoutState::Idle)
    }

    async fn set_order(&self, user_id: &str, order: OrderDescriptor) {
        if let Some(session) = self.sessions.write().await.get_mut(user_id) {
            session.order = Some(order);
        }
    }

    async fn transition(&self, user_id: &str, next: CheckoutState) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(user_id).ok_or_else(|| {
            AppError::new(AppErrorKind::Validation(ValidationError::InvalidField {
                field: "user_id".to_string(),
                reason: "No active checkout for user".to_string(),
            }))
        })?;

        if !session.state.valid_transitions().contains(&next) {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidField {
                    field: "checkout_state".to_string(),
                    reason: format!("Cannot move from {} to {}", session.state, next),
                },
            )));
        }

        session.state = next;
        Ok(())
    }
}
