pub mod checkout;
pub mod drivers;
pub mod payments;
pub mod rides;
pub mod users;

use crate::database::driver_repository::DriverRepository;
use crate::database::ride_repository::RideRepository;
use crate::database::user_repository::UserRepository;
use crate::gateway::PaymentGateway;
use crate::services::CheckoutOrchestrator;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared handles for building the API router
#[derive(Clone)]
pub struct ApiContext {
    pub gateway: Arc<dyn PaymentGateway>,
    pub orchestrator: Arc<CheckoutOrchestrator>,
    pub rides: Arc<RideRepository>,
    pub users: Arc<UserRepository>,
    pub drivers: Arc<DriverRepository>,
}

/// Assemble the /api router
pub fn api_router(ctx: ApiContext) -> Router {
    let payments = Router::new()
        .route("/payments/orders", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        .with_state(payments::PaymentsState {
            gateway: ctx.gateway.clone(),
        });

    let checkout = Router::new()
        .route("/checkout", post(checkout::begin_checkout))
        .route("/checkout/complete", post(checkout::complete_checkout))
        .route("/checkout/cancel", post(checkout::cancel_checkout))
        .with_state(checkout::CheckoutApiState {
            orchestrator: ctx.orchestrator.clone(),
        });

    let rides = Router::new()
        .route("/rides", post(rides::create_ride))
        .route("/rides/user/{user_id}", get(rides::list_user_rides))
        .route(
            "/rides/{ride_id}",
            get(rides::get_ride).put(rides::update_ride),
        )
        .with_state(rides::RidesState {
            rides: ctx.rides.clone(),
        });

    let users = Router::new()
        .route("/users", post(users::create_user).get(users::get_user))
        .with_state(users::UsersState {
            users: ctx.users.clone(),
        });

    let drivers = Router::new()
        .route(
            "/drivers",
            get(drivers::list_drivers).post(drivers::create_driver),
        )
        .with_state(drivers::DriversState {
            drivers: ctx.drivers.clone(),
        });

    Router::new().nest(
        "/api",
        payments
            .merge(checkout)
            .merge(rides)
            .merge(users)
            .merge(drivers),
    )
}
