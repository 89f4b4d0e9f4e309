//! Axum router configuration for the lifecycle endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    cancel_membership, create_plan, deactivate_plan, get_client, get_membership_history, health,
    list_plans, onboard_client, record_payment, renew_membership, run_reconciliation, save_gym,
    LifecycleAppState,
};

/// Routes scoped to one gym, mounted at `/api/gyms`.
///
/// # Routes
///
/// - `PUT /{gym_id}` - Create or replace gym settings
/// - `GET /{gym_id}/plans` - List plans (`?include_inactive=true` for all)
/// - `POST /{gym_id}/plans` - Create a plan
/// - `POST /{gym_id}/plans/{plan_id}/deactivate` - Stop selling a plan
/// - `POST /{gym_id}/clients` - Onboard a client
/// - `GET /{gym_id}/clients/{client_id}` - Client with linked grants
/// - `GET /{gym_id}/clients/{client_id}/memberships` - History and activity
/// - `POST /{gym_id}/clients/{client_id}/renewals` - Renew
/// - `POST /{gym_id}/clients/{client_id}/payments` - Record a payment
/// - `POST /{gym_id}/memberships/{membership_id}/cancel` - Cancel a grant
pub fn gym_routes() -> Router<LifecycleAppState> {
    Router::new()
        .route("/:gym_id", put(save_gym))
        .route("/:gym_id/plans", get(list_plans).post(create_plan))
        .route("/:gym_id/plans/:plan_id/deactivate", post(deactivate_plan))
        .route("/:gym_id/clients", post(onboard_client))
        .route("/:gym_id/clients/:client_id", get(get_client))
        .route("/:gym_id/clients/:client_id/memberships", get(get_membership_history))
        .route("/:gym_id/clients/:client_id/renewals", post(renew_membership))
        .route("/:gym_id/clients/:client_id/payments", post(record_payment))
        .route("/:gym_id/memberships/:membership_id/cancel", post(cancel_membership))
}

/// Operational routes, mounted at `/api/reconciliation`.
///
/// - `POST /run` - Run reconciliation now (requires `X-Reconciliation-Secret`)
pub fn reconciliation_routes() -> Router<LifecycleAppState> {
    Router::new().route("/run", post(run_reconciliation))
}

/// The complete lifecycle API with state applied.
pub fn lifecycle_router(state: LifecycleAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/gyms", gym_routes())
        .nest("/api/reconciliation", reconciliation_routes())
        .with_state(state)
}
