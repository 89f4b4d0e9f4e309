//! HTTP handlers for the lifecycle endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

use crate::application::handlers::gym::{SaveGymSettingsCommand, SaveGymSettingsHandler};
use crate::application::handlers::lifecycle::{
    CancelMembershipCommand, CancelMembershipHandler, GetClientHandler, GetClientQuery,
    GetMembershipHistoryHandler, GetMembershipHistoryQuery, LifecyclePolicy,
    OnboardClientCommand, OnboardClientHandler, ReconcileMembershipsCommand,
    ReconcileMembershipsHandler, RecordPaymentCommand, RecordPaymentHandler,
    RenewMembershipCommand, RenewMembershipHandler,
};
use crate::application::handlers::plan::{
    CreatePlanCommand, CreatePlanHandler, DeactivatePlanCommand, DeactivatePlanHandler,
    ListPlansHandler, ListPlansQuery,
};
use crate::domain::foundation::{ClientId, GymId, MembershipId, PlanId};
use crate::domain::membership::LifecycleError;
use crate::ports::{Clock, GymDirectory, LifecycleStore, Notifier, PlanCatalog};

use super::dto::{
    ClientResponse, ClientStateResponse, CreatePlanRequest, ErrorResponse, GymResponse,
    HistoryParams, ListPlansParams, MembershipHistoryResponse, MembershipResponse,
    OnboardClientRequest, OnboardClientResponse, PlanListResponse, PlanResponse,
    ReconcileParams, RecordPaymentRequest, RenewMembershipRequest, RenewMembershipResponse,
    SaveGymRequest,
};

/// Header carrying the shared secret for manual reconciliation runs.
pub const RECONCILIATION_SECRET_HEADER: &str = "X-Reconciliation-Secret";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct LifecycleAppState {
    pub gyms: Arc<dyn GymDirectory>,
    pub plans: Arc<dyn PlanCatalog>,
    pub store: Arc<dyn LifecycleStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub policy: LifecyclePolicy,
    pub default_reminder_days: u32,
    /// Shared with the scheduler so both see the same reminder bookkeeping.
    pub reconciler: Arc<ReconcileMembershipsHandler>,
    /// Manual runs are refused when unset.
    pub reconciliation_secret: Option<Arc<Secret<String>>>,
}

impl LifecycleAppState {
    pub fn onboard_client_handler(&self) -> OnboardClientHandler {
        OnboardClientHandler::new(
            self.gyms.clone(),
            self.plans.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.clock.clone(),
            self.policy,
        )
    }

    pub fn renew_membership_handler(&self) -> RenewMembershipHandler {
        RenewMembershipHandler::new(
            self.gyms.clone(),
            self.plans.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.clock.clone(),
            self.policy,
        )
    }

    pub fn record_payment_handler(&self) -> RecordPaymentHandler {
        RecordPaymentHandler::new(self.store.clone(), self.clock.clone())
    }

    pub fn cancel_membership_handler(&self) -> CancelMembershipHandler {
        CancelMembershipHandler::new(self.store.clone(), self.clock.clone())
    }

    pub fn get_client_handler(&self) -> GetClientHandler {
        GetClientHandler::new(self.store.clone())
    }

    pub fn history_handler(&self) -> GetMembershipHistoryHandler {
        GetMembershipHistoryHandler::new(self.store.clone())
    }

    pub fn create_plan_handler(&self) -> CreatePlanHandler {
        CreatePlanHandler::new(self.gyms.clone(), self.plans.clone(), self.clock.clone())
    }

    pub fn deactivate_plan_handler(&self) -> DeactivatePlanHandler {
        DeactivatePlanHandler::new(self.plans.clone(), self.clock.clone())
    }

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.plans.clone())
    }

    pub fn save_gym_handler(&self) -> SaveGymSettingsHandler {
        SaveGymSettingsHandler::new(self.gyms.clone(), self.default_reminder_days)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Body Extraction
// ════════════════════════════════════════════════════════════════════════════════

/// JSON body extractor whose rejections use the API error body.
///
/// A body that is not JSON, or does not match the request shape, becomes a
/// 400 `VALIDATION_FAILED` with `field: "body"`.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = LifecycleApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Client Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/gyms/{gym_id}/clients - Onboard a client
pub async fn onboard_client(
    State(state): State<LifecycleAppState>,
    Path(gym_id): Path<GymId>,
    ApiJson(request): ApiJson<OnboardClientRequest>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let cmd = OnboardClientCommand {
        gym_id,
        primary: request.primary.into(),
        dependents: request.dependents.into_iter().map(Into::into).collect(),
        plan_id: request.plan_id,
        method: request.method,
        payment_received: request.payment_received,
        start_date: request.start_date,
        amount: request.amount,
        remarks: request.remarks,
    };

    let result = state.onboard_client_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(OnboardClientResponse::from(result))))
}

/// GET /api/gyms/{gym_id}/clients/{client_id} - Client with its linked grants
pub async fn get_client(
    State(state): State<LifecycleAppState>,
    Path((gym_id, client_id)): Path<(GymId, ClientId)>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let view = state
        .get_client_handler()
        .handle(GetClientQuery { gym_id, client_id })
        .await?;
    Ok(Json(ClientStateResponse::from(view)))
}

/// GET /api/gyms/{gym_id}/clients/{client_id}/memberships - Grants and activity
pub async fn get_membership_history(
    State(state): State<LifecycleAppState>,
    Path((gym_id, client_id)): Path<(GymId, ClientId)>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let history = state
        .history_handler()
        .handle(GetMembershipHistoryQuery {
            gym_id,
            client_id,
            activity_limit: params.limit,
        })
        .await?;
    Ok(Json(MembershipHistoryResponse::from(history)))
}

/// POST /api/gyms/{gym_id}/clients/{client_id}/renewals - Renew now or in advance
pub async fn renew_membership(
    State(state): State<LifecycleAppState>,
    Path((gym_id, client_id)): Path<(GymId, ClientId)>,
    ApiJson(request): ApiJson<RenewMembershipRequest>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let cmd = RenewMembershipCommand {
        gym_id,
        client_id,
        plan_id: request.plan_id,
        dependents: request.dependents.into_iter().map(Into::into).collect(),
        method: request.method,
        payment_received: request.payment_received,
        start_date: request.start_date,
        amount: request.amount,
        remarks: request.remarks,
    };

    let result = state.renew_membership_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(RenewMembershipResponse::from(result))))
}

/// POST /api/gyms/{gym_id}/clients/{client_id}/payments - Pay down the balance
pub async fn record_payment(
    State(state): State<LifecycleAppState>,
    Path((gym_id, client_id)): Path<(GymId, ClientId)>,
    ApiJson(request): ApiJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let cmd = RecordPaymentCommand {
        gym_id,
        client_id,
        amount: request.amount,
        method: request.method,
        remarks: request.remarks,
        membership_id: request.membership_id,
    };

    let client = state.record_payment_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(ClientResponse::from(&client))))
}

/// POST /api/gyms/{gym_id}/memberships/{membership_id}/cancel - Withdraw a grant
pub async fn cancel_membership(
    State(state): State<LifecycleAppState>,
    Path((gym_id, membership_id)): Path<(GymId, MembershipId)>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let grant = state
        .cancel_membership_handler()
        .handle(CancelMembershipCommand {
            gym_id,
            membership_id,
        })
        .await?;
    Ok(Json(MembershipResponse::from(&grant)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Catalog and Settings Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// PUT /api/gyms/{gym_id} - Create or replace gym settings
pub async fn save_gym(
    State(state): State<LifecycleAppState>,
    Path(gym_id): Path<GymId>,
    ApiJson(request): ApiJson<SaveGymRequest>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let cmd = SaveGymSettingsCommand {
        gym_id,
        name: request.name,
        timezone: request.timezone,
        reminder_days: request.reminder_days,
        notify_onboarding: request.notify_onboarding,
        notify_renewal: request.notify_renewal,
        notify_expiry_reminder: request.notify_expiry_reminder,
    };

    let settings = state.save_gym_handler().handle(cmd).await?;
    Ok(Json(GymResponse::from(&settings)))
}

/// GET /api/gyms/{gym_id}/plans - List the catalog
pub async fn list_plans(
    State(state): State<LifecycleAppState>,
    Path(gym_id): Path<GymId>,
    Query(params): Query<ListPlansParams>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let plans = state
        .list_plans_handler()
        .handle(ListPlansQuery {
            gym_id,
            include_inactive: params.include_inactive,
        })
        .await?;
    Ok(Json(PlanListResponse {
        plans: plans.iter().map(PlanResponse::from).collect(),
    }))
}

/// POST /api/gyms/{gym_id}/plans - Add a plan
pub async fn create_plan(
    State(state): State<LifecycleAppState>,
    Path(gym_id): Path<GymId>,
    ApiJson(request): ApiJson<CreatePlanRequest>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let cmd = CreatePlanCommand {
        gym_id,
        plan_name: request.plan_name,
        duration_in_months: request.duration_in_months,
        duration_in_days: request.duration_in_days,
        price: request.price,
        is_trial: request.is_trial,
        plan_type: request.plan_type,
        members_allowed: request.members_allowed,
    };

    let plan = state.create_plan_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(&plan))))
}

/// POST /api/gyms/{gym_id}/plans/{plan_id}/deactivate - Stop selling a plan
pub async fn deactivate_plan(
    State(state): State<LifecycleAppState>,
    Path((gym_id, plan_id)): Path<(GymId, PlanId)>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let plan = state
        .deactivate_plan_handler()
        .handle(DeactivatePlanCommand { gym_id, plan_id })
        .await?;
    Ok(Json(PlanResponse::from(&plan)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Operations Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/reconciliation/run - Run reconciliation now
pub async fn run_reconciliation(
    State(state): State<LifecycleAppState>,
    headers: HeaderMap,
    Query(params): Query<ReconcileParams>,
) -> Result<impl IntoResponse, LifecycleApiError> {
    let provided = headers
        .get(RECONCILIATION_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !secret_matches(state.reconciliation_secret.as_deref(), provided) {
        tracing::warn!("Rejected reconciliation trigger with missing or wrong secret");
        return Err(LifecycleApiError::Unauthorized);
    }

    let report = state
        .reconciler
        .handle(ReconcileMembershipsCommand {
            gym_id: params.gym_id,
        })
        .await?;
    Ok(Json(report))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Constant-time check of the provided secret against the configured one.
fn secret_matches(expected: Option<&Secret<String>>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) => expected
            .expose_secret()
            .as_bytes()
            .ct_eq(provided.as_bytes())
            .into(),
        _ => false,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts lifecycle errors to HTTP responses.
#[derive(Debug)]
pub enum LifecycleApiError {
    Lifecycle(LifecycleError),
    Unauthorized,
}

impl From<LifecycleError> for LifecycleApiError {
    fn from(err: LifecycleError) -> Self {
        Self::Lifecycle(err)
    }
}

impl From<JsonRejection> for LifecycleApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Lifecycle(LifecycleError::validation("body", rejection.body_text()))
    }
}

impl LifecycleApiError {
    fn status(err: &LifecycleError) -> StatusCode {
        match err {
            LifecycleError::GymNotFound(_)
            | LifecycleError::PlanNotFound(_)
            | LifecycleError::ClientNotFound(_)
            | LifecycleError::MembershipNotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::PlanInactive(_)
            | LifecycleError::CapacityExceeded { .. }
            | LifecycleError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            LifecycleError::PhoneNumberTaken(_)
            | LifecycleError::Conflict(_)
            | LifecycleError::InvalidState { .. } => StatusCode::CONFLICT,
            LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LifecycleApiError {
    fn into_response(self) -> axum::response::Response {
        let err = match self {
            LifecycleApiError::Unauthorized => {
                let body = ErrorResponse::new("UNAUTHORIZED", "Missing or invalid reconciliation secret");
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            LifecycleApiError::Lifecycle(err) => err,
        };

        let status = Self::status(&err);
        let body = match &err {
            LifecycleError::Storage(detail) => {
                tracing::error!(error = %detail, "Request failed on storage");
                ErrorResponse::new(err.code().to_string(), "Internal error")
            }
            LifecycleError::ValidationFailed { field, message } => ErrorResponse::with_details(
                err.code().to_string(),
                message.clone(),
                serde_json::json!({ "field": field }),
            ),
            LifecycleError::CapacityExceeded { allowed, requested } => ErrorResponse::with_details(
                err.code().to_string(),
                err.to_string(),
                serde_json::json!({ "allowed": allowed, "requested": requested }),
            ),
            _ => ErrorResponse::new(err.code().to_string(), err.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
