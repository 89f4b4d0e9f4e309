//! HTTP DTOs (Data Transfer Objects) for the lifecycle endpoints.
//!
//! These types define the JSON request/response structure of the API.
//! They serve as the boundary between HTTP and the application layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::handlers::lifecycle::{
    ClientView, DependentInput, MembershipHistory, OnboardClientResult, RenewMembershipResult,
};
use crate::domain::activity::{Activity, ActivityType};
use crate::domain::client::{Client, ClientRole, Gender, NewClientProfile, PaymentMethod, PaymentRecord};
use crate::domain::foundation::{ClientId, GymId, MembershipId, PlanId, Timestamp};
use crate::domain::gym::GymSettings;
use crate::domain::membership::{AssignedMembership, MembershipStatus};
use crate::domain::plan::{MembershipPlan, PlanType};

fn rfc3339(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Personal details of a client being registered.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientProfileRequest {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl From<ClientProfileRequest> for NewClientProfile {
    fn from(req: ClientProfileRequest) -> Self {
        NewClientProfile {
            name: req.name,
            phone_number: req.phone_number,
            gender: req.gender,
            email: req.email,
            date_of_birth: req.date_of_birth,
            address: req.address,
            emergency_contact: req.emergency_contact,
        }
    }
}

/// A dependent is either an existing client (`{"client_id": ...}`) or a new profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependentRequest {
    Existing { client_id: ClientId },
    New(ClientProfileRequest),
}

impl From<DependentRequest> for DependentInput {
    fn from(req: DependentRequest) -> Self {
        match req {
            DependentRequest::Existing { client_id } => DependentInput::Existing(client_id),
            DependentRequest::New(profile) => DependentInput::New(profile.into()),
        }
    }
}

/// Request to onboard a client onto a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardClientRequest {
    pub primary: ClientProfileRequest,
    #[serde(default)]
    pub dependents: Vec<DependentRequest>,
    pub plan_id: PlanId,
    pub method: PaymentMethod,
    pub payment_received: bool,
    /// First day of the grant; today when omitted.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Billed amount; the plan price when omitted.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Request to renew a client's membership.
#[derive(Debug, Clone, Deserialize)]
pub struct RenewMembershipRequest {
    pub plan_id: PlanId,
    #[serde(default)]
    pub dependents: Vec<DependentRequest>,
    pub method: PaymentMethod,
    pub payment_received: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Request to record a payment against a client's balance.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: i64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub membership_id: Option<MembershipId>,
}

/// Request to add a plan to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub plan_name: String,
    #[serde(default)]
    pub duration_in_months: Option<u32>,
    #[serde(default)]
    pub duration_in_days: Option<u32>,
    pub price: i64,
    #[serde(default)]
    pub is_trial: bool,
    pub plan_type: PlanType,
    pub members_allowed: u32,
}

/// Request to create or replace a gym's settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveGymRequest {
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub reminder_days: Option<u32>,
    #[serde(default)]
    pub notify_onboarding: Option<bool>,
    #[serde(default)]
    pub notify_renewal: Option<bool>,
    #[serde(default)]
    pub notify_expiry_reminder: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPlansParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileParams {
    #[serde(default)]
    pub gym_id: Option<GymId>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub amount: i64,
    pub method: PaymentMethod,
    pub paid_at: String,
    pub remarks: Option<String>,
    pub membership_id: Option<String>,
}

impl From<&PaymentRecord> for PaymentResponse {
    fn from(p: &PaymentRecord) -> Self {
        Self {
            amount: p.amount,
            method: p.method,
            paid_at: rfc3339(&p.paid_at),
            remarks: p.remarks.clone(),
            membership_id: p.membership_id.map(|id| id.to_string()),
        }
    }
}

/// A client as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ClientResponse {
    pub id: String,
    pub gym_id: String,
    pub name: String,
    pub phone_number: String,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub role: ClientRole,
    pub membership_status: MembershipStatus,
    pub active_membership: Option<String>,
    pub upcoming_membership: Option<String>,
    pub membership_history: Vec<String>,
    pub payment_history: Vec<PaymentResponse>,
    /// Outstanding amount owed.
    pub balance: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Client> for ClientResponse {
    fn from(c: &Client) -> Self {
        Self {
            id: c.id.to_string(),
            gym_id: c.gym_id.to_string(),
            name: c.name.clone(),
            phone_number: c.phone_number.to_string(),
            gender: c.gender,
            email: c.email.clone(),
            date_of_birth: c.date_of_birth,
            address: c.address.clone(),
            emergency_contact: c.emergency_contact.clone(),
            role: c.role,
            membership_status: c.membership_status(),
            active_membership: c.active_membership().map(|id| id.to_string()),
            upcoming_membership: c.upcoming_membership().map(|id| id.to_string()),
            membership_history: c.membership_history().iter().map(|id| id.to_string()).collect(),
            payment_history: c.payment_history().iter().map(PaymentResponse::from).collect(),
            balance: c.balance(),
            created_at: rfc3339(&c.created_at),
            updated_at: rfc3339(&c.updated_at),
        }
    }
}

/// An assigned membership as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    pub id: String,
    pub gym_id: String,
    pub primary_member_id: String,
    pub member_ids: Vec<String>,
    pub plan_id: String,
    pub plan_name: String,
    pub is_trial: bool,
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    pub status: MembershipStatus,
    pub total_amount: i64,
    pub payment_received: bool,
    pub created_at: String,
}

impl From<&AssignedMembership> for MembershipResponse {
    fn from(m: &AssignedMembership) -> Self {
        Self {
            id: m.id.to_string(),
            gym_id: m.gym_id.to_string(),
            primary_member_id: m.primary_member_id.to_string(),
            member_ids: m.member_ids.iter().map(|id| id.to_string()).collect(),
            plan_id: m.plan_id.to_string(),
            plan_name: m.plan_name.clone(),
            is_trial: m.is_trial,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            total_amount: m.total_amount,
            payment_received: m.payment_received,
            created_at: rfc3339(&m.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardClientResponse {
    pub client: ClientResponse,
    pub dependents: Vec<ClientResponse>,
    pub membership: MembershipResponse,
}

impl From<OnboardClientResult> for OnboardClientResponse {
    fn from(r: OnboardClientResult) -> Self {
        Self {
            client: ClientResponse::from(&r.client),
            dependents: r.dependents.iter().map(ClientResponse::from).collect(),
            membership: MembershipResponse::from(&r.membership),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenewMembershipResponse {
    pub client: ClientResponse,
    pub dependents: Vec<ClientResponse>,
    pub membership: MembershipResponse,
    /// Previous grant expired as part of this renewal, if any.
    pub closed_out: Option<MembershipResponse>,
}

impl From<RenewMembershipResult> for RenewMembershipResponse {
    fn from(r: RenewMembershipResult) -> Self {
        Self {
            client: ClientResponse::from(&r.client),
            dependents: r.dependents.iter().map(ClientResponse::from).collect(),
            membership: MembershipResponse::from(&r.membership),
            closed_out: r.closed_out.as_ref().map(MembershipResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStateResponse {
    pub client: ClientResponse,
    pub active: Option<MembershipResponse>,
    pub upcoming: Option<MembershipResponse>,
}

impl From<ClientView> for ClientStateResponse {
    fn from(v: ClientView) -> Self {
        Self {
            client: ClientResponse::from(&v.client),
            active: v.active.as_ref().map(MembershipResponse::from),
            upcoming: v.upcoming.as_ref().map(MembershipResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub member_id: String,
    pub membership_id: Option<String>,
    pub amount: Option<i64>,
    pub date: String,
}

impl From<&Activity> for ActivityResponse {
    fn from(a: &Activity) -> Self {
        Self {
            id: a.id.to_string(),
            activity_type: a.activity_type,
            title: a.title.clone(),
            description: a.description.clone(),
            member_id: a.member_id.to_string(),
            membership_id: a.membership_id.map(|id| id.to_string()),
            amount: a.amount,
            date: rfc3339(&a.occurred_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipHistoryResponse {
    pub client_id: String,
    pub memberships: Vec<MembershipResponse>,
    pub activities: Vec<ActivityResponse>,
}

impl From<MembershipHistory> for MembershipHistoryResponse {
    fn from(h: MembershipHistory) -> Self {
        Self {
            client_id: h.client_id.to_string(),
            memberships: h.memberships.iter().map(MembershipResponse::from).collect(),
            activities: h.activities.iter().map(ActivityResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub gym_id: String,
    pub plan_name: String,
    pub duration_in_months: Option<u32>,
    pub duration_in_days: Option<u32>,
    pub price: i64,
    pub is_trial: bool,
    pub plan_type: PlanType,
    pub members_allowed: u32,
    pub active: bool,
}

impl From<&MembershipPlan> for PlanResponse {
    fn from(p: &MembershipPlan) -> Self {
        Self {
            id: p.id.to_string(),
            gym_id: p.gym_id.to_string(),
            plan_name: p.plan_name.clone(),
            duration_in_months: p.duration.months(),
            duration_in_days: p.duration.days(),
            price: p.price,
            is_trial: p.is_trial,
            plan_type: p.plan_type,
            members_allowed: p.members_allowed,
            active: p.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GymResponse {
    pub gym_id: String,
    pub name: String,
    pub timezone: Option<String>,
    pub reminder_days: u32,
    pub notify_onboarding: bool,
    pub notify_renewal: bool,
    pub notify_expiry_reminder: bool,
}

impl From<&GymSettings> for GymResponse {
    fn from(g: &GymSettings) -> Self {
        Self {
            gym_id: g.gym_id.to_string(),
            name: g.name.clone(),
            timezone: g.timezone.map(|tz| tz.name().to_string()),
            reminder_days: g.reminder_days,
            notify_onboarding: g.notify_onboarding,
            notify_renewal: g.notify_renewal,
            notify_expiry_reminder: g.notify_expiry_reminder,
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
