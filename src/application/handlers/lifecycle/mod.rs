//! Lifecycle handlers.
//!
//! The engine that moves clients and their grants through the membership
//! lifecycle:
//!
//! ## Commands
//! - Onboarding a client, with dependents, onto a plan
//! - Renewing (now or in advance)
//! - Recording payments against an outstanding balance
//! - Cancelling a grant
//! - Daily reconciliation (promotion, expiry, reminders, retention)
//!
//! ## Queries
//! - Get a client with its linked grants
//! - Get a client's membership history and activity

mod cancel_membership;
mod get_client;
mod get_membership_history;
mod onboard_client;
mod reconcile_memberships;
mod record_payment;
mod renew_membership;
mod support;

pub use support::{DependentInput, LifecyclePolicy};

// Commands
pub use cancel_membership::{CancelMembershipCommand, CancelMembershipHandler};
pub use onboard_client::{OnboardClientCommand, OnboardClientHandler, OnboardClientResult};
pub use reconcile_memberships::{
    ReconcileMembershipsCommand, ReconcileMembershipsHandler, ReconciliationReport,
};
pub use record_payment::{RecordPaymentCommand, RecordPaymentHandler};
pub use renew_membership::{RenewMembershipCommand, RenewMembershipHandler, RenewMembershipResult};

// Queries
pub use get_client::{ClientView, GetClientHandler, GetClientQuery};
pub use get_membership_history::{
    GetMembershipHistoryHandler, GetMembershipHistoryQuery, MembershipHistory,
};
