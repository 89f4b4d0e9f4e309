//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::gym::{SaveGymSettingsCommand, SaveGymSettingsHandler};
pub use handlers::lifecycle::{
    CancelMembershipCommand, CancelMembershipHandler, ClientView, DependentInput,
    GetClientHandler, GetClientQuery, GetMembershipHistoryHandler, GetMembershipHistoryQuery,
    LifecyclePolicy, MembershipHistory, OnboardClientCommand, OnboardClientHandler,
    OnboardClientResult, ReconcileMembershipsCommand, ReconcileMembershipsHandler,
    ReconciliationReport, RecordPaymentCommand, RecordPaymentHandler, RenewMembershipCommand,
    RenewMembershipHandler, RenewMembershipResult,
};
pub use handlers::plan::{
    CreatePlanCommand, CreatePlanHandler, DeactivatePlanCommand, DeactivatePlanHandler,
    ListPlansHandler, ListPlansQuery,
};
