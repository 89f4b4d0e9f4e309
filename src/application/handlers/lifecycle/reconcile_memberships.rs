//! ReconcileMembershipsHandler - Daily batch that moves grants through their lifecycle.
//!
//! Steps run in a fixed order for each gym, against the gym-local "today":
//!
//! 1. **Promotion** - upcoming grants whose start date arrived come into force
//! 2. **Expiry** - grants in force whose end date passed are expired
//! 3. **Reminders** - members whose grant ends in `reminder_days` are messaged
//! 4. **Retention** - activities past the retention window are purged
//!
//! Promotion runs before expiry so a renewal starting today is never shown as
//! expired in between. Every step checks persisted status before acting, so a
//! second run on the same day changes nothing. Each grant is its own unit of
//! work; a failing grant is logged and skipped.

use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::domain::activity::Activity;
use crate::domain::client::Client;
use crate::domain::foundation::{GymCalendar, GymId, MembershipId, Timestamp};
use crate::domain::gym::GymSettings;
use crate::domain::membership::{AssignedMembership, LifecycleError, MembershipStatus};
use crate::ports::{
    Clock, GymDirectory, LifecycleChanges, LifecycleStore, NotificationTemplate, Notifier,
};

use super::support::{self, LifecyclePolicy};

/// Command to run reconciliation for one gym, or every gym when `gym_id` is `None`.
#[derive(Debug, Clone, Default)]
pub struct ReconcileMembershipsCommand {
    pub gym_id: Option<GymId>,
}

/// Counts of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReconciliationReport {
    pub gyms: usize,
    pub promoted: usize,
    pub expired: usize,
    pub reminded: usize,
    pub purged: u64,
    pub failed: usize,
}

pub struct ReconcileMembershipsHandler {
    gyms: Arc<dyn GymDirectory>,
    store: Arc<dyn LifecycleStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
    /// Grants already reminded per gym for the current day, so reruns don't repeat them.
    reminded: Mutex<HashMap<GymId, (NaiveDate, HashSet<MembershipId>)>>,
}

impl ReconcileMembershipsHandler {
    pub fn new(
        gyms: Arc<dyn GymDirectory>,
        store: Arc<dyn LifecycleStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            gyms,
            store,
            notifier,
            clock,
            policy,
            reminded: Mutex::new(HashMap::new()),
        }
    }

    /// Runs reconciliation.
    ///
    /// # Errors
    ///
    /// Only fails when the gyms to reconcile cannot be determined. Failures
    /// inside a gym are counted in the report instead.
    pub async fn handle(
        &self,
        cmd: ReconcileMembershipsCommand,
    ) -> Result<ReconciliationReport, LifecycleError> {
        let gyms = match cmd.gym_id {
            Some(gym_id) => vec![support::load_gym(self.gyms.as_ref(), &gym_id).await?],
            None => self.gyms.list().await?,
        };

        let now = self.clock.now();
        let mut report = ReconciliationReport::default();
        for gym in &gyms {
            report.gyms += 1;
            let span = tracing::info_span!("reconcile_gym", gym_id = %gym.gym_id);
            self.reconcile_gym(gym, now, &mut report)
                .instrument(span)
                .await;
        }

        tracing::info!(
            gyms = report.gyms,
            promoted = report.promoted,
            expired = report.expired,
            reminded = report.reminded,
            purged = report.purged,
            failed = report.failed,
            "Reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_gym(&self, gym: &GymSettings, now: Timestamp, report: &mut ReconciliationReport) {
        let calendar = gym.calendar(self.policy.default_timezone);
        let today = calendar.today(now);
        tracing::debug!(%today, "Reconciling gym");

        // 1. Promotion
        match self.store.clients_with_upcoming(&gym.gym_id).await {
            Ok(clients) => self.promote(gym, clients, today, now, report).await,
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Could not load upcoming memberships");
            }
        }

        // 2. Expiry
        match self.store.memberships_due_for_expiry(&gym.gym_id, today).await {
            Ok(due) => {
                for grant in due {
                    let membership_id = grant.id;
                    match self.expire_grant(grant, now).await {
                        Ok(()) => report.expired += 1,
                        Err(e) => {
                            report.failed += 1;
                            tracing::warn!(%membership_id, error = %e, "Expiry skipped");
                        }
                    }
                }
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Could not load memberships due for expiry");
            }
        }

        // 3. Reminders
        if gym.notify_expiry_reminder {
            if let Err(e) = self.send_reminders(gym, today, report).await {
                report.failed += 1;
                tracing::error!(error = %e, "Could not send expiry reminders");
            }
        }

        // 4. Retention
        match self.purge(gym, &calendar, today).await {
            Ok(purged) => report.purged += purged,
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Could not purge old activities");
            }
        }
    }

    async fn promote(
        &self,
        gym: &GymSettings,
        clients: Vec<Client>,
        today: NaiveDate,
        now: Timestamp,
        report: &mut ReconciliationReport,
    ) {
        let mut by_grant: BTreeMap<MembershipId, Vec<Client>> = BTreeMap::new();
        for client in clients {
            if let Some(upcoming) = client.upcoming_membership() {
                by_grant.entry(upcoming).or_default().push(client);
            }
        }

        let ids: Vec<MembershipId> = by_grant.keys().copied().collect();
        let grants = match self.store.find_memberships(&gym.gym_id, &ids).await {
            Ok(grants) => grants,
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Could not load upcoming grants");
                return;
            }
        };

        for grant in grants {
            if grant.start_date > today {
                continue;
            }
            let Some(clients) = by_grant.remove(&grant.id) else {
                continue;
            };
            let membership_id = grant.id;
            match self.promote_grant(grant, clients, now).await {
                Ok(true) => report.promoted += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(%membership_id, error = %e, "Promotion skipped");
                }
            }
        }
    }

    /// Brings one upcoming grant into force for all members waiting on it.
    ///
    /// Returns true if the grant itself was activated by this call.
    async fn promote_grant(
        &self,
        mut grant: AssignedMembership,
        mut clients: Vec<Client>,
        now: Timestamp,
    ) -> Result<bool, LifecycleError> {
        let mut changes = LifecycleChanges::default();
        let activated = grant.status == MembershipStatus::Future;
        if activated {
            grant.activate(now)?;
            changes.update_membership(grant.clone());
            changes.log(Activity::activation(&grant, now));
        }

        for client in clients.iter_mut() {
            let changed = if grant.status == MembershipStatus::Cancelled {
                client.clear_upcoming(grant.id, now)
            } else {
                client.promote_upcoming(&grant, now)
            };
            if changed {
                changes.update_client(client.clone());
            }
        }

        if !changes.is_empty() {
            self.store.apply(changes).await?;
        }
        if activated {
            tracing::info!(membership_id = %grant.id, status = %grant.status, "Membership activated");
        }
        Ok(activated)
    }

    /// Ends one grant and mirrors the result onto members still using it.
    async fn expire_grant(&self, mut grant: AssignedMembership, now: Timestamp) -> Result<(), LifecycleError> {
        grant.expire(now)?;

        let mut changes = LifecycleChanges::default();
        for mut client in self.store.find_clients(&grant.gym_id, &grant.member_ids).await? {
            if client.mirror_expiry(&grant, now) {
                changes.update_client(client);
            }
        }
        changes.log(Activity::expiry(&grant, now));
        changes.update_membership(grant.clone());
        self.store.apply(changes).await?;

        tracing::info!(membership_id = %grant.id, status = %grant.status, "Membership expired");
        Ok(())
    }

    async fn send_reminders(
        &self,
        gym: &GymSettings,
        today: NaiveDate,
        report: &mut ReconciliationReport,
    ) -> Result<(), LifecycleError> {
        let Some(ending_on) = today.checked_add_days(Days::new(u64::from(gym.reminder_days))) else {
            return Ok(());
        };
        let grants = self.store.memberships_ending_on(&gym.gym_id, ending_on).await?;

        let mut reminded = self.reminded.lock().await;
        let done = reminded.entry(gym.gym_id).or_insert_with(|| (today, HashSet::new()));
        if done.0 != today {
            *done = (today, HashSet::new());
        }

        let mut requests = Vec::new();
        for grant in &grants {
            if done.1.contains(&grant.id) {
                continue;
            }
            let members = match self.store.find_clients(&gym.gym_id, &grant.member_ids).await {
                Ok(members) => members,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(membership_id = %grant.id, error = %e, "Reminder skipped");
                    continue;
                }
            };
            done.1.insert(grant.id);
            for client in members {
                // Members who already renewed don't need a nudge
                if client.active_membership() != Some(grant.id) || client.upcoming_membership().is_some() {
                    continue;
                }
                requests.push(support::notification(
                    gym,
                    &client,
                    NotificationTemplate::ExpiryReminder,
                    vec![
                        client.name.clone(),
                        grant.plan_name.clone(),
                        support::format_date(grant.end_date),
                    ],
                ));
            }
        }
        drop(reminded);

        report.reminded += support::dispatch(self.notifier.as_ref(), requests).await;
        Ok(())
    }

    async fn purge(
        &self,
        gym: &GymSettings,
        calendar: &GymCalendar,
        today: NaiveDate,
    ) -> Result<u64, LifecycleError> {
        let retention = Days::new(u64::from(self.policy.activity_retention_days));
        let Some(oldest_kept) = today.checked_sub_days(retention) else {
            return Ok(0);
        };
        let purged = self
            .store
            .purge_activities_before(&gym.gym_id, calendar.start_of_day(oldest_kept))
            .await?;
        if purged > 0 {
            tracing::info!(purged, "Purged old activities");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::{InMemoryGymDirectory, InMemoryLifecycleStore, InMemoryPlanCatalog};
    use crate::adapters::notify::RecordingNotifier;
    use crate::application::handlers::lifecycle::{
        DependentInput, OnboardClientCommand, OnboardClientHandler, RenewMembershipCommand,
        RenewMembershipHandler,
    };
    use crate::domain::activity::ActivityType;
    use crate::domain::client::{NewClientProfile, PaymentMethod, PhoneNumber};
    use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
    use crate::domain::plan::{MembershipPlan, NewPlan, PlanDuration, PlanType};
    use crate::ports::PlanCatalog;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    /// Delegates to the in-memory store but refuses batches touching one grant
    /// and reads including one client.
    struct FlakyStore {
        inner: Arc<InMemoryLifecycleStore>,
        poisoned: std::sync::Mutex<Option<MembershipId>>,
        unreadable: std::sync::Mutex<Option<ClientId>>,
    }

    impl FlakyStore {
        fn poison(&self, id: MembershipId) {
            *self.poisoned.lock().unwrap() = Some(id);
        }

        fn fail_reads_of(&self, id: Option<ClientId>) {
            *self.unreadable.lock().unwrap() = id;
        }
    }

    #[async_trait]
    impl LifecycleStore for FlakyStore {
        async fn find_client(&self, g: &GymId, c: &ClientId) -> Result<Option<Client>, DomainError> {
            self.inner.find_client(g, c).await
        }
        async fn find_clients(&self, g: &GymId, ids: &[ClientId]) -> Result<Vec<Client>, DomainError> {
            let unreadable = *self.unreadable.lock().unwrap();
            if unreadable.is_some_and(|id| ids.contains(&id)) {
                return Err(DomainError::new(ErrorCode::DatabaseError, "Simulated read failure"));
            }
            self.inner.find_clients(g, ids).await
        }
        async fn find_client_by_phone(&self, g: &GymId, p: &PhoneNumber) -> Result<Option<Client>, DomainError> {
            self.inner.find_client_by_phone(g, p).await
        }
        async fn find_membership(&self, g: &GymId, m: &MembershipId) -> Result<Option<AssignedMembership>, DomainError> {
            self.inner.find_membership(g, m).await
        }
        async fn find_memberships(&self, g: &GymId, ids: &[MembershipId]) -> Result<Vec<AssignedMembership>, DomainError> {
            self.inner.find_memberships(g, ids).await
        }
        async fn clients_with_upcoming(&self, g: &GymId) -> Result<Vec<Client>, DomainError> {
            self.inner.clients_with_upcoming(g).await
        }
        async fn memberships_due_for_expiry(&self, g: &GymId, d: NaiveDate) -> Result<Vec<AssignedMembership>, DomainError> {
            self.inner.memberships_due_for_expiry(g, d).await
        }
        async fn memberships_ending_on(&self, g: &GymId, d: NaiveDate) -> Result<Vec<AssignedMembership>, DomainError> {
            self.inner.memberships_ending_on(g, d).await
        }
        async fn list_activities(&self, g: &GymId, m: Option<&ClientId>, l: usize) -> Result<Vec<Activity>, DomainError> {
            self.inner.list_activities(g, m, l).await
        }
        async fn apply(&self, changes: LifecycleChanges) -> Result<(), DomainError> {
            let poisoned = *self.poisoned.lock().unwrap();
            if let Some(id) = poisoned {
                if changes.updated_memberships.iter().any(|m| m.id == id) {
                    return Err(DomainError::new(ErrorCode::DatabaseError, "Simulated write failure"));
                }
            }
            self.inner.apply(changes).await
        }
        async fn purge_activities_before(&self, g: &GymId, cutoff: Timestamp) -> Result<u64, DomainError> {
            self.inner.purge_activities_before(g, cutoff).await
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        gym_id: GymId,
        plan: MembershipPlan,
        store: Arc<InMemoryLifecycleStore>,
        flaky: Arc<FlakyStore>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<FixedClock>,
        onboard: OnboardClientHandler,
        renew: RenewMembershipHandler,
        reconcile: ReconcileMembershipsHandler,
    }

    // 2025-01-01 10:00 in Kolkata.
    fn start() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2025, 1, 1, 4, 30, 0).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn fixture() -> Fixture {
        let gym_id = GymId::new();
        let gyms = Arc::new(InMemoryGymDirectory::with_gyms([GymSettings::new(gym_id, "Iron Temple")]));
        let plans = Arc::new(InMemoryPlanCatalog::new());
        let store = Arc::new(InMemoryLifecycleStore::new());
        let flaky = Arc::new(FlakyStore {
            inner: store.clone(),
            poisoned: std::sync::Mutex::new(None),
            unreadable: std::sync::Mutex::new(None),
        });
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(FixedClock::new(start()));

        let plan = MembershipPlan::create(
            gym_id,
            NewPlan {
                plan_name: "Monthly".to_string(),
                duration: PlanDuration::Months(1),
                price: 1000,
                is_trial: false,
                plan_type: PlanType::Couple,
                members_allowed: 2,
            },
            start(),
        )
        .unwrap();
        plans.save_plan(&plan).await.unwrap();

        let policy = LifecyclePolicy::default();
        Fixture {
            gym_id,
            plan,
            onboard: OnboardClientHandler::new(
                gyms.clone(),
                plans.clone(),
                store.clone(),
                notifier.clone(),
                clock.clone(),
                policy,
            ),
            renew: RenewMembershipHandler::new(
                gyms.clone(),
                plans.clone(),
                store.clone(),
                notifier.clone(),
                clock.clone(),
                policy,
            ),
            reconcile: ReconcileMembershipsHandler::new(
                gyms,
                flaky.clone(),
                notifier.clone(),
                clock.clone(),
                policy,
            ),
            store,
            flaky,
            notifier,
            clock,
        }
    }

    fn profile(name: &str, phone: &str) -> NewClientProfile {
        NewClientProfile {
            name: name.to_string(),
            phone_number: phone.to_string(),
            ..Default::default()
        }
    }

    async fn onboard(f: &Fixture, name: &str, phone: &str, dependents: Vec<DependentInput>) -> Client {
        f.onboard
            .handle(OnboardClientCommand {
                gym_id: f.gym_id,
                primary: profile(name, phone),
                dependents,
                plan_id: f.plan.id,
                method: PaymentMethod::Cash,
                payment_received: true,
                start_date: None,
                amount: None,
                remarks: None,
            })
            .await
            .unwrap()
            .client
    }

    async fn renew_on(f: &Fixture, client: &Client, start_date: NaiveDate) -> AssignedMembership {
        f.renew
            .handle(RenewMembershipCommand {
                gym_id: f.gym_id,
                client_id: client.id,
                plan_id: f.plan.id,
                dependents: vec![],
                method: PaymentMethod::Cash,
                payment_received: true,
                start_date: Some(start_date),
                amount: None,
                remarks: None,
            })
            .await
            .unwrap()
            .membership
    }

    async fn client(f: &Fixture, id: ClientId) -> Client {
        f.store.find_client(&f.gym_id, &id).await.unwrap().unwrap()
    }

    async fn run(f: &Fixture) -> ReconciliationReport {
        f.reconcile
            .handle(ReconcileMembershipsCommand::default())
            .await
            .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Promotion and Expiry
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn expires_lapsed_grant_and_mirrors_to_members() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![DependentInput::New(profile("Vikram", "9000000002"))]).await;

        f.clock.advance_days(31); // Feb 1
        let report = run(&f).await;
        assert_eq!(report.expired, 1);

        let asha = client(&f, asha.id).await;
        assert_eq!(asha.membership_status(), MembershipStatus::Expired);
        let grant = f.store.find_membership(&f.gym_id, &asha.active_membership().unwrap()).await.unwrap().unwrap();
        let vikram = client(&f, grant.member_ids[1]).await;
        assert_eq!(vikram.membership_status(), MembershipStatus::Expired);

        let expiries: Vec<_> = f
            .store
            .activities()
            .await
            .into_iter()
            .filter(|a| a.activity_type == ActivityType::Expiry)
            .collect();
        assert_eq!(expiries.len(), 1);
    }

    #[tokio::test]
    async fn grant_is_not_expired_on_its_last_day() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        f.clock.advance_days(30); // Jan 31
        let report = run(&f).await;
        assert_eq!(report.expired, 0);
        assert_eq!(client(&f, asha.id).await.membership_status(), MembershipStatus::Active);
    }

    #[tokio::test]
    async fn promotion_runs_before_expiry() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        let old_id = asha.active_membership().unwrap();
        let renewed = renew_on(&f, &asha, date(2025, 2, 1)).await;

        f.clock.advance_days(31); // Feb 1: old ended yesterday, renewal starts today
        let report = run(&f).await;
        assert_eq!(report.promoted, 1);
        assert_eq!(report.expired, 1);

        let asha = client(&f, asha.id).await;
        assert_eq!(asha.membership_status(), MembershipStatus::Active);
        assert_eq!(asha.active_membership(), Some(renewed.id));
        assert!(asha.upcoming_membership().is_none());

        let old = f.store.find_membership(&f.gym_id, &old_id).await.unwrap().unwrap();
        assert_eq!(old.status, MembershipStatus::Expired);
    }

    #[tokio::test]
    async fn future_grant_waits_until_start_date() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        renew_on(&f, &asha, date(2025, 2, 1)).await;

        f.clock.advance_days(10);
        let report = run(&f).await;
        assert_eq!(report.promoted, 0);
        assert!(client(&f, asha.id).await.upcoming_membership().is_some());
    }

    #[tokio::test]
    async fn second_run_same_day_changes_nothing() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        renew_on(&f, &asha, date(2025, 2, 1)).await;
        onboard(&f, "Ravi", "9123456789", vec![]).await;

        f.clock.advance_days(31);
        run(&f).await;
        let clients_after_first = client(&f, asha.id).await;
        let memberships_after_first = f.store.memberships(&f.gym_id).await;
        let activities_after_first = f.store.activities().await.len();

        let report = run(&f).await;
        assert_eq!(report.promoted, 0);
        assert_eq!(report.expired, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(client(&f, asha.id).await, clients_after_first);
        assert_eq!(f.store.memberships(&f.gym_id).await, memberships_after_first);
        assert_eq!(f.store.activities().await.len(), activities_after_first);
    }

    #[tokio::test]
    async fn failing_grant_does_not_stop_the_batch() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        let ravi = onboard(&f, "Ravi", "9123456789", vec![]).await;
        f.flaky.poison(asha.active_membership().unwrap());

        f.clock.advance_days(31);
        let report = run(&f).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.expired, 1);
        assert_eq!(client(&f, asha.id).await.membership_status(), MembershipStatus::Active);
        assert_eq!(client(&f, ravi.id).await.membership_status(), MembershipStatus::Expired);
    }

    #[tokio::test]
    async fn cancelled_upcoming_grant_is_cleared_not_promoted() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        let mut renewed = renew_on(&f, &asha, date(2025, 1, 10)).await;
        renewed.cancel(f.clock.now()).unwrap();
        let mut changes = LifecycleChanges::default();
        changes.update_membership(renewed.clone());
        f.store.apply(changes).await.unwrap();

        f.clock.advance_days(9);
        let report = run(&f).await;
        assert_eq!(report.promoted, 0);
        let asha = client(&f, asha.id).await;
        assert!(asha.upcoming_membership().is_none());
        assert_eq!(asha.membership_status(), MembershipStatus::Active);
    }

    #[tokio::test]
    async fn logs_one_activation_per_grant() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        f.renew
            .handle(RenewMembershipCommand {
                gym_id: f.gym_id,
                client_id: asha.id,
                plan_id: f.plan.id,
                dependents: vec![DependentInput::New(profile("Vikram", "9000000002"))],
                method: PaymentMethod::Cash,
                payment_received: true,
                start_date: Some(date(2025, 1, 20)),
                amount: None,
                remarks: None,
            })
            .await
            .unwrap();

        f.clock.advance_days(19);
        let report = run(&f).await;
        assert_eq!(report.promoted, 1);

        let activations = f
            .store
            .activities()
            .await
            .into_iter()
            .filter(|a| a.title == "Membership activated")
            .count();
        assert_eq!(activations, 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Reminders and Retention
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reminds_members_three_days_before_end_once_per_day() {
        let f = fixture().await;
        onboard(&f, "Asha", "9876543210", vec![]).await;

        f.clock.advance_days(27); // Jan 28, grant ends Jan 31
        let first = run(&f).await;
        let second = run(&f).await;
        assert_eq!(first.reminded, 1);
        assert_eq!(second.reminded, 0);

        let sent = f.notifier.sent_with(NotificationTemplate::ExpiryReminder).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].params, vec!["Asha", "Monthly", "31 Jan 2025"]);
    }

    #[tokio::test]
    async fn unreadable_members_do_not_block_other_reminders() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        onboard(&f, "Ravi", "9876543211", vec![]).await;

        f.clock.advance_days(27); // Jan 28, both grants end Jan 31
        f.flaky.fail_reads_of(Some(asha.id));
        let first = run(&f).await;
        assert_eq!(first.reminded, 1);
        assert_eq!(first.failed, 1);

        let sent = f.notifier.sent_with(NotificationTemplate::ExpiryReminder).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].params[0], "Ravi");

        // A rerun the same day picks up the skipped grant only
        f.flaky.fail_reads_of(None);
        let retry = run(&f).await;
        assert_eq!(retry.reminded, 1);
        assert_eq!(retry.failed, 0);

        let sent = f.notifier.sent_with(NotificationTemplate::ExpiryReminder).await;
        let names: Vec<&str> = sent.iter().map(|r| r.params[0].as_str()).collect();
        assert_eq!(names, vec!["Ravi", "Asha"]);
    }

    #[tokio::test]
    async fn skips_reminder_for_members_who_renewed() {
        let f = fixture().await;
        let asha = onboard(&f, "Asha", "9876543210", vec![]).await;
        renew_on(&f, &asha, date(2025, 2, 1)).await;

        f.clock.advance_days(27);
        let report = run(&f).await;
        assert_eq!(report.reminded, 0);
    }

    #[tokio::test]
    async fn purges_activities_past_retention() {
        let f = fixture().await;
        onboard(&f, "Asha", "9876543210", vec![]).await;

        f.clock.advance_days(120);
        let report = run(&f).await;
        assert_eq!(report.purged, 1);
        // The expiry logged in this run is recent and kept
        let remaining = f.store.activities().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].activity_type, ActivityType::Expiry);
    }

    #[tokio::test]
    async fn single_gym_run_rejects_unknown_gym() {
        let f = fixture().await;
        let result = f
            .reconcile
            .handle(ReconcileMembershipsCommand {
                gym_id: Some(GymId::new()),
            })
            .await;
        assert!(matches!(result, Err(LifecycleError::GymNotFound(_))));
    }
}
