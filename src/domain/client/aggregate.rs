//! Client aggregate.
//!
//! A client is a person registered at a gym. The membership linkage
//! (`membership_status`, `active_membership`, `upcoming_membership`) is a
//! cache of grant state and is only changed through the `link_*`,
//! `promote_upcoming`, `mirror_*` and `clear_upcoming` methods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, GymId, MembershipId, Timestamp, ValidationError};
use crate::domain::membership::{AssignedMembership, MembershipStatus};

use super::{PaymentRecord, PhoneNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Role within the grant the client was last enrolled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Billed member of a grant.
    Primary,
    /// Shares a grant billed to someone else.
    Dependent,
}

/// Profile fields supplied when registering a new client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClientProfile {
    pub name: String,
    pub phone_number: String,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub gym_id: GymId,
    pub name: String,
    pub phone_number: PhoneNumber,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub role: ClientRole,
    membership_status: MembershipStatus,
    active_membership: Option<MembershipId>,
    upcoming_membership: Option<MembershipId>,
    membership_history: Vec<MembershipId>,
    payment_history: Vec<PaymentRecord>,
    balance: i64,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Client {
    /// Registers a never-enrolled client.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or malformed phone number.
    pub fn register(
        gym_id: GymId,
        profile: NewClientProfile,
        role: ClientRole,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let phone_number = PhoneNumber::parse(&profile.phone_number)?;

        Ok(Self {
            id: ClientId::new(),
            gym_id,
            name: name.to_string(),
            phone_number,
            gender: profile.gender,
            email: profile.email,
            date_of_birth: profile.date_of_birth,
            address: profile.address,
            emergency_contact: profile.emergency_contact,
            role,
            membership_status: MembershipStatus::default(),
            active_membership: None,
            upcoming_membership: None,
            membership_history: Vec::new(),
            payment_history: Vec::new(),
            balance: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn membership_status(&self) -> MembershipStatus {
        self.membership_status
    }

    pub fn active_membership(&self) -> Option<MembershipId> {
        self.active_membership
    }

    pub fn upcoming_membership(&self) -> Option<MembershipId> {
        self.upcoming_membership
    }

    pub fn membership_history(&self) -> &[MembershipId] {
        &self.membership_history
    }

    pub fn payment_history(&self) -> &[PaymentRecord] {
        &self.payment_history
    }

    /// Outstanding amount owed, in minor units.
    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn assign_role(&mut self, role: ClientRole, now: Timestamp) {
        self.role = role;
        self.updated_at = now;
    }

    /// Links a freshly created grant as active or upcoming according to its status.
    ///
    /// # Errors
    ///
    /// Fails for a `future` grant when another upcoming grant is already linked.
    pub fn link(&mut self, grant: &AssignedMembership, now: Timestamp) -> Result<(), ValidationError> {
        if grant.status == MembershipStatus::Future {
            self.link_upcoming(grant, now)
        } else {
            self.link_active(grant, now);
            Ok(())
        }
    }

    /// Makes `grant` the membership in force.
    pub fn link_active(&mut self, grant: &AssignedMembership, now: Timestamp) {
        self.active_membership = Some(grant.id);
        self.membership_status = grant.status;
        if self.upcoming_membership == Some(grant.id) {
            self.upcoming_membership = None;
        }
        self.push_history(grant.id);
        self.updated_at = now;
    }

    /// Stages `grant` to take over once it starts.
    ///
    /// A client with nothing in force shows `future` until then; otherwise the
    /// status keeps reflecting the current grant.
    ///
    /// # Errors
    ///
    /// Fails when a different upcoming grant is already linked.
    pub fn link_upcoming(
        &mut self,
        grant: &AssignedMembership,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        if let Some(existing) = self.upcoming_membership {
            if existing != grant.id {
                return Err(ValidationError::invalid_format(
                    "start_date",
                    format!("client {} already has upcoming membership {}", self.id, existing),
                ));
            }
        }
        self.upcoming_membership = Some(grant.id);
        if self.active_membership.is_none() {
            self.membership_status = MembershipStatus::Future;
        }
        self.push_history(grant.id);
        self.updated_at = now;
        Ok(())
    }

    /// Moves the upcoming grant into force after it has been activated.
    ///
    /// Returns false without changes if `grant` is not this client's upcoming one.
    pub fn promote_upcoming(&mut self, grant: &AssignedMembership, now: Timestamp) -> bool {
        if self.upcoming_membership != Some(grant.id) {
            return false;
        }
        self.link_active(grant, now);
        true
    }

    /// Copies an ended grant's status if it is still the one in force.
    ///
    /// Returns true if anything changed.
    pub fn mirror_expiry(&mut self, grant: &AssignedMembership, now: Timestamp) -> bool {
        if self.active_membership != Some(grant.id) || self.membership_status == grant.status {
            return false;
        }
        self.membership_status = grant.status;
        self.updated_at = now;
        true
    }

    /// Reflects a cancelled grant on this client, whether it was in force or upcoming.
    ///
    /// Returns true if anything changed.
    pub fn mirror_cancellation(&mut self, grant: &AssignedMembership, now: Timestamp) -> bool {
        if self.active_membership == Some(grant.id) {
            self.membership_status = grant.status;
            self.updated_at = now;
            true
        } else {
            self.clear_upcoming(grant.id, now)
        }
    }

    /// Drops the upcoming link if it points at `membership_id`.
    ///
    /// Returns true if anything changed.
    pub fn clear_upcoming(&mut self, membership_id: MembershipId, now: Timestamp) -> bool {
        if self.upcoming_membership != Some(membership_id) {
            return false;
        }
        self.upcoming_membership = None;
        if self.active_membership.is_none() {
            self.membership_status = MembershipStatus::Cancelled;
        }
        self.updated_at = now;
        true
    }

    /// Appends a collected payment to the history. Does not touch the balance.
    pub fn record_payment(&mut self, payment: PaymentRecord, now: Timestamp) {
        self.payment_history.push(payment);
        self.updated_at = now;
    }

    /// Increases the outstanding balance by an unpaid amount.
    ///
    /// # Errors
    ///
    /// Fails for a negative amount.
    pub fn charge(&mut self, amount: i64, now: Timestamp) -> Result<(), ValidationError> {
        if amount < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, amount));
        }
        self.balance = self.balance.saturating_add(amount);
        self.updated_at = now;
        Ok(())
    }

    /// Pays down the outstanding balance.
    ///
    /// # Errors
    ///
    /// Fails unless `0 < amount <= balance`.
    pub fn settle(&mut self, amount: i64, now: Timestamp) -> Result<(), ValidationError> {
        if amount <= 0 || amount > self.balance {
            return Err(ValidationError::out_of_range("amount", 1, self.balance, amount));
        }
        self.balance -= amount;
        self.updated_at = now;
        Ok(())
    }

    fn push_history(&mut self, membership_id: MembershipId) {
        if !self.membership_history.contains(&membership_id) {
            self.membership_history.push(membership_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client::PaymentMethod;
    use crate::domain::membership::{GrantOrigin, NewGrant};
    use crate::domain::plan::{MembershipPlan, NewPlan, PlanDuration, PlanType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn asha() -> Client {
        Client::register(
            GymId::new(),
            NewClientProfile {
                name: "  Asha  ".to_string(),
                phone_number: "9876543210".to_string(),
                gender: Some(Gender::Female),
                ..Default::default()
            },
            ClientRole::Primary,
            Timestamp::now(),
        )
        .unwrap()
    }

    fn grant(client: &Client, start: NaiveDate, today: NaiveDate) -> AssignedMembership {
        let plan = MembershipPlan::create(
            client.gym_id,
            NewPlan {
                plan_name: "Monthly".to_string(),
                duration: PlanDuration::Months(1),
                price: 1000,
                is_trial: false,
                plan_type: PlanType::Individual,
                members_allowed: 1,
            },
            Timestamp::now(),
        )
        .unwrap();
        AssignedMembership::grant(
            NewGrant {
                plan: &plan,
                origin: GrantOrigin::Onboarding,
                primary_member_id: client.id,
                dependent_ids: vec![],
                start_date: start,
                total_amount: 1000,
                payment_received: true,
            },
            today,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn register_trims_name_and_starts_unenrolled() {
        let client = asha();
        assert_eq!(client.name, "Asha");
        assert_eq!(client.membership_status(), MembershipStatus::Cancelled);
        assert!(client.active_membership().is_none());
        assert_eq!(client.balance(), 0);
    }

    #[test]
    fn register_rejects_blank_name() {
        let result = Client::register(
            GymId::new(),
            NewClientProfile {
                name: " ".to_string(),
                phone_number: "9876543210".to_string(),
                ..Default::default()
            },
            ClientRole::Primary,
            Timestamp::now(),
        );
        assert_eq!(result.unwrap_err(), ValidationError::empty_field("name"));
    }

    #[test]
    fn link_active_grant_mirrors_status() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let g = grant(&client, today, today);
        client.link(&g, Timestamp::now()).unwrap();
        assert_eq!(client.active_membership(), Some(g.id));
        assert_eq!(client.membership_status(), MembershipStatus::Active);
        assert_eq!(client.membership_history(), &[g.id]);
    }

    #[test]
    fn link_future_grant_on_new_client_shows_future() {
        let mut client = asha();
        let g = grant(&client, date(2025, 1, 6), date(2025, 1, 1));
        client.link(&g, Timestamp::now()).unwrap();
        assert_eq!(client.upcoming_membership(), Some(g.id));
        assert!(client.active_membership().is_none());
        assert_eq!(client.membership_status(), MembershipStatus::Future);
    }

    #[test]
    fn link_future_grant_keeps_current_status() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let current = grant(&client, today, today);
        client.link(&current, Timestamp::now()).unwrap();
        let next = grant(&client, date(2025, 1, 6), today);
        client.link(&next, Timestamp::now()).unwrap();
        assert_eq!(client.active_membership(), Some(current.id));
        assert_eq!(client.upcoming_membership(), Some(next.id));
        assert_eq!(client.membership_status(), MembershipStatus::Active);
    }

    #[test]
    fn second_upcoming_grant_is_rejected() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let first = grant(&client, date(2025, 1, 6), today);
        let second = grant(&client, date(2025, 2, 6), today);
        client.link(&first, Timestamp::now()).unwrap();
        assert!(client.link(&second, Timestamp::now()).is_err());
        assert_eq!(client.upcoming_membership(), Some(first.id));
    }

    #[test]
    fn promote_upcoming_moves_grant_into_force() {
        let mut client = asha();
        let mut g = grant(&client, date(2025, 1, 6), date(2025, 1, 1));
        client.link(&g, Timestamp::now()).unwrap();
        g.activate(Timestamp::now()).unwrap();

        assert!(client.promote_upcoming(&g, Timestamp::now()));
        assert_eq!(client.active_membership(), Some(g.id));
        assert!(client.upcoming_membership().is_none());
        assert_eq!(client.membership_status(), MembershipStatus::Active);
        assert!(!client.promote_upcoming(&g, Timestamp::now()));
    }

    #[test]
    fn mirror_expiry_ignores_grants_no_longer_in_force() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let mut old = grant(&client, today, today);
        client.link(&old, Timestamp::now()).unwrap();
        let new = grant(&client, date(2025, 2, 1), date(2025, 2, 1));
        client.link_active(&new, Timestamp::now());

        old.expire(Timestamp::now()).unwrap();
        assert!(!client.mirror_expiry(&old, Timestamp::now()));
        assert_eq!(client.membership_status(), MembershipStatus::Active);
    }

    #[test]
    fn mirror_expiry_applies_once() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let mut g = grant(&client, today, today);
        client.link(&g, Timestamp::now()).unwrap();
        g.expire(Timestamp::now()).unwrap();
        assert!(client.mirror_expiry(&g, Timestamp::now()));
        assert_eq!(client.membership_status(), MembershipStatus::Expired);
        assert!(!client.mirror_expiry(&g, Timestamp::now()));
    }

    #[test]
    fn cancelling_upcoming_only_grant_resets_status() {
        let mut client = asha();
        let mut g = grant(&client, date(2025, 1, 6), date(2025, 1, 1));
        client.link(&g, Timestamp::now()).unwrap();
        g.cancel(Timestamp::now()).unwrap();
        assert!(client.mirror_cancellation(&g, Timestamp::now()));
        assert!(client.upcoming_membership().is_none());
        assert_eq!(client.membership_status(), MembershipStatus::Cancelled);
    }

    #[test]
    fn charge_and_settle_balance() {
        let mut client = asha();
        client.charge(1500, Timestamp::now()).unwrap();
        assert_eq!(client.balance(), 1500);
        client.settle(500, Timestamp::now()).unwrap();
        assert_eq!(client.balance(), 1000);
        assert!(client.settle(1001, Timestamp::now()).is_err());
        assert!(client.settle(0, Timestamp::now()).is_err());
        assert!(client.charge(-1, Timestamp::now()).is_err());
    }

    #[test]
    fn record_payment_appends_history() {
        let mut client = asha();
        client.record_payment(
            PaymentRecord {
                amount: 1000,
                method: PaymentMethod::Upi,
                paid_at: Timestamp::now(),
                remarks: None,
                membership_id: None,
            },
            Timestamp::now(),
        );
        assert_eq!(client.payment_history().len(), 1);
        assert_eq!(client.balance(), 0);
    }

    #[test]
    fn serde_round_trip_preserves_private_linkage() {
        let mut client = asha();
        let today = date(2025, 1, 1);
        let g = grant(&client, today, today);
        client.link(&g, Timestamp::now()).unwrap();
        let json = serde_json::to_value(&client).unwrap();
        let back: Client = serde_json::from_value(json).unwrap();
        assert_eq!(back, client);
    }
}
