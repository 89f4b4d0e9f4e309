//! Payment records kept on the billed client.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MembershipId, Timestamp};

/// How a payment was collected at the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    BankTransfer,
    Other,
}

/// One entry in a client's append-only payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: i64,
    pub method: PaymentMethod,
    pub paid_at: Timestamp,
    pub remarks: Option<String>,
    /// Grant the payment was collected for, if any.
    pub membership_id: Option<MembershipId>,
}
