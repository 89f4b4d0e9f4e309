//! Client domain module.
//!
//! - `aggregate` - Client record and its membership linkage
//! - `phone` - PhoneNumber value object
//! - `payment` - Payment history entries

mod aggregate;
mod payment;
mod phone;

pub use aggregate::{Client, ClientRole, Gender, NewClientProfile};
pub use payment::{PaymentMethod, PaymentRecord};
pub use phone::PhoneNumber;
