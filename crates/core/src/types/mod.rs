//! Validated domain values.

pub mod contact;
pub mod id;
pub mod money;
pub mod status;

pub use contact::{Email, EmailError, PhoneError, PhoneNumber};
pub use id::*;
pub use money::{Kobo, OrderAmounts, OrderAmountsError};
pub use status::*;
