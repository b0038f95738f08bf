//! Sudsy Core - domain types shared by the API server and the CLI.
//!
//! Nothing here performs I/O. With the `postgres` feature the types also
//! implement the `sqlx` encode/decode traits the store needs.
//!
//! # Modules
//!
//! - [`types`] - Document IDs, kobo amounts, contact details, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
