//! Sudsy web library.
//!
//! The laundry booking API as a library, so the binary, the CLI, and the
//! integration tests share one router and one store implementation.
//!
//! # Security
//!
//! This crate holds the Paystack secret key (API calls and webhook
//! signatures) and the WhatsApp Cloud API token. Both are wrapped in
//! `SecretString` and redacted from `Debug` output.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::WebConfig;
pub use routes::app;
pub use state::AppState;
