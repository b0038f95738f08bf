//! Business logic services.
//!
//! # Services
//!
//! - [`auth`] - Customer and admin password authentication
//! - [`booking`] - Pricing, loyalty redemption, and order creation
//! - [`order_admin`] - Admin status updates, assignment, and reminders
//! - [`receipt`] - Receipts joined from orders, items, and services
//! - [`payments`] - Paystack checkout, verification, and webhook signatures
//! - [`webhook`] - Applying verified payment webhook events
//! - [`notifications`] - WhatsApp customer messages

pub mod auth;
pub mod booking;
pub mod notifications;
pub mod order_admin;
pub mod payments;
pub mod receipt;
pub mod webhook;
