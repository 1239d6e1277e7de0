//! Caretide: multi-tenant clinic administration core.
//!
//! Three layers:
//! - domain: roles/sessions ([`auth`]), availability windows and derived
//!   time slots ([`scheduling`]), booking status workflow ([`booking`]),
//!   subscription plan gating ([`billing`])
//! - persistence: SQLite repositories under [`db`]
//! - transport: the admin HTTP API ([`api`]) and the console-side session
//!   controller ([`console`]) that the dashboard drives.

pub mod api;
pub mod auth;
pub mod billing;
pub mod booking;
pub mod config;
pub mod console;
pub mod db;
pub mod scheduling;
