//! HTTP endpoint for PayFast Instant Transaction Notifications.
//!
//! Every notification is acknowledged with `200 Success` straight away; the
//! three trust checks from [`itn`] then run on a background task.
//!
//! # Modules
//!
//! - [`routes`] — HTTP endpoints (payment_notify, health, metrics)
//! - [`state`] — Shared [`AppState`](state::AppState)
//! - [`config`] — Environment configuration ([`ServerConfig`](config::ServerConfig))
//! - [`alert`] — Signed alert webhooks for notifications that fail verification
//! - [`metrics`] — Prometheus counters for notifications and check results

pub mod alert;
pub mod config;
pub mod metrics;
pub mod routes;
pub mod state;
