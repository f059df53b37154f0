//! Signed, expiring session tokens with revocation-safe logout.
//!
//! `auth::TokenAuthority` is the core; `session::SessionManager` ties it to
//! credential verification and cookie persistence, and `startup::run`
//! serves it over HTTP.

pub mod auth;
pub mod configuration;
pub mod cookies;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod startup;
pub mod telemetry;
pub mod validators;
