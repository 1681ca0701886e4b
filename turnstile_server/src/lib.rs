//! The auth service and the traffic-log service
//!
//! The auth service owns the process-wide [`Verifier`](turnstile_oauth2::Verifier).
//! It obtains access tokens from the identity provider on behalf of its
//! clients and answers authorization checks for other services. The
//! traffic-log service stores captured HTTP exchanges and delegates every
//! authorization decision to the auth service.
//!
//! Both binaries read their settings from the environment (a `.env` file is
//! honored) and log through `tracing`, with a generated `x-request-id`
//! attached to every request span.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod auth;
pub mod config;
pub mod credentials;
pub mod gate;
pub mod telemetry;
pub mod traffic_logs;
