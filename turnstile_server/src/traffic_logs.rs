//! The traffic-log service: storage of captured HTTP exchanges
//!
//! Every route except `/echo` is guarded. Reads need the
//! `traffic_logs:read` scope and writes need `traffic_logs:write`; the
//! decision is made by whatever [`AuthGate`](turnstile_axum::AuthGate) the
//! router is given.

mod model;
mod repository;
mod routes;

pub use model::{Endpoint, Header, InvalidTrafficLog, TrafficLog, TrafficLogPatch};
pub use repository::{InMemoryTrafficLogs, TrafficLogNotFound, TrafficLogRepository};
pub use routes::{router, ReadTrafficLogs, TrafficLogResponse, TrafficLogState, WriteTrafficLogs};
