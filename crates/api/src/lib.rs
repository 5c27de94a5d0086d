//! HTTP API: router, auth middleware, permission gate, error mapping.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
