//! Token lifecycle orchestration: issue, renew, and revoke service tokens behind leases.
//!
//! Every operation resolves its role from storage, borrows the shared client from the cache,
//! and performs exactly one remote call. The engine keeps no per-token state between calls;
//! the remote service and the host's lease tracker own the token's lifecycle.

pub mod common;

mod issue;
mod metrics;
mod renew;
mod revoke;

pub use metrics::LifecycleMetrics;
