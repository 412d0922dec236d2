//! Client for the remote GraphQL product API.
//!
//! Calls are paced against a budget estimate built from the cost metadata the
//! API returns, throttled calls are retried with server-directed backoff, and
//! every completed call reports its latency to the stats collector.

pub mod client;
pub mod queries;
pub mod transport;
pub mod types;

pub use client::{parse_retry_after, RetryPolicy, UpstreamClient};
pub use transport::{HttpTransport, ScriptedTransport, Transport, TransportResponse};
