//! Metrics collection.
//!
//! # Metrics
//! - `guestbook_fallback_total` (counter): sample-data fallbacks by cause
//! - `guestbook_submissions_total` (counter): submissions by outcome
//! - `guestbook_rpc_failures_total` (counter): failed RPC calls by method
//!
//! Without an installed recorder these are no-ops, so library users decide
//! whether and where to export them.

use metrics::counter;

/// Record a read-path fallback to sample data.
pub fn record_fallback(cause: &'static str) {
    counter!("guestbook_fallback_total", "cause" => cause).increment(1);
}

/// Record the outcome of a submission attempt.
pub fn record_submission(outcome: &'static str) {
    counter!("guestbook_submissions_total", "outcome" => outcome).increment(1);
}

/// Record an RPC call that failed on every endpoint or was rejected by the node.
pub fn record_rpc_failure(method: &'static str) {
    counter!("guestbook_rpc_failures_total", "method" => method).increment(1);
}
