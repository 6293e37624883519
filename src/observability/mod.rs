//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stderr (pretty or JSON)
//!     → whichever metrics recorder the embedding binary installs
//! ```
//!
//! # Design Decisions
//! - Read-path fallbacks are logged and counted per cause even though the
//!   user only ever sees sample data
//! - Secrets and signed envelopes are never logged

pub mod logging;
pub mod metrics;
