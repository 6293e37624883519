//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)  or  built-in testnet defaults
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GuestbookConfig (validated, immutable)
//!     → handed to the RPC client, repository, workflow and app at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing reads module-level constants
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GuestbookConfig;
pub use schema::{NetworkConfig, ReaderConfig, SubmissionConfig, WalletConfig};
pub use schema::{ObservabilityConfig, StorageConfig};
