//! Stellar Guestbook Client Library
//!
//! Reads and appends short messages to a Soroban guestbook contract.
//!
//! ```text
//!   config ──▶ blockchain (wallet, RPC client, transactions)
//!                 │
//!                 ▼
//!             guestbook (repository, submission, local store)
//!                 │
//!                 ▼
//!               app (session, form, entry list, notifications)
//! ```

pub mod app;
pub mod blockchain;
pub mod config;
pub mod guestbook;
pub mod observability;

pub use app::GuestbookApp;
pub use config::GuestbookConfig;
pub use guestbook::{EntryRepository, GuestbookEntry, SubmissionWorkflow};
