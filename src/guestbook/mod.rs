//! Guestbook domain subsystem.
//!
//! # Data Flow
//! ```text
//! Read:  repository.rs → simulate get_messages → decode.rs → entry.rs (normalize, sort)
//!                      ↘ on any failure: sample dataset
//! Write: submission.rs → build → simulate → assemble → sign → send → confirm
//!                      → local_store.rs (bookkeeping only)
//! ```

pub mod decode;
pub mod entry;
pub mod local_store;
pub mod repository;
pub mod submission;

pub use decode::{DecodeError, RawEntry};
pub use entry::GuestbookEntry;
pub use local_store::{LocalMessageStore, StoredMessage};
pub use repository::{EntryRepository, EntrySource, FallbackCause, FetchOutcome};
pub use submission::{validate_message, MessageLengthError, SubmissionWorkflow, SubmitError};
