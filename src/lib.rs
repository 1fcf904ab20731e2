//! console-rules - saved JavaScript snippets you can edit, organize and run.
//!
//! The library holds everything the front ends share:
//! - [`models::SnippetStore`]: the ordered snippet collection mirrored to a key-value backend
//! - [`highlight`]: a lightweight JavaScript highlighter
//! - [`runner`]: the execution boundary with a one-run-at-a-time guard
//! - [`i18n`]: English and Portuguese strings
//! - [`config`]: TOML configuration and logging setup
//! - [`session`]: all of the above opened together for a front end

pub mod config;
pub mod error;
pub mod highlight;
pub mod i18n;
pub mod models;
pub mod runner;
pub mod search;
pub mod session;

pub use error::{ImportError, RunError, StorageError, StoreError};
pub use models::{FileStorage, KeyValueStore, MemoryStorage, Snippet, SnippetStore};
pub use session::Session;
