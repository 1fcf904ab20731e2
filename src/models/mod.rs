pub mod export;
pub mod snippet;
pub mod storage;
pub mod store;

pub use export::{ExportData, ImportPayload, export_file_name};
pub use snippet::Snippet;
pub use storage::{Backend, FileStorage, KeyValueStore, MemoryStorage};
pub use store::{SnippetStore, StoreLabels};
