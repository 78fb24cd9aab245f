pub mod error;
pub mod storage;
pub mod snapshot;
pub mod services;
pub mod handlers;
pub mod router;

pub use error::*;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use snapshot::{CrmData, CrmField, LoadSource, MergedSnapshot, RejectedField};
pub use services::{backup_key, StateStore, StoreConfig};
pub use router::create_store_router;
