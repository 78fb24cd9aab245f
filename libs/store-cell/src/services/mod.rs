pub mod autosave;
pub mod state;

pub use state::{backup_key, StateStore, StoreConfig};
