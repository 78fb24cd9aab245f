pub mod error;
pub mod models;
pub mod template;
pub mod services;
pub mod handlers;
pub mod router;

pub use error::*;
pub use models::*;
pub use router::create_practice_router;
