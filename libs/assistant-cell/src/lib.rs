pub mod error;
pub mod models;
pub mod services;
pub mod handlers;
pub mod router;

pub use error::*;
pub use models::*;
pub use services::AssistantClient;
pub use router::create_assistant_router;
