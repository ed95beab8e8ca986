// DocQuery - ask questions about an uploaded document and stream the answer

pub mod config;
pub mod types;
pub mod models;
pub mod extract;
pub mod prompt;
pub mod llm;
pub mod pipeline;
pub mod routes;
pub mod middleware;
pub mod utils;

pub use models::AppState;
pub use types::{AppError, AppResult};
