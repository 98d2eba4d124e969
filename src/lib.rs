pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod retrieval;
pub mod server;
pub mod storm;

// Re-export commonly used types
pub use config::Config;
pub use error::{StormError, StormResult};
pub use server::{AppState, build_app, serve};
