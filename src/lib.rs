// AI Farming API - community, knowledge base and farm records for poultry farmers

// Domain models and request schemas
pub mod models;

// Persistence: repository trait with Postgres and in-memory backends
pub mod store;

// Pure analytics over farm logs
pub mod analytics;

// Tokens, passwords and request guards
pub mod auth;

// Upstream services: LLM assistant and image storage
pub mod ai;
pub mod media;

// HTTP layer
pub mod api;
pub mod app_state;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
