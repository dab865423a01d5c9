//! User Registry - user management service
//!
//! Registration, login, password reset and admin user management over a
//! REST API, backed by in-memory stores.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and logic
//! - **services**: Application use cases and business logic
//! - **infra**: Storage and outbound email
//! - **jobs**: Background email worker
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared types (pagination, responses)
//! - **utils**: Email templates
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! user-registry serve --port 3000
//!
//! # Preview an email
//! user-registry templates render welcome --var username=jdoe --var email=jdoe@example.com
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole, UserStatus};
pub use errors::{AppError, AppResult};
