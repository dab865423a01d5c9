//! CLI module - Command-line interface for the application.
//!
//! - `serve` - Start the HTTP server
//! - `templates` - List and render email templates

pub mod args;

pub use args::{Cli, Commands};
