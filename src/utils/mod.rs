//! Utility helpers.

pub mod templates;

pub use templates::{render, EmailTemplate, RenderedEmail, TemplateContext};
