//! Email templates.
//!
//! Templates are plain text with `{{ name }}` placeholders. Rendering fails
//! on any placeholder without a value, so a half-filled email never goes out.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::{AppError, AppResult};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Built-in email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    PasswordReset,
    PasswordChanged,
    StatusChanged,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 4] = [
        EmailTemplate::Welcome,
        EmailTemplate::PasswordReset,
        EmailTemplate::PasswordChanged,
        EmailTemplate::StatusChanged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome => "welcome",
            EmailTemplate::PasswordReset => "password-reset",
            EmailTemplate::PasswordChanged => "password-changed",
            EmailTemplate::StatusChanged => "status-changed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    fn subject_source(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome => "Welcome to {{app_name}}, {{username}}!",
            EmailTemplate::PasswordReset => "Reset your {{app_name}} password",
            EmailTemplate::PasswordChanged => "Your {{app_name}} password was changed",
            EmailTemplate::StatusChanged => "Your {{app_name}} account is now {{status}}",
        }
    }

    fn body_source(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome => {
                "Hi {{username}},\n\n\
                 Your account has been created and is ready to use.\n\
                 Sign in at {{base_url}} with {{email}}.\n\n\
                 The {{app_name}} team"
            }
            EmailTemplate::PasswordReset => {
                "Hi {{username}},\n\n\
                 We received a request to reset your password.\n\
                 Open the link below within {{ttl_minutes}} minutes:\n\n\
                 {{base_url}}/reset-password?token={{token}}\n\n\
                 Reset token: {{token}}\n\n\
                 If you did not ask for this, you can ignore this email.\n\n\
                 The {{app_name}} team"
            }
            EmailTemplate::PasswordChanged => {
                "Hi {{username}},\n\n\
                 The password for {{email}} was just changed.\n\
                 If this was not you, reset your password at {{base_url}} immediately.\n\n\
                 The {{app_name}} team"
            }
            EmailTemplate::StatusChanged => {
                "Hi {{username}},\n\n\
                 Your account status changed from {{previous_status}} to {{status}}.\n\n\
                 The {{app_name}} team"
            }
        }
    }

    /// Variables the template needs.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = [self.subject_source(), self.body_source()]
            .into_iter()
            .flat_map(|source| PLACEHOLDER.captures_iter(source))
            .map(|caps| caps[1].to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Render subject and body.
    pub fn render(&self, context: &TemplateContext) -> AppResult<RenderedEmail> {
        Ok(RenderedEmail {
            subject: render(self.subject_source(), context)?,
            body: render(self.body_source(), context)?,
        })
    }
}

impl std::fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendered subject and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Insert only if the key is not set yet.
    pub fn insert_default(&mut self, key: &str, value: impl ToString) {
        self.values
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Substitute every `{{ name }}` in `source`.
///
/// # Errors
/// Returns a validation error naming the first placeholder without a value.
pub fn render(source: &str, context: &TemplateContext) -> AppResult<String> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .find(|name| context.get(name).is_none())
    {
        return Err(AppError::validation(format!(
            "Template variable '{}' is not set",
            missing
        )));
    }

    let rendered = PLACEHOLDER.replace_all(source, |caps: &Captures| {
        context.get(&caps[1]).unwrap_or_default().to_string()
    });
    Ok(rendered.into_owned())
}
