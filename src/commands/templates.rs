//! Templates command - Inspect email templates without running the server.
//!
//! ```bash
//! user-registry templates list
//! user-registry templates render password-reset --var username=jdoe --var token=abc
//! ```

use crate::cli::args::{TemplatesAction, TemplatesArgs};
use crate::config::Branding;
use crate::errors::{AppError, AppResult};
use crate::utils::{EmailTemplate, RenderedEmail, TemplateContext};

/// Execute the templates command
pub fn execute(args: TemplatesArgs, branding: &Branding) -> AppResult<()> {
    match args.action {
        TemplatesAction::List => {
            for template in EmailTemplate::ALL {
                println!("{:<18} {}", template.name(), template.variables().join(", "));
            }
            Ok(())
        }
        TemplatesAction::Render { name, vars } => {
            let email = render_template(&name, vars, branding)?;
            println!("Subject: {}\n\n{}", email.subject, email.body);
            Ok(())
        }
    }
}

/// Render `name` with `vars`, falling back to the configured `app_name` and `base_url`.
pub fn render_template(
    name: &str,
    vars: Vec<(String, String)>,
    branding: &Branding,
) -> AppResult<RenderedEmail> {
    let template = EmailTemplate::from_name(name).ok_or_else(|| {
        let known: Vec<_> = EmailTemplate::ALL.iter().map(|t| t.name()).collect();
        AppError::BadRequest(format!(
            "Unknown template '{}'. Available: {}",
            name,
            known.join(", ")
        ))
    })?;

    let mut context = TemplateContext::new();
    for (key, value) in vars {
        context.insert(key, value);
    }
    context.insert_default("app_name", &branding.app_name);
    context.insert_default("base_url", &branding.app_base_url);

    tracing::debug!(template = %template, "Rendering template");
    template.render(&context)
}
