//! Background jobs.

mod email_job;

pub use email_job::{run_email_worker, EmailJob};
