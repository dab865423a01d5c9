//! Custom request extractors.

mod request_parts;
mod validated_json;

pub use request_parts::{ApiPath, ApiQuery};
pub use validated_json::ValidatedJson;
