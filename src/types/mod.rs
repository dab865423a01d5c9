//! Shared request/response types.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginationMeta, PaginationParams, UserPage};
pub use response::{MessageResponse, NoContent};
