//! Request pipeline stages shared by every route.

mod api_key_auth;
mod body_limit;
mod request_id;

pub use api_key_auth::{AuthenticatedApiKey, require_api_key};
pub use body_limit::{is_length_limit_error, limit_body_size};
pub use request_id::{RequestId, assign_request_id};
