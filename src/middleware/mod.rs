pub mod auth;
pub mod response;

pub use auth::{bearer_auth_middleware, extract_bearer_token};
pub use response::{ApiResponse, ApiResult};
