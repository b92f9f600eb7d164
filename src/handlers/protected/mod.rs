// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here runs behind `bearer_auth_middleware` and receives the
// caller as `Extension<AuthUser>`. Queries are always scoped to that user.

pub mod expenses;

pub use expenses::*;
