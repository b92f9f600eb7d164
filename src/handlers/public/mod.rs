// handlers/public/mod.rs - Public handlers (no authentication)
//
// Service info, health check and the connectivity test routes the browser
// client uses to debug its Authorization header.

pub mod status;
pub mod diagnostics;

pub use status::{health, root};
pub use diagnostics::{auth_check as test_auth_check, ping as test_ping};
