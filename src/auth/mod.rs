//! Token-based authentication: issuing and resolving access tokens, the
//! middleware guarding protected routes, and the register/login endpoints.

mod endpoints;
mod middleware;
mod token;

pub use endpoints::{
    get_profile_endpoint, log_in_endpoint, register_endpoint, update_profile_endpoint,
};
pub use middleware::auth_guard;
pub use token::issue_token;
