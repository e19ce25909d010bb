// Authentication module
// Decision: Password accounts with stateless JWT sessions carried in a cookie

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AuthError, AuthState, AuthUser, FromRef};
pub use routes::routes;
