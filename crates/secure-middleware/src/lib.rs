//! Secure Session Middleware for axum
//!
//! Authenticates every request against the caller's embedded public key
//! and the server's static secret, then lets handlers answer with
//! responses signed and encrypted back to the same caller.
//!
//! ```ignore
//! let config = Arc::new(SecureSessionConfig::from_env()?);
//! let app = Router::new()
//!     .route("/getSend", get(handler))
//!     .route_layer(middleware::from_fn_with_state(config, require_secure_session));
//! ```

mod config;
mod context;
mod error;
mod middleware;

pub use config::*;
pub use context::*;
pub use error::*;
pub use middleware::*;
