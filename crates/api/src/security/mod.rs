//! Cross-origin access control

mod cors;

pub use cors::{cors_middleware, CorsPolicy};
