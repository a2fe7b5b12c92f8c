//! Bearer authentication

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{CredentialValidator, JwtService};
pub use middleware::auth_middleware;
pub use models::{JwtClaims, UserContext};
