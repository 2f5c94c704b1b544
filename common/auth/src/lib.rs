pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod issuer;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use config::{JwtConfig, DEFAULT_TOKEN_TTL_SECONDS};
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use issuer::TokenIssuer;
pub use roles::{Role, UnknownRole, ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_STUDENT};
pub use verifier::JwtVerifier;
