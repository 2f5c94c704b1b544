use common_auth::{AuthContext, Role};
use common_http_errors::{ApiError, ApiResult};
use tracing::{error, warn};

use crate::repo;
use crate::store::DocumentStore;

/// Lets the request through only when the verified caller's stored role is `role`.
///
/// Runs after [`AuthContext`] extraction, so the token is already verified. A
/// token without an email, an unknown email and a different role all end in
/// `Forbidden`.
pub async fn require_role(store: &dyn DocumentStore, auth: &AuthContext, role: Role) -> ApiResult<()> {
    let Some(email) = auth.email() else {
        warn!(required = %role, "role check on token without email");
        return Err(ApiError::Forbidden);
    };

    let user = repo::find_user_by_email(store, email).await.map_err(|err| {
        error!(error = %err, email, "role lookup failed");
        ApiError::internal("Failed to verify role")
    })?;

    match user {
        Some(user) if user.has_role(role) => Ok(()),
        Some(user) => {
            warn!(email, required = %role, actual = ?user.role, "role_check_failed");
            Err(ApiError::Forbidden)
        }
        None => {
            warn!(email, required = %role, "role check for unknown user");
            Err(ApiError::Forbidden)
        }
    }
}

pub async fn require_admin(store: &dyn DocumentStore, auth: &AuthContext) -> ApiResult<()> {
    require_role(store, auth, Role::Admin).await
}

pub async fn require_instructor(store: &dyn DocumentStore, auth: &AuthContext) -> ApiResult<()> {
    require_role(store, auth, Role::Instructor).await
}
