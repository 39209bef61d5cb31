use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::cookies::get_cookie_value;
use crate::auth::policy;
use crate::db::models::{Role, User};
use crate::db::users;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated user for this request, resolved from the token cookie
/// and reloaded from the database every time.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let user_id = state.keys.verify(token).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthenticated
        })?;

        let conn = state.db.get()?;
        let user = users::find_by_id(&conn, &user_id)?.ok_or_else(|| {
            tracing::info!(user_id = %user_id, "Token for unknown user");
            AppError::Unauthenticated
        })?;

        Ok(CurrentUser(user))
    }
}

/// An authenticated user holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // CurrentUser has just reloaded the record, so its role is current.
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let admin = policy::require_role(user, Role::Admin)?;
        Ok(AdminUser(admin))
    }
}

/// Optional user extractor. Returns None instead of redirecting when not
/// authenticated. Store failures still surface.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthenticated) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}
