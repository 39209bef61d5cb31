//! Who may do what. Every check works from a freshly loaded user record.

use crate::db::models::{Comment, Role, User};
use crate::error::{AppError, AppResult};

/// Name no regular user may rename themselves to, compared case-insensitively.
pub const RESERVED_USERNAME: &str = "admin";

impl Role {
    /// `Admin` satisfies any requirement; `User` only the `User` one.
    pub fn permits(&self, required: Role) -> bool {
        match required {
            Role::Admin => *self == Role::Admin,
            Role::User => true,
        }
    }
}

/// Require `role` of a user record loaded for this request.
pub fn require_role(user: User, role: Role) -> AppResult<User> {
    if !user.role.permits(role) {
        tracing::info!(user_id = %user.id, required = %role, "Role check failed");
        return Err(AppError::Forbidden(format!("{} access required", role)));
    }
    Ok(user)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsernameChangeError {
    #[error("Admins cannot change their username")]
    AdminRename,
    #[error("That username is reserved")]
    Reserved,
    #[error("Username is already taken, please choose another")]
    Duplicate,
}

impl From<UsernameChangeError> for AppError {
    fn from(err: UsernameChangeError) -> Self {
        match err {
            UsernameChangeError::AdminRename | UsernameChangeError::Reserved => {
                AppError::Forbidden(err.to_string())
            }
            UsernameChangeError::Duplicate => AppError::Conflict(err.to_string()),
        }
    }
}

/// Rules for renaming, checked in order: admins never rename, the reserved
/// name is off limits, and the name must not belong to someone else.
pub fn check_username_change(
    actor: &User,
    new_username: &str,
    taken_by_other: bool,
) -> Result<(), UsernameChangeError> {
    if actor.is_admin() {
        return Err(UsernameChangeError::AdminRename);
    }
    if new_username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(UsernameChangeError::Reserved);
    }
    if taken_by_other {
        return Err(UsernameChangeError::Duplicate);
    }
    Ok(())
}

/// Only a comment's author may edit or delete it. Admins get no override.
pub fn authorize_comment_mutation(actor_id: &str, comment: &Comment) -> AppResult<()> {
    if comment.created_by != actor_id {
        tracing::info!(
            user_id = %actor_id,
            comment_id = %comment.id,
            "Comment mutation denied: not the author"
        );
        return Err(AppError::Forbidden(
            "You can only change your own comments".into(),
        ));
    }
    Ok(())
}
