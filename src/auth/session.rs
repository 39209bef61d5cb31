//! Credential checks and token issuance for login, registration and the
//! admin import command.

use crate::auth::{cookies, password};
use crate::db::models::{Role, User};
use crate::db::users;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::state::{AppState, DbPool};

/// Check a username/password pair. Unknown users and wrong passwords are
/// reported identically.
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    let user = {
        let conn = pool.get()?;
        users::find_by_username(&conn, username)?
    };

    let Some(user) = user else {
        tracing::info!("Login failed: unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify(password, &user.password_hash).await? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Create a regular user account.
pub async fn register(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    create_user(pool, username, password, Role::User).await
}

/// Create an account with the admin role, as the import command does.
pub async fn import_admin(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    create_user(pool, username, password, Role::Admin).await
}

async fn create_user(pool: &DbPool, username: &str, password: &str, role: Role) -> AppResult<User> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    {
        let conn = pool.get()?;
        if users::find_by_username(&conn, username)?.is_some() {
            return Err(duplicate());
        }
    }

    let hashed = password::hash(password).await?;

    // A concurrent registration can still win the race; the UNIQUE constraint decides.
    let conn = pool.get()?;
    match users::insert(&conn, username, &hashed, role) {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %role, "User created");
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => Err(duplicate()),
        Err(e) => Err(e.into()),
    }
}

fn duplicate() -> AppError {
    AppError::Conflict("Username is already taken".into())
}

/// Sign a token for the user and wrap it in the Set-Cookie value.
pub fn login_cookie(state: &AppState, user: &User) -> AppResult<String> {
    let token = state.keys.issue(&user.id)?;
    Ok(cookies::token_cookie(&state.config.auth, &token))
}
