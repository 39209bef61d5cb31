use askama::Template;
use axum::extract::State;
use axum::response::Response;
use axum::Form;
use serde::Deserialize;

use crate::auth::policy;
use crate::db::models::User;
use crate::db::users;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash::{self, Flash};
use crate::routes::home::{display_date, Html, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub user: User,
    pub member_since: String,
    pub can_rename: bool,
}

#[derive(Deserialize)]
pub struct UsernameForm {
    #[serde(rename = "newUsername", alias = "new_username", default)]
    pub new_username: String,
}

/// GET /profile
pub async fn profile(CurrentUser(user): CurrentUser, flash: Flash) -> Response {
    let template = ProfileTemplate {
        nav: Nav::new(Some(&user), &flash),
        member_since: display_date(&user.created_at),
        can_rename: !user.is_admin(),
        user,
    };
    flash.consume(Html(template))
}

/// POST /update-username
pub async fn update_username(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<UsernameForm>,
) -> AppResult<Response> {
    let new_username = form.new_username.trim();
    if new_username.is_empty() && !user.is_admin() {
        return Err(AppError::Validation("New username is required".into()));
    }

    let conn = state.db.get()?;
    let taken = users::username_taken_by_other(&conn, new_username, &user.id)?;
    if let Err(reason) = policy::check_username_change(&user, new_username, taken) {
        tracing::info!(user_id = %user.id, "Username change rejected: {}", reason);
        return Err(reason.into());
    }

    if new_username != user.username {
        match users::update_username(&conn, &user.id, new_username) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(policy::UsernameChangeError::Duplicate.into());
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %user.id, "Username updated");
    }

    Ok(flash::redirect_with("/profile", "Username updated"))
}
