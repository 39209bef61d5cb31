use askama::Template;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::policy;
use crate::db::models::Comment;
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash::{self, Flash};
use crate::routes::home::{Html, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/edit_comment.html")]
pub struct EditCommentTemplate {
    pub nav: Nav,
    pub comment: Comment,
}

#[derive(Deserialize)]
pub struct CreateCommentForm {
    #[serde(rename = "postId", alias = "post_id", default)]
    pub post_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub struct EditCommentForm {
    #[serde(default)]
    pub text: String,
}

/// POST /add-comments
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Form(form): Form<CreateCommentForm>,
) -> AppResult<Response> {
    let post_id = form.post_id.trim();
    let text = form.text.trim();
    if post_id.is_empty() {
        return Ok(flash::redirect_with(&back_path(&headers), "Missing post reference"));
    }
    if text.is_empty() {
        return Ok(flash::redirect_with(&back_path(&headers), "Comment text is required"));
    }

    let conn = state.db.get()?;
    posts::find_by_id(&conn, post_id)?.ok_or(AppError::NotFound)?;
    let id = comments::insert(&conn, post_id, text, &user.id)?;
    tracing::info!(comment_id = %id, post_id = %post_id, user_id = %user.id, "Comment created");

    Ok(Redirect::to(&format!("/post/{}", post_id)).into_response())
}

/// GET /edit-comments/{id}
pub async fn edit_comment_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: Flash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let comment = load_owned(&state, &user.id, &id)?;
    Ok(flash.consume(Html(EditCommentTemplate {
        nav: Nav::new(Some(&user), &flash),
        comment,
    })))
}

/// PUT /edit-comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<EditCommentForm>,
) -> AppResult<Response> {
    let comment = load_owned(&state, &user.id, &id)?;

    let text = form.text.trim();
    if text.is_empty() {
        return Ok(flash::redirect_with(&back_path(&headers), "Comment text is required"));
    }

    let conn = state.db.get()?;
    comments::update_text(&conn, &comment.id, text)?;
    tracing::info!(comment_id = %comment.id, user_id = %user.id, "Comment updated");

    Ok(Redirect::to(&format!("/post/{}", comment.post_id)).into_response())
}

/// DELETE /delete-comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let comment = load_owned(&state, &user.id, &id)?;

    let conn = state.db.get()?;
    comments::delete(&conn, &comment.id)?;
    tracing::info!(comment_id = %comment.id, user_id = %user.id, "Comment deleted");

    Ok(Redirect::to(&format!("/post/{}", comment.post_id)).into_response())
}

/// Fetch a comment and require that `user_id` wrote it.
fn load_owned(state: &AppState, user_id: &str, comment_id: &str) -> AppResult<Comment> {
    let conn = state.db.get()?;
    let comment = comments::find_by_id(&conn, comment_id)?.ok_or(AppError::NotFound)?;
    policy::authorize_comment_mutation(user_id, &comment)?;
    Ok(comment)
}

/// Local path of the Referer, so a redirect back never leaves the site.
/// The Referer is resolved against a fixed origin and only its path and
/// query are kept.
fn back_path(headers: &HeaderMap) -> String {
    let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) else {
        return "/".to_string();
    };

    let resolved = url::Url::parse("http://localhost/").and_then(|base| base.join(referer));
    let Ok(url) = resolved else {
        return "/".to_string();
    };

    let path = url.path();
    // A path like `//host` would read as protocol-relative in Location.
    if !path.starts_with('/') || path.starts_with("//") {
        return "/".to_string();
    }
    match url.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}
