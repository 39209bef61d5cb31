use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{cookies, session};
use crate::db::models::Post;
use crate::db::posts::{self, PostInput};
use crate::error::{AppError, AppResult};
use crate::extractors::{AdminUser, MaybeUser};
use crate::flash::{self, Flash};
use crate::listing::{self, Listing, ListingParams};
use crate::routes::home::{Html, Nav, Pager, PostCard};
use crate::state::AppState;
use crate::uploads;

// -- Templates --

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "admin/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub total: u64,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "admin/add_post.html")]
pub struct AddPostTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "admin/edit_post.html")]
pub struct EditPostTemplate {
    pub nav: Nav,
    pub post: Post,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Fields of the multipart post form after the image has been stored.
struct PostForm {
    title: String,
    body: String,
    category: String,
    new_image: Option<String>,
}

// -- Login / registration --

/// GET /admin. Signed-in visitors go straight to their landing page.
pub async fn login_page(MaybeUser(user): MaybeUser, flash: Flash) -> Response {
    if let Some(user) = user {
        let to = if user.is_admin() { "/dashboard" } else { "/" };
        return Redirect::to(to).into_response();
    }
    flash.consume(Html(LoginTemplate {
        nav: Nav::new(None, &flash),
    }))
}

/// POST /admin
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let user = session::authenticate(&state.db, &form.username, &form.password).await?;
    let cookie = session::login_cookie(&state, &user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    let to = if user.is_admin() { "/dashboard" } else { "/" };
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response())
}

/// GET /register
pub async fn register_page(flash: Flash) -> Response {
    flash.consume(Html(RegisterTemplate {
        nav: Nav::new(None, &flash),
    }))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let user = match session::register(&state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(AppError::Conflict(msg)) | Err(AppError::Validation(msg)) => {
            return Ok(flash::redirect_with("/register", &msg));
        }
        Err(e) => return Err(e),
    };
    let cookie = session::login_cookie(&state, &user)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
}

/// GET /logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, cookies::clear_token_cookie(&state.config.auth))],
        Redirect::to("/"),
    )
        .into_response()
}

// -- Dashboard & posts --

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    flash: Flash,
    Query(params): Query<ListingParams>,
) -> AppResult<Response> {
    let listing = Listing::from_params(&params, listing::DASHBOARD_PAGE_SIZE);
    let page = {
        let conn = state.db.get()?;
        posts::list(&conn, &listing)?
    };

    let template = DashboardTemplate {
        nav: Nav::new(Some(&admin), &flash),
        posts: page.items.iter().map(PostCard::from).collect(),
        total: page.total,
        pager: Pager::new(&page, &listing),
    };
    Ok(flash.consume(Html(template)))
}

/// GET /add-post
pub async fn add_post_page(AdminUser(admin): AdminUser, flash: Flash) -> Response {
    flash.consume(Html(AddPostTemplate {
        nav: Nav::new(Some(&admin), &flash),
    }))
}

/// POST /add-post (multipart)
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let uploads_dir = state.config.uploads_path();
    let form = read_post_form(multipart, &uploads_dir).await?;

    let Some(image) = form.new_image.clone() else {
        return Err(AppError::Validation("An image is required".into()));
    };
    let input = match validated_input(&form, image.clone()) {
        Ok(input) => input,
        Err(e) => {
            uploads::remove_image(&uploads_dir, &image).await;
            return Err(e);
        }
    };

    let id = {
        let conn = state.db.get()?;
        posts::insert(&conn, &input, &admin.id)?
    };
    tracing::info!(post_id = %id, user_id = %admin.id, "Post created");

    Ok(flash::redirect_with("/dashboard", "Post created"))
}

/// GET /edit-post/{id}
pub async fn edit_post_page(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    flash: Flash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let post = {
        let conn = state.db.get()?;
        posts::find_by_id(&conn, &id)?.ok_or(AppError::NotFound)?
    };
    Ok(flash.consume(Html(EditPostTemplate {
        nav: Nav::new(Some(&admin), &flash),
        post,
    })))
}

/// PUT /edit-post/{id} (multipart). A new image replaces the old file.
pub async fn update_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let uploads_dir = state.config.uploads_path();
    let form = read_post_form(multipart, &uploads_dir).await?;

    let existing = {
        let conn = state.db.get()?;
        posts::find_by_id(&conn, &id)?
    };
    let Some(existing) = existing else {
        if let Some(image) = &form.new_image {
            uploads::remove_image(&uploads_dir, image).await;
        }
        return Err(AppError::NotFound);
    };

    let image = form
        .new_image
        .clone()
        .unwrap_or_else(|| existing.image.clone());
    let input = match validated_input(&form, image) {
        Ok(input) => input,
        Err(e) => {
            if let Some(image) = &form.new_image {
                uploads::remove_image(&uploads_dir, image).await;
            }
            return Err(e);
        }
    };

    {
        let conn = state.db.get()?;
        posts::update(&conn, &id, &input)?;
    }
    tracing::info!(post_id = %id, user_id = %admin.id, "Post updated");

    // The row already points at the new image; a failed removal only leaves a stray file.
    if form.new_image.is_some() && existing.image != input.image {
        uploads::remove_image(&uploads_dir, &existing.image).await;
    }

    Ok(flash::redirect_with("/dashboard", "Post updated successfully!"))
}

/// DELETE /delete-post/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let image = {
        let conn = state.db.get()?;
        posts::delete(&conn, &id)?.ok_or(AppError::NotFound)?
    };
    tracing::info!(post_id = %id, user_id = %admin.id, "Post deleted");

    uploads::remove_image(&state.config.uploads_path(), &image).await;
    Ok(flash::redirect_with("/dashboard", "Post deleted"))
}

// -- Form helpers --

async fn read_post_form(
    mut multipart: Multipart,
    uploads_dir: &std::path::Path,
) -> AppResult<PostForm> {
    let mut form = PostForm {
        title: String::new(),
        body: String::new(),
        category: String::new(),
        new_image: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if let Some(previous) = form.new_image.take() {
                    uploads::remove_image(uploads_dir, &previous).await;
                }
                form.new_image = Some(uploads::save_image(uploads_dir, &file_name, &bytes).await?);
            }
            "title" => form.title = field.text().await?,
            "body" => form.body = field.text().await?,
            "category" => form.category = field.text().await?,
            _ => {}
        }
    }

    Ok(form)
}

fn validated_input(form: &PostForm, image: String) -> AppResult<PostInput> {
    let title = form.title.trim();
    let body = form.body.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if body.is_empty() {
        return Err(AppError::Validation("Body is required".into()));
    }
    Ok(PostInput {
        title: title.to_string(),
        body: body.to_string(),
        category: form.category.trim().to_string(),
        image,
    })
}
