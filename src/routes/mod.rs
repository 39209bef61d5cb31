pub mod admin;
pub mod assets;
pub mod comments;
pub mod home;
pub mod profile;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use url::form_urlencoded;

use crate::state::AppState;
use crate::uploads;

/// Every route, with state applied.
fn routes(state: AppState) -> Router {
    let body_limit = state.config.storage.max_upload_bytes;

    Router::new()
        // Public pages
        .route("/", get(home::index))
        .route("/post/{id}", get(home::show_post))
        .route("/about", get(home::about))
        .route("/search", post(home::search))
        // Login, registration, logout
        .route("/admin", get(admin::login_page).post(admin::login))
        .route("/register", get(admin::register_page).post(admin::register))
        .route("/logout", get(admin::logout))
        // Admin area
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/add-post",
            get(admin::add_post_page).post(admin::create_post),
        )
        .route(
            "/edit-post/{id}",
            get(admin::edit_post_page).put(admin::update_post),
        )
        .route("/delete-post/{id}", delete(admin::delete_post))
        // Profile
        .route("/profile", get(profile::profile))
        .route("/update-username", post(profile::update_username))
        // Comments
        .route("/add-comments", post(comments::create_comment))
        .route(
            "/edit-comments/{id}",
            get(comments::edit_comment_page).put(comments::update_comment),
        )
        .route("/delete-comments/{id}", delete(comments::delete_comment))
        // Files
        .route("/uploads/{file}", get(uploads::serve))
        .route("/assets/{*path}", get(assets::serve))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// The full application. Method override has to see the request before
/// routing, so the routes sit behind an outer router as its fallback.
pub fn app(state: AppState) -> Router {
    Router::new()
        .fallback_service(routes(state))
        .layer(middleware::from_fn(method_override))
        .layer(TraceLayer::new_for_http())
}

/// HTML forms only send GET and POST; `?_method=PUT|DELETE` on a POST
/// stands in for the real verb.
async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        if let Some(method) = override_method(request.uri().query()) {
            *request.method_mut() = method;
        }
    }
    next.run(request).await
}

fn override_method(query: Option<&str>) -> Option<Method> {
    let (_, value) = form_urlencoded::parse(query?.as_bytes()).find(|(k, _)| k == "_method")?;
    match value.to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_reads_method_from_query() {
        assert_eq!(override_method(Some("_method=PUT")), Some(Method::PUT));
        assert_eq!(override_method(Some("a=1&_method=delete")), Some(Method::DELETE));
        assert_eq!(override_method(Some("_method=GET")), None);
        assert_eq!(override_method(Some("a=1")), None);
        assert_eq!(override_method(None), None);
    }
}
