use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use crate::db::models::{CommentView, Post, User};
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::flash::Flash;
use crate::listing::{self, Listing, ListingParams, Page, Sort};
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Header state shared by every page layout.
pub struct Nav {
    pub username: Option<String>,
    pub is_admin: bool,
    pub notice: Option<String>,
}

impl Nav {
    pub fn new(user: Option<&User>, flash: &Flash) -> Self {
        Self {
            username: user.map(|u| u.username.clone()),
            is_admin: user.map(|u| u.is_admin()).unwrap_or(false),
            notice: flash.0.clone(),
        }
    }
}

// --- View structs ---

pub struct PostCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub image: String,
    pub date: String,
}

impl From<&Post> for PostCard {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            excerpt: excerpt(&post.body, 200),
            category: post.category.clone(),
            image: post.image.clone(),
            date: display_date(&post.created_at),
        }
    }
}

pub struct CommentItem {
    pub id: String,
    pub author: String,
    pub text: String,
    pub when: String,
    pub can_edit: bool,
}

impl CommentItem {
    fn new(view: CommentView, viewer: Option<&User>) -> Self {
        let can_edit = viewer.map(|u| u.id == view.created_by).unwrap_or(false);
        Self {
            id: view.id,
            author: view.author,
            text: view.text,
            when: parse_and_format_time(&view.created_at),
            can_edit,
        }
    }
}

/// Pagination links for a listing page.
pub struct Pager {
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub sort: String,
    pub category: String,
}

impl Pager {
    pub fn new<T>(page: &Page<T>, listing: &Listing) -> Self {
        Self {
            prev: page.prev_page(),
            next: page.next_page(),
            sort: listing.sort.as_str().to_string(),
            category: listing
                .category
                .clone()
                .unwrap_or_else(|| listing::ALL_CATEGORIES.to_string()),
        }
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub categories: Vec<String>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub post: PostCard,
    pub body: String,
    pub comments: Vec<CommentItem>,
    pub can_comment: bool,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub nav: Nav,
    pub term: String,
    pub posts: Vec<PostCard>,
    pub total: u64,
    pub next: Option<u32>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

// --- Forms ---

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(rename = "searchTerm", alias = "search_term", default)]
    pub search_term: String,
    pub page: Option<String>,
}

// --- Handlers ---

/// GET /
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Query(params): Query<ListingParams>,
) -> AppResult<Response> {
    let listing = Listing::from_params(&params, listing::HOME_PAGE_SIZE);
    let (page, categories) = {
        let conn = state.db.get()?;
        (posts::list(&conn, &listing)?, posts::categories(&conn)?)
    };

    let template = IndexTemplate {
        nav: Nav::new(user.as_ref(), &flash),
        posts: page.items.iter().map(PostCard::from).collect(),
        categories,
        pager: Pager::new(&page, &listing),
    };
    Ok(flash.consume(Html(template)))
}

/// GET /post/{id}
pub async fn show_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let (post, comment_views) = {
        let conn = state.db.get()?;
        let post = posts::find_by_id(&conn, &id)?.ok_or(AppError::NotFound)?;
        let comment_views = comments::list_for_post(&conn, &id)?;
        (post, comment_views)
    };

    let template = PostTemplate {
        nav: Nav::new(user.as_ref(), &flash),
        body: post.body.clone(),
        post: PostCard::from(&post),
        comments: comment_views
            .into_iter()
            .map(|c| CommentItem::new(c, user.as_ref()))
            .collect(),
        can_comment: user.is_some(),
    };
    Ok(flash.consume(Html(template)))
}

/// POST /search
pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Form(form): Form<SearchForm>,
) -> AppResult<Response> {
    let term = listing::sanitize_search_term(&form.search_term);
    let listing = Listing {
        page: listing::parse_page(form.page.as_deref()),
        page_size: listing::SEARCH_PAGE_SIZE,
        sort: Sort::Latest,
        category: None,
    };

    let page = {
        let conn = state.db.get()?;
        posts::search(&conn, &term, &listing)?
    };

    let template = SearchTemplate {
        nav: Nav::new(user.as_ref(), &flash),
        term,
        posts: page.items.iter().map(PostCard::from).collect(),
        total: page.total,
        next: page.next_page(),
    };
    Ok(flash.consume(Html(template)))
}

/// GET /about
pub async fn about(MaybeUser(user): MaybeUser, flash: Flash) -> Response {
    let template = AboutTemplate {
        nav: Nav::new(user.as_ref(), &flash),
    };
    flash.consume(Html(template))
}

// --- Text helpers ---

fn excerpt(body: &str, max_chars: usize) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

fn parse_db_time(db_time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S%.f").ok()
}

pub fn display_date(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| db_time.to_string())
}

fn parse_and_format_time(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn format_relative_time_buckets() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::minutes(5))),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::hours(3))),
            "3h ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::days(2))),
            "2d ago"
        );
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
    }

    #[test]
    fn db_times_with_and_without_fraction() {
        assert_eq!(display_date("2025-01-15 12:00:00"), "Jan 15, 2025");
        assert_eq!(display_date("2025-01-15 12:00:00.123"), "Jan 15, 2025");
        assert_eq!(display_date("not-a-date"), "not-a-date");
        assert_eq!(parse_and_format_time("not-a-date"), "not-a-date");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("hello world again", 11), "hello world…");
    }
}
