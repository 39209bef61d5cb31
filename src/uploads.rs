//! Post images on disk. Only the generated filename is stored on the post.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::Path as FsPath;

use crate::error::{AppError, AppResult};
use crate::routes::assets::file_response;
use crate::state::AppState;

/// Keep the last path component and only filename-safe characters.
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

pub fn is_image(filename: &str) -> bool {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

/// Stored name: `image_<unix millis>_<sanitized original>`.
pub fn stored_name(original: &str) -> String {
    format!(
        "image_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize_filename(original)
    )
}

/// A name we would have generated ourselves: no separators, no traversal.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Write an uploaded image and return its stored filename.
pub async fn save_image(dir: &FsPath, original: &str, bytes: &[u8]) -> AppResult<String> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded image is empty".into()));
    }
    if !is_image(original) {
        return Err(AppError::Validation("Upload must be an image".into()));
    }
    let name = stored_name(original);
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&name), bytes).await?;
    tracing::info!(file = %name, size = bytes.len(), "Stored upload");
    Ok(name)
}

/// Best-effort removal. Failures are logged and never undo the caller's
/// completed database change.
pub async fn remove_image(dir: &FsPath, name: &str) {
    if !is_safe_name(name) {
        tracing::warn!(file = %name, "Refusing to remove suspicious upload name");
        return;
    }
    if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
        tracing::warn!(file = %name, "Failed to remove upload: {}", e);
    }
}

/// GET /uploads/{file}
pub async fn serve(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    if !is_safe_name(&file) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read(state.config.uploads_path().join(&file)).await {
        Ok(data) => file_response(&file, data),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\pics\\my cat.png"), "mycat.png");
        assert_eq!(sanitize_filename(".hidden.jpg"), "hidden.jpg");
        assert_eq!(sanitize_filename("???"), "upload");
    }

    #[test]
    fn image_detection_uses_extension() {
        assert!(is_image("cat.png"));
        assert!(is_image("cat.JPG"));
        assert!(!is_image("notes.txt"));
        assert!(!is_image("noext"));
    }

    #[test]
    fn stored_name_has_prefix() {
        let name = stored_name("cat.png");
        assert!(name.starts_with("image_"));
        assert!(name.ends_with("_cat.png"));
        assert!(is_safe_name(&name));
    }

    #[test]
    fn unsafe_names_rejected() {
        assert!(!is_safe_name("../x.png"));
        assert!(!is_safe_name(".env"));
        assert!(!is_safe_name("a/b.png"));
        assert!(!is_safe_name(""));
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let name = save_image(tmp.path(), "cat.png", b"fakepng").await.unwrap();
        assert!(tmp.path().join(&name).exists());

        remove_image(tmp.path(), &name).await;
        assert!(!tmp.path().join(&name).exists());

        // Removing again only logs.
        remove_image(tmp.path(), &name).await;
    }

    #[tokio::test]
    async fn save_rejects_non_images_and_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            save_image(tmp.path(), "notes.txt", b"text").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            save_image(tmp.path(), "cat.png", b"").await,
            Err(AppError::Validation(_))
        ));
    }
}
