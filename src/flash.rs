//! One-shot notices carried across a redirect in a short-lived cookie.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use std::convert::Infallible;
use url::form_urlencoded;

use crate::auth::cookies::get_cookie_value;

const FLASH_COOKIE: &str = "flash";

/// The pending notice, if the previous response left one.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let message = get_cookie_value(&parts.headers, FLASH_COOKIE)
            .filter(|raw| !raw.is_empty())
            .map(decode);
        Ok(Flash(message))
    }
}

impl Flash {
    /// Wrap a rendered page so the notice is cleared once shown.
    pub fn consume<R: IntoResponse>(&self, page: R) -> Response {
        if self.0.is_some() {
            ([(header::SET_COOKIE, clear_cookie())], page).into_response()
        } else {
            page.into_response()
        }
    }
}

/// 303 redirect that leaves a notice for the next page.
pub fn redirect_with(to: &str, message: &str) -> Response {
    (
        [(header::SET_COOKIE, set_cookie(message))],
        Redirect::to(to),
    )
        .into_response()
}

fn set_cookie(message: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60",
        FLASH_COOKIE, encoded
    )
}

fn clear_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", FLASH_COOKIE)
}

fn decode(raw: &str) -> String {
    form_urlencoded::parse(format!("m={}", raw).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
