//! services/api/src/web/middleware.rs
//!
//! Tab-identification middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::state::AppState;

pub const TAB_COOKIE: &str = "tab";

/// Extracts the tab id from a `Cookie` header value.
pub fn tab_id_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("tab="))
        .filter(|id| !id.is_empty())
}

/// Middleware that attaches the caller's `TabState` to the request.
///
/// Requests without a live `tab` cookie (none, expired, or an id this server
/// never issued) get a fresh tab, returned as a session cookie so it lives as
/// long as the browser session.
pub async fn attach_tab(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Look up the tab named by the cookie, or mint one
    let existing = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(tab_id_from_cookie)
        .and_then(|id| state.tabs.get(id));
    let is_new = existing.is_none();
    let tab = existing.unwrap_or_else(|| state.tabs.create());
    let tab_id = tab.id.clone();

    // 2. Insert the tab state into request extensions
    req.extensions_mut().insert(tab);

    // 3. Continue to the handler
    let mut response = next.run(req).await;

    // 4. Hand new tabs their cookie
    if is_new {
        debug!("Issued new tab {}", tab_id);
        let cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", TAB_COOKIE, tab_id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to build tab cookie: {:?}", e),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_tab_among_other_cookies() {
        assert_eq!(tab_id_from_cookie("theme=dark; tab=abc-123"), Some("abc-123"));
        assert_eq!(tab_id_from_cookie("tab=xyz"), Some("xyz"));
        assert_eq!(tab_id_from_cookie("theme=dark"), None);
        assert_eq!(tab_id_from_cookie("tab="), None);
    }
}
