use std::sync::Arc;

use http::Extensions;
use reqwest::{header::HeaderValue, Request, Response, Url};
use reqwest_cookie_store::CookieStoreMutex;
use reqwest_middleware::{Middleware, Next};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Reads the CSRF token the server set for `url`, percent-decoded.
pub fn csrf_token(cookies: &CookieStoreMutex, url: &Url) -> Option<String> {
    let store = cookies.lock().ok()?;
    let cookie = store
        .matches(url)
        .into_iter()
        .find(|c| c.name() == CSRF_COOKIE)?;
    let raw = cookie.value();
    let token = urlencoding::decode(raw)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Copies the `csrf_token` cookie into the `x-csrf-token` header of every
/// outgoing request. Requests go out untouched when there is no such cookie.
pub struct CsrfMiddleware {
    cookies: Arc<CookieStoreMutex>,
}

impl CsrfMiddleware {
    pub fn new(cookies: Arc<CookieStoreMutex>) -> Self {
        Self { cookies }
    }
}

#[async_trait::async_trait]
impl Middleware for CsrfMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if let Some(token) = csrf_token(&self.cookies, req.url()) {
            match HeaderValue::from_str(&token) {
                Ok(value) => {
                    req.headers_mut().insert(CSRF_HEADER, value);
                }
                Err(_) => warn!("Ignoring csrf_token cookie that is not a valid header value"),
            }
        }

        next.run(req, extensions).await
    }
}
