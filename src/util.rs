use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::CONTENT_TYPE, Url};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use reqwest_middleware::ClientWithMiddleware;

use crate::{
    config::Config,
    csrf::CsrfMiddleware,
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
};

pub struct HttpClient {
    pub client: ClientWithMiddleware,
    pub cookies: Arc<CookieStoreMutex>,
    base_url: String,
    cookie_file: Option<PathBuf>,
}

/// Sibling of `path` that a new version is written to before it is renamed
/// over the original.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn load_cookie_store(path: &Path) -> Result<CookieStore, TransportError> {
    if !path.exists() {
        return Ok(CookieStore::default());
    }

    let file = File::open(path)?;
    match cookie_store::serde::json::load_all(BufReader::new(file)) {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("Discarding unreadable cookie file {:?}: {}", path, e);
            Ok(CookieStore::default())
        }
    }
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<HttpClient, TransportError> {
        Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let store = match &config.cookie_file {
            Some(path) => load_cookie_store(path)?,
            None => CookieStore::default(),
        };
        let cookies = Arc::new(CookieStoreMutex::new(store));

        let client = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(config.timeout)
            .build()?;

        let client = reqwest_middleware::ClientBuilder::new(client)
            .with(CsrfMiddleware::new(cookies.clone()))
            .build();

        Ok(HttpClient {
            client,
            cookies,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_file: config.cookie_file.clone(),
        })
    }

    pub fn url(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!("{}{}", self.base_url, path);
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    /// Writes the cookie jar, session cookies included, to the configured
    /// cookie file. Without a cookie file this does nothing.
    pub fn save_cookies(&self) -> Result<(), TransportError> {
        let Some(path) = &self.cookie_file else {
            return Ok(());
        };

        let store = self
            .cookies
            .lock()
            .map_err(|_| TransportError::Cookies("cookie store lock poisoned".into()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = temp_path(path);
        let mut writer = BufWriter::new(File::create(&temp)?);
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut writer)
            .map_err(|e| TransportError::Cookies(e.to_string()))?;
        writer.flush()?;
        drop(writer);
        fs::rename(&temp, path)?;
        debug!("Saved cookies to {}", path.display());

        Ok(())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| TransportError::Other(e.to_string()))?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        trace!("{} {} -> {}", request.method, request.path, status);

        Ok(ApiResponse { status, body })
    }
}

/// Formats a count with thousands separators, e.g. `1,234,567`.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats an outlier score the way video cards show it, e.g. `12.3x`.
pub fn format_score(score: f64) -> String {
    format!("{:.1}x", score)
}

const TIME_UNITS: [(&str, i64); 5] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// Relative publish time, e.g. `3 days ago` or `just now`.
pub fn time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - published).num_seconds();
    for (label, unit) in TIME_UNITS {
        let count = seconds / unit;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{} {}{} ago", count, label, plural);
        }
    }
    "just now".to_string()
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
