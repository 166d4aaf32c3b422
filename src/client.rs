use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{
    renewal::{RenewalState, Ticket},
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
};

pub const REFRESH_PATH: &str = "/auth/refresh-token";
pub const LOGIN_VIEW: &str = "/login";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("request failed with {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session renewal failed: {0}")]
    RenewalFailed(Arc<ApiError>),
    #[error("session renewal was abandoned")]
    RenewalAborted,
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The session could not be renewed and the user has to log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::RenewalFailed(_) | ApiError::RenewalAborted)
    }

    /// Text suitable for showing next to the form or page that failed.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Validation(message) => message.clone(),
            ApiError::RenewalFailed(_) | ApiError::RenewalAborted => {
                "Your session has expired. Please log in again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Where the client sends the user once their session cannot be renewed.
pub trait Navigator: Send + Sync {
    /// Path and query of the view the user is on, used as the return target.
    fn current_location(&self) -> String;
    fn redirect(&self, target: &str);
}

/// Default navigator: remembers the current location and logs redirects.
#[derive(Debug)]
pub struct LoggingNavigator {
    location: Mutex<String>,
}

impl LoggingNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
        }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.lock().unwrap_or_else(|e| e.into_inner()) = location.into();
    }
}

impl Default for LoggingNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for LoggingNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn redirect(&self, target: &str) {
        warn!("Session expired, redirecting to {}", target);
    }
}

pub fn login_redirect(next: &str) -> String {
    format!("{}?next={}", LOGIN_VIEW, urlencoding::encode(next))
}

fn check_status(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }

    let message = response.error_message().unwrap_or_else(|| {
        response
            .status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    Err(ApiError::Status {
        status: response.status,
        message,
    })
}

/// Authenticated client for the Streamline API.
///
/// A 401 on any request other than login or signup renews the session once
/// through `POST /auth/refresh-token` and retries the request. Concurrent
/// 401s share a single renewal.
pub struct ApiClient<T> {
    transport: T,
    renewal: RenewalState,
    navigator: Arc<dyn Navigator>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            renewal: RenewalState::new(),
            navigator: Arc::new(LoggingNavigator::default()),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn renewal(&self) -> &RenewalState {
        &self.renewal
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.execute(&request).await?;
        if response.status != StatusCode::UNAUTHORIZED || request.is_credential_exchange() {
            return check_status(response);
        }

        debug!(
            "{} {} answered 401, renewing session",
            request.method, request.path
        );
        self.renew_session().await?;

        // Retried once; a second 401 goes back to the caller as is
        let response = self.transport.execute(&request).await?;
        check_status(response)
    }

    pub async fn fetch<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let response = self.send(request).await?;
        response.json().map_err(ApiError::Decode)
    }

    /// Sends the request and discards the response body.
    pub async fn execute(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn renew_session(&self) -> Result<(), ApiError> {
        let guard = match self.renewal.begin() {
            Ticket::Lead(guard) => guard,
            Ticket::Wait(rx) => {
                return match rx.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ApiError::RenewalFailed(e)),
                    Err(_) => Err(ApiError::RenewalAborted),
                };
            }
        };

        info!("Refreshing session");
        match self.refresh().await {
            Ok(()) => {
                guard.settle(Ok(()));
                info!("Session refreshed");
                Ok(())
            }
            Err(e) => {
                error!("Could not refresh session: {}", e);
                let e = Arc::new(e);
                guard.settle(Err(e.clone()));
                let target = login_redirect(&self.navigator.current_location());
                self.navigator.redirect(&target);
                Err(ApiError::RenewalFailed(e))
            }
        }
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        let response = self
            .transport
            .execute(&ApiRequest::post(REFRESH_PATH))
            .await?;
        check_status(response).map(|_| ())
    }
}
