use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::{
    client::{ApiClient, ApiError},
    models::SessionUser,
    transport::{ApiRequest, Transport},
};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Same checks the login and signup forms run before submitting.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !EMAIL.is_match(&self.email) {
            return Err(ApiError::Validation("Invalid email.".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password needs at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        json!({ "email": self.email, "password": self.password })
    }
}

impl<T: Transport> ApiClient<T> {
    pub async fn signup(&self, credentials: &Credentials) -> Result<(), ApiError> {
        credentials.validate()?;
        self.execute(ApiRequest::post("/auth/signup").json(credentials.to_json()))
            .await
    }

    /// Logs in; the session and CSRF cookies arrive with the response.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        credentials.validate()?;
        self.execute(ApiRequest::post("/auth/login").json(credentials.to_json()))
            .await
    }

    /// Exchanges a Google ID token for a session.
    pub async fn google_login(&self, credential: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post("/auth/google").json(json!({ "credential": credential })))
            .await
    }

    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        self.fetch(ApiRequest::get("/auth/me")).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(ApiRequest::post("/auth/logout")).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post("/auth/forgot-password").json(json!({ "email": email })))
            .await
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password needs at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        self.execute(
            ApiRequest::post("/auth/reset-password")
                .json(json!({ "token": token, "password": password })),
        )
        .await
    }
}
