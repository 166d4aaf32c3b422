use serde_json::json;

use super::{auth::MIN_PASSWORD_LEN, non_empty};
use crate::{
    client::{ApiClient, ApiError},
    models::Settings,
    transport::{ApiRequest, Transport},
};

impl<T: Transport> ApiClient<T> {
    pub async fn settings(&self) -> Result<Settings, ApiError> {
        self.fetch(ApiRequest::get("/settings/get")).await
    }

    /// Changes the login email. The backend re-issues the session cookies.
    pub async fn update_email(&self, email: &str, current_password: &str) -> Result<(), ApiError> {
        let email = non_empty(email, "Email")?;
        self.execute(
            ApiRequest::post("/settings/update/email")
                .json(json!({ "email": email, "currentPassword": current_password })),
        )
        .await
    }

    pub async fn update_password(
        &self,
        current_password: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        self.execute(
            ApiRequest::post("/settings/update/password")
                .json(json!({ "currentPassword": current_password, "password": password })),
        )
        .await
    }

    pub async fn update_notifications(&self, enabled: bool) -> Result<(), ApiError> {
        self.execute(
            ApiRequest::post("/settings/update/notifications").json(json!({ "enabled": enabled })),
        )
        .await
    }

    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete("/settings/delete")).await
    }
}
