use serde_json::json;

use super::non_empty;
use crate::{
    client::{ApiClient, ApiError},
    models::{MarkReadResponse, Notification},
    transport::{ApiRequest, Transport},
};

impl<T: Transport> ApiClient<T> {
    pub async fn notifications(&self, channel_id: &str) -> Result<Vec<Notification>, ApiError> {
        let channel_id = non_empty(channel_id, "Channel")?;
        let notifications: Option<Vec<Notification>> = self
            .fetch(ApiRequest::get("/notifications/list").query("channelId", channel_id))
            .await?;
        Ok(notifications.unwrap_or_default())
    }

    pub async fn mark_notifications_read(
        &self,
        channel_id: &str,
    ) -> Result<MarkReadResponse, ApiError> {
        let channel_id = non_empty(channel_id, "Channel")?;
        self.fetch(
            ApiRequest::post("/notifications/mark-read").json(json!({ "channelId": channel_id })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn list_then_mark_read() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/notifications/list",
            200,
            r#"[{"_id": "n1", "channelId": "UC1", "message": "New outlier", "read": false, "timestamp": "2024-03-01T10:00:00Z"}]"#,
        );
        mock.on(
            "/notifications/mark-read",
            200,
            r#"{"success": true, "updatedCount": 1}"#,
        );
        let client = ApiClient::new(mock.clone());

        let notifications = client.notifications("UC1").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(!notifications[0].read);
        assert!(notifications[0].timestamp.is_some());
        assert_eq!(
            mock.last_request("/notifications/list").unwrap().query,
            vec![("channelId".to_string(), "UC1".to_string())]
        );

        let marked = client.mark_notifications_read("UC1").await.unwrap();
        assert_eq!(marked.updated_count, 1);
        assert_eq!(
            mock.last_request("/notifications/mark-read").unwrap().body,
            Some(json!({"channelId": "UC1"}))
        );
    }
}
