use serde::Deserialize;
use serde_json::json;

use super::{require_text, segment};
use crate::{
    client::{ApiClient, ApiError},
    models::{AddCompetitorResponse, Competitor, CompetitorList},
    transport::{ApiRequest, Transport},
};

pub const MAX_LIST_NAME_LEN: usize = 50;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedList {
    list_id: String,
}

fn lists_path(channel_id: &str) -> String {
    format!("/competitor-tracker/lists/{}", segment(channel_id))
}

fn competitors_path(channel_id: &str, list_id: &str) -> String {
    format!(
        "/competitor-tracker/competitors/{}/{}",
        segment(channel_id),
        segment(list_id)
    )
}

impl<T: Transport> ApiClient<T> {
    pub async fn competitor_lists(&self, channel_id: &str) -> Result<Vec<CompetitorList>, ApiError> {
        let lists: Option<Vec<CompetitorList>> =
            self.fetch(ApiRequest::get(lists_path(channel_id))).await?;
        Ok(lists.unwrap_or_default())
    }

    /// Creates a list under the user's channel and returns its id.
    pub async fn create_competitor_list(
        &self,
        channel_id: &str,
        name: &str,
    ) -> Result<String, ApiError> {
        let name = require_text(name, "List name", MAX_LIST_NAME_LEN)?;
        let created: CreatedList = self
            .fetch(
                ApiRequest::post(format!("{}/create", lists_path(channel_id)))
                    .json(json!({ "name": name })),
            )
            .await?;
        Ok(created.list_id)
    }

    pub async fn rename_competitor_list(
        &self,
        channel_id: &str,
        list_id: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let name = require_text(name, "List name", MAX_LIST_NAME_LEN)?;
        self.execute(
            ApiRequest::post(format!(
                "{}/{}/rename",
                lists_path(channel_id),
                segment(list_id)
            ))
            .json(json!({ "name": name })),
        )
        .await
    }

    pub async fn delete_competitor_list(&self, channel_id: &str, list_id: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(format!(
            "{}/{}/delete",
            lists_path(channel_id),
            segment(list_id)
        )))
        .await
    }

    pub async fn competitors(&self, channel_id: &str, list_id: &str) -> Result<Vec<Competitor>, ApiError> {
        let competitors: Option<Vec<Competitor>> = self
            .fetch(ApiRequest::get(competitors_path(channel_id, list_id)))
            .await?;
        Ok(competitors.unwrap_or_default())
    }

    pub async fn add_competitor(
        &self,
        channel_id: &str,
        list_id: &str,
        competitor_channel_id: &str,
    ) -> Result<AddCompetitorResponse, ApiError> {
        let competitor_channel_id = super::non_empty(competitor_channel_id, "Competitor channel")?;
        self.fetch(
            ApiRequest::post(format!("{}/add", competitors_path(channel_id, list_id)))
                .json(json!({ "competitorChannelId": competitor_channel_id })),
        )
        .await
    }

    pub async fn remove_competitor(
        &self,
        channel_id: &str,
        list_id: &str,
        competitor_channel_id: &str,
    ) -> Result<(), ApiError> {
        self.execute(
            ApiRequest::post(format!("{}/remove", competitors_path(channel_id, list_id)))
                .json(json!({ "competitor_channel_id": competitor_channel_id })),
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
    async fn create_list_returns_id_and_trims_name() {
        let mock = Arc::new(MockTransport::new());
        mock.on("/competitor-tracker/lists/UC1/create", 200, r#"{"listId": "l1"}"#);
        let client = ApiClient::new(mock.clone());

        let id = client.create_competitor_list("UC1", " Rivals ").await.unwrap();
        assert_eq!(id, "l1");
        let sent = mock.last_request("/competitor-tracker/lists/UC1/create").unwrap();
        assert_eq!(sent.body, Some(json!({"name": "Rivals"})));
    }

    #[tokio::test]
    async fn long_list_names_are_rejected_locally() {
        let mock = Arc::new(MockTransport::new());
        let client = ApiClient::new(mock.clone());
        let err = client
            .create_competitor_list("UC1", &"x".repeat(MAX_LIST_NAME_LEN + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn add_and_list_competitors() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/competitor-tracker/competitors/UC1/l1/add",
            200,
            r#"{"success": true, "competitor": {"competitorChannelId": "UC7", "channelTitle": "Rival", "avatar": "", "subscriberCount": 10}}"#,
        );
        mock.on(
            "/competitor-tracker/competitors/UC1/l1",
            200,
            r#"[{"competitorChannelId": "UC7", "channelTitle": "Rival", "subscriberCount": "10"}]"#,
        );
        let client = ApiClient::new(mock.clone());

        let added = client.add_competitor("UC1", "l1", "UC7").await.unwrap();
        assert!(added.success);
        assert_eq!(added.competitor.unwrap().channel_title, "Rival");
        let sent = mock
            .last_request("/competitor-tracker/competitors/UC1/l1/add")
            .unwrap();
        assert_eq!(sent.body, Some(json!({"competitorChannelId": "UC7"})));

        let listed = client.competitors("UC1", "l1").await.unwrap();
        assert_eq!(listed[0].subscriber_count, 10);
    }

    #[tokio::test]
    async fn remove_uses_snake_case_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/competitor-tracker/competitors/UC1/l1/remove",
            200,
            r#"{"success": true}"#,
        );
        let client = ApiClient::new(mock.clone());
        client.remove_competitor("UC1", "l1", "UC7").await.unwrap();
        let sent = mock
            .last_request("/competitor-tracker/competitors/UC1/l1/remove")
            .unwrap();
        assert_eq!(sent.body, Some(json!({"competitor_channel_id": "UC7"})));
    }

    #[tokio::test]
    async fn missing_list_surfaces_not_found() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/competitor-tracker/lists/UC1/l9/delete",
            404,
            r#"{"error": "List not found"}"#,
        );
        let client = ApiClient::new(mock);
        let err = client.delete_competitor_list("UC1", "l9").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert_eq!(err.message(), "List not found");
    }
}
