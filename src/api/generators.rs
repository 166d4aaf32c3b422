use serde_json::json;

use super::{non_empty, require_text};
use crate::{
    client::{ApiClient, ApiError},
    models::TitleSuggestions,
    transport::{ApiRequest, Transport},
};

pub const MAX_IDEA_LEN: usize = 100;

impl<T: Transport> ApiClient<T> {
    /// Title suggestions for a video idea, styled after the user's channel.
    pub async fn generate_titles(&self, idea: &str, channel_id: &str) -> Result<Vec<String>, ApiError> {
        let idea = require_text(idea, "Idea", MAX_IDEA_LEN)?;
        let channel_id = non_empty(channel_id, "Channel")?;
        let suggestions: Option<TitleSuggestions> = self
            .fetch(
                ApiRequest::post("/generators/title")
                    .json(json!({ "idea": idea, "channelId": channel_id })),
            )
            .await?;
        Ok(suggestions.map(|s| s.titles).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn titles_are_generated_for_the_selected_channel() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/generators/title",
            200,
            r#"{"titles": ["I Cooked Every Egg", "The Egg Nobody Makes"]}"#,
        );
        let client = ApiClient::new(mock.clone());

        let titles = client.generate_titles(" eggs ", "UC1").await.unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(
            mock.last_request("/generators/title").unwrap().body,
            Some(json!({"idea": "eggs", "channelId": "UC1"}))
        );
    }

    #[tokio::test]
    async fn empty_idea_never_reaches_the_server() {
        let mock = Arc::new(MockTransport::new());
        let client = ApiClient::new(mock.clone());
        let err = client.generate_titles("  ", "UC1").await.unwrap_err();
        assert_eq!(err.message(), "Idea is required.");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_profile_error_is_shown_as_is() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/generators/title",
            400,
            r#"{"error": "Could not find your channel profile. Add it first."}"#,
        );
        let client = ApiClient::new(mock);
        let err = client.generate_titles("eggs", "UC1").await.unwrap_err();
        assert_eq!(err.message(), "Could not find your channel profile. Add it first.");
    }
}
