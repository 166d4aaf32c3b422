use std::sync::Arc;

use serde_json::{json, Value};

use super::segment;
use crate::{
    client::{ApiClient, ApiError},
    models::{
        Channel, ChannelList, ChannelMetadata, ChannelSearchResult, ChannelStats, ContentType,
        Insights, InsightsResponse, NewChannel, VideoPage,
    },
    poller::{PollHandle, Poller},
    transport::{ApiRequest, Transport},
};

impl<T: Transport> ApiClient<T> {
    pub async fn add_channel(&self, channel: &NewChannel) -> Result<(), ApiError> {
        let body = serde_json::to_value(channel)?;
        self.execute(ApiRequest::post("/channel/add").json(body))
            .await
    }

    pub async fn remove_channel(&self, channel_id: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post("/channel/remove").json(json!({ "channelId": channel_id })))
            .await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        let list: Option<ChannelList> = self.fetch(ApiRequest::get("/channel/list")).await?;
        Ok(list.map(|l| l.channels).unwrap_or_default())
    }

    pub async fn search_channels(&self, query: &str) -> Result<Vec<ChannelSearchResult>, ApiError> {
        let query = super::non_empty(query, "Search query")?;
        let results: Option<Vec<ChannelSearchResult>> = self
            .fetch(ApiRequest::get("/channel/search").query("q", query))
            .await?;
        Ok(results.unwrap_or_default())
    }

    /// One page of a channel's uploads; pass the previous page's
    /// `next_page_token` to continue.
    pub async fn channel_videos(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
        content_type: Option<ContentType>,
    ) -> Result<VideoPage, ApiError> {
        let body = json!({
            "pageToken": page_token,
            "contentType": content_type.map(|c| c.as_str()),
        });
        let page: Option<VideoPage> = self
            .fetch(ApiRequest::post(format!("/channel/{}/videos", segment(channel_id))).json(body))
            .await?;
        Ok(page.unwrap_or_default())
    }

    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, ApiError> {
        self.fetch(ApiRequest::get(format!("/channel/{}/stats", segment(channel_id))))
            .await
    }

    pub async fn channel_metadata(&self, channel_id: &str) -> Result<ChannelMetadata, ApiError> {
        self.fetch(ApiRequest::get(format!("/channel/{}/metadata", segment(channel_id))))
            .await
    }

    /// Insights about `channel_id` relative to the user's own channel. The
    /// `insights` field is empty while the backend is still computing them.
    pub async fn channel_insights(
        &self,
        channel_id: &str,
        my_channel_id: &str,
    ) -> Result<InsightsResponse, ApiError> {
        let value: Value = self
            .fetch(
                ApiRequest::post(format!("/channel/{}/insights", segment(channel_id)))
                    .json(json!({ "my_channel_id": my_channel_id })),
            )
            .await?;
        if value.is_null() {
            return Ok(InsightsResponse { insights: None });
        }
        serde_json::from_value(value).map_err(ApiError::Decode)
    }
}

impl<T: Transport + 'static> ApiClient<T> {
    /// Re-requests insights until the backend has finished computing them.
    pub fn poll_insights(
        self: &Arc<Self>,
        poller: &Poller,
        channel_id: &str,
        my_channel_id: &str,
    ) -> PollHandle<Insights> {
        let client = Arc::clone(self);
        let channel_id = channel_id.to_string();
        let my_channel_id = my_channel_id.to_string();
        poller.start(move || {
            let client = Arc::clone(&client);
            let channel_id = channel_id.clone();
            let my_channel_id = my_channel_id.clone();
            async move {
                let resp = client.channel_insights(&channel_id, &my_channel_id).await?;
                Ok::<_, ApiError>(resp.insights)
            }
        })
    }
}
