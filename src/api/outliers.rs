use std::sync::Arc;

use crate::{
    client::{ApiClient, ApiError},
    models::Video,
    poller::{PollHandle, Poller},
    transport::{ApiRequest, Transport},
};

impl<T: Transport> ApiClient<T> {
    /// Videos from the channel's tracked competitors that beat their
    /// channel's usual performance. Empty while the backend is still
    /// computing them.
    pub async fn outliers(&self, channel_id: &str) -> Result<Vec<Video>, ApiError> {
        let channel_id = super::non_empty(channel_id, "Channel")?;
        let videos: Option<Vec<Video>> = self
            .fetch(ApiRequest::get("/outliers/list").query("channelId", channel_id))
            .await?;
        Ok(videos.unwrap_or_default())
    }
}

impl<T: Transport + 'static> ApiClient<T> {
    /// Re-fetches outliers until the list is non-empty.
    pub fn poll_outliers(self: &Arc<Self>, poller: &Poller, channel_id: &str) -> PollHandle<Vec<Video>> {
        let client = Arc::clone(self);
        let channel_id = channel_id.to_string();
        poller.start(move || {
            let client = Arc::clone(&client);
            let channel_id = channel_id.clone();
            async move {
                let videos = client.outliers(&channel_id).await?;
                Ok::<_, ApiError>(if videos.is_empty() { None } else { Some(videos) })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        client::REFRESH_PATH,
        poller::PollOutcome,
        testing::{MockTransport, RecordingNavigator},
    };

    #[tokio::test]
    async fn channel_id_goes_in_the_query() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "/outliers/list",
            200,
            r#"[{"videoId": "v1", "title": "Big one", "views": 90000, "outlierScore": 14.2}]"#,
        );
        let client = ApiClient::new(mock.clone());

        let videos = client.outliers("UC1").await.unwrap();
        assert_eq!(videos[0].outlier_score, Some(14.2));
        let sent = mock.last_request("/outliers/list").unwrap();
        assert_eq!(sent.query, vec![("channelId".to_string(), "UC1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_waits_for_a_non_empty_list() {
        let mock = Arc::new(MockTransport::new());
        mock.on("/outliers/list", 200, "[]");
        mock.on("/outliers/list", 500, r#"{"error": "Internal server error"}"#);
        mock.on("/outliers/list", 200, r#"[{"videoId": "v1", "title": "Big one"}]"#);
        let client = Arc::new(ApiClient::new(mock.clone()));

        let handle = client.poll_outliers(&Poller::new(Duration::from_secs(5), 12), "UC1");
        match handle.join().await {
            PollOutcome::Ready(videos) => assert_eq!(videos[0].video_id, "v1"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(mock.calls_to("/outliers/list"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_gives_up_on_an_empty_list() {
        let mock = Arc::new(MockTransport::new());
        mock.on("/outliers/list", 200, "[]");
        let client = Arc::new(ApiClient::new(mock.clone()));

        let outcome = client
            .poll_outliers(&Poller::new(Duration::from_secs(5), 3), "UC1")
            .join()
            .await;
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn polling_ends_when_the_session_cannot_be_renewed() {
        let mock = Arc::new(MockTransport::new());
        mock.on("/outliers/list", 401, "");
        mock.on(REFRESH_PATH, 401, r#"{"error": "Refresh token expired"}"#);
        let navigator = Arc::new(RecordingNavigator::new("/app/outliers"));
        let client = Arc::new(ApiClient::new(mock.clone()).with_navigator(navigator.clone()));

        let outcome = client
            .poll_outliers(&Poller::new(Duration::from_secs(5), 12), "UC1")
            .join()
            .await;
        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(mock.calls_to("/outliers/list"), 1);
        assert_eq!(mock.calls_to(REFRESH_PATH), 1);
        assert_eq!(navigator.redirects(), vec!["/login?next=%2Fapp%2Foutliers".to_string()]);
    }
}
