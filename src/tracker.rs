//! Recent uploads of tracked competitors, refetched at most every ten
//! minutes per channel and content type.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
    client::{ApiClient, ApiError},
    models::{ContentType, Video},
    transport::Transport,
};

pub fn freshness() -> Duration {
    Duration::minutes(10)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVideos {
    pub fetched_at: DateTime<Utc>,
    pub videos: Vec<Video>,
    /// The last fetch brought a video newer than anything seen before.
    pub has_new_video: bool,
}

fn newest(videos: &[Video]) -> Option<DateTime<Utc>> {
    videos.iter().filter_map(|v| v.published_at).max()
}

#[derive(Debug, Default)]
pub struct CompetitorTracker {
    entries: HashMap<(String, ContentType), TrackedVideos>,
}

impl CompetitorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: &str, content_type: ContentType) -> Option<&TrackedVideos> {
        self.entries.get(&(channel_id.to_string(), content_type))
    }

    pub fn has_new_video(&self, channel_id: &str, content_type: ContentType) -> bool {
        self.get(channel_id, content_type)
            .is_some_and(|t| t.has_new_video)
    }

    pub fn needs_refresh(&self, channel_id: &str, content_type: ContentType, now: DateTime<Utc>) -> bool {
        match self.get(channel_id, content_type) {
            Some(tracked) => now - tracked.fetched_at >= freshness(),
            None => true,
        }
    }

    /// Stores a fetch and returns whether it brought a new upload. The first
    /// fetch of a channel never counts as new.
    pub fn record(
        &mut self,
        channel_id: &str,
        content_type: ContentType,
        videos: Vec<Video>,
        now: DateTime<Utc>,
    ) -> bool {
        let key = (channel_id.to_string(), content_type);
        let previous = self.entries.get(&key).and_then(|t| newest(&t.videos));
        let has_new_video = match (newest(&videos), previous) {
            (Some(latest), Some(previous)) => latest > previous,
            _ => false,
        };
        if has_new_video {
            info!("{} has a new {} upload", channel_id, content_type.as_str());
        }
        self.entries.insert(
            key,
            TrackedVideos {
                fetched_at: now,
                videos,
                has_new_video,
            },
        );
        has_new_video
    }

    /// Drops a competitor that was removed from its list.
    pub fn forget(&mut self, channel_id: &str) {
        self.entries.retain(|(id, _), _| id != channel_id);
    }

    /// Refetches the first page of `channel_id`'s uploads when the cached one
    /// is stale. Returns whether a fetch happened.
    pub async fn refresh<T: Transport>(
        &mut self,
        client: &ApiClient<T>,
        channel_id: &str,
        content_type: ContentType,
        now: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        if !self.needs_refresh(channel_id, content_type, now) {
            return Ok(false);
        }
        debug!("Fetching {} videos for {}", content_type.as_str(), channel_id);
        let page = client
            .channel_videos(channel_id, None, Some(content_type))
            .await?;
        self.record(channel_id, content_type, page.videos, now);
        Ok(true)
    }
}
