use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::prelude::*;
use serde_json::Value;

/// Accepts RFC 3339 (YouTube) and RFC 2822 (Flask `jsonify` of datetimes)
/// timestamps; anything else, or no value, becomes `None`.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .or_else(|_| DateTime::parse_from_rfc2822(&s))
            .map(|d| d.with_timezone(&Utc))
            .ok()
    }))
}

fn default_auth_provider() -> String {
    "local".to_string()
}

fn default_true() -> bool {
    true
}

/// The logged in user as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default = "default_auth_provider", alias = "authProvider")]
    pub auth_provider: String,
    #[serde(default = "default_true", alias = "notificationsEnabled")]
    pub notifications_enabled: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A channel the user connected, as listed by `/channel/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: String,
    #[serde(default, alias = "title")]
    pub channel_title: String,
    #[serde(default, alias = "thumbnail")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub subscriber_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// The one channel the views work against. This is what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedChannel {
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

impl From<&Channel> for SelectedChannel {
    fn from(channel: &Channel) -> Self {
        Self {
            channel_id: channel.channel_id.clone(),
            title: channel.channel_title.clone(),
            avatar: channel.avatar.clone(),
            handle: channel.handle.clone(),
        }
    }
}

/// Payload for `/channel/add`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChannel {
    pub channel_id: String,
    pub channel_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// A YouTube channel found through `/channel/search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSearchResult {
    pub channel_id: String,
    #[serde(default, alias = "title")]
    pub channel_title: String,
    #[serde(default, alias = "thumbnail")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub subscriber_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "views",
        deserialize_with = "deserialize_option_number_from_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(
        default,
        alias = "videoChannelId",
        skip_serializing_if = "Option::is_none"
    )]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Longform,
    Shorts,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Longform => "longform",
            ContentType::Shorts => "shorts",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default, alias = "title")]
    pub channel_title: String,
    #[serde(default, alias = "avatar")]
    pub thumbnail: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub subscriber_count: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelMetadata {
    #[serde(default)]
    pub channel: Option<ChannelInfo>,
}

/// Channel statistics; the backend shape varies so fields are kept as is.
pub type ChannelStats = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub attention_market: Option<String>,
    #[serde(default)]
    pub competitor_type: Option<String>,
}

/// `insights` stays empty while the backend is still computing them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub insights: Option<Insights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: String,
    pub name: String,
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionVideos {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorList {
    pub list_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub competitor_channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_number_from_string"
    )]
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddCompetitorResponse {
    #[serde(default)]
    pub success: bool,
    pub competitor: Option<Competitor>,
}

/// A channel surfaced by the niche explorer, ranked by `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicheChannel {
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_number_from_string"
    )]
    pub subscriber_count: u64,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TitleSuggestions {
    #[serde(default)]
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub email: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_auth_provider")]
    pub auth_provider: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub updated_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn video_accepts_outlier_list_shape() {
        let video: Video = serde_json::from_value(json!({
            "videoId": "abc",
            "title": "How I edit",
            "views": "12345",
            "outlierScore": 8.4,
            "publishedAt": "2024-03-01T12:00:00Z",
            "channelTitle": "Someone",
            "videoChannelId": "UC1"
        }))
        .unwrap();
        assert_eq!(video.view_count, Some(12_345));
        assert_eq!(video.outlier_score, Some(8.4));
        assert_eq!(video.channel_id.as_deref(), Some("UC1"));
        assert_eq!(
            video.published_at.unwrap().to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn video_tolerates_missing_and_odd_fields() {
        let video: Video = serde_json::from_value(json!({
            "videoId": "abc",
            "publishedAt": "yesterday"
        }))
        .unwrap();
        assert_eq!(video.view_count, None);
        assert_eq!(video.published_at, None);
        assert_eq!(video.outlier_score, None);
    }

    #[test]
    fn competitor_list_parses_flask_dates() {
        let list: CompetitorList = serde_json::from_value(json!({
            "listId": "65f0",
            "name": "Tech",
            "createdAt": "Tue, 05 Mar 2024 10:00:00 GMT"
        }))
        .unwrap();
        assert!(list.created_at.is_some());
    }

    #[test]
    fn session_user_keeps_unknown_fields() {
        let user: SessionUser = serde_json::from_value(json!({
            "_id": "u1",
            "email": "me@example.com",
            "auth_provider": "google",
            "notifications_enabled": false,
            "channels": []
        }))
        .unwrap();
        assert_eq!(user.auth_provider, "google");
        assert!(!user.notifications_enabled);
        assert!(user.extra.contains_key("channels"));

        let minimal: SessionUser =
            serde_json::from_value(json!({"email": "me@example.com"})).unwrap();
        assert_eq!(minimal.auth_provider, "local");
        assert!(minimal.notifications_enabled);
    }

    #[test]
    fn selected_channel_is_stored_with_browser_field_names() {
        let channel: Channel = serde_json::from_value(json!({
            "channelId": "abc",
            "channelTitle": "My Channel",
            "avatar": "https://img",
            "handle": "@mine"
        }))
        .unwrap();
        let stored = serde_json::to_value(SelectedChannel::from(&channel)).unwrap();
        assert_eq!(
            stored,
            json!({
                "channelId": "abc",
                "title": "My Channel",
                "avatar": "https://img",
                "handle": "@mine"
            })
        );
    }
}
