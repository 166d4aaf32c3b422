use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::require_text;
use crate::{
    client::{ApiClient, ApiError},
    models::NicheChannel,
    transport::{ApiRequest, Transport},
};

pub const MAX_QUERY_LEN: usize = 100;

/// How far back the niche search looks for uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrame {
    LastWeek,
    #[default]
    LastMonth,
    LastYear,
    #[serde(rename = "last_2_years")]
    LastTwoYears,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 4] = [
        TimeFrame::LastWeek,
        TimeFrame::LastMonth,
        TimeFrame::LastYear,
        TimeFrame::LastTwoYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::LastWeek => "last_week",
            TimeFrame::LastMonth => "last_month",
            TimeFrame::LastYear => "last_year",
            TimeFrame::LastTwoYears => "last_2_years",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    Longform,
    Shorts,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Longform => "longform",
            VideoType::Shorts => "shorts",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown option {0:?}")]
pub struct UnknownNicheOption(pub String);

impl FromStr for TimeFrame {
    type Err = UnknownNicheOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFrame::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNicheOption(s.to_string()))
    }
}

impl FromStr for VideoType {
    type Err = UnknownNicheOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "longform" => Ok(VideoType::Longform),
            "shorts" => Ok(VideoType::Shorts),
            other => Err(UnknownNicheOption(other.to_string())),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NicheOptions {
    pub time_frame: TimeFrame,
    pub video_type: VideoType,
}

impl<T: Transport> ApiClient<T> {
    /// Channels ranked by how well they fit the niche described by `query`.
    pub async fn search_niche(
        &self,
        query: &str,
        options: NicheOptions,
    ) -> Result<Vec<NicheChannel>, ApiError> {
        let query = require_text(query, "Query", MAX_QUERY_LEN)?;
        let body = json!({
            "query": query,
            "time_frame": options.time_frame,
            "video_type": options.video_type,
        });
        let channels: Option<Vec<NicheChannel>> = self
            .fetch(ApiRequest::post("/niche-explorer/search").json(body))
            .await?;
        Ok(channels.unwrap_or_default())
    }
}
