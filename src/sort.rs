//! Client-side ordering of already fetched video lists.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};

use crate::models::Video;

/// Anything a video grid can be sorted by. Missing values count as zero or
/// the Unix epoch.
pub trait Sortable {
    fn view_count(&self) -> u64;
    fn published_at(&self) -> DateTime<Utc>;
    fn outlier_score(&self) -> f64;
}

impl Sortable for Video {
    fn view_count(&self) -> u64 {
        self.view_count.unwrap_or(0)
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn outlier_score(&self) -> f64 {
        self.outlier_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    Views,
    ViewsAsc,
    #[default]
    Recent,
    Oldest,
    Outlier,
    OutlierLow,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown sort option {0:?}")]
pub struct UnknownSortOption(pub String);

impl SortOption {
    pub const ALL: [SortOption; 6] = [
        SortOption::Views,
        SortOption::ViewsAsc,
        SortOption::Recent,
        SortOption::Oldest,
        SortOption::Outlier,
        SortOption::OutlierLow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Views => "views",
            SortOption::ViewsAsc => "views_asc",
            SortOption::Recent => "recent",
            SortOption::Oldest => "oldest",
            SortOption::Outlier => "outlier",
            SortOption::OutlierLow => "outlier_low",
        }
    }

    pub fn compare<V: Sortable>(&self, a: &V, b: &V) -> Ordering {
        match self {
            SortOption::Views => b.view_count().cmp(&a.view_count()),
            SortOption::ViewsAsc => a.view_count().cmp(&b.view_count()),
            SortOption::Recent => b.published_at().cmp(&a.published_at()),
            SortOption::Oldest => a.published_at().cmp(&b.published_at()),
            SortOption::Outlier => b.outlier_score().total_cmp(&a.outlier_score()),
            SortOption::OutlierLow => a.outlier_score().total_cmp(&b.outlier_score()),
        }
    }
}

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| UnknownSortOption(s.to_string()))
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns a sorted copy; ties keep their original order.
pub fn sort_videos<V: Sortable + Clone>(videos: &[V], option: SortOption) -> Vec<V> {
    let mut sorted = videos.to_vec();
    sorted.sort_by(|a, b| option.compare(a, b));
    sorted
}

/// Sorts by a raw option key; an unknown key leaves the order untouched.
pub fn sort_by_key<V: Sortable + Clone>(videos: &[V], key: &str) -> Vec<V> {
    match key.parse::<SortOption>() {
        Ok(option) => sort_videos(videos, option),
        Err(_) => videos.to_vec(),
    }
}
