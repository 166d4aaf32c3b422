use serde_json::json;

use super::{non_empty, segment};
use crate::{
    client::{ApiClient, ApiError},
    models::{Collection, CollectionVideos, Video},
    transport::{ApiRequest, Transport},
};

impl<T: Transport> ApiClient<T> {
    pub async fn collections(&self) -> Result<Vec<Collection>, ApiError> {
        let collections: Option<Vec<Collection>> =
            self.fetch(ApiRequest::get("/collections/list")).await?;
        Ok(collections.unwrap_or_default())
    }

    pub async fn create_collection(&self, name: &str) -> Result<Collection, ApiError> {
        let name = non_empty(name, "Collection name")?;
        self.fetch(ApiRequest::post("/collections/create").json(json!({ "name": name })))
            .await
    }

    pub async fn rename_collection(&self, collection_id: &str, name: &str) -> Result<(), ApiError> {
        let name = non_empty(name, "Collection name")?;
        self.execute(
            ApiRequest::post(format!("/collections/{}/rename", segment(collection_id)))
                .json(json!({ "name": name })),
        )
        .await
    }

    pub async fn delete_collection(&self, collection_id: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(format!(
            "/collections/{}",
            segment(collection_id)
        )))
        .await
    }

    pub async fn collection_videos(&self, collection_id: &str) -> Result<Vec<Video>, ApiError> {
        let resp: Option<CollectionVideos> = self
            .fetch(ApiRequest::get(format!(
                "/collections/{}/videos",
                segment(collection_id)
            )))
            .await?;
        Ok(resp.map(|r| r.videos).unwrap_or_default())
    }

    pub async fn add_video_to_collection(
        &self,
        collection_id: &str,
        video: &Video,
    ) -> Result<(), ApiError> {
        let video = serde_json::to_value(video)?;
        self.execute(
            ApiRequest::post(format!("/collections/{}/videos", segment(collection_id)))
                .json(json!({ "video": video })),
        )
        .await
    }

    pub async fn remove_video_from_collection(
        &self,
        collection_id: &str,
        video_id: &str,
    ) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(format!(
            "/collections/{}/videos/{}",
            segment(collection_id),
            segment(video_id)
        )))
        .await
    }
}
