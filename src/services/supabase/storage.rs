// src/services/supabase/storage.rs
//
// Storage API: object upload and public URLs.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info};

use super::{check, SupabaseClient};
use crate::services::provider::{ObjectStorage, ProviderError};

/// Percent-encodes each path segment, keeping the `/` separators
fn encode_key(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        let size = data.len();
        let url = self.endpoint(&format!(
            "/storage/v1/object/{}/{}",
            urlencoding::encode(bucket),
            encode_key(path)
        ));

        let request = self
            .authorized(
                self.inner
                    .http
                    .post(url)
                    .header("Content-Type", content_type)
                    .header("x-upsert", "false")
                    .body(data),
            )
            .await?;

        check(request.send().await?).await.map_err(|e| {
            error!(error = %e, bucket = %bucket, key = %path, "Failed to upload object");
            e
        })?;

        info!(bucket = %bucket, key = %path, size, "Object uploaded");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            urlencoding::encode(bucket),
            encode_key(path)
        ))
    }
}
