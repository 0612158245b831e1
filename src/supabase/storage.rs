use async_trait::async_trait;
use tracing::debug;

use super::{encode_key, failure_message, SupabaseClient};
use crate::error::{MigrateError, Result};
use crate::store::ObjectStore;

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_key(key)
        );
        let size = bytes.len();
        let req = self
            .http
            .post(&url)
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes);

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| MigrateError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(MigrateError::Upload {
                key: key.to_string(),
                message: failure_message(resp).await,
            });
        }
        debug!(target = "storage", bucket, key, size, "object stored");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_key(key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn upload_posts_raw_bytes_with_content_type() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/storage/v1/object/product-images/migrated/1-abc-unit.webp")
                .header("content-type", "image/webp")
                .header("authorization", "Bearer service-key")
                .header("apikey", "service-key")
                .header("x-upsert", "false")
                .body("RIFF");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"Key": "product-images/migrated/1-abc-unit.webp"}));
        });

        let client = SupabaseClient::new(&server.base_url(), "service-key", Some(5)).unwrap();
        client
            .upload(
                "product-images",
                "migrated/1-abc-unit.webp",
                b"RIFF".to_vec(),
                "image/webp",
            )
            .await
            .expect("upload should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn upload_surfaces_storage_errors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/storage/v1/object/product-images/migrated/dup.png");
            then.status(409)
                .header("content-type", "application/json")
                .json_body(json!({"statusCode": "409", "error": "Duplicate", "message": "The resource already exists"}));
        });

        let client = SupabaseClient::new(&server.base_url(), "k", Some(5)).unwrap();
        let err = client
            .upload("product-images", "migrated/dup.png", vec![1, 2, 3], "image/png")
            .await
            .expect_err("conflict expected");
        assert!(
            matches!(err, MigrateError::Upload { ref message, .. } if message.contains("409") && message.contains("already exists"))
        );
    }

    #[test]
    fn public_url_points_at_public_object_route() {
        let client = SupabaseClient::new("https://abc.supabase.co", "k", None).unwrap();
        assert_eq!(
            client.public_url("product-images", "migrated/1-x-FCU 400.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/product-images/migrated/1-x-FCU%20400.jpg"
        );
    }
}
