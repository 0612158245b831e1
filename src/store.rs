//! Seams to the hosted services: object storage for image bytes and the
//! product catalog. The Supabase client implements both; tests swap in fakes.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{MigrateError, Result};

/// A product row as read from the catalog. Only these three columns are touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_urls: Vec<String>,
}

// Catalog ids are opaque: accept uuid strings and integer keys alike.
fn id_as_string<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported product id: {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `bucket/key`. Must not overwrite an existing object.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Stable public URL for `bucket/key`. Pure; performs no request.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Products whose name contains `token`, case-insensitively. Unordered.
    async fn find_products_by_name(&self, token: &str) -> Result<Vec<ProductRecord>>;

    /// Replace the product's `image_urls` column with `image_urls`.
    async fn update_image_urls(&self, product_id: &str, image_urls: &[String]) -> Result<()>;
}

/// Stand-in used for dry runs when no credentials are configured.
/// Never touches the network; the catalog appears empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

#[async_trait]
impl ObjectStore for OfflineStore {
    async fn upload(&self, _: &str, key: &str, _: Vec<u8>, _: &str) -> Result<()> {
        Err(MigrateError::Upload {
            key: key.to_string(),
            message: "object storage is offline (no credentials configured)".into(),
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("offline://{bucket}/{key}")
    }
}

#[async_trait]
impl CatalogStore for OfflineStore {
    async fn find_products_by_name(&self, _token: &str) -> Result<Vec<ProductRecord>> {
        Ok(Vec::new())
    }

    async fn update_image_urls(&self, product_id: &str, _: &[String]) -> Result<()> {
        Err(MigrateError::Persist {
            product_id: product_id.to_string(),
            message: "catalog is offline (no credentials configured)".into(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// In-memory store recording every call. Uploads listed in `fail_uploads`
    /// (1-based call numbers) return an error.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingStore {
        pub products: Vec<ProductRecord>,
        pub fail_uploads: HashSet<usize>,
        pub fail_queries: bool,
        pub fail_updates: bool,
        pub uploads: Mutex<Vec<(String, String, usize)>>,
        pub queries: Mutex<Vec<String>>,
        pub updates: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingStore {
        pub(crate) fn with_products(products: Vec<ProductRecord>) -> Self {
            Self {
                products,
                ..Self::default()
            }
        }

        pub(crate) fn upload_calls(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }

        pub(crate) fn query_calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        pub(crate) fn update_calls(&self) -> Vec<(String, Vec<String>)> {
            self.updates.lock().unwrap().clone()
        }
    }

    pub(crate) fn product(id: &str, name: &str, urls: &[&str]) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            image_urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn upload(
            &self,
            _bucket: &str,
            key: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<()> {
            let call = {
                let mut uploads = self.uploads.lock().unwrap();
                uploads.push((key.to_string(), content_type.to_string(), bytes.len()));
                uploads.len()
            };
            if self.fail_uploads.contains(&call) {
                return Err(MigrateError::Upload {
                    key: key.to_string(),
                    message: "503 Service Unavailable".into(),
                });
            }
            Ok(())
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("https://cdn.test/{bucket}/{key}")
        }
    }

    #[async_trait]
    impl CatalogStore for RecordingStore {
        async fn find_products_by_name(&self, token: &str) -> Result<Vec<ProductRecord>> {
            self.queries.lock().unwrap().push(token.to_string());
            if self.fail_queries {
                return Err(MigrateError::MatchQuery {
                    token: token.to_string(),
                    message: "connection reset".into(),
                });
            }
            let needle = token.to_lowercase();
            Ok(self
                .products
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        async fn update_image_urls(&self, product_id: &str, image_urls: &[String]) -> Result<()> {
            self.updates
                .lock()
                .unwrap()
                .push((product_id.to_string(), image_urls.to_vec()));
            if self.fail_updates {
                return Err(MigrateError::Persist {
                    product_id: product_id.to_string(),
                    message: "permission denied for table products".into(),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_rows_tolerate_numeric_ids_and_null_arrays() {
        let rows: Vec<ProductRecord> = serde_json::from_value(serde_json::json!([
            {"id": 7, "name": "AFSTPU Standard", "image_urls": null},
            {"id": "3f1c", "name": "FCU 400", "image_urls": ["a", "b"]}
        ]))
        .unwrap();
        assert_eq!(rows[0].id, "7");
        assert!(rows[0].image_urls.is_empty());
        assert_eq!(rows[1].image_urls, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn offline_store_reports_empty_catalog() {
        let store = OfflineStore;
        assert!(store.find_products_by_name("afstpu").await.unwrap().is_empty());
        assert!(store.update_image_urls("1", &[]).await.is_err());
        assert!(store.public_url("b", "k").starts_with("offline://"));
    }
}
