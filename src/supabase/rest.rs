use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{failure_message, SupabaseClient};
use crate::error::{MigrateError, Result};
use crate::store::{CatalogStore, ProductRecord};

const PRODUCT_COLUMNS: &str = "id,name,image_urls";

impl SupabaseClient {
    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.products_table)
    }
}

#[async_trait]
impl CatalogStore for SupabaseClient {
    async fn find_products_by_name(&self, token: &str) -> Result<Vec<ProductRecord>> {
        let query_err = |message: String| MigrateError::MatchQuery {
            token: token.to_string(),
            message,
        };

        let pattern = format!("ilike.*{token}*");
        let req = self
            .http
            .get(self.table_url())
            .query(&[("select", PRODUCT_COLUMNS), ("name", pattern.as_str())]);

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| query_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(query_err(failure_message(resp).await));
        }

        let rows: Vec<ProductRecord> = resp
            .json()
            .await
            .map_err(|e| query_err(format!("unexpected response body: {e}")))?;
        debug!(target = "catalog", token, rows = rows.len(), "product lookup");
        Ok(rows)
    }

    async fn update_image_urls(&self, product_id: &str, image_urls: &[String]) -> Result<()> {
        let persist_err = |message: String| MigrateError::Persist {
            product_id: product_id.to_string(),
            message,
        };

        let filter = format!("eq.{product_id}");
        let req = self
            .http
            .patch(self.table_url())
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&json!({ "image_urls": image_urls }));

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| persist_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(persist_err(failure_message(resp).await));
        }
        debug!(target = "catalog", product_id, urls = image_urls.len(), "image_urls updated");
        Ok(())
    }
}
