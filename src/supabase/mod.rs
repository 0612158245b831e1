//! Thin Supabase client over reqwest: Storage for image objects and
//! PostgREST for the products table.
//!
//! Endpoints used:
//! - POST  /storage/v1/object/{bucket}/{key}      upload raw bytes
//! - GET   /storage/v1/object/public/{bucket}/{key}  public URL (never requested here)
//! - GET   /rest/v1/{table}?name=ilike.*token*    fuzzy product lookup
//! - PATCH /rest/v1/{table}?id=eq.{id}            image_urls write-back

pub mod rest;
pub mod storage;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::config::{Credentials, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PRODUCTS_TABLE};
use crate::error::{truncate_for_log, Result};

/// One client per process; cloned cheaply and shared by every pipeline step.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    products_table: String,
    http: Client,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: Option<u64>) -> Result<Self> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let http = Client::builder()
            .user_agent(concat!("catalog-image-migrate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            products_table: DEFAULT_PRODUCTS_TABLE.to_string(),
            http,
        })
    }

    pub fn from_credentials(creds: &Credentials, timeout_secs: Option<u64>) -> Result<Self> {
        Self::new(&creds.url, &creds.api_key, timeout_secs)
    }

    pub fn with_products_table(mut self, table: impl Into<String>) -> Self {
        self.products_table = table.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Percent-encode each `/`-separated segment of an object key, keeping the separators.
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a non-2xx response into a readable message (status plus clipped body).
pub(crate) async fn failure_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let body = truncate_for_log(body.trim().to_string(), 300);
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_encoded_per_segment() {
        assert_eq!(
            encode_key("migrated/1700000000000-ab12cd34-AFSTPU (STANDARD).webp"),
            "migrated/1700000000000-ab12cd34-AFSTPU%20%28STANDARD%29.webp"
        );
    }

    #[test]
    fn base_url_is_normalized() {
        let client = SupabaseClient::new("https://abc.supabase.co/", "k", Some(5)).unwrap();
        assert_eq!(client.base_url(), "https://abc.supabase.co");
    }
}
