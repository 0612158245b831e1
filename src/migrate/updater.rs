use tracing::{info, warn};

use crate::store::{CatalogStore, ProductRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Persisted { image_urls: Vec<String> },
    /// Dry run: the list that would have been written.
    Previewed { image_urls: Vec<String> },
    Failed { error: String },
}

impl UpdateOutcome {
    pub fn success(&self) -> bool {
        !matches!(self, UpdateOutcome::Failed { .. })
    }
}

/// Existing URLs followed by `public_url`. No de-duplication: each run
/// uploads to a fresh key, so a re-run appends a new, distinct URL.
pub fn appended_urls(existing: &[String], public_url: &str) -> Vec<String> {
    let mut urls = Vec::with_capacity(existing.len() + 1);
    urls.extend_from_slice(existing);
    urls.push(public_url.to_string());
    urls
}

pub struct CatalogUpdater<'a, C> {
    catalog: &'a C,
    dry_run: bool,
}

impl<'a, C: CatalogStore> CatalogUpdater<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Append `public_url` to the product's image list and persist it.
    pub async fn append_image(&self, product: &ProductRecord, public_url: &str) -> UpdateOutcome {
        if public_url.trim().is_empty() {
            return UpdateOutcome::Failed {
                error: "refusing to attach an empty image URL".into(),
            };
        }

        let image_urls = appended_urls(&product.image_urls, public_url);
        if self.dry_run {
            info!(target = "catalog", product_id = %product.id, urls = image_urls.len(), "dry-run: image_urls not written");
            return UpdateOutcome::Previewed { image_urls };
        }

        match self
            .catalog
            .update_image_urls(&product.id, &image_urls)
            .await
        {
            Ok(()) => UpdateOutcome::Persisted { image_urls },
            Err(err) => {
                warn!(target = "catalog", product_id = %product.id, error = %err, "image_urls update failed");
                UpdateOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}
