use std::path::Path;

use futures::{stream, StreamExt};
use tracing::{info, warn};

use super::matcher::{MatchPolicy, ProductMatcher, Selection};
use super::scanner::{scan_images, ImageDescriptor};
use super::summary::{CatalogStep, FileOutcome, PipelineRunSummary};
use super::updater::{CatalogUpdater, UpdateOutcome};
use super::uploader::{UploadResult, Uploader};
use crate::config::{MigrationConfig, RunMode};
use crate::store::{CatalogStore, ObjectStore};

/// Drives scan -> upload -> match -> update over a directory of images.
///
/// Each file is handled in isolation: a failure is recorded in its
/// [`FileOutcome`] and the batch moves on. With `concurrency > 1` up to that
/// many files are in flight, but outcomes are still consumed in scan order by
/// this task alone, so the summary is never shared.
pub struct Pipeline<'a, S, C> {
    uploader: Uploader<'a, S>,
    matcher: ProductMatcher<'a, C>,
    updater: CatalogUpdater<'a, C>,
    policy: MatchPolicy,
    mode: RunMode,
    concurrency: usize,
}

impl<'a, S: ObjectStore, C: CatalogStore> Pipeline<'a, S, C> {
    pub fn new(store: &'a S, catalog: &'a C, config: &MigrationConfig) -> Self {
        let mode = config.mode;
        Self {
            uploader: Uploader::new(store, config.bucket.clone(), config.key_prefix.clone())
                .with_throttle(config.throttle)
                .dry_run(mode.dry_run),
            matcher: ProductMatcher::new(catalog),
            updater: CatalogUpdater::new(catalog).dry_run(mode.dry_run),
            policy: config.match_policy,
            mode,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Scan `root` and process everything found. A missing directory is
    /// logged and yields an empty summary.
    pub async fn run(&self, root: &Path) -> PipelineRunSummary {
        let images = match scan_images(root) {
            Ok(images) => images,
            Err(err) => {
                warn!(target = "migrate", error = %err, "nothing to migrate");
                println!("⚠️  {err}; nothing to migrate");
                return PipelineRunSummary::default();
            }
        };
        println!("📁 Found {} image(s) in {}", images.len(), root.display());
        self.process_all(&images).await
    }

    pub async fn process_all(&self, images: &[ImageDescriptor]) -> PipelineRunSummary {
        let mut summary = PipelineRunSummary {
            scanned: images.len(),
            ..PipelineRunSummary::default()
        };
        let total = images.len();

        let mut outcomes = stream::iter(images.iter().enumerate())
            .map(|(i, image)| self.process(i + 1, total, image))
            .buffered(self.concurrency);
        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);
        }

        info!(
            target = "migrate",
            scanned = summary.scanned,
            uploaded = summary.uploaded,
            failed = summary.failed_uploads,
            updated = summary.matched_and_updated,
            "batch complete"
        );
        summary
    }

    async fn process(&self, index: usize, total: usize, image: &ImageDescriptor) -> FileOutcome {
        let size_kb = image.size_bytes as f64 / 1024.0;
        if self.mode.dry_run {
            println!(
                "🧪 [{index}/{total}] Would upload {} ({size_kb:.1} KB)",
                image.relative_path
            );
        } else {
            println!(
                "📤 [{index}/{total}] Uploading {} ({size_kb:.1} KB)",
                image.relative_path
            );
        }

        let upload = self.uploader.upload(image).await;
        let catalog = match &upload {
            UploadResult::Failed { error } => {
                println!("   ❌ Upload failed: {error}");
                CatalogStep::NotAttempted
            }
            UploadResult::Uploaded { public_url, .. } => {
                println!("   ✅ {public_url}");
                if self.mode.update_catalog {
                    self.attach(&image.name, public_url).await
                } else {
                    CatalogStep::NotAttempted
                }
            }
        };

        FileOutcome {
            relative_path: image.relative_path.clone(),
            upload,
            catalog,
        }
    }

    async fn attach(&self, file_name: &str, public_url: &str) -> CatalogStep {
        let set = self.matcher.find_matches(file_name).await;
        let Some(token) = set.token else {
            println!("   ⏭️  No usable match token in \"{file_name}\"; skipping");
            return CatalogStep::NoToken;
        };

        let product = match self.policy.select(&set.products) {
            Selection::NoMatch => {
                println!("   ⏭️  No product matches \"{token}\"; skipping");
                return CatalogStep::NoMatch { token };
            }
            Selection::Ambiguous(candidates) => {
                println!(
                    "   ⚠️  {candidates} products match \"{token}\"; skipping for manual review:"
                );
                for p in &set.products {
                    println!("      - {} ({})", p.name, p.id);
                }
                return CatalogStep::Ambiguous { token, candidates };
            }
            Selection::Chosen(product) => product,
        };

        if set.products.len() > 1 {
            println!(
                "   ⚠️  {} products match \"{token}\"; using the first",
                set.products.len()
            );
        }
        println!("   🔗 Matched product: {} ({})", product.name, product.id);

        match self.updater.append_image(product, public_url).await {
            UpdateOutcome::Persisted { image_urls } => {
                println!("   💾 Updated product ({} image(s))", image_urls.len());
                CatalogStep::Updated {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                }
            }
            UpdateOutcome::Previewed { image_urls } => {
                println!("   🧪 Would set image_urls to {} entr(ies)", image_urls.len());
                CatalogStep::Updated {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                }
            }
            UpdateOutcome::Failed { error } => {
                println!("   ❌ DB update failed for product {}: {error}", product.id);
                CatalogStep::UpdateFailed {
                    product_id: product.id.clone(),
                    error,
                }
            }
        }
    }
}
