use serde::Serialize;

use super::uploader::UploadResult;
use crate::config::RunMode;

/// What happened on the catalog side for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStep {
    /// Matching disabled, or the upload failed.
    NotAttempted,
    /// File name produced no usable token.
    NoToken,
    NoMatch { token: String },
    /// Strict policy and several candidates.
    Ambiguous { token: String, candidates: usize },
    Updated { product_id: String, product_name: String },
    UpdateFailed { product_id: String, error: String },
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub relative_path: String,
    pub upload: UploadResult,
    pub catalog: CatalogStep,
}

/// Aggregate counters for one invocation. Updated by a single consumer as
/// file outcomes arrive; printed once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineRunSummary {
    pub scanned: usize,
    pub uploaded: usize,
    pub failed_uploads: usize,
    pub matched_and_updated: usize,
    pub skipped_no_match: usize,
    pub skipped_ambiguous: usize,
    pub failed_updates: usize,
    /// Relative paths whose upload failed, in processing order.
    pub failed_files: Vec<String>,
}

impl PipelineRunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        if outcome.upload.success() {
            self.uploaded += 1;
        } else {
            self.failed_uploads += 1;
            self.failed_files.push(outcome.relative_path.clone());
        }
        match &outcome.catalog {
            CatalogStep::NotAttempted => {}
            CatalogStep::NoToken | CatalogStep::NoMatch { .. } => self.skipped_no_match += 1,
            CatalogStep::Ambiguous { .. } => self.skipped_ambiguous += 1,
            CatalogStep::Updated { .. } => self.matched_and_updated += 1,
            CatalogStep::UpdateFailed { .. } => self.failed_updates += 1,
        }
    }

    pub fn print(&self, mode: RunMode, bucket: &str) {
        println!();
        println!("{}", "=".repeat(50));
        println!("📊 Migration summary ({})", mode.label());
        println!("{}", "=".repeat(50));
        println!("   🖼️  Images found:          {}", self.scanned);
        if mode.dry_run {
            println!("   🧪 Would upload:          {}", self.uploaded);
        } else {
            println!("   ✅ Uploaded:              {}", self.uploaded);
        }
        println!("   ❌ Failed uploads:        {}", self.failed_uploads);
        for path in &self.failed_files {
            println!("      - {path}");
        }
        if mode.update_catalog {
            let label = if mode.dry_run { "Would update:" } else { "Matched & updated:" };
            println!("   🔗 {label:<22} {}", self.matched_and_updated);
            println!("   ⏭️  No matching product:   {}", self.skipped_no_match);
            if self.skipped_ambiguous > 0 {
                println!("   ⚠️  Ambiguous (skipped):   {}", self.skipped_ambiguous);
            }
            if self.failed_updates > 0 {
                println!("   ❌ Failed DB updates:     {}", self.failed_updates);
            }
        }

        if !mode.dry_run && self.uploaded > 0 {
            println!();
            println!("📝 Next steps:");
            for (i, step) in next_steps(bucket).iter().enumerate() {
                println!("   {}. {step}", i + 1);
            }
        }
    }
}

pub fn next_steps(bucket: &str) -> Vec<String> {
    vec![
        format!("Check the uploaded objects in the Supabase Storage bucket '{bucket}'"),
        "Review product image_urls in the admin panel and fix any misattributed images".into(),
        "Attach skipped images to their products manually".into(),
        "Once verified, remove the migrated files from public/images/products".into(),
    ]
}
