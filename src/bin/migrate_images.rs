//! migrate_images.rs
//! Upload local product images to Supabase Storage and attach the public URLs
//! to matching rows in the products table.
//!
//! Env: SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY (anon key accepted as a
//! fallback), PRODUCT_IMAGES_BUCKET, PRODUCTS_TABLE, MIGRATE_THROTTLE_MS,
//! MIGRATE_HTTP_TIMEOUT_SECS, MIGRATE_STRICT_MATCH.
//! Run one instance at a time: there is no lock against concurrent runs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_image_migrate::config::{DEFAULT_SOURCE_DIR, URL_KEYS};
use catalog_image_migrate::logging::init_tracing;
use catalog_image_migrate::migrate::{MatchPolicy, Pipeline, PipelineRunSummary};
use catalog_image_migrate::util::env as env_util;
use catalog_image_migrate::{
    CatalogStore, Credentials, MigrationConfig, ObjectStore, OfflineStore, RunMode,
    SupabaseClient,
};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "migrate_images",
    version,
    about = "Upload local product images and link them to catalog products"
)]
struct Cli {
    /// Log every step but upload nothing and write nothing to the catalog
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Upload only; skip product matching and DB updates (wins over --update-db)
    #[arg(long, default_value_t = false)]
    upload_only: bool,
    /// Match products and append image URLs (the default unless --upload-only)
    #[arg(long, default_value_t = false)]
    update_db: bool,
    /// Skip files whose token matches more than one product instead of taking the first
    #[arg(long, default_value_t = false)]
    strict_match: bool,
    /// Directory scanned for images
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,
    /// Storage bucket (defaults to PRODUCT_IMAGES_BUCKET or product-images)
    #[arg(long)]
    bucket: Option<String>,
    /// Files processed at once; 1 keeps the run strictly sequential
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    /// Delay after each upload in milliseconds (defaults to MIGRATE_THROTTLE_MS or 100)
    #[arg(long)]
    throttle_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;
    let cli = Cli::parse();

    if cli.upload_only && cli.update_db {
        warn!("--upload-only and --update-db both set; --upload-only wins");
        println!("⚠️  --upload-only wins over --update-db: the catalog will not be touched.\n");
    }
    let mode = RunMode::from_flags(cli.dry_run, cli.upload_only);
    let mut config = MigrationConfig::from_env(mode);
    config.source_dir = cli.source_dir.clone();
    config.concurrency = cli.concurrency.max(1);
    if let Some(bucket) = cli.bucket.clone() {
        config.bucket = bucket;
    }
    if let Some(ms) = cli.throttle_ms {
        config.throttle = Duration::from_millis(ms);
    }
    if cli.strict_match {
        config.match_policy = MatchPolicy::Strict;
    }

    env_util::log_config_snapshot(
        "migrate_images",
        &[
            URL_KEYS[0],
            URL_KEYS[1],
            "SUPABASE_SERVICE_ROLE_KEY",
            "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            "PRODUCT_IMAGES_BUCKET",
            "PRODUCTS_TABLE",
        ],
    );

    println!("🚀 Product image migration");
    println!("   Mode:   {}", mode.label());
    println!("   Source: {}", config.source_dir.display());
    println!("   Bucket: {}", config.bucket);
    if mode.update_catalog {
        println!("   Match:  {:?}", config.match_policy);
    }
    println!();

    let summary = match Credentials::from_env() {
        Ok(creds) => {
            let client = SupabaseClient::from_credentials(&creds, Some(config.http_timeout_secs))
                .context("failed to build Supabase client")?
                .with_products_table(config.products_table.clone());
            info!(base_url = client.base_url(), role = ?creds.role, "supabase client ready");
            run(&client, &client, &config).await
        }
        Err(err) if mode.dry_run => {
            warn!(error = %err, "no credentials; dry run continues offline");
            println!("⚠️  {err}");
            println!("   Dry run continues offline: product lookups are skipped.\n");
            run(&OfflineStore, &OfflineStore, &config).await
        }
        Err(err) => {
            println!("❌ {err}");
            println!("   Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY (or run with --dry-run).");
            return Err(err.into());
        }
    };

    summary.print(mode, &config.bucket);
    info!(
        summary = %serde_json::to_string(&summary).unwrap_or_default(),
        "migration finished"
    );
    Ok(())
}

async fn run<S, C>(store: &S, catalog: &C, config: &MigrationConfig) -> PipelineRunSummary
where
    S: ObjectStore,
    C: CatalogStore,
{
    Pipeline::new(store, catalog, config)
        .run(&config.source_dir)
        .await
}
