use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::{MigrateError, Result};
use crate::migrate::matcher::MatchPolicy;
use crate::util::env::{env_first, env_flag, env_opt, env_parse};

pub const DEFAULT_SOURCE_DIR: &str = "public/images/products";
pub const DEFAULT_BUCKET: &str = "product-images";
pub const DEFAULT_KEY_PREFIX: &str = "migrated/";
pub const DEFAULT_PRODUCTS_TABLE: &str = "products";
pub const DEFAULT_THROTTLE_MS: u64 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const URL_KEYS: [&str; 2] = ["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
pub const SERVICE_ROLE_KEYS: [&str; 1] = ["SUPABASE_SERVICE_ROLE_KEY"];
pub const ANON_KEYS: [&str; 2] = ["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];

/// Which kind of key authenticated the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    ServiceRole,
    /// Public key; storage/table policies may reject writes.
    Anon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub api_key: String,
    pub role: KeyRole,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::resolve(|keys| env_first(keys).map(|(_, v)| v))
    }

    /// Resolve from an arbitrary lookup over candidate key lists.
    /// The service-role key wins; the anon key is a local-testing fallback.
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&[&str]) -> Option<String>,
    {
        let url = lookup(&URL_KEYS[..]);
        let service = lookup(&SERVICE_ROLE_KEYS[..]);
        let anon = lookup(&ANON_KEYS[..]);

        let (api_key, role) = match (service, anon) {
            (Some(k), _) => (Some(k), KeyRole::ServiceRole),
            (None, Some(k)) => (Some(k), KeyRole::Anon),
            (None, None) => (None, KeyRole::Anon),
        };

        match (url, api_key) {
            (Some(url), Some(api_key)) => {
                if role == KeyRole::Anon {
                    warn!(
                        target = "config",
                        "SUPABASE_SERVICE_ROLE_KEY not set; falling back to anon key with reduced privileges"
                    );
                }
                Ok(Self {
                    url: url.trim().trim_end_matches('/').to_string(),
                    api_key: api_key.trim().to_string(),
                    role,
                })
            }
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(URL_KEYS.join(" or "));
                }
                if key.is_none() {
                    missing.push(format!(
                        "{} (or {})",
                        SERVICE_ROLE_KEYS[0],
                        ANON_KEYS.join(" / ")
                    ));
                }
                Err(MigrateError::Configuration(format!(
                    "missing required env: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Flags selecting which pipeline steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    pub dry_run: bool,
    pub update_catalog: bool,
}

impl RunMode {
    /// Updating the catalog is the default, so only `--upload-only` changes
    /// anything here. `--update-db` is accepted by the CLI and loses to it.
    pub fn from_flags(dry_run: bool, upload_only: bool) -> Self {
        Self {
            dry_run,
            update_catalog: !upload_only,
        }
    }

    pub fn label(&self) -> &'static str {
        match (self.dry_run, self.update_catalog) {
            (true, true) => "dry-run (upload + update)",
            (true, false) => "dry-run (upload only)",
            (false, true) => "upload + update",
            (false, false) => "upload only",
        }
    }
}

impl Default for RunMode {
    fn default() -> Self {
        Self::from_flags(false, false)
    }
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source_dir: PathBuf,
    pub bucket: String,
    pub key_prefix: String,
    pub products_table: String,
    pub throttle: Duration,
    pub http_timeout_secs: u64,
    pub concurrency: usize,
    pub match_policy: MatchPolicy,
    pub mode: RunMode,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            bucket: DEFAULT_BUCKET.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            products_table: DEFAULT_PRODUCTS_TABLE.to_string(),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            concurrency: 1,
            match_policy: MatchPolicy::First,
            mode: RunMode::default(),
        }
    }
}

impl MigrationConfig {
    /// Defaults overlaid with env: PRODUCT_IMAGES_BUCKET, PRODUCTS_TABLE,
    /// MIGRATE_THROTTLE_MS, MIGRATE_HTTP_TIMEOUT_SECS, MIGRATE_STRICT_MATCH.
    pub fn from_env(mode: RunMode) -> Self {
        let defaults = Self::default();
        Self {
            bucket: env_opt("PRODUCT_IMAGES_BUCKET").unwrap_or(defaults.bucket),
            products_table: env_opt("PRODUCTS_TABLE").unwrap_or(defaults.products_table),
            throttle: Duration::from_millis(env_parse("MIGRATE_THROTTLE_MS", DEFAULT_THROTTLE_MS)),
            http_timeout_secs: env_parse("MIGRATE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            match_policy: if env_flag("MIGRATE_STRICT_MATCH", false) {
                MatchPolicy::Strict
            } else {
                MatchPolicy::First
            },
            mode,
            ..defaults
        }
    }
}
