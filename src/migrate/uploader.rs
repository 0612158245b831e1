use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::scanner::ImageDescriptor;
use crate::store::ObjectStore;

/// Outcome of uploading one file. A success always has a URL and a failure
/// always has a message; the enum keeps both from being set at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Uploaded { key: String, public_url: String },
    Failed { error: String },
}

impl UploadResult {
    pub fn success(&self) -> bool {
        matches!(self, UploadResult::Uploaded { .. })
    }

    pub fn public_url(&self) -> Option<&str> {
        match self {
            UploadResult::Uploaded { public_url, .. } => Some(public_url),
            UploadResult::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadResult::Uploaded { .. } => None,
            UploadResult::Failed { error } => Some(error),
        }
    }
}

/// Storage content type for an image file name.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// `<prefix><unix millis>-<8 hex>-<file name>`. The random part keeps keys
/// distinct even when two uploads land in the same millisecond.
pub fn storage_key(prefix: &str, file_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{prefix}{millis}-{}-{file_name}", &nonce[..8])
}

pub struct Uploader<'a, S> {
    store: &'a S,
    bucket: String,
    key_prefix: String,
    throttle: Duration,
    dry_run: bool,
}

impl<'a, S: ObjectStore> Uploader<'a, S> {
    pub fn new(store: &'a S, bucket: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
            throttle: Duration::ZERO,
            dry_run: false,
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Upload one image. Never returns an error: read and storage failures
    /// come back as [`UploadResult::Failed`].
    pub async fn upload(&self, image: &ImageDescriptor) -> UploadResult {
        let key = storage_key(&self.key_prefix, &image.name);
        let content_type = content_type_for(&image.name);

        if self.dry_run {
            debug!(target = "upload", key = %key, content_type, "dry-run: skipping upload");
            return UploadResult::Uploaded {
                public_url: format!("dry-run://{}/{}", self.bucket, key),
                key,
            };
        }

        let result = match tokio::fs::read(&image.local_path).await {
            Ok(bytes) => match self
                .store
                .upload(&self.bucket, &key, bytes, content_type)
                .await
            {
                Ok(()) => UploadResult::Uploaded {
                    public_url: self.store.public_url(&self.bucket, &key),
                    key,
                },
                Err(err) => UploadResult::Failed {
                    error: err.to_string(),
                },
            },
            Err(err) => UploadResult::Failed {
                error: format!("failed to read {}: {err}", image.local_path.display()),
            },
        };

        if let UploadResult::Failed { error } = &result {
            warn!(target = "upload", file = %image.relative_path, error = %error, "upload failed");
        }
        if !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }
        result
    }
}
