//! Image migration pipeline: scan a local directory, upload each image to
//! object storage, and attach the public URL to the matching catalog product.

pub mod matcher;
pub mod pipeline;
pub mod scanner;
pub mod summary;
pub mod updater;
pub mod uploader;

pub use matcher::MatchPolicy;
pub use pipeline::Pipeline;
pub use scanner::{scan_images, ImageDescriptor};
pub use summary::PipelineRunSummary;
pub use uploader::UploadResult;
