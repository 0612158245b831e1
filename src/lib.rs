pub mod config;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod normalization;
pub mod store;
pub mod supabase;

pub mod util {
    pub mod env;
}

pub use config::{Credentials, MigrationConfig, RunMode};
pub use error::{MigrateError, Result};
pub use store::{CatalogStore, ObjectStore, OfflineStore, ProductRecord};
pub use supabase::SupabaseClient;
