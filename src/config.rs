//! Sync configuration: file loading and validated settings.

/// Config file loader
mod loader;
/// Configuration types and settings
mod types;

pub use loader::{
    DEFAULT_CONFIG_FILE,
    load_from_file,
};
pub use types::{
    ConfigError,
    PersistenceConfig,
    ProviderSettings,
    SyncOptions,
    SyncSettings,
    ValidationError,
};
