//! Configuration for OrdoDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{OrdoError, Result};

/// Main configuration for an OrdoDB store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files, `None` for a memory-only store.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log               (write-ahead log)
    ///     └── tables/checkpoint.tbl (latest checkpoint)
    pub data_dir: Option<PathBuf>,

    /// Verify the checkpoint table CRC when loading it
    pub verify_checksums_on_open: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// WAL size (in bytes) after which a checkpoint is written and the
    /// WAL truncated
    pub checkpoint_threshold: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("./ordodb_data")),
            verify_checksums_on_open: true,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            checkpoint_threshold: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config for a store that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            ..Self::default()
        }
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(OrdoError::Config(
                "WAL sync interval must be at least one entry".to_string(),
            ));
        }
        if self.checkpoint_threshold == 0 {
            return Err(OrdoError::Config(
                "Checkpoint threshold must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(path.into());
        self
    }

    /// Keep everything in memory
    pub fn in_memory(mut self) -> Self {
        self.config.data_dir = None;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the WAL size (in bytes) that triggers a checkpoint
    pub fn checkpoint_threshold(mut self, size: usize) -> Self {
        self.config.checkpoint_threshold = size;
        self
    }

    /// Verify checkpoint checksums on open
    pub fn verify_checksums_on_open(mut self, verify: bool) -> Self {
        self.config.verify_checksums_on_open = verify;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::in_memory().validate().is_ok());
    }

    #[test]
    fn test_zero_sync_interval_rejected() {
        let config = Config::builder()
            .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
            .build();
        assert!(matches!(config.validate(), Err(OrdoError::Config(_))));
    }

    #[test]
    fn test_zero_checkpoint_threshold_rejected() {
        let config = Config::builder().checkpoint_threshold(0).build();
        assert!(matches!(config.validate(), Err(OrdoError::Config(_))));
    }
}
