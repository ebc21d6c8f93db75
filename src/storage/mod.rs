pub mod json_backend;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::{errors::LedgerError, ledger::ShopData};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Abstraction over persistence backends for the shop's data file and its backups.
pub trait StorageBackend: Send + Sync {
    /// Writes the active store, snapshotting the previous copy first.
    fn save(&self, data: &ShopData) -> Result<PathBuf>;
    fn load(&self) -> Result<LoadReport>;
    fn backup(&self, data: &ShopData, note: Option<&str>) -> Result<BackupInfo>;
    /// Newest first.
    fn list_backups(&self) -> Result<Vec<BackupInfo>>;
    fn restore(&self, backup_name: &str) -> Result<LoadReport>;
    fn export_to(&self, data: &ShopData, path: &Path) -> Result<()>;
    fn import_from(&self, path: &Path) -> Result<LoadReport>;
    /// Removes the active store. Returns false when there was nothing to remove.
    fn clear(&self) -> Result<bool>;
    fn usage(&self) -> Result<String>;
}

/// Loaded data plus any integrity problems noticed while reading it.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub data: ShopData,
    pub warnings: Vec<String>,
    pub path: Option<PathBuf>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub(crate) stamp: String,
    /// Position among backups taken in the same second, starting at 1.
    pub(crate) seq: u32,
}

pub use json_backend::{
    data_warnings, format_size, integrity_warnings, load_from_path, BackupEnvelope, JsonStorage,
    BACKUP_FORMAT_VERSION,
};
