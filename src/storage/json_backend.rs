use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    currency::format_money,
    errors::LedgerError,
    ledger::{LedgerReconciler, ShopData, CURRENT_SCHEMA_VERSION},
};

use super::{BackupInfo, LoadReport, Result, StorageBackend};

pub const BACKUP_FORMAT_VERSION: &str = "1.0";

const SUPPORTED_MAJOR_VERSION: u32 = 1;
const BACKUP_PREFIX: &str = "shop";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// On-disk wrapper shared by the active store, backups and export files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: ShopData,
}

impl BackupEnvelope {
    pub fn new(data: ShopData) -> Self {
        Self {
            version: BACKUP_FORMAT_VERSION.to_string(),
            timestamp: Utc::now(),
            data,
        }
    }
}

#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    store_file: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = PathResolver::resolve_base(root);
        ensure_dir(&root)?;
        ensure_dir(&PathResolver::data_dir_in(&root))?;
        let backups_dir = PathResolver::backup_dir_in(&root);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            store_file: PathResolver::store_file_in(&root),
            backups_dir,
            root,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self) -> &Path {
        &self.store_file
    }

    pub fn backup_path(&self, backup_name: &str) -> Result<PathBuf> {
        if backup_name.is_empty()
            || backup_name.contains(['/', '\\'])
            || backup_name.contains("..")
        {
            return Err(LedgerError::Persistence(format!(
                "invalid backup name `{}`",
                backup_name
            )));
        }
        Ok(self.backups_dir.join(backup_name))
    }

    /// `shop_<stamp>[.<seq>][_<note>].json`; backups taken within the same
    /// second get an increasing sequence number.
    fn next_backup_path(&self, note: Option<&str>) -> Result<PathBuf> {
        let stamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let compact = stamp.replace('_', "");
        let seq = self
            .list_backups()?
            .iter()
            .filter(|existing| existing.stamp == compact)
            .map(|existing| existing.seq)
            .max()
            .map_or(1, |last| last + 1);

        let mut stem = format!("{}_{}", BACKUP_PREFIX, stamp);
        if seq > 1 {
            stem.push_str(&format!(".{seq}"));
        }
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        Ok(self.backups_dir.join(format!("{stem}.{BACKUP_EXTENSION}")))
    }

    fn backup_existing_store(&self) -> Result<()> {
        if !self.store_file.exists() {
            return Ok(());
        }
        let target = self.next_backup_path(None)?;
        fs::copy(&self.store_file, &target)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for stale in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                warn!(path = %stale.path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, data: &ShopData) -> Result<PathBuf> {
        self.backup_existing_store()?;
        write_envelope(&self.store_file, data)?;
        info!(path = %self.store_file.display(), suppliers = data.suppliers.len(), "saved shop data");
        Ok(self.store_file.clone())
    }

    fn load(&self) -> Result<LoadReport> {
        if !self.store_file.exists() {
            return Ok(LoadReport {
                data: ShopData::new(),
                warnings: Vec::new(),
                path: None,
            });
        }
        load_from_path(&self.store_file)
    }

    fn backup(&self, data: &ShopData, note: Option<&str>) -> Result<BackupInfo> {
        let path = self.next_backup_path(note)?;
        write_envelope(&path, data)?;
        self.prune_backups()?;
        info!(path = %path.display(), "created backup");
        backup_info(path).ok_or_else(|| LedgerError::Persistence("backup name unreadable".into()))
    }

    fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(info) = backup_info(path) {
                entries.push(info);
            }
        }
        entries.sort_by(|a, b| {
            b.stamp
                .cmp(&a.stamp)
                .then_with(|| b.seq.cmp(&a.seq))
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(entries)
    }

    fn restore(&self, backup_name: &str) -> Result<LoadReport> {
        let backup_path = self.backup_path(backup_name)?;
        if !backup_path.exists() {
            return Err(LedgerError::Persistence(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        // Validate and read before the pre-restore snapshot can prune the source.
        let report = load_from_path(&backup_path)?;
        let raw = fs::read_to_string(&backup_path)?;
        self.backup_existing_store()?;
        write_atomic(&self.store_file, &raw)?;
        info!(backup = backup_name, "restored backup");
        Ok(LoadReport {
            path: Some(self.store_file.clone()),
            ..report
        })
    }

    fn export_to(&self, data: &ShopData, path: &Path) -> Result<()> {
        write_envelope(path, data)?;
        info!(path = %path.display(), "exported shop data");
        Ok(())
    }

    fn import_from(&self, path: &Path) -> Result<LoadReport> {
        load_from_path(path)
    }

    fn clear(&self) -> Result<bool> {
        if !self.store_file.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.store_file)?;
        warn!(path = %self.store_file.display(), "cleared shop data");
        Ok(true)
    }

    fn usage(&self) -> Result<String> {
        if !self.store_file.exists() {
            return Ok("0 KB".to_string());
        }
        Ok(format_size(fs::metadata(&self.store_file)?.len()))
    }
}

fn write_envelope(path: &Path, data: &ShopData) -> Result<()> {
    let json = serde_json::to_string_pretty(&BackupEnvelope::new(data.clone()))?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Reads and validates an envelope file from anywhere on disk.
pub fn load_from_path(path: &Path) -> Result<LoadReport> {
    let raw = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let (Some(version), Some(data)) = (
        value.get("version").and_then(|v| v.as_str()),
        value.get("data"),
    ) else {
        return Err(LedgerError::Persistence(format!(
            "invalid backup file format: {}",
            path.display()
        )));
    };
    ensure_supported_version(version)?;
    let data: ShopData = serde_json::from_value(data.clone())?;
    if data.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::UnsupportedVersion(format!(
            "schema v{} is newer than v{}",
            data.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    let warnings = data_warnings(&data);
    for warning in &warnings {
        warn!(path = %path.display(), "{}", warning);
    }
    Ok(LoadReport {
        data,
        warnings,
        path: Some(path.to_path_buf()),
    })
}

fn ensure_supported_version(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|part| part.trim().parse::<u32>().ok())
        .ok_or_else(|| LedgerError::UnsupportedVersion(version.to_string()))?;
    if major > SUPPORTED_MAJOR_VERSION {
        return Err(LedgerError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

/// Detects balance drift and dangling references within loaded data.
pub fn data_warnings(data: &ShopData) -> Vec<String> {
    let mut warnings: Vec<String> = data
        .suppliers
        .iter()
        .filter_map(|supplier| {
            LedgerReconciler::audit(supplier.account()).map(|drift| {
                format!(
                    "supplier `{}` balance {} does not match its ledger ({})",
                    supplier.name(),
                    format_money(drift.stored_cents, ""),
                    format_money(drift.computed_cents, "")
                )
            })
        })
        .collect();
    warnings.extend(integrity_warnings(data));
    warnings
}

/// Structural problems other than balance drift: duplicate names or ids,
/// negative amounts and orders for unknown suppliers.
pub fn integrity_warnings(data: &ShopData) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut names = HashSet::new();
    for supplier in &data.suppliers {
        if !names.insert(supplier.name().trim().to_lowercase()) {
            warnings.push(format!("duplicate supplier name `{}`", supplier.name()));
        }
        let mut ids = HashSet::new();
        for entry in supplier.account().entries() {
            if !ids.insert(entry.id) {
                warnings.push(format!(
                    "supplier `{}` has duplicate ledger entry {}",
                    supplier.name(),
                    entry.id
                ));
            }
            if entry.amount_cents < 0 {
                warnings.push(format!(
                    "supplier `{}` entry {} stores a negative amount",
                    supplier.name(),
                    entry.id
                ));
            }
        }
    }
    // Settled orders may outlive their supplier; pending ones may not.
    for order in data.purchase_orders.iter().filter(|order| order.is_pending()) {
        if data.supplier_by_name(&order.supplier_name).is_none() {
            warnings.push(format!(
                "purchase order {} references unknown supplier `{}`",
                order.short_id(),
                order.supplier_name
            ));
        }
    }
    warnings
}

fn backup_info(path: PathBuf) -> Option<BackupInfo> {
    let name = path.file_name()?.to_str()?.to_string();
    let stem = name.strip_suffix(&format!(".{BACKUP_EXTENSION}"))?;
    let mut parts = stem.splitn(4, '_');
    if parts.next()? != BACKUP_PREFIX {
        return None;
    }
    let date = parts.next()?;
    let time_part = parts.next()?;
    let (time, seq) = match time_part.split_once('.') {
        Some((time, seq)) => (time, seq.parse::<u32>().ok()?),
        None => (time_part, 1),
    };
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    let note = parts.next().map(str::to_string);
    let created_at = NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    Some(BackupInfo {
        stamp: format!("{date}{time}"),
        seq,
        name,
        path,
        created_at,
        note,
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_')) && !sanitized.ends_with('-')
        {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Human-readable size: KB below one megabyte, MB above.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes > KB * KB {
        format!("{:.2} MB", bytes / (KB * KB))
    } else {
        format!("{:.2} KB", bytes / KB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_with_temp_dir(retention: usize) -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(retention)).expect("storage");
        (storage, temp)
    }

    #[test]
    fn load_without_store_returns_empty_data() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let report = storage.load().unwrap();
        assert!(report.data.suppliers.is_empty());
        assert!(report.path.is_none());
        assert_eq!(storage.usage().unwrap(), "0 KB");
    }

    #[test]
    fn backup_names_carry_sanitized_note() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let info = storage
            .backup(&ShopData::new(), Some("Month End / Oct"))
            .unwrap();
        assert!(info.name.starts_with("shop_"));
        assert!(info.name.ends_with("_month-end-oct.json"), "{}", info.name);
        assert_eq!(info.note.as_deref(), Some("month-end-oct"));
        assert!(info.created_at.is_some());
    }

    #[test]
    fn retention_prunes_oldest_backups() {
        let (storage, _guard) = storage_with_temp_dir(2);
        for _ in 0..4 {
            storage.backup(&ShopData::new(), None).unwrap();
        }
        assert_eq!(storage.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn same_second_backups_order_by_sequence() {
        let (storage, _guard) = storage_with_temp_dir(2);
        for name in [
            "shop_20231001_101010.json",
            "shop_20231001_101010.9_month-end.json",
            "shop_20231001_101010.10.json",
            "shop_20231001_101009.json",
        ] {
            fs::write(storage.backups_dir.join(name), "{}").unwrap();
        }

        let names: Vec<_> = storage
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "shop_20231001_101010.10.json",
                "shop_20231001_101010.9_month-end.json",
                "shop_20231001_101010.json",
                "shop_20231001_101009.json",
            ]
        );

        storage.prune_backups().unwrap();
        let kept: Vec<_> = storage
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|info| (info.seq, info.note))
            .collect();
        assert_eq!(kept, vec![(10, None), (9, Some("month-end".to_string()))]);
    }

    #[test]
    fn backups_within_one_second_get_increasing_sequence() {
        let (storage, _guard) = storage_with_temp_dir(5);
        let first = storage.backup(&ShopData::new(), None).unwrap();
        let second = storage.backup(&ShopData::new(), Some("again")).unwrap();
        if first.stamp == second.stamp {
            assert_eq!((first.seq, second.seq), (1, 2));
            assert_eq!(second.note.as_deref(), Some("again"));
        }
        assert_eq!(storage.list_backups().unwrap()[0].name, second.name);
    }

    #[test]
    fn backup_path_rejects_traversal() {
        let (storage, _guard) = storage_with_temp_dir(2);
        assert!(storage.backup_path("../shop.json").is_err());
        assert!(storage.backup_path("a/b.json").is_err());
        assert!(storage.backup_path("shop_20240101_000000.json").is_ok());
    }

    #[test]
    fn version_check_accepts_minor_bumps_only() {
        assert!(ensure_supported_version("1.0").is_ok());
        assert!(ensure_supported_version("1.3").is_ok());
        assert!(ensure_supported_version("2.0").is_err());
        assert!(ensure_supported_version("beta").is_err());
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "0.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
