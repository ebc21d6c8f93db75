#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use supplier_ledger::{
    config::ConfigManager,
    ledger::{EntryDraft, EntryKind},
    storage::JsonStorage,
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Reserves a unique directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated storage and config managers in a fresh directory.
pub fn setup_test_env(retention: usize) -> (JsonStorage, ConfigManager, PathBuf) {
    let base = temp_base();
    let storage =
        JsonStorage::new(Some(base.clone()), Some(retention)).expect("create json storage backend");
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (storage, config_manager, base)
}

pub fn day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, day).expect("valid date")
}

pub fn draft(kind: EntryKind, description: &str, amount: f64) -> EntryDraft {
    EntryDraft::new(day(1), kind, description, amount)
}
