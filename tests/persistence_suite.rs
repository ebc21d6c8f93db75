mod common;

use assert_fs::prelude::*;
use common::{draft, setup_test_env};
use supplier_ledger::{
    config::Config,
    core::services::{LedgerService, PurchaseOrderService, SupplierService},
    errors::LedgerError,
    ledger::{EntryKind, PurchaseOrderItem, ShopData, SupplierProfile},
    storage::{JsonStorage, StorageBackend, BACKUP_FORMAT_VERSION},
};

fn sample_shop() -> ShopData {
    let mut shop = ShopData::new();
    let id = SupplierService::register(
        &mut shop,
        SupplierProfile::named("MobileSentrix").with_contact("Support Team"),
    )
    .unwrap();
    LedgerService::post_entry(
        &mut shop,
        id,
        &draft(EntryKind::Invoice, "Pixel 7 Pro Screen", 850.0).with_reference("INV-22"),
    )
    .unwrap();
    LedgerService::post_entry(&mut shop, id, &draft(EntryKind::Payment, "Card", 200.0)).unwrap();
    PurchaseOrderService::create(
        &mut shop,
        "MobileSentrix",
        common::day(5),
        vec![PurchaseOrderItem::new("Charging Port Flex", 5, 1_200)],
    )
    .unwrap();
    shop
}

#[test]
fn save_then_load_round_trips_shop_data() {
    let (storage, _, _) = setup_test_env(3);
    let shop = sample_shop();
    storage.save(&shop).unwrap();

    let report = storage.load().unwrap();
    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(report.data, shop);
    assert_eq!(report.path.as_deref(), Some(storage.store_path()));
}

#[test]
fn store_file_uses_envelope_layout() {
    let (storage, _, _) = setup_test_env(3);
    storage.save(&sample_shop()).unwrap();

    let raw = std::fs::read_to_string(storage.store_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], BACKUP_FORMAT_VERSION);
    assert!(value["timestamp"].is_string());
    let supplier = &value["data"]["suppliers"][0];
    assert_eq!(supplier["name"], "MobileSentrix");
    assert_eq!(supplier["balance_cents"], 65_000);
    assert_eq!(supplier["ledger"][0]["type"], "Payment");
    assert_eq!(supplier["ledger"][1]["date"], "2023-10-01");
}

#[test]
fn tampered_balance_is_reported_on_load() {
    let (storage, _, _) = setup_test_env(3);
    storage.save(&sample_shop()).unwrap();

    let raw = std::fs::read_to_string(storage.store_path()).unwrap();
    let tampered = raw.replacen("\"balance_cents\": 65000", "\"balance_cents\": 1", 1);
    assert_ne!(raw, tampered);
    std::fs::write(storage.store_path(), tampered).unwrap();

    let mut report = storage.load().unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("MobileSentrix"));

    let id = report.data.suppliers[0].id;
    let drift = LedgerService::repair(&mut report.data, id).unwrap().unwrap();
    assert_eq!(drift.stored_cents, 1);
    assert_eq!(drift.computed_cents, 65_000);
    assert!(LedgerService::audit(&report.data).is_empty());
}

#[test]
fn import_rejects_foreign_and_newer_files() {
    let (storage, _, _) = setup_test_env(3);
    let temp = assert_fs::TempDir::new().unwrap();

    let foreign = temp.child("foreign.json");
    foreign.write_str(r#"{"inventory": []}"#).unwrap();
    let err = storage.import_from(foreign.path()).unwrap_err();
    assert!(err.to_string().contains("invalid backup file format"));

    let newer = temp.child("newer.json");
    newer
        .write_str(r#"{"version": "2.0", "timestamp": "2024-01-01T00:00:00Z", "data": {"suppliers": [], "updated_at": "2024-01-01T00:00:00Z"}}"#)
        .unwrap();
    assert!(matches!(
        storage.import_from(newer.path()),
        Err(LedgerError::UnsupportedVersion(_))
    ));

    let broken = temp.child("broken.json");
    broken.write_str("{ not json").unwrap();
    assert!(matches!(
        storage.import_from(broken.path()),
        Err(LedgerError::Serde(_))
    ));
}

#[test]
fn export_then_import_into_another_store() {
    let (source, _, _) = setup_test_env(3);
    let (target, _, _) = setup_test_env(3);
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("exports").child("shop-export.json");

    let shop = sample_shop();
    source.export_to(&shop, file.path()).unwrap();
    file.assert(predicates::path::exists());

    let report = target.import_from(file.path()).unwrap();
    assert_eq!(report.data, shop);
    assert!(!target.store_path().exists());
}

#[test]
fn save_keeps_previous_store_as_backup_within_retention() {
    let (storage, _, _) = setup_test_env(2);
    let mut shop = sample_shop();
    storage.save(&shop).unwrap();
    assert!(storage.list_backups().unwrap().is_empty());

    for round in 0..4 {
        let id = shop.suppliers[0].id;
        LedgerService::post_entry(
            &mut shop,
            id,
            &draft(EntryKind::Invoice, &format!("Round {round}"), 10.0),
        )
        .unwrap();
        storage.save(&shop).unwrap();
    }
    assert_eq!(storage.list_backups().unwrap().len(), 2);
}

#[test]
fn restore_replaces_active_store() {
    let (storage, _, _) = setup_test_env(5);
    let original = sample_shop();
    storage.save(&original).unwrap();
    let info = storage.backup(&original, Some("before reset")).unwrap();
    assert_eq!(info.note.as_deref(), Some("before-reset"));

    assert!(storage.clear().unwrap());
    assert!(!storage.clear().unwrap());
    assert!(storage.load().unwrap().data.suppliers.is_empty());

    let report = storage.restore(&info.name).unwrap();
    assert_eq!(report.data, original);
    assert_eq!(storage.load().unwrap().data, original);
    assert!(storage.restore("../escape.json").is_err());
    assert!(storage.restore("shop_19990101_000000.json").is_err());
}

#[test]
fn usage_reports_human_readable_size() {
    let (storage, _, _) = setup_test_env(3);
    assert_eq!(storage.usage().unwrap(), "0 KB");
    storage.save(&sample_shop()).unwrap();
    let usage = storage.usage().unwrap();
    assert!(usage.ends_with(" KB"), "{usage}");
    assert_ne!(usage, "0 KB");
}

#[test]
fn retention_comes_from_config() {
    let (_, config_manager, base) = setup_test_env(3);
    let config = Config {
        backup_retention: 1,
        ..Config::default()
    };
    config_manager.save(&config).unwrap();

    let loaded = config_manager.load().unwrap();
    let storage = JsonStorage::new(Some(base), Some(loaded.backup_retention)).unwrap();
    for _ in 0..3 {
        storage.backup(&ShopData::new(), None).unwrap();
    }
    assert_eq!(storage.list_backups().unwrap().len(), 1);
}
