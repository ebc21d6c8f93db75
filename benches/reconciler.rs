use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use supplier_ledger::ledger::{EntryDraft, EntryKind, LedgerReconciler, SupplierAccount};
use supplier_ledger::storage::{JsonStorage, StorageBackend};
use supplier_ledger::{
    core::services::{LedgerService, SupplierService},
    ledger::{ShopData, SupplierProfile},
};
use tempfile::tempdir;

fn sample_draft(idx: usize) -> EntryDraft {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let kind = match idx % 5 {
        0 | 1 | 2 => EntryKind::Invoice,
        3 => EntryKind::Payment,
        _ => EntryKind::Return,
    };
    EntryDraft::new(
        start + Duration::days((idx % 365) as i64),
        kind,
        format!("Bench entry {idx}"),
        25.0 + (idx % 400) as f64 * 1.75,
    )
}

fn build_account(entries: usize) -> SupplierAccount {
    (0..entries).fold(SupplierAccount::new(), |account, idx| {
        LedgerReconciler::create(&account, &sample_draft(idx))
            .expect("create")
            .account
    })
}

fn bench_reconciler(c: &mut Criterion) {
    let account = build_account(black_box(2_000));
    let middle = account.entries()[1_000].id;

    c.bench_function("reconciler_create_2k", |b| {
        b.iter(|| {
            let posted = LedgerReconciler::create(&account, &sample_draft(7)).expect("create");
            black_box(posted);
        })
    });

    c.bench_function("reconciler_edit_2k", |b| {
        b.iter(|| {
            let edited =
                LedgerReconciler::edit(&account, middle, &sample_draft(3)).expect("edit");
            black_box(edited);
        })
    });

    c.bench_function("reconciler_audit_2k", |b| {
        b.iter(|| black_box(LedgerReconciler::audit(&account)))
    });
}

fn bench_storage(c: &mut Criterion) {
    let mut shop = ShopData::new();
    for supplier_idx in 0..20 {
        let id = SupplierService::register(
            &mut shop,
            SupplierProfile::named(format!("Supplier {supplier_idx}")),
        )
        .expect("register");
        for idx in 0..250 {
            LedgerService::post_entry(&mut shop, id, &sample_draft(idx)).expect("post");
        }
    }
    let dir = tempdir().expect("tempdir");
    let storage = JsonStorage::new(Some(dir.path().to_path_buf()), Some(2)).expect("storage");

    c.bench_function("shop_save_5k_entries", |b| {
        b.iter_batched(
            || shop.clone(),
            |data| storage.save(&data).expect("save"),
            BatchSize::SmallInput,
        );
    });

    storage.save(&shop).expect("seed");
    c.bench_function("shop_load_5k_entries", |b| {
        b.iter(|| black_box(storage.load().expect("load")))
    });
}

criterion_group!(benches, bench_reconciler, bench_storage);
criterion_main!(benches);
