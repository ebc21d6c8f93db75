mod common;

use common::{day, draft};
use proptest::{prelude::*, sample::Index};
use supplier_ledger::ledger::{
    EntryDraft, EntryKind, LedgerReconciler, ReconcileError, SupplierAccount,
};

fn post(account: &SupplierAccount, kind: EntryKind, description: &str, amount: f64) -> SupplierAccount {
    LedgerReconciler::create(account, &draft(kind, description, amount))
        .expect("valid draft")
        .account
}

fn assert_reconciled(account: &SupplierAccount) {
    let totals = account.totals();
    assert_eq!(
        account.balance_cents(),
        totals.invoiced_cents - totals.paid_or_returned_cents(),
        "balance must equal invoices minus payments and returns"
    );
    assert_eq!(totals.outstanding_cents(), account.balance_cents());
    assert!(account.is_consistent());
    assert_eq!(LedgerReconciler::audit(account), None);
}

#[test]
fn sign_convention_per_kind() {
    let start = SupplierAccount::new();
    assert_eq!(
        post(&start, EntryKind::Invoice, "Screens", 500.0).balance_cents(),
        50_000
    );
    assert_eq!(
        post(&start, EntryKind::Payment, "Wire", 500.0).balance_cents(),
        -50_000
    );
    assert_eq!(
        post(&start, EntryKind::Return, "Faulty batch", 500.0).balance_cents(),
        -50_000
    );
}

#[test]
fn scenario_invoice_payment_invoice() {
    let account = SupplierAccount::new();
    let account = post(&account, EntryKind::Invoice, "Bulk Order - iPhone Screens", 120_000.0);
    assert_eq!(account.balance_cents(), 12_000_000);
    let account = post(&account, EntryKind::Payment, "Bank Transfer", 40_000.0);
    assert_eq!(account.balance_cents(), 8_000_000);
    let account = post(&account, EntryKind::Invoice, "Batteries", 20_000.0);
    assert_eq!(account.balance_cents(), 10_000_000);

    let totals = account.totals();
    assert_eq!(totals.invoiced_cents, 14_000_000);
    assert_eq!(totals.paid_or_returned_cents(), 4_000_000);
    assert_eq!(totals.outstanding_cents(), 10_000_000);
    assert_reconciled(&account);
}

#[test]
fn scenario_edit_invoice_amount_down() {
    let account = post(&SupplierAccount::new(), EntryKind::Invoice, "Bulk Order", 120_000.0);
    let invoice = account.entries()[0].id;
    let account = post(&account, EntryKind::Payment, "Bank Transfer", 40_000.0);
    let account = post(&account, EntryKind::Invoice, "Batteries", 20_000.0);

    let mut revised = EntryDraft::from_entry(account.entry(invoice).unwrap());
    revised.amount = Some(100_000.0);
    let account = LedgerReconciler::edit(&account, invoice, &revised).unwrap();

    assert_eq!(account.balance_cents(), 8_000_000);
    assert_eq!(account.position(invoice), Some(2));
    assert_reconciled(&account);
}

#[test]
fn scenario_delete_payment_restores_balance() {
    let account = post(&SupplierAccount::new(), EntryKind::Invoice, "Bulk Order", 120_000.0);
    let account = post(&account, EntryKind::Payment, "Bank Transfer", 40_000.0);
    assert_eq!(account.balance_cents(), 8_000_000);
    let payment = account.entries()[0].id;

    let account = LedgerReconciler::delete(&account, payment).unwrap();
    assert_eq!(account.balance_cents(), 12_000_000);
    assert_eq!(account.len(), 1);
    assert!(account.entry(payment).is_none());
}

#[test]
fn create_then_delete_is_a_no_op() {
    let base = post(&SupplierAccount::new(), EntryKind::Invoice, "Opening", 75.5);
    for kind in EntryKind::ALL {
        let posted = LedgerReconciler::create(&base, &draft(kind, "Temp", 19.99)).unwrap();
        let restored = LedgerReconciler::delete(&posted.account, posted.entry_id).unwrap();
        assert_eq!(restored.balance_cents(), base.balance_cents());
        assert_eq!(restored.entries(), base.entries());
    }
}

#[test]
fn edit_matches_delete_plus_create_except_for_position() {
    let account = post(&SupplierAccount::new(), EntryKind::Invoice, "Old invoice", 300.0);
    let target = account.entries()[0].id;
    let account = post(&account, EntryKind::Payment, "Part payment", 120.0);
    let account = post(&account, EntryKind::Invoice, "New invoice", 45.0);

    let replacement = EntryDraft::new(day(9), EntryKind::Return, "Returned screens", 80.0);
    let edited = LedgerReconciler::edit(&account, target, &replacement).unwrap();

    let removed = LedgerReconciler::delete(&account, target).unwrap();
    let recreated = LedgerReconciler::create(&removed, &replacement).unwrap();

    assert_eq!(edited.balance_cents(), recreated.account.balance_cents());
    assert_eq!(edited.position(target), Some(2));
    assert_eq!(recreated.account.position(recreated.entry_id), Some(0));
    assert_eq!(edited.entry(target).unwrap().kind, EntryKind::Return);
}

#[test]
fn rejected_drafts_leave_account_untouched() {
    let account = post(&SupplierAccount::new(), EntryKind::Invoice, "Screens", 250.0);
    let existing = account.entries()[0].id;
    let snapshot = account.clone();

    let mut blank = draft(EntryKind::Payment, "", 10.0);
    assert_eq!(
        LedgerReconciler::create(&account, &blank).unwrap_err(),
        ReconcileError::MissingDescription
    );
    blank.description = "Cash".into();
    blank.amount = Some(f64::NAN);
    assert_eq!(
        LedgerReconciler::create(&account, &blank).unwrap_err(),
        ReconcileError::InvalidAmount
    );
    assert_eq!(
        LedgerReconciler::edit(&account, existing, &blank).unwrap_err(),
        ReconcileError::InvalidAmount
    );
    assert_eq!(account, snapshot);
}

#[test]
fn negative_amounts_are_stored_as_magnitudes() {
    let account = post(&SupplierAccount::new(), EntryKind::Payment, "Refund typo", -40.0);
    assert_eq!(account.entries()[0].amount_cents, 4_000);
    assert_eq!(account.balance_cents(), -4_000);
}

#[test]
fn aggregation_is_idempotent() {
    let account = post(&SupplierAccount::new(), EntryKind::Invoice, "Screens", 99.99);
    let account = post(&account, EntryKind::Return, "Dead pixels", 33.33);
    assert_eq!(account.totals(), account.totals());
    assert_eq!(account.status(), account.status());
}

#[derive(Debug, Clone)]
enum Step {
    Create(EntryKind, i64),
    Edit(Index, EntryKind, i64),
    Delete(Index),
}

fn kind_strategy() -> impl Strategy<Value = EntryKind> {
    prop_oneof![
        Just(EntryKind::Invoice),
        Just(EntryKind::Payment),
        Just(EntryKind::Return),
    ]
}

/// Amounts in cents, up to 50,000.00.
fn cents_strategy() -> impl Strategy<Value = i64> {
    0i64..5_000_000
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => (kind_strategy(), cents_strategy()).prop_map(|(kind, cents)| Step::Create(kind, cents)),
        1 => (any::<Index>(), kind_strategy(), cents_strategy())
            .prop_map(|(target, kind, cents)| Step::Edit(target, kind, cents)),
        1 => any::<Index>().prop_map(Step::Delete),
    ]
}

fn draft_for(kind: EntryKind, cents: i64, label: &str) -> EntryDraft {
    EntryDraft::new(day(2), kind, label, cents as f64 / 100.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn balance_tracks_ledger_for_any_sequence(
        steps in prop::collection::vec(step_strategy(), 1..80)
    ) {
        let mut account = SupplierAccount::new();
        let mut expected = 0i64;

        for (idx, step) in steps.into_iter().enumerate() {
            let label = format!("step {idx}");
            account = match step {
                Step::Create(kind, cents) => {
                    expected += kind.signed(cents);
                    LedgerReconciler::create(&account, &draft_for(kind, cents, &label))
                        .unwrap()
                        .account
                }
                Step::Edit(_, _, _) | Step::Delete(_) if account.is_empty() => account,
                Step::Edit(target, kind, cents) => {
                    let old = &account.entries()[target.index(account.len())];
                    expected += kind.signed(cents) - old.signed_amount();
                    let (id, position) = (old.id, target.index(account.len()));
                    let edited =
                        LedgerReconciler::edit(&account, id, &draft_for(kind, cents, &label))
                            .unwrap();
                    prop_assert_eq!(edited.position(id), Some(position));
                    edited
                }
                Step::Delete(target) => {
                    let old = &account.entries()[target.index(account.len())];
                    expected -= old.signed_amount();
                    let id = old.id;
                    LedgerReconciler::delete(&account, id).unwrap()
                }
            };

            let totals = account.totals();
            prop_assert_eq!(account.balance_cents(), expected);
            prop_assert_eq!(
                account.balance_cents(),
                totals.invoiced_cents - totals.paid_or_returned_cents()
            );
            prop_assert!(LedgerReconciler::audit(&account).is_none());
        }
    }

    #[test]
    fn create_then_delete_restores_any_account(
        opening in prop::collection::vec((kind_strategy(), cents_strategy()), 0..10),
        kind in kind_strategy(),
        cents in cents_strategy(),
    ) {
        let base = opening.iter().fold(SupplierAccount::new(), |account, (kind, cents)| {
            LedgerReconciler::create(&account, &draft_for(*kind, *cents, "opening"))
                .unwrap()
                .account
        });
        let posted = LedgerReconciler::create(&base, &draft_for(kind, cents, "temp")).unwrap();
        prop_assert_eq!(posted.account.position(posted.entry_id), Some(0));

        let restored = LedgerReconciler::delete(&posted.account, posted.entry_id).unwrap();
        prop_assert_eq!(restored, base);
    }
}
