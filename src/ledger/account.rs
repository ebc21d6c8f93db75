use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EntryKind, LedgerEntry};

/// Running balance and ledger of what the shop owes one supplier.
///
/// Fields are private: the only way to produce a different account is through
/// [`LedgerReconciler`](super::reconciler::LedgerReconciler), which keeps
/// `balance_cents` equal to the signed sum of the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierAccount {
    #[serde(default)]
    balance_cents: i64,
    #[serde(default)]
    ledger: Vec<LedgerEntry>,
}

impl SupplierAccount {
    /// Creates an account with an empty ledger and a zero balance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(balance_cents: i64, ledger: Vec<LedgerEntry>) -> Self {
        Self {
            balance_cents,
            ledger,
        }
    }

    /// Stored balance; positive means money is due to the supplier.
    pub fn balance_cents(&self) -> i64 {
        self.balance_cents
    }

    /// Entries newest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn entry(&self, id: Uuid) -> Option<&LedgerEntry> {
        self.ledger.iter().find(|entry| entry.id == id)
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.ledger.iter().position(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Recomputes the per-kind sums from the ledger.
    pub fn totals(&self) -> LedgerTotals {
        self.ledger
            .iter()
            .fold(LedgerTotals::default(), |mut totals, entry| {
                let bucket = match entry.kind {
                    EntryKind::Invoice => &mut totals.invoiced_cents,
                    EntryKind::Payment => &mut totals.paid_cents,
                    EntryKind::Return => &mut totals.returned_cents,
                };
                *bucket = bucket.saturating_add(entry.amount_cents);
                totals
            })
    }

    /// Per-kind sums without saturation; `None` when a sum leaves `i64`.
    pub fn checked_totals(&self) -> Option<LedgerTotals> {
        self.ledger
            .iter()
            .try_fold(LedgerTotals::default(), |mut totals, entry| {
                let bucket = match entry.kind {
                    EntryKind::Invoice => &mut totals.invoiced_cents,
                    EntryKind::Payment => &mut totals.paid_cents,
                    EntryKind::Return => &mut totals.returned_cents,
                };
                *bucket = bucket.checked_add(entry.amount_cents)?;
                Some(totals)
            })
            .filter(|totals| totals.paid_cents.checked_add(totals.returned_cents).is_some())
    }

    pub fn status(&self) -> BalanceStatus {
        BalanceStatus::from_balance(self.balance_cents)
    }

    /// True when the stored balance matches the recomputed one.
    pub fn is_consistent(&self) -> bool {
        self.totals().outstanding_cents() == self.balance_cents
    }
}

/// Aggregates recomputed on demand from a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub invoiced_cents: i64,
    pub paid_cents: i64,
    pub returned_cents: i64,
}

impl LedgerTotals {
    pub fn paid_or_returned_cents(&self) -> i64 {
        self.paid_cents.saturating_add(self.returned_cents)
    }

    pub fn outstanding_cents(&self) -> i64 {
        self.invoiced_cents
            .saturating_sub(self.paid_or_returned_cents())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    /// The shop owes the supplier.
    Due,
    Settled,
    /// The supplier owes the shop (over-payment or returns).
    Credit,
}

impl BalanceStatus {
    pub fn from_balance(balance_cents: i64) -> Self {
        match balance_cents.signum() {
            1 => BalanceStatus::Due,
            0 => BalanceStatus::Settled,
            _ => BalanceStatus::Credit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BalanceStatus::Due => "Due",
            BalanceStatus::Settled => "Settled",
            BalanceStatus::Credit => "Cr",
        }
    }
}
