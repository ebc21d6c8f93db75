use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Classifies how a ledger entry moves the supplier balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Goods billed by the supplier; raises what the shop owes.
    Invoice,
    Payment,
    /// Goods sent back; credited like a payment.
    Return,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [EntryKind::Invoice, EntryKind::Payment, EntryKind::Return];

    /// Applies the kind's sign to an absolute amount.
    pub fn signed(self, amount_cents: i64) -> i64 {
        match self {
            EntryKind::Invoice => amount_cents,
            EntryKind::Payment | EntryKind::Return => -amount_cents,
        }
    }

    pub fn increases_balance(self) -> bool {
        matches!(self, EntryKind::Invoice)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Invoice => "Invoice",
            EntryKind::Payment => "Payment",
            EntryKind::Return => "Return",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entry type `{0}` (expected invoice, payment, or return)")]
pub struct ParseEntryKindError(pub String);

impl FromStr for EntryKind {
    type Err = ParseEntryKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "invoice" | "inv" => Ok(EntryKind::Invoice),
            "payment" | "pay" => Ok(EntryKind::Payment),
            "return" | "ret" => Ok(EntryKind::Return),
            _ => Err(ParseEntryKindError(value.to_string())),
        }
    }
}

/// A posted line in a supplier ledger.
///
/// `amount_cents` is always non-negative; the direction comes from `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub description: String,
    pub amount_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl LedgerEntry {
    /// Contribution of this entry to the supplier balance.
    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount_cents)
    }
}

/// Field values collected by a form or command before they are posted.
///
/// `amount` stays optional and unnormalized here; the reconciler decides
/// whether the draft is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub description: String,
    pub amount: Option<f64>,
    pub reference: Option<String>,
}

impl EntryDraft {
    pub fn new(
        date: NaiveDate,
        kind: EntryKind,
        description: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            date,
            kind,
            description: description.into(),
            amount: Some(amount),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Pre-fills a draft from an existing entry, the way an edit form opens.
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            date: entry.date,
            kind: entry.kind,
            description: entry.description.clone(),
            amount: Some(crate::currency::cents_to_amount(entry.amount_cents)),
            reference: entry.reference.clone(),
        }
    }
}
