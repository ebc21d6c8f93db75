//! Balance-preserving create/edit/delete of supplier ledger entries.
//!
//! Every operation borrows the current [`SupplierAccount`] and returns a new
//! one. A rejected request returns an error and leaves the caller's account as
//! it was, so there is no partially applied state.

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::currency::amount_to_cents;

use super::{
    account::SupplierAccount,
    entry::{EntryDraft, EntryKind, LedgerEntry},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("description is required")]
    MissingDescription,
    #[error("amount must be a finite number")]
    InvalidAmount,
    #[error("ledger entry {0} not found")]
    EntryNotFound(Uuid),
    #[error("balance would overflow")]
    BalanceOverflow,
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Account produced by a create, together with the id assigned to the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub account: SupplierAccount,
    pub entry_id: Uuid,
}

/// Difference between a stored balance and the one implied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDrift {
    pub stored_cents: i64,
    pub computed_cents: i64,
}

impl BalanceDrift {
    pub fn difference_cents(&self) -> i64 {
        self.stored_cents.saturating_sub(self.computed_cents)
    }
}

pub struct LedgerReconciler;

impl LedgerReconciler {
    /// Posts a new entry at the front of the ledger.
    pub fn create(account: &SupplierAccount, draft: &EntryDraft) -> ReconcileResult<Posted> {
        let fields = validate(draft)?;
        let balance = apply(account.balance_cents(), fields.kind, fields.amount_cents)?;
        let entry = fields.into_entry(Uuid::new_v4());
        let entry_id = entry.id;
        debug!(
            entry = %entry_id,
            kind = %entry.kind,
            amount_cents = entry.amount_cents,
            balance_cents = balance,
            "posted ledger entry"
        );

        let mut ledger = Vec::with_capacity(account.len() + 1);
        ledger.push(entry);
        ledger.extend_from_slice(account.entries());
        Ok(Posted {
            account: summable(SupplierAccount::from_parts(balance, ledger))?,
            entry_id,
        })
    }

    /// Replaces an entry in place.
    ///
    /// The old entry's effect is reversed before the new one is applied, so a
    /// change of kind and amount at once is handled the same way as a delete
    /// followed by a create. The entry keeps its id and position.
    pub fn edit(
        account: &SupplierAccount,
        entry_id: Uuid,
        draft: &EntryDraft,
    ) -> ReconcileResult<SupplierAccount> {
        let index = locate(account, entry_id)?;
        let fields = validate(draft)?;
        let previous = &account.entries()[index];

        let reversed = reverse(account.balance_cents(), previous.kind, previous.amount_cents)?;
        let balance = apply(reversed, fields.kind, fields.amount_cents)?;
        debug!(
            entry = %entry_id,
            from_kind = %previous.kind,
            from_cents = previous.amount_cents,
            to_kind = %fields.kind,
            to_cents = fields.amount_cents,
            balance_cents = balance,
            "revised ledger entry"
        );

        let mut ledger = account.entries().to_vec();
        ledger[index] = fields.into_entry(entry_id);
        summable(SupplierAccount::from_parts(balance, ledger))
    }

    /// Removes an entry and reverses its effect on the balance.
    ///
    /// Callers are expected to have confirmed the deletion already; once
    /// called this does not ask again.
    pub fn delete(account: &SupplierAccount, entry_id: Uuid) -> ReconcileResult<SupplierAccount> {
        let index = locate(account, entry_id)?;
        let removed = &account.entries()[index];
        let balance = reverse(account.balance_cents(), removed.kind, removed.amount_cents)?;
        debug!(
            entry = %entry_id,
            kind = %removed.kind,
            amount_cents = removed.amount_cents,
            balance_cents = balance,
            "deleted ledger entry"
        );

        let ledger = account
            .entries()
            .iter()
            .filter(|entry| entry.id != entry_id)
            .cloned()
            .collect();
        Ok(SupplierAccount::from_parts(balance, ledger))
    }

    /// Compares the stored balance against the ledger sum.
    pub fn audit(account: &SupplierAccount) -> Option<BalanceDrift> {
        let computed_cents = account.totals().outstanding_cents();
        if computed_cents == account.balance_cents() {
            return None;
        }
        let drift = BalanceDrift {
            stored_cents: account.balance_cents(),
            computed_cents,
        };
        warn!(
            stored_cents = drift.stored_cents,
            computed_cents = drift.computed_cents,
            "supplier balance does not match its ledger"
        );
        Some(drift)
    }

    /// Returns the account with its balance recomputed from the ledger.
    pub fn rebuild(account: &SupplierAccount) -> SupplierAccount {
        SupplierAccount::from_parts(
            account.totals().outstanding_cents(),
            account.entries().to_vec(),
        )
    }
}

struct ValidFields {
    date: chrono::NaiveDate,
    kind: EntryKind,
    description: String,
    amount_cents: i64,
    reference: Option<String>,
}

impl ValidFields {
    fn into_entry(self, id: Uuid) -> LedgerEntry {
        LedgerEntry {
            id,
            date: self.date,
            kind: self.kind,
            description: self.description,
            amount_cents: self.amount_cents,
            reference: self.reference,
        }
    }
}

fn validate(draft: &EntryDraft) -> ReconcileResult<ValidFields> {
    let description = draft.description.trim();
    if description.is_empty() {
        return Err(rejected(ReconcileError::MissingDescription));
    }
    let amount_cents = draft
        .amount
        .and_then(amount_to_cents)
        .ok_or_else(|| rejected(ReconcileError::InvalidAmount))?;
    let reference = draft
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    Ok(ValidFields {
        date: draft.date,
        kind: draft.kind,
        description: description.to_string(),
        amount_cents,
        reference,
    })
}

fn locate(account: &SupplierAccount, entry_id: Uuid) -> ReconcileResult<usize> {
    account
        .position(entry_id)
        .ok_or_else(|| rejected(ReconcileError::EntryNotFound(entry_id)))
}

fn apply(balance_cents: i64, kind: EntryKind, amount_cents: i64) -> ReconcileResult<i64> {
    balance_cents
        .checked_add(kind.signed(amount_cents))
        .ok_or_else(|| rejected(ReconcileError::BalanceOverflow))
}

fn reverse(balance_cents: i64, kind: EntryKind, amount_cents: i64) -> ReconcileResult<i64> {
    balance_cents
        .checked_sub(kind.signed(amount_cents))
        .ok_or_else(|| rejected(ReconcileError::BalanceOverflow))
}

/// Rejects an account whose per-kind totals no longer fit in `i64`, so the
/// balance can always be recomputed from the ledger exactly.
fn summable(account: SupplierAccount) -> ReconcileResult<SupplierAccount> {
    if account.checked_totals().is_none() {
        return Err(rejected(ReconcileError::BalanceOverflow));
    }
    Ok(account)
}

fn rejected(err: ReconcileError) -> ReconcileError {
    warn!(error = %err, "ledger request rejected");
    err
}
