//! Routes ledger requests for a stored supplier through the reconciler.
//!
//! This is the only place a supplier's account is replaced; the reconciler
//! produces the new account and the service swaps it in.

use uuid::Uuid;

use crate::ledger::{BalanceDrift, EntryDraft, LedgerReconciler, ShopData, SupplierAccount};

use super::{ServiceError, ServiceResult};

pub struct LedgerService;

impl LedgerService {
    /// Posts a new entry and returns its id.
    pub fn post_entry(
        shop: &mut ShopData,
        supplier_id: Uuid,
        draft: &EntryDraft,
    ) -> ServiceResult<Uuid> {
        let posted = LedgerReconciler::create(Self::account(shop, supplier_id)?, draft)?;
        Self::store(shop, supplier_id, posted.account)?;
        Ok(posted.entry_id)
    }

    pub fn revise_entry(
        shop: &mut ShopData,
        supplier_id: Uuid,
        entry_id: Uuid,
        draft: &EntryDraft,
    ) -> ServiceResult<()> {
        let account = LedgerReconciler::edit(Self::account(shop, supplier_id)?, entry_id, draft)?;
        Self::store(shop, supplier_id, account)
    }

    pub fn remove_entry(shop: &mut ShopData, supplier_id: Uuid, entry_id: Uuid) -> ServiceResult<()> {
        let account = LedgerReconciler::delete(Self::account(shop, supplier_id)?, entry_id)?;
        Self::store(shop, supplier_id, account)
    }

    /// Recomputes a supplier's balance from its ledger, returning the drift
    /// that was corrected, if any.
    pub fn repair(shop: &mut ShopData, supplier_id: Uuid) -> ServiceResult<Option<BalanceDrift>> {
        let current = Self::account(shop, supplier_id)?;
        let Some(drift) = LedgerReconciler::audit(current) else {
            return Ok(None);
        };
        let rebuilt = LedgerReconciler::rebuild(current);
        Self::store(shop, supplier_id, rebuilt)?;
        Ok(Some(drift))
    }

    /// Suppliers whose stored balance disagrees with their ledger.
    pub fn audit(shop: &ShopData) -> Vec<(Uuid, BalanceDrift)> {
        shop.suppliers
            .iter()
            .filter_map(|supplier| {
                LedgerReconciler::audit(supplier.account()).map(|drift| (supplier.id, drift))
            })
            .collect()
    }

    fn account(shop: &ShopData, supplier_id: Uuid) -> ServiceResult<&SupplierAccount> {
        shop.supplier(supplier_id)
            .map(|supplier| supplier.account())
            .ok_or_else(|| ServiceError::SupplierNotFound(supplier_id.to_string()))
    }

    fn store(shop: &mut ShopData, supplier_id: Uuid, account: SupplierAccount) -> ServiceResult<()> {
        let supplier = shop
            .supplier_mut(supplier_id)
            .ok_or_else(|| ServiceError::SupplierNotFound(supplier_id.to_string()))?;
        supplier.replace_account(account);
        shop.touch();
        Ok(())
    }
}
