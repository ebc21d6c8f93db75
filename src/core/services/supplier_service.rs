use tracing::info;
use uuid::Uuid;

use crate::ledger::{ShopData, Supplier, SupplierProfile};

use super::{ServiceError, ServiceResult};

pub struct SupplierService;

impl SupplierService {
    /// Registers a supplier with an empty ledger and returns its id.
    pub fn register(shop: &mut ShopData, profile: SupplierProfile) -> ServiceResult<Uuid> {
        let profile = Self::normalize(profile)?;
        Self::validate_name(shop, None, &profile.name)?;
        let supplier = Supplier::new(profile);
        let id = supplier.id;
        info!(supplier = %id, name = %supplier.name(), "registered supplier");
        shop.suppliers.push(supplier);
        shop.touch();
        Ok(id)
    }

    pub fn update_profile(
        shop: &mut ShopData,
        id: Uuid,
        profile: SupplierProfile,
    ) -> ServiceResult<()> {
        let profile = Self::normalize(profile)?;
        Self::validate_name(shop, Some(id), &profile.name)?;
        let supplier = shop
            .supplier_mut(id)
            .ok_or_else(|| ServiceError::SupplierNotFound(id.to_string()))?;
        let previous = std::mem::replace(&mut supplier.profile, profile);
        let renamed_to = supplier.name().to_string();

        // Orders refer to suppliers by name.
        if previous.name != renamed_to {
            let mut moved = 0;
            for order in shop
                .purchase_orders
                .iter_mut()
                .filter(|order| order.is_for(&previous.name))
            {
                order.supplier_name = renamed_to.clone();
                moved += 1;
            }
            info!(supplier = %id, from = %previous.name, to = %renamed_to, orders = moved, "renamed supplier");
        }
        shop.touch();
        Ok(())
    }

    /// Drops a supplier. Accounts with money still owed either way are kept,
    /// as are suppliers with orders still to be received or billed.
    pub fn remove(shop: &mut ShopData, id: Uuid) -> ServiceResult<Supplier> {
        let index = shop
            .suppliers
            .iter()
            .position(|supplier| supplier.id == id)
            .ok_or_else(|| ServiceError::SupplierNotFound(id.to_string()))?;
        let supplier = &shop.suppliers[index];
        if supplier.balance_cents() != 0 {
            return Err(ServiceError::Invalid(format!(
                "Supplier `{}` has an open balance",
                supplier.name()
            )));
        }
        let pending = shop
            .purchase_orders
            .iter()
            .filter(|order| order.is_for(supplier.name()) && order.is_pending())
            .count();
        if pending > 0 {
            return Err(ServiceError::Invalid(format!(
                "Supplier `{}` has {} purchase order(s) not yet received or billed",
                supplier.name(),
                pending
            )));
        }
        let removed = shop.suppliers.remove(index);
        info!(supplier = %id, "removed supplier");
        shop.touch();
        Ok(removed)
    }

    pub fn search<'a>(shop: &'a ShopData, query: &str) -> Vec<&'a Supplier> {
        shop.suppliers
            .iter()
            .filter(|supplier| supplier.matches(query))
            .collect()
    }

    /// Resolves a supplier by exact (case-insensitive) name or by id.
    pub fn resolve<'a>(shop: &'a ShopData, key: &str) -> ServiceResult<&'a Supplier> {
        if let Some(supplier) = shop.supplier_by_name(key) {
            return Ok(supplier);
        }
        key.parse::<Uuid>()
            .ok()
            .and_then(|id| shop.supplier(id))
            .ok_or_else(|| ServiceError::SupplierNotFound(key.to_string()))
    }

    fn normalize(mut profile: SupplierProfile) -> ServiceResult<SupplierProfile> {
        profile.name = profile.name.trim().to_string();
        if profile.name.is_empty() {
            return Err(ServiceError::Invalid("Supplier name is required".into()));
        }
        Ok(profile)
    }

    fn validate_name(shop: &ShopData, exclude: Option<Uuid>, candidate: &str) -> ServiceResult<()> {
        let normalized = candidate.trim().to_lowercase();
        let duplicate = shop.suppliers.iter().any(|supplier| {
            supplier.name().trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| supplier.id != id)
        });
        if duplicate {
            Err(ServiceError::Invalid(format!(
                "Supplier `{}` already exists",
                candidate
            )))
        } else {
            Ok(())
        }
    }
}
