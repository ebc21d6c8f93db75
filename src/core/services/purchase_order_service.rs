use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::ledger::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, ShopData};

use super::{LedgerService, ServiceError, ServiceResult};

pub struct PurchaseOrderService;

impl PurchaseOrderService {
    /// Records a new order, newest first. The supplier must be registered.
    pub fn create(
        shop: &mut ShopData,
        supplier_name: &str,
        date: NaiveDate,
        items: Vec<PurchaseOrderItem>,
    ) -> ServiceResult<Uuid> {
        let supplier = shop
            .supplier_by_name(supplier_name)
            .ok_or_else(|| ServiceError::SupplierNotFound(supplier_name.to_string()))?;
        if items.is_empty() {
            return Err(ServiceError::Invalid(
                "Purchase order needs at least one item".into(),
            ));
        }
        if let Some(item) = items
            .iter()
            .find(|item| item.quantity == 0 || item.unit_cost_cents < 0 || item.name.trim().is_empty())
        {
            return Err(ServiceError::Invalid(format!(
                "Invalid purchase order item `{}`",
                item.name
            )));
        }
        let order = PurchaseOrder::new(supplier.name().to_string(), date, items);
        let id = order.id;
        info!(order = %id, supplier = %order.supplier_name, total_cents = order.total_cents(), "created purchase order");
        shop.purchase_orders.insert(0, order);
        shop.touch();
        Ok(id)
    }

    pub fn receive(shop: &mut ShopData, id: Uuid) -> ServiceResult<()> {
        Self::transition(shop, id, PurchaseOrderStatus::Received)
    }

    pub fn cancel(shop: &mut ShopData, id: Uuid) -> ServiceResult<()> {
        Self::transition(shop, id, PurchaseOrderStatus::Cancelled)
    }

    pub fn set_expected_date(
        shop: &mut ShopData,
        id: Uuid,
        expected: Option<NaiveDate>,
    ) -> ServiceResult<()> {
        let order = shop
            .purchase_order_mut(id)
            .ok_or(ServiceError::PurchaseOrderNotFound(id))?;
        if let Some(date) = expected.filter(|date| *date < order.date) {
            return Err(ServiceError::Invalid(format!(
                "Expected date {} is before the order date {}",
                date, order.date
            )));
        }
        order.expected_date = expected;
        shop.touch();
        Ok(())
    }

    /// Posts a received order to its supplier's ledger as an invoice.
    pub fn bill(shop: &mut ShopData, id: Uuid, date: NaiveDate) -> ServiceResult<Uuid> {
        let order = shop
            .purchase_order(id)
            .ok_or(ServiceError::PurchaseOrderNotFound(id))?;
        if order.status != PurchaseOrderStatus::Received {
            return Err(ServiceError::Invalid(format!(
                "Purchase order {} must be received before billing",
                order.short_id()
            )));
        }
        if order.billed_entry.is_some() {
            return Err(ServiceError::Invalid(format!(
                "Purchase order {} is already billed",
                order.short_id()
            )));
        }
        let supplier_id = shop
            .supplier_by_name(&order.supplier_name)
            .map(|supplier| supplier.id)
            .ok_or_else(|| ServiceError::SupplierNotFound(order.supplier_name.clone()))?;
        let draft = order.invoice_draft(date);

        let entry_id = LedgerService::post_entry(shop, supplier_id, &draft)?;
        if let Some(order) = shop.purchase_order_mut(id) {
            order.billed_entry = Some(entry_id);
        }
        Ok(entry_id)
    }

    pub fn open(shop: &ShopData) -> Vec<&PurchaseOrder> {
        shop.purchase_orders
            .iter()
            .filter(|order| order.is_open())
            .collect()
    }

    /// Resolves an order by full id or by the short id shown in listings.
    pub fn resolve(shop: &ShopData, key: &str) -> ServiceResult<Uuid> {
        if let Ok(id) = key.parse::<Uuid>() {
            if shop.purchase_order(id).is_some() {
                return Ok(id);
            }
        }
        let needle = key.trim().trim_start_matches('#').to_uppercase();
        let mut matches = shop
            .purchase_orders
            .iter()
            .filter(|order| !needle.is_empty() && order.short_id().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(order), None) => Ok(order.id),
            (Some(_), Some(_)) => Err(ServiceError::Invalid(format!(
                "Purchase order `{}` is ambiguous",
                key
            ))),
            (None, _) => Err(ServiceError::Invalid(format!(
                "Purchase order `{}` not found",
                key
            ))),
        }
    }

    fn transition(shop: &mut ShopData, id: Uuid, to: PurchaseOrderStatus) -> ServiceResult<()> {
        let order = shop
            .purchase_order_mut(id)
            .ok_or(ServiceError::PurchaseOrderNotFound(id))?;
        if !order.is_open() {
            return Err(ServiceError::Invalid(format!(
                "Purchase order {} is already {}",
                order.short_id(),
                order.status
            )));
        }
        order.status = to;
        info!(order = %id, status = %to, "purchase order updated");
        shop.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::SupplierService;
    use crate::ledger::SupplierProfile;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, 10).unwrap()
    }

    fn shop_with_order() -> (ShopData, Uuid, Uuid) {
        let mut shop = ShopData::new();
        let supplier =
            SupplierService::register(&mut shop, SupplierProfile::named("Injured Gadgets")).unwrap();
        let order = PurchaseOrderService::create(
            &mut shop,
            "injured gadgets",
            date(),
            vec![PurchaseOrderItem::new("High Capacity Battery", 4, 220_000)],
        )
        .unwrap();
        (shop, supplier, order)
    }

    #[test]
    fn create_requires_known_supplier_and_items() {
        let mut shop = ShopData::new();
        assert!(matches!(
            PurchaseOrderService::create(&mut shop, "Ghost", date(), Vec::new()),
            Err(ServiceError::SupplierNotFound(_))
        ));
        SupplierService::register(&mut shop, SupplierProfile::named("Ghost")).unwrap();
        assert!(matches!(
            PurchaseOrderService::create(&mut shop, "Ghost", date(), Vec::new()),
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            PurchaseOrderService::create(
                &mut shop,
                "Ghost",
                date(),
                vec![PurchaseOrderItem::new("Screws", 0, 10)]
            ),
            Err(ServiceError::Invalid(_))
        ));
    }

    #[test]
    fn create_uses_registered_supplier_spelling() {
        let (shop, _, order) = shop_with_order();
        assert_eq!(shop.purchase_order(order).unwrap().supplier_name, "Injured Gadgets");
        assert_eq!(PurchaseOrderService::open(&shop).len(), 1);
    }

    #[test]
    fn status_moves_only_from_ordered() {
        let (mut shop, _, order) = shop_with_order();
        PurchaseOrderService::receive(&mut shop, order).unwrap();
        assert!(PurchaseOrderService::cancel(&mut shop, order).is_err());
        assert!(PurchaseOrderService::receive(&mut shop, order).is_err());
        assert!(PurchaseOrderService::open(&shop).is_empty());
    }

    #[test]
    fn bill_posts_invoice_once() {
        let (mut shop, supplier, order) = shop_with_order();
        assert!(PurchaseOrderService::bill(&mut shop, order, date()).is_err());

        PurchaseOrderService::receive(&mut shop, order).unwrap();
        let entry = PurchaseOrderService::bill(&mut shop, order, date()).unwrap();
        let account = shop.supplier(supplier).unwrap().account();
        assert_eq!(account.balance_cents(), 880_000);
        assert_eq!(account.entries()[0].id, entry);
        assert_eq!(shop.purchase_order(order).unwrap().billed_entry, Some(entry));

        assert!(PurchaseOrderService::bill(&mut shop, order, date()).is_err());
        assert_eq!(shop.supplier(supplier).unwrap().account().len(), 1);
    }

    #[test]
    fn expected_date_cannot_precede_order() {
        let (mut shop, _, order) = shop_with_order();
        let early = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
        assert!(PurchaseOrderService::set_expected_date(&mut shop, order, Some(early)).is_err());
        let later = NaiveDate::from_ymd_opt(2023, 10, 20).unwrap();
        PurchaseOrderService::set_expected_date(&mut shop, order, Some(later)).unwrap();
        assert_eq!(shop.purchase_order(order).unwrap().expected_date, Some(later));
    }

    #[test]
    fn resolve_accepts_short_ids() {
        let (shop, _, order) = shop_with_order();
        let short = shop.purchase_order(order).unwrap().short_id();
        assert_eq!(PurchaseOrderService::resolve(&shop, &short.to_lowercase()).unwrap(), order);
        assert_eq!(
            PurchaseOrderService::resolve(&shop, &format!("#{short}")).unwrap(),
            order
        );
        assert!(PurchaseOrderService::resolve(&shop, "").is_err());
    }
}
