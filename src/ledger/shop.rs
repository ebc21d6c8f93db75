use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{purchase_order::PurchaseOrder, supplier::Supplier};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Everything the back office persists: suppliers with their ledgers and
/// purchase orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopData {
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub purchase_orders: Vec<PurchaseOrder>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "ShopData::schema_version_default")]
    pub schema_version: u8,
}

impl Default for ShopData {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopData {
    pub fn new() -> Self {
        Self {
            suppliers: Vec::new(),
            purchase_orders: Vec::new(),
            updated_at: Utc::now(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn supplier(&self, id: Uuid) -> Option<&Supplier> {
        self.suppliers.iter().find(|supplier| supplier.id == id)
    }

    pub(crate) fn supplier_mut(&mut self, id: Uuid) -> Option<&mut Supplier> {
        self.suppliers.iter_mut().find(|supplier| supplier.id == id)
    }

    pub fn supplier_by_name(&self, name: &str) -> Option<&Supplier> {
        let needle = name.trim().to_lowercase();
        self.suppliers
            .iter()
            .find(|supplier| supplier.name().trim().to_lowercase() == needle)
    }

    pub fn purchase_order(&self, id: Uuid) -> Option<&PurchaseOrder> {
        self.purchase_orders.iter().find(|order| order.id == id)
    }

    pub(crate) fn purchase_order_mut(&mut self, id: Uuid) -> Option<&mut PurchaseOrder> {
        self.purchase_orders.iter_mut().find(|order| order.id == id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
