use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::cents_to_amount;

use super::entry::{EntryDraft, EntryKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PurchaseOrderStatus {
    Ordered,
    Received,
    Cancelled,
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PurchaseOrderStatus::Ordered => "Ordered",
            PurchaseOrderStatus::Received => "Received",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseOrderItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_cost_cents: i64,
}

impl PurchaseOrderItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_cost_cents: i64) -> Self {
        Self {
            name: name.into(),
            sku: None,
            quantity,
            unit_cost_cents,
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_cost_cents.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub date: NaiveDate,
    pub supplier_name: String,
    pub status: PurchaseOrderStatus,
    #[serde(default)]
    pub items: Vec<PurchaseOrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    /// Ledger entry the order was billed as, once billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_entry: Option<Uuid>,
}

impl PurchaseOrder {
    pub fn new(
        supplier_name: impl Into<String>,
        date: NaiveDate,
        items: Vec<PurchaseOrderItem>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            supplier_name: supplier_name.into(),
            status: PurchaseOrderStatus::Ordered,
            items,
            expected_date: None,
            billed_entry: None,
        }
    }

    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(PurchaseOrderItem::line_total_cents)
            .fold(0i64, i64::saturating_add)
    }

    /// First eight hex digits of the id, upper-cased, for display and references.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_uppercase()
    }

    pub fn is_open(&self) -> bool {
        self.status == PurchaseOrderStatus::Ordered
    }

    /// Ordered, or received but not yet billed to the supplier.
    pub fn is_pending(&self) -> bool {
        match self.status {
            PurchaseOrderStatus::Ordered => true,
            PurchaseOrderStatus::Received => self.billed_entry.is_none(),
            PurchaseOrderStatus::Cancelled => false,
        }
    }

    pub fn is_for(&self, supplier_name: &str) -> bool {
        self.supplier_name.trim().to_lowercase() == supplier_name.trim().to_lowercase()
    }

    /// Invoice draft that bills this order to the supplier ledger.
    pub fn invoice_draft(&self, date: NaiveDate) -> EntryDraft {
        let names: Vec<&str> = self.items.iter().map(|item| item.name.as_str()).collect();
        let mut description = format!("PO #{}", self.short_id());
        if !names.is_empty() {
            description.push_str(" - ");
            description.push_str(&names.join(", "));
        }
        EntryDraft::new(
            date,
            EntryKind::Invoice,
            description,
            cents_to_amount(self.total_cents()),
        )
        .with_reference(format!("PO-{}", self.short_id()))
    }
}
