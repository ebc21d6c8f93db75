//! Supplier ledger domain: entries, accounts, the reconciler that keeps them
//! balanced, and the purchase orders billed into them.

pub mod account;
pub mod entry;
pub mod purchase_order;
pub mod reconciler;
pub mod shop;
pub mod supplier;

pub use account::{BalanceStatus, LedgerTotals, SupplierAccount};
pub use entry::{EntryDraft, EntryKind, LedgerEntry, ParseEntryKindError};
pub use purchase_order::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};
pub use reconciler::{BalanceDrift, LedgerReconciler, Posted, ReconcileError, ReconcileResult};
pub use shop::{ShopData, CURRENT_SCHEMA_VERSION};
pub use supplier::{Supplier, SupplierProfile};
