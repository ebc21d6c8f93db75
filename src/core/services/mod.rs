pub mod ledger_service;
pub mod purchase_order_service;
pub mod summary_service;
pub mod supplier_service;

pub use ledger_service::LedgerService;
pub use purchase_order_service::PurchaseOrderService;
pub use summary_service::{PayablesSummary, SummaryService};
pub use supplier_service::SupplierService;

use uuid::Uuid;

use crate::ledger::ReconcileError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),
    #[error("Purchase order not found: {0}")]
    PurchaseOrderNotFound(Uuid),
    #[error("{0}")]
    Invalid(String),
}
