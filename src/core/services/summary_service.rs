use crate::ledger::{BalanceStatus, ShopData};

/// Dashboard figures across all supplier accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayablesSummary {
    pub suppliers: usize,
    pub suppliers_due: usize,
    /// Sum of positive balances: what the shop owes.
    pub due_cents: i64,
    /// Sum of negative balances as a positive figure: credit held with suppliers.
    pub credit_cents: i64,
    pub open_orders: usize,
    pub open_order_cents: i64,
}

impl PayablesSummary {
    pub fn net_cents(&self) -> i64 {
        self.due_cents.saturating_sub(self.credit_cents)
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn payables(shop: &ShopData) -> PayablesSummary {
        let mut summary = PayablesSummary {
            suppliers: shop.suppliers.len(),
            ..PayablesSummary::default()
        };
        for supplier in &shop.suppliers {
            let balance = supplier.balance_cents();
            match BalanceStatus::from_balance(balance) {
                BalanceStatus::Due => {
                    summary.suppliers_due += 1;
                    summary.due_cents = summary.due_cents.saturating_add(balance);
                }
                BalanceStatus::Credit => {
                    summary.credit_cents = summary.credit_cents.saturating_add(balance.saturating_neg());
                }
                BalanceStatus::Settled => {}
            }
        }
        for order in shop.purchase_orders.iter().filter(|order| order.is_open()) {
            summary.open_orders += 1;
            summary.open_order_cents = summary.open_order_cents.saturating_add(order.total_cents());
        }
        summary
    }
}
