pub mod inventory;

use std::collections::BTreeMap;

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::accounting::calculation::inventory::Inventory;
use crate::accounting::{FundAnalysis, Operation, OperationDetail, OperationType};

/// Replays every fund's operations through its own FIFO inventory.
///
/// Operations are grouped by fund name and sorted by date before replay; the
/// sort is stable, so same-day operations keep their statement order.
pub fn analyze(operations: &[Operation]) -> BTreeMap<String, FundAnalysis> {
    let mut funds: BTreeMap<&str, Vec<&Operation>> = BTreeMap::new();
    for operation in operations {
        funds
            .entry(operation.fund_name.as_str())
            .or_insert_with(Vec::new)
            .push(operation);
    }

    funds
        .into_iter()
        .map(|(fund_name, mut fund_operations)| {
            fund_operations.sort_by_key(|operation| operation.date);
            let analysis = FundCalculation::new(fund_name).replay(&fund_operations);
            (fund_name.to_string(), analysis)
        })
        .collect()
}

/// `a + b`, clamped to the decimal range instead of overflowing.
pub(crate) fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        warn!("{} + {} is out of decimal range, result clamped", a, b);
        a.saturating_add(b)
    })
}

/// `a * b`, clamped to the decimal range instead of overflowing.
pub(crate) fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        warn!("{} * {} is out of decimal range, result clamped", a, b);
        a.saturating_mul(b)
    })
}

struct FundCalculation {
    fund_name: String,
    inventory: Inventory,
    total_purchases: Decimal,
    total_sales: Decimal,
    total_gain_loss: Decimal,
    log: Vec<OperationDetail>,
}

impl FundCalculation {
    fn new(fund_name: &str) -> FundCalculation {
        FundCalculation {
            fund_name: fund_name.to_string(),
            inventory: Inventory::new(),
            total_purchases: Decimal::ZERO,
            total_sales: Decimal::ZERO,
            total_gain_loss: Decimal::ZERO,
            log: Vec::new(),
        }
    }

    fn replay(mut self, operations: &[&Operation]) -> FundAnalysis {
        for operation in operations {
            match operation.operation_type {
                OperationType::Purchase => self.process_purchase(operation),
                OperationType::Sale => self.process_sale(operation),
            }
        }
        debug!(
            "{}: {} operations replayed, realized {}",
            self.fund_name,
            self.log.len(),
            self.total_gain_loss
        );

        FundAnalysis {
            current_position: self.inventory.current_position(),
            fund_name: self.fund_name,
            total_purchases: self.total_purchases,
            total_sales: self.total_sales,
            total_gain_loss: self.total_gain_loss,
            operations_detail: self.log,
        }
    }

    fn process_purchase(&mut self, purchase: &Operation) {
        self.inventory
            .record_purchase(purchase.date, purchase.quantity, purchase.unit_price);
        self.total_purchases = add(self.total_purchases, purchase.total_amount);

        self.log.push(OperationDetail {
            date: purchase.date,
            operation_type: OperationType::Purchase,
            quantity: purchase.quantity,
            unit_price: purchase.unit_price,
            total: purchase.total_amount,
            cost_basis: None,
            gain_loss: None,
            shortfall: None,
            consumed_lots: Vec::new(),
        });
    }

    fn process_sale(&mut self, sale: &Operation) {
        let result = self
            .inventory
            .record_sale(sale.date, sale.quantity, sale.unit_price);
        self.total_sales = add(self.total_sales, sale.total_amount);
        self.total_gain_loss = add(self.total_gain_loss, result.gain_loss);

        self.log.push(OperationDetail {
            date: sale.date,
            operation_type: OperationType::Sale,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            total: sale.total_amount,
            cost_basis: Some(result.cost_basis),
            gain_loss: Some(result.gain_loss),
            shortfall: Some(result.shortfall),
            consumed_lots: result.consumed_lots,
        });
    }
}
