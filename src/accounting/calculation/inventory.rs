use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use crate::accounting::calculation::{add, mul};
use crate::accounting::{AcquisitionLot, ConsumedLot, CurrentPosition, SaleResult};

/// FIFO lot inventory for a single fund.
///
/// Lots are kept in acquisition order and never removed; a lot whose
/// `remaining` reached zero simply stops taking part in sales.
#[derive(Debug, Default)]
pub struct Inventory {
    lots: Vec<AcquisitionLot>,
}

impl Inventory {
    pub fn new() -> Inventory {
        Inventory { lots: Vec::new() }
    }

    pub fn lots(&self) -> &[AcquisitionLot] {
        &self.lots
    }

    pub fn record_purchase(&mut self, date: NaiveDate, quantity: Decimal, unit_price: Decimal) {
        self.lots.push(AcquisitionLot::new(date, quantity, unit_price));
    }

    pub fn record_sale(
        &mut self,
        date: NaiveDate,
        quantity_sold: Decimal,
        sale_price: Decimal,
    ) -> SaleResult {
        let sale_value = mul(quantity_sold, sale_price);

        if self.lots.is_empty() {
            warn!(
                "sale of {} units on {} has no previous purchases to match",
                quantity_sold, date
            );
            return SaleResult {
                gain_loss: sale_value,
                cost_basis: Decimal::ZERO,
                sale_value,
                consumed_lots: Vec::new(),
                shortfall: quantity_sold,
                insufficient_inventory: true,
            };
        }

        let mut cost_basis = Decimal::ZERO;
        let mut outstanding = quantity_sold;
        let mut consumed_lots = Vec::new();

        // oldest lots first
        for lot in self.lots.iter_mut().filter(|lot| lot.is_open()) {
            if outstanding <= Decimal::ZERO {
                break;
            }

            let taken = lot.consume(outstanding);
            let cost = mul(taken, lot.unit_price);
            cost_basis = add(cost_basis, cost);
            outstanding -= taken;

            consumed_lots.push(ConsumedLot {
                date: lot.date,
                quantity: taken,
                unit_price: lot.unit_price,
                cost,
            });
        }

        let shortfall = outstanding.max(Decimal::ZERO);
        if shortfall > Decimal::ZERO {
            warn!(
                "sale on {} is short {} units of recorded purchases",
                date, shortfall
            );
        }

        SaleResult {
            gain_loss: sale_value.saturating_sub(cost_basis),
            cost_basis,
            sale_value,
            consumed_lots,
            shortfall,
            insufficient_inventory: shortfall > Decimal::ZERO,
        }
    }

    pub fn current_position(&self) -> CurrentPosition {
        let quantity = self
            .lots
            .iter()
            .fold(Decimal::ZERO, |sum, lot| add(sum, lot.remaining()));
        let total_cost = self
            .lots
            .iter()
            .fold(Decimal::ZERO, |sum, lot| add(sum, mul(lot.remaining(), lot.unit_price)));
        let average_cost = if quantity > Decimal::ZERO {
            total_cost.checked_div(quantity).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        CurrentPosition {
            quantity,
            total_cost,
            average_cost,
            open_lots: self.lots.iter().filter(|lot| lot.is_open()).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_lot_inventory() -> Inventory {
        let mut inventory = Inventory::new();
        inventory.record_purchase(day(2024, 1, 10), dec!(100), dec!(10.00));
        inventory.record_purchase(day(2024, 2, 10), dec!(50), dec!(12.00));
        inventory
    }

    #[test]
    fn test_sale_consumes_oldest_lot_first() {
        let mut inventory = two_lot_inventory();
        let result = inventory.record_sale(day(2024, 3, 1), dec!(100), dec!(11));

        assert_eq!(result.cost_basis, dec!(1000));
        assert_eq!(result.consumed_lots.len(), 1);
        assert_eq!(result.consumed_lots[0].date, day(2024, 1, 10));
        assert_eq!(inventory.lots()[1].remaining(), dec!(50));
    }

    #[test]
    fn test_sale_spanning_two_lots() {
        let mut inventory = two_lot_inventory();
        let result = inventory.record_sale(day(2024, 3, 10), dec!(120), dec!(15.00));

        assert_eq!(result.cost_basis, dec!(1240));
        assert_eq!(result.sale_value, dec!(1800));
        assert_eq!(result.gain_loss, dec!(560));
        assert_eq!(result.shortfall, Decimal::ZERO);
        assert!(!result.insufficient_inventory);
        assert_eq!(
            result.consumed_lots,
            vec![
                ConsumedLot {
                    date: day(2024, 1, 10),
                    quantity: dec!(100),
                    unit_price: dec!(10.00),
                    cost: dec!(1000),
                },
                ConsumedLot {
                    date: day(2024, 2, 10),
                    quantity: dec!(20),
                    unit_price: dec!(12.00),
                    cost: dec!(240),
                },
            ]
        );

        let position = inventory.current_position();
        assert_eq!(position.quantity, dec!(30));
        assert_eq!(position.total_cost, dec!(360));
        assert_eq!(position.average_cost, dec!(12));
        assert_eq!(position.open_lots.len(), 1);
        assert_eq!(position.open_lots[0].unit_price, dec!(12.00));

        let result = inventory.record_sale(day(2024, 4, 10), dec!(30), dec!(13));
        assert_eq!(result.shortfall, Decimal::ZERO);
        assert_eq!(result.cost_basis, dec!(360));
        assert_eq!(inventory.current_position().quantity, Decimal::ZERO);
    }

    #[test]
    fn test_sale_against_empty_inventory() {
        let mut inventory = Inventory::new();
        let result = inventory.record_sale(day(2024, 1, 1), dec!(7), dec!(3));

        assert_eq!(result.cost_basis, Decimal::ZERO);
        assert_eq!(result.sale_value, dec!(21));
        assert_eq!(result.gain_loss, dec!(21));
        assert_eq!(result.shortfall, dec!(7));
        assert!(result.insufficient_inventory);
        assert!(result.consumed_lots.is_empty());
    }

    #[test]
    fn test_partial_shortfall_keeps_partial_cost() {
        let mut inventory = Inventory::new();
        inventory.record_purchase(day(2024, 1, 1), dec!(5), dec!(2));
        let result = inventory.record_sale(day(2024, 2, 1), dec!(8), dec!(3));

        assert_eq!(result.cost_basis, dec!(10));
        assert_eq!(result.sale_value, dec!(24));
        assert_eq!(result.gain_loss, dec!(14));
        assert_eq!(result.shortfall, dec!(3));
        assert!(result.insufficient_inventory);

        // exhausted lots stay in the history
        assert_eq!(inventory.lots().len(), 1);
        let second = inventory.record_sale(day(2024, 3, 1), dec!(1), dec!(3));
        assert_eq!(second.shortfall, dec!(1));
        assert!(second.consumed_lots.is_empty());
    }

    #[test]
    fn test_quantity_is_conserved() {
        let mut inventory = Inventory::new();
        inventory.record_purchase(day(2024, 1, 1), dec!(10.12345678), dec!(1.5));
        inventory.record_purchase(day(2024, 1, 2), dec!(3.5), dec!(1.7));
        let first = inventory.record_sale(day(2024, 1, 3), dec!(4.00000001), dec!(2));
        inventory.record_purchase(day(2024, 1, 4), dec!(2), dec!(1.9));
        let second = inventory.record_sale(day(2024, 1, 5), dec!(20), dec!(2));

        let purchased = dec!(10.12345678) + dec!(3.5) + dec!(2);
        let matched = (dec!(4.00000001) - first.shortfall) + (dec!(20) - second.shortfall);
        let remaining: Decimal = inventory.lots().iter().map(|l| l.remaining()).sum();
        assert_eq!(remaining, purchased - matched);
        assert_eq!(remaining, Decimal::ZERO);
    }

    #[test]
    fn test_current_position_is_idempotent() {
        let mut inventory = two_lot_inventory();
        inventory.record_sale(day(2024, 3, 1), dec!(33.3), dec!(11));
        assert_eq!(inventory.current_position(), inventory.current_position());
    }

    #[test]
    fn test_values_out_of_range_are_clamped() {
        let huge = dec!(99999999999999999999);

        let mut inventory = Inventory::new();
        let sale = inventory.record_sale(day(2024, 1, 10), huge, huge);
        assert_eq!(sale.sale_value, Decimal::MAX);
        assert_eq!(sale.gain_loss, Decimal::MAX);
        assert_eq!(sale.shortfall, huge);

        inventory.record_purchase(day(2024, 1, 11), huge, huge);
        inventory.record_purchase(day(2024, 1, 12), huge, huge);
        let position = inventory.current_position();
        assert_eq!(position.quantity, huge * dec!(2));
        assert_eq!(position.total_cost, Decimal::MAX);

        let sale = inventory.record_sale(day(2024, 1, 13), huge, dec!(1));
        assert_eq!(sale.cost_basis, Decimal::MAX);
        assert_eq!(sale.gain_loss, huge - Decimal::MAX);
    }

    #[test]
    fn test_empty_position_has_zero_average() {
        let position = Inventory::new().current_position();
        assert_eq!(position.quantity, Decimal::ZERO);
        assert_eq!(position.average_cost, Decimal::ZERO);
        assert!(position.open_lots.is_empty());
    }
}
