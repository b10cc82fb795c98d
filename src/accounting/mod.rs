pub mod accountant;
pub mod reports;
pub mod calculation;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use calculation::analyze;
pub use calculation::inventory::Inventory;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Purchase,
    Sale,
}

impl OperationType {
    /// Maps the statement vocabulary (SUSCRIPCION/COMPRA, RESCATE/VENTA).
    pub fn from_statement(token: &str) -> Option<OperationType> {
        match token.to_uppercase().as_str() {
            "SUSCRIPCION" | "SUSCRIPCIÓN" | "COMPRA" => Some(OperationType::Purchase),
            "RESCATE" | "VENTA" => Some(OperationType::Sale),
            _ => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Purchase => write!(f, "PURCHASE"),
            OperationType::Sale => write!(f, "SALE"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundType {
    #[serde(rename = "Renta Fija")]
    FixedIncome,
    #[serde(rename = "Renta Variable")]
    Equity,
    #[serde(rename = "Mixto")]
    Mixed,
    #[serde(rename = "Money Market")]
    MoneyMarket,
    #[serde(rename = "Obligaciones Negociables")]
    CorporateBonds,
    #[serde(rename = "Acciones")]
    Shares,
    #[serde(rename = "Otro")]
    Other,
}

impl FundType {
    pub const ALL: [FundType; 7] = [
        FundType::FixedIncome,
        FundType::Equity,
        FundType::Mixed,
        FundType::MoneyMarket,
        FundType::CorporateBonds,
        FundType::Shares,
        FundType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FundType::FixedIncome => "Renta Fija",
            FundType::Equity => "Renta Variable",
            FundType::Mixed => "Mixto",
            FundType::MoneyMarket => "Money Market",
            FundType::CorporateBonds => "Obligaciones Negociables",
            FundType::Shares => "Acciones",
            FundType::Other => "Otro",
        }
    }
}

impl fmt::Display for FundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FundType::ALL
            .iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown fund type '{}'", s))
    }
}

/// A single transaction read from a statement line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub date: NaiveDate,
    pub operation_type: OperationType,
    pub fund_name: String,
    pub fund_type: FundType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub description: String,
    pub source_reference: String,
}

/// Holding as stated by the document itself, not derived from the lots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub fund_name: String,
    pub fund_type: FundType,
    pub quantity: Decimal,
    pub unit_value: Decimal,
    pub total_value: Decimal,
}

/// One purchase event. Only `remaining` ever changes, and only downwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AcquisitionLot {
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    remaining: Decimal,
}

impl AcquisitionLot {
    pub fn new(date: NaiveDate, quantity: Decimal, unit_price: Decimal) -> AcquisitionLot {
        AcquisitionLot {
            date,
            quantity,
            unit_price,
            remaining: quantity,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    pub fn is_open(&self) -> bool {
        self.remaining > Decimal::ZERO
    }

    /// Takes up to `wanted` units out of the lot and returns how many were taken.
    pub(crate) fn consume(&mut self, wanted: Decimal) -> Decimal {
        let taken = wanted.min(self.remaining).max(Decimal::ZERO);
        self.remaining -= taken;
        taken
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsumedLot {
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub cost: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaleResult {
    pub gain_loss: Decimal,
    pub cost_basis: Decimal,
    pub sale_value: Decimal,
    pub consumed_lots: Vec<ConsumedLot>,
    /// Units that no open lot could cover.
    pub shortfall: Decimal,
    pub insufficient_inventory: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentPosition {
    pub quantity: Decimal,
    pub total_cost: Decimal,
    pub average_cost: Decimal,
    pub open_lots: Vec<AcquisitionLot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationDetail {
    pub date: NaiveDate,
    pub operation_type: OperationType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub cost_basis: Option<Decimal>,
    pub gain_loss: Option<Decimal>,
    pub shortfall: Option<Decimal>,
    pub consumed_lots: Vec<ConsumedLot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundAnalysis {
    pub fund_name: String,
    pub total_purchases: Decimal,
    pub total_sales: Decimal,
    pub total_gain_loss: Decimal,
    pub operations_detail: Vec<OperationDetail>,
    pub current_position: CurrentPosition,
}
