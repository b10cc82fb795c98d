use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{Writer, WriterBuilder};
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accounting::calculation::add;
use crate::accounting::{FundAnalysis, FundType, Operation, OperationType, Position};
use crate::error::Result;

const OPERATION_HEADERS: [&str; 9] = [
    "date",
    "operation_type",
    "fund_name",
    "fund_type",
    "quantity",
    "unit_price",
    "total_amount",
    "description",
    "source_reference",
];
const POSITION_HEADERS: [&str; 5] = ["fund_name", "fund_type", "quantity", "unit_value", "total_value"];
const DETAIL_HEADERS: [&str; 10] = [
    "fund_name",
    "date",
    "operation_type",
    "quantity",
    "unit_price",
    "total",
    "cost_basis",
    "gain_loss",
    "shortfall",
    "lots_used",
];
const SUMMARY_HEADERS: [&str; 8] = [
    "fund_name",
    "total_purchases",
    "total_sales",
    "total_gain_loss",
    "quantity",
    "total_cost",
    "average_cost",
    "open_lots",
];
const FUND_TYPE_HEADERS: [&str; 4] = ["fund_type", "positions", "total_value", "portfolio_share"];

#[derive(Debug, Serialize)]
struct OperationRecord<'a> {
    date: NaiveDate,
    operation_type: OperationType,
    fund_name: &'a str,
    fund_type: FundType,
    quantity: Decimal,
    unit_price: Decimal,
    total_amount: Decimal,
    description: &'a str,
    source_reference: &'a str,
}

#[derive(Debug, Serialize)]
struct PositionRecord<'a> {
    fund_name: &'a str,
    fund_type: FundType,
    quantity: Decimal,
    unit_value: Decimal,
    total_value: Decimal,
}

#[derive(Debug, Serialize)]
struct DetailRecord<'a> {
    fund_name: &'a str,
    date: NaiveDate,
    operation_type: OperationType,
    quantity: Decimal,
    unit_price: Decimal,
    total: Decimal,
    cost_basis: Option<Decimal>,
    gain_loss: Option<Decimal>,
    shortfall: Option<Decimal>,
    lots_used: usize,
}

#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    fund_name: &'a str,
    total_purchases: Decimal,
    total_sales: Decimal,
    total_gain_loss: Decimal,
    quantity: Decimal,
    total_cost: Decimal,
    average_cost: Decimal,
    open_lots: usize,
}

#[derive(Debug, PartialEq, Serialize)]
struct FundTypeRecord {
    fund_type: FundType,
    positions: usize,
    total_value: Decimal,
    portfolio_share: Decimal,
}

/// Writes the CSV artifacts for one analysed statement.
pub struct ReportWriter {
    output_dir: PathBuf,
    decimal_places: u32,
    fund_type: Option<FundType>,
}

impl ReportWriter {
    pub fn new(output_dir: &str, decimal_places: u32) -> ReportWriter {
        ReportWriter {
            output_dir: PathBuf::from(output_dir),
            decimal_places,
            fund_type: None,
        }
    }

    /// Restricts every report to funds of this type.
    pub fn fund_type(mut self, fund_type: FundType) -> ReportWriter {
        self.fund_type = Some(fund_type);
        self
    }

    pub fn render(
        &self,
        operations: &[Operation],
        positions: &[Position],
        analyses: &BTreeMap<String, FundAnalysis>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let operations: Vec<&Operation> = operations
            .iter()
            .filter(|o| self.wants(o.fund_type))
            .collect();
        let positions: Vec<&Position> = positions
            .iter()
            .filter(|p| self.wants(p.fund_type))
            .collect();
        let analyses: Vec<&FundAnalysis> = analyses
            .values()
            .filter(|a| match self.fund_type {
                None => true,
                Some(_) => operations.iter().any(|o| o.fund_name == a.fund_name),
            })
            .collect();

        self.write_operations(&operations)?;
        self.write_positions(&positions)?;
        self.write_detail(&analyses)?;
        self.write_summary(&analyses)?;
        self.write_fund_types(&positions)?;

        info!("reports written to {}", self.output_dir.display());
        Ok(self.output_dir.clone())
    }

    fn wants(&self, fund_type: FundType) -> bool {
        self.fund_type.map_or(true, |wanted| wanted == fund_type)
    }

    /// Banker's rounding, then padded so every figure shows the same scale.
    fn round(&self, value: Decimal) -> Decimal {
        let mut rounded = value.round_dp(self.decimal_places);
        rounded.rescale(self.decimal_places);
        rounded
    }

    /// Opens `file_name` with its header row already written, so a report
    /// with no rows still carries its columns.
    fn writer(&self, file_name: &str, headers: &[&str]) -> Result<Writer<std::fs::File>> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(self.output_dir.join(file_name))?;
        writer.write_record(headers)?;
        Ok(writer)
    }

    fn write_operations(&self, operations: &[&Operation]) -> Result<()> {
        let mut writer = self.writer("operations.csv", &OPERATION_HEADERS)?;
        for operation in operations {
            writer.serialize(OperationRecord {
                date: operation.date,
                operation_type: operation.operation_type,
                fund_name: &operation.fund_name,
                fund_type: operation.fund_type,
                quantity: self.round(operation.quantity),
                unit_price: self.round(operation.unit_price),
                total_amount: self.round(operation.total_amount),
                description: &operation.description,
                source_reference: &operation.source_reference,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_positions(&self, positions: &[&Position]) -> Result<()> {
        let mut writer = self.writer("positions.csv", &POSITION_HEADERS)?;
        for position in positions {
            writer.serialize(PositionRecord {
                fund_name: &position.fund_name,
                fund_type: position.fund_type,
                quantity: self.round(position.quantity),
                unit_value: self.round(position.unit_value),
                total_value: self.round(position.total_value),
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_detail(&self, analyses: &[&FundAnalysis]) -> Result<()> {
        let mut writer = self.writer("peps_detail.csv", &DETAIL_HEADERS)?;
        for analysis in analyses {
            for detail in &analysis.operations_detail {
                writer.serialize(DetailRecord {
                    fund_name: &analysis.fund_name,
                    date: detail.date,
                    operation_type: detail.operation_type,
                    quantity: self.round(detail.quantity),
                    unit_price: self.round(detail.unit_price),
                    total: self.round(detail.total),
                    cost_basis: detail.cost_basis.map(|v| self.round(v)),
                    gain_loss: detail.gain_loss.map(|v| self.round(v)),
                    shortfall: detail.shortfall.map(|v| self.round(v)),
                    lots_used: detail.consumed_lots.len(),
                })?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_summary(&self, analyses: &[&FundAnalysis]) -> Result<()> {
        let mut writer = self.writer("peps_summary.csv", &SUMMARY_HEADERS)?;
        for analysis in analyses {
            let position = &analysis.current_position;
            writer.serialize(SummaryRecord {
                fund_name: &analysis.fund_name,
                total_purchases: self.round(analysis.total_purchases),
                total_sales: self.round(analysis.total_sales),
                total_gain_loss: self.round(analysis.total_gain_loss),
                quantity: self.round(position.quantity),
                total_cost: self.round(position.total_cost),
                average_cost: self.round(position.average_cost),
                open_lots: position.open_lots.len(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_fund_types(&self, positions: &[&Position]) -> Result<()> {
        let mut writer = self.writer("fund_types.csv", &FUND_TYPE_HEADERS)?;
        for record in fund_type_breakdown(positions) {
            writer.serialize(FundTypeRecord {
                total_value: self.round(record.total_value),
                portfolio_share: record.portfolio_share.round_dp(2),
                ..record
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn fund_type_breakdown(positions: &[&Position]) -> Vec<FundTypeRecord> {
    let portfolio = positions
        .iter()
        .fold(Decimal::ZERO, |sum, p| add(sum, p.total_value));

    FundType::ALL
        .iter()
        .filter_map(|fund_type| {
            let matching: Vec<&&Position> = positions
                .iter()
                .filter(|p| p.fund_type == *fund_type)
                .collect();
            if matching.is_empty() {
                return None;
            }
            let total_value = matching
                .iter()
                .fold(Decimal::ZERO, |sum, p| add(sum, p.total_value));
            let portfolio_share = if portfolio > Decimal::ZERO {
                total_value
                    .checked_div(portfolio)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            };
            Some(FundTypeRecord {
                fund_type: *fund_type,
                positions: matching.len(),
                total_value,
                portfolio_share,
            })
        })
        .collect()
}

/// Paths of the files a [`ReportWriter`] produces in `dir`.
pub fn report_files(dir: &Path) -> Vec<PathBuf> {
    [
        "operations.csv",
        "positions.csv",
        "peps_detail.csv",
        "peps_summary.csv",
        "fund_types.csv",
    ]
    .iter()
    .map(|name| dir.join(name))
    .collect()
}
