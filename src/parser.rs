use log::{debug, info, warn};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accounting::{FundType, Operation, OperationType, Position};
use crate::amount::normalize;
use crate::config::ParserConfig;
use crate::dates::parse_statement_date;

/// Section the scanner is currently in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Positions,
    /// Transactions of the named fund.
    Operations(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParsedStatement {
    pub operations: Vec<Operation>,
    pub positions: Vec<Position>,
}

/// Line-oriented scanner for fund statements.
///
/// Holds only configuration; every call to [`StatementParser::parse`] starts
/// from [`Mode::Idle`].
pub struct StatementParser {
    config: ParserConfig,
    position_as_of: Regex,
    fund_header: Regex,
    leading_date: Regex,
    number: Regex,
    trailing_number: Regex,
}

impl StatementParser {
    pub fn new(config: &ParserConfig) -> StatementParser {
        StatementParser {
            config: config.clone(),
            position_as_of: Regex::new(r"(?i)posici[oó]n al \d{1,2}/\d{1,2}/\d{2,4}").unwrap(),
            fund_header: Regex::new(r"FONDO\s*[-–—]\s*(.+)$").unwrap(),
            leading_date: Regex::new(r"^\d{1,2}/\d{1,2}/(\d{4}|\d{2})(\s|$)").unwrap(),
            number: Regex::new(r"\d(?:[\d.,]*\d)?").unwrap(),
            trailing_number: Regex::new(r"^(.+?)\s+(\d[\d.,]*)$").unwrap(),
        }
    }

    pub fn parse(&self, text: &str, source_reference: &str) -> ParsedStatement {
        let mut statement = ParsedStatement::default();
        let mut mode = Mode::Idle;

        info!("parsing {} ({} lines)", source_reference, text.lines().count());

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(next) = self.transition(line) {
                match &next {
                    Mode::Positions => info!("line {}: positions section", i + 1),
                    Mode::Operations(fund) => info!("line {}: fund {}", i + 1, fund),
                    Mode::Idle => {}
                }
                mode = next;
                continue;
            }

            match &mode {
                Mode::Idle => debug!("line {}: outside any section", i + 1),
                Mode::Positions => {
                    if let Some(position) = self.parse_position(i + 1, line) {
                        statement.positions.push(position);
                    }
                }
                Mode::Operations(fund) => {
                    if let Some(operation) = self.parse_operation(i + 1, line, fund, source_reference) {
                        statement.operations.push(operation);
                    }
                }
            }
        }

        info!(
            "parsed {}: {} operations, {} positions",
            source_reference,
            statement.operations.len(),
            statement.positions.len()
        );
        statement
    }

    /// Section entered by `line`, if it is a section marker at all.
    fn transition(&self, line: &str) -> Option<Mode> {
        if line.contains(&self.config.section_header) || self.position_as_of.is_match(line) {
            return Some(Mode::Positions);
        }
        self.fund_header
            .captures(line)
            .map(|caps| caps[1].trim().to_string())
            .filter(|fund| !fund.is_empty())
            .map(Mode::Operations)
    }

    pub fn classify(&self, fund_name: &str) -> FundType {
        if fund_name.contains(&self.config.money_market_marker) {
            FundType::MoneyMarket
        } else {
            FundType::Other
        }
    }

    fn parse_position(&self, number: usize, line: &str) -> Option<Position> {
        let marker = self.config.currency_marker.as_str();
        if !line.contains(&self.config.fund_family_marker) || line.matches(marker).count() < 2 {
            debug!("line {}: not a position line", number);
            return None;
        }

        let parts: Vec<&str> = line
            .split(marker)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            warn!("line {}: position line with {} parts: {}", number, parts.len(), line);
            return None;
        }

        let position = match self.trailing_number.captures(parts[0]) {
            // NAME QTY $ UNIT $ TOTAL
            Some(caps) => {
                let quantity = normalize(&caps[2]);
                let total_value = normalize(parts[2]);
                let stated_unit = normalize(parts[1]);
                let unit_value = if stated_unit.is_zero() {
                    unit_value(total_value, quantity)
                } else {
                    stated_unit
                };
                self.position(caps[1].trim(), quantity, unit_value, total_value)
            }
            // NAME $ QTY $ TOTAL
            None => {
                let quantity = normalize(parts[1]);
                let total_value = normalize(parts[2]);
                self.position(parts[0], quantity, unit_value(total_value, quantity), total_value)
            }
        };

        info!(
            "line {}: position {} - {} units",
            number, position.fund_name, position.quantity
        );
        Some(position)
    }

    fn position(&self, fund_name: &str, quantity: Decimal, unit_value: Decimal, total_value: Decimal) -> Position {
        Position {
            fund_name: fund_name.to_string(),
            fund_type: self.classify(fund_name),
            quantity,
            unit_value,
            total_value,
        }
    }

    fn parse_operation(
        &self,
        number: usize,
        line: &str,
        fund: &str,
        source_reference: &str,
    ) -> Option<Operation> {
        if !self.leading_date.is_match(line) {
            debug!("line {}: no leading date", number);
            return None;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            warn!("line {}: unexpected layout, {} tokens: {}", number, tokens.len(), line);
            return None;
        }

        let date = match parse_statement_date(tokens[0]) {
            Some(date) => date,
            None => {
                warn!("line {}: invalid date '{}', operation skipped", number, tokens[0]);
                return None;
            }
        };

        let type_token = tokens[1].to_uppercase();
        let operation_type = match OperationType::from_statement(&type_token) {
            Some(operation_type) => operation_type,
            None => {
                warn!("line {}: unknown operation type '{}'", number, type_token);
                return None;
            }
        };

        let rest = tokens[2..].join(" ");
        let numbers: Vec<&str> = self.number.find_iter(&rest).map(|m| m.as_str()).collect();
        if numbers.len() < 3 {
            warn!("line {}: not enough numeric values: {:?}", number, numbers);
            return None;
        }

        let quantity = normalize(numbers[0]);
        let unit_price = normalize(numbers[1]);
        let total_amount = normalize(numbers[2]);
        if quantity <= Decimal::ZERO || unit_price <= Decimal::ZERO || total_amount <= Decimal::ZERO {
            warn!(
                "line {}: invalid values quantity={} unit={} total={}",
                number, quantity, unit_price, total_amount
            );
            return None;
        }
        if quantity.checked_mul(unit_price).is_none() {
            warn!(
                "line {}: {} units at {} is out of range, operation skipped",
                number, quantity, unit_price
            );
            return None;
        }

        info!(
            "line {}: {} {} {} units at {} = {}",
            number, date, type_token, quantity, unit_price, total_amount
        );
        Some(Operation {
            date,
            operation_type,
            fund_name: fund.to_string(),
            fund_type: self.classify(fund),
            quantity,
            unit_price,
            total_amount,
            description: format!("{} - {}", type_token, fund),
            source_reference: source_reference.to_string(),
        })
    }
}

fn unit_value(total_value: Decimal, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        total_value.checked_div(quantity).unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn parser() -> StatementParser {
        StatementParser::new(&ParserConfig::default())
    }

    const STATEMENT: &str = "
Resumen de cuenta
FIMA-FONDOS COMUNES DE INVERSION
FIMA PREMIUM CLASE A 1.234,5678 $ 12,35 $ 15.246,92
FIMA AHORRO PESOS $ 500,00 $ 1.000,00
Total cartera $ 16.246,92

FONDO - FIMA PREMIUM CLASE A
Fecha Operacion Cuotas Valor Importe
10/01/2024 SUSCRIPCION 100,00 $ 10,00 $ 1.000,00
10/02/2024 suscripcion 50,00 $ 12,00 $ 600,00
10/03/2024 RESCATE 120,00 $ 15,00 $ 1.800,00
FONDO - FIMA AHORRO PESOS
15/01/24 COMPRA 10 $ 2,50 $ 25,00
";

    #[test]
    fn test_parses_positions_and_operations() {
        let statement = parser().parse(STATEMENT, "resumen.pdf");

        assert_eq!(statement.positions.len(), 2);
        let premium = &statement.positions[0];
        assert_eq!(premium.fund_name, "FIMA PREMIUM CLASE A");
        assert_eq!(premium.fund_type, FundType::MoneyMarket);
        assert_eq!(premium.quantity, dec!(1234.5678));
        assert_eq!(premium.unit_value, dec!(12.35));
        assert_eq!(premium.total_value, dec!(15246.92));

        let ahorro = &statement.positions[1];
        assert_eq!(ahorro.fund_name, "FIMA AHORRO PESOS");
        assert_eq!(ahorro.quantity, dec!(500));
        assert_eq!(ahorro.unit_value, dec!(2));
        assert_eq!(ahorro.total_value, dec!(1000));

        assert_eq!(statement.operations.len(), 4);
        let first = &statement.operations[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(first.operation_type, OperationType::Purchase);
        assert_eq!(first.fund_name, "FIMA PREMIUM CLASE A");
        assert_eq!(first.quantity, dec!(100));
        assert_eq!(first.unit_price, dec!(10));
        assert_eq!(first.total_amount, dec!(1000));
        assert_eq!(first.description, "SUSCRIPCION - FIMA PREMIUM CLASE A");
        assert_eq!(first.source_reference, "resumen.pdf");

        assert_eq!(statement.operations[1].operation_type, OperationType::Purchase);
        assert_eq!(statement.operations[2].operation_type, OperationType::Sale);

        let last = &statement.operations[3];
        assert_eq!(last.fund_name, "FIMA AHORRO PESOS");
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(last.unit_price, dec!(2.5));
    }

    #[test]
    fn test_skips_malformed_operation_lines() {
        let text = "
FONDO - FIMA RENTA
10/01/2024 SUSCRIPCION 100,00 $ 10,00
11/01/2024 SUSCRIPCION 0 $ 10,00 $ 0
12/01/2024 DIVIDENDO 1 $ 1 $ 1
31/02/2024 RESCATE 1 $ 1 $ 1
13/01/2024 RESCATE
14/01/2024 RESCATE 5 $ 2 $ 10
";
        let statement = parser().parse(text, "x.txt");
        assert_eq!(statement.operations.len(), 1);
        assert_eq!(statement.operations[0].quantity, dec!(5));
        assert_eq!(statement.operations[0].fund_type, FundType::MoneyMarket);
    }

    #[test]
    fn test_mode_switches_drop_fund_context() {
        let text = "
FONDO - FIMA RENTA
10/01/2024 SUSCRIPCION 1 $ 1 $ 1
Posicion al 31/01/2024
10/02/2024 SUSCRIPCION 1 $ 1 $ 1
FONDO - OTRO FONDO
10/03/2024 COMPRA 2 $ 3 $ 6
";
        let statement = parser().parse(text, "x.txt");
        assert_eq!(statement.operations.len(), 2);
        assert_eq!(statement.operations[1].fund_name, "OTRO FONDO");
        assert_eq!(statement.operations[1].fund_type, FundType::Other);
    }

    #[test]
    fn test_idle_lines_are_ignored() {
        let text = "10/01/2024 SUSCRIPCION 1 $ 1 $ 1\nFIMA X $ 1 $ 2\n";
        assert_eq!(parser().parse(text, "x.txt"), ParsedStatement::default());
    }

    #[test]
    fn test_position_without_units_has_zero_unit_value() {
        let text = "Posicion al 31/12/2023\nFIMA CERO $ 0,00 $ 0,00\nFIMA CORTA $ 1,00\n";
        let statement = parser().parse(text, "x.txt");
        assert_eq!(statement.positions.len(), 1);
        assert_eq!(statement.positions[0].unit_value, Decimal::ZERO);
    }

    #[test]
    fn test_zero_stated_unit_value_is_recomputed() {
        let text = "Posicion al 31/12/2023\nFIMA X 10 $ 0 $ 50\n";
        let statement = parser().parse(text, "x.txt");
        assert_eq!(statement.positions.len(), 1);
        assert_eq!(statement.positions[0].fund_name, "FIMA X");
        assert_eq!(statement.positions[0].quantity, dec!(10));
        assert_eq!(statement.positions[0].unit_value, dec!(5));
        assert_eq!(statement.positions[0].total_value, dec!(50));
    }

    #[test]
    fn test_skips_operations_out_of_decimal_range() {
        let text = "
FONDO - FIMA AHORRO
10/01/2024 RESCATE 99999999999999999999 $ 99999999999999999999 $ 1
11/01/2024 SUSCRIPCION 99999999999999999999 $ 99999999999999999999 $ 1
12/01/2024 SUSCRIPCION 99999999999999999999 $ 1 $ 99999999999999999999
";
        let statement = parser().parse(text, "x.txt");
        assert_eq!(statement.operations.len(), 1);
        assert_eq!(statement.operations[0].date, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
        assert_eq!(statement.operations[0].quantity, dec!(99999999999999999999));
    }

    #[test]
    fn test_parser_keeps_no_state_between_calls() {
        let parser = parser();
        let first = parser.parse(STATEMENT, "a.pdf");
        let second = parser.parse("10/01/2024 SUSCRIPCION 1 $ 1 $ 1", "b.pdf");
        assert!(!first.operations.is_empty());
        assert!(second.operations.is_empty());
    }

    #[test]
    fn test_custom_markers() {
        let config = ParserConfig {
            section_header: "TENENCIAS".to_string(),
            fund_family_marker: "ALPHA".to_string(),
            currency_marker: "USD".to_string(),
            money_market_marker: "AHORRO".to_string(),
        };
        let text = "TENENCIAS\nALPHA AHORRO USD 10 USD 25\n";
        let statement = StatementParser::new(&config).parse(text, "x.txt");
        assert_eq!(statement.positions[0].fund_type, FundType::MoneyMarket);
        assert_eq!(statement.positions[0].unit_value, dec!(2.5));
    }
}
