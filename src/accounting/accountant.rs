use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::accounting::{calculation, FundAnalysis, Operation, Position};
use crate::config::Config;
use crate::error::Result;
use crate::extract::{ExtractorChain, TextExtractor};
use crate::parser::StatementParser;

/// Everything learned from one statement.
#[derive(Debug, Serialize)]
pub struct StatementReport {
    pub source_reference: String,
    pub operations: Vec<Operation>,
    pub positions: Vec<Position>,
    pub analyses: BTreeMap<String, FundAnalysis>,
}

impl StatementReport {
    pub fn total_gain_loss(&self) -> rust_decimal::Decimal {
        self.analyses
            .values()
            .fold(rust_decimal::Decimal::ZERO, |sum, a| calculation::add(sum, a.total_gain_loss))
    }
}

pub struct Accountant {
    extractors: ExtractorChain,
    parser: StatementParser,
}

impl Accountant {
    pub fn new(config: &Config) -> Accountant {
        Accountant {
            extractors: ExtractorChain::from_kinds(config.extractors()),
            parser: StatementParser::new(config.parser()),
        }
    }

    pub fn extractors(mut self, extractors: Vec<Box<dyn TextExtractor>>) -> Accountant {
        self.extractors = ExtractorChain::new(extractors);
        self
    }

    pub fn analyze_file(&self, path: &Path) -> Result<StatementReport> {
        let text = self.extractors.extract(path)?;
        let source_reference = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.analyze_text(&text, &source_reference))
    }

    pub fn analyze_text(&self, text: &str, source_reference: &str) -> StatementReport {
        let statement = self.parser.parse(text, source_reference);
        let analyses = calculation::analyze(&statement.operations);

        StatementReport {
            source_reference: source_reference.to_string(),
            operations: statement.operations,
            positions: statement.positions,
            analyses,
        }
    }
}
