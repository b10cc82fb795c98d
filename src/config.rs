use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::ExtractorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rounding applied when reports are written; the ledger itself never rounds.
    pub(crate) decimal_places: u32,
    pub(crate) output_dir: String,
    pub(crate) extractors: Vec<ExtractorKind>,
    pub(crate) parser: ParserConfig,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            decimal_places: 8,
            output_dir: "exports".to_string(),
            extractors: vec![ExtractorKind::Pdf, ExtractorKind::Text],
            parser: ParserConfig::default(),
        }
    }
}

impl Config {
    pub fn new(config_path: &str) -> Result<Config> {
        let file = std::fs::File::open(config_path)?;
        let config: Config = ::serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Like `new`, but a missing file means the defaults.
    pub fn load_or_default(config_path: &str) -> Result<Config> {
        if !Path::new(config_path).exists() {
            warn!("config file \"{}\" not found, using defaults", config_path);
            return Ok(Config::default());
        }
        Config::new(config_path)
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn set_output_dir(&mut self, output_dir: &str) {
        self.output_dir = output_dir.to_string();
    }

    pub fn extractors(&self) -> &[ExtractorKind] {
        &self.extractors
    }

    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }
}

/// Markers the statement parser looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub section_header: String,
    pub fund_family_marker: String,
    pub currency_marker: String,
    pub money_market_marker: String,
}

impl Default for ParserConfig {
    fn default() -> ParserConfig {
        ParserConfig {
            section_header: "FIMA-FONDOS COMUNES DE INVERSION".to_string(),
            fund_family_marker: "FIMA".to_string(),
            currency_marker: "$".to_string(),
            money_market_marker: "FIMA".to_string(),
        }
    }
}
