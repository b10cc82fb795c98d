//! Text extraction backends, tried in a configured order.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Pdf,
    Text,
}

pub trait TextExtractor {
    fn name(&self) -> &'static str;

    /// Whether this backend is worth trying for `path`.
    fn accepts(&self, path: &Path) -> bool;

    fn extract(&self, path: &Path) -> Result<String>;
}

pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| Error::Extraction {
            path: path.display().to_string(),
            reasons: e.to_string(),
        })
    }
}

/// Statements that were already converted to text.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn accepts(&self, path: &Path) -> bool {
        !has_extension(path, &["pdf"])
    }

    fn extract(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

pub struct ExtractorChain {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn TextExtractor>>) -> ExtractorChain {
        ExtractorChain { extractors }
    }

    pub fn from_kinds(kinds: &[ExtractorKind]) -> ExtractorChain {
        let extractors = kinds
            .iter()
            .map(|kind| -> Box<dyn TextExtractor> {
                match kind {
                    ExtractorKind::Pdf => Box::new(PdfTextExtractor),
                    ExtractorKind::Text => Box::new(PlainTextExtractor),
                }
            })
            .collect();
        ExtractorChain::new(extractors)
    }

    /// Text from the first backend that produces something other than whitespace.
    pub fn extract(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("statement not found: {}", path.display()),
            )));
        }

        let mut reasons = Vec::new();
        let mut tried = false;
        for extractor in self.extractors.iter().filter(|e| e.accepts(path)) {
            tried = true;
            match extractor.extract(path) {
                Ok(text) if !text.trim().is_empty() => {
                    info!("extracted {} with {}", path.display(), extractor.name());
                    return Ok(text);
                }
                Ok(_) => {
                    warn!("{} produced no text for {}", extractor.name(), path.display());
                    reasons.push(format!("{}: empty", extractor.name()));
                }
                Err(e) => {
                    warn!("{} failed on {}: {}", extractor.name(), path.display(), e);
                    reasons.push(format!("{}: {}", extractor.name(), e));
                }
            }
        }

        if !tried {
            return Err(Error::UnsupportedInput(path.display().to_string()));
        }
        Err(Error::Extraction {
            path: path.display().to_string(),
            reasons: reasons.join("; "),
        })
    }
}
