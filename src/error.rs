use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("no extractor produced text for {path}: {reasons}")]
    Extraction { path: String, reasons: String },

    #[error("no extractor accepts {0}")]
    UnsupportedInput(String),
}
