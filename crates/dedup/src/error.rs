use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty prefix, no date formats, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// The table has no data rows.
    #[error("input table is empty")]
    EmptyInput,
    /// A mandatory column is absent from the header row.
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },
    /// A mandatory value is blank.
    #[error("line {line}: empty value in column '{column}'")]
    EmptyField { line: u64, column: &'static str },
    /// The same signalisation number appears twice.
    #[error("line {line}: signalisation '{id}' already appears at line {first_line}")]
    DuplicateSignalisationId { id: String, first_line: u64, line: u64 },
    /// Malformed CSV (unbalanced quotes, ragged rows, ...).
    #[error("CSV error at line {line}: {message}")]
    Csv { line: u64, message: String },
}

impl DedupError {
    pub(crate) fn csv(err: &csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        Self::Csv { line, message: err.to_string() }
    }

    /// True for errors about the shape of the input table, as opposed to config errors.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::ConfigParse(_) | Self::ConfigValidation(_))
    }
}
