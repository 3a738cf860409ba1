use serde::{Deserialize, Serialize};

use crate::error::DedupError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Resolution policy. Every field has a default, so an empty TOML document
/// is the built-in policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DedupConfig {
    /// IDPP class prefix diverted before grouping.
    pub excluded_prefix: String,
    /// Also require the same normalized name, first name and birth date.
    pub strict_identity: bool,
    /// Resolve groups on the rayon pool.
    pub parallel: bool,
    pub una: UnaConfig,
    pub dates: DateConfig,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            excluded_prefix: "PN".into(),
            strict_identity: false,
            parallel: true,
            una: UnaConfig::default(),
            dates: DateConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// UNA extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaRule {
    /// All slash-delimited segments joined: `00116/00149/2024` -> `00116001492024`.
    #[default]
    Concatenate,
    /// A single segment, selected by `UnaConfig::segment` (0-based).
    Segment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnaConfig {
    pub rule: UnaRule,
    pub segment: usize,
}

impl std::fmt::Display for UnaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rule {
            UnaRule::Concatenate => write!(f, "concatenate"),
            UnaRule::Segment => write!(f, "segment[{}]", self.segment),
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// chrono format strings, tried in order. Formats with a time part keep the date.
pub const DEFAULT_DATE_FORMATS: [&str; 14] = [
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d-%m-%y",
    "%d.%m.%Y",
    "%d.%m.%y",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d%m%Y",
    "%d%m%y",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateConfig {
    pub formats: Vec<String>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl DedupConfig {
    pub fn from_toml(input: &str) -> Result<Self, DedupError> {
        let config: DedupConfig =
            toml::from_str(input).map_err(|e| DedupError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        if self.excluded_prefix.is_empty() {
            return Err(DedupError::ConfigValidation(
                "excluded_prefix must not be empty".into(),
            ));
        }
        if !self.excluded_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DedupError::ConfigValidation(format!(
                "excluded_prefix must be alphanumeric, got '{}'",
                self.excluded_prefix
            )));
        }

        if self.dates.formats.is_empty() {
            return Err(DedupError::ConfigValidation(
                "dates.formats must list at least one format".into(),
            ));
        }
        if let Some(i) = self.dates.formats.iter().position(|f| f.trim().is_empty()) {
            return Err(DedupError::ConfigValidation(format!(
                "dates.formats[{i}] is empty"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default_policy() {
        let config = DedupConfig::from_toml("").unwrap();
        assert_eq!(config.excluded_prefix, "PN");
        assert!(!config.strict_identity);
        assert!(config.parallel);
        assert_eq!(config.una.rule, UnaRule::Concatenate);
        assert_eq!(config.dates.formats.len(), DEFAULT_DATE_FORMATS.len());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
excluded_prefix = "XX"
strict_identity = true
parallel = false

[una]
rule = "segment"
segment = 1

[dates]
formats = ["%Y-%m-%d"]
"#;
        let config = DedupConfig::from_toml(input).unwrap();
        assert_eq!(config.excluded_prefix, "XX");
        assert!(config.strict_identity);
        assert!(!config.parallel);
        assert_eq!(config.una.rule, UnaRule::Segment);
        assert_eq!(config.una.segment, 1);
        assert_eq!(config.una.to_string(), "segment[1]");
        assert_eq!(config.dates.formats, vec!["%Y-%m-%d"]);
    }

    #[test]
    fn reject_unknown_key() {
        let err = DedupConfig::from_toml("exclude_prefix = \"PN\"").unwrap_err();
        assert!(matches!(err, DedupError::ConfigParse(_)));
    }

    #[test]
    fn reject_invalid_una_rule() {
        let err = DedupConfig::from_toml("[una]\nrule = \"middle\"").unwrap_err();
        assert!(matches!(err, DedupError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_prefix() {
        let err = DedupConfig::from_toml("excluded_prefix = \"\"").unwrap_err();
        assert!(err.to_string().contains("excluded_prefix"));
    }

    #[test]
    fn reject_no_date_formats() {
        let err = DedupConfig::from_toml("[dates]\nformats = []").unwrap_err();
        assert!(err.to_string().contains("dates.formats"));
    }

    #[test]
    fn reject_blank_date_format() {
        let err = DedupConfig::from_toml("[dates]\nformats = [\"%Y\", \" \"]").unwrap_err();
        assert!(err.to_string().contains("dates.formats[1]"));
    }
}
