//! Result line formatting.

use crate::{OutputFormat, ValidationResult};

/// Formats validation results for output.
pub struct ResultsReport;

impl ResultsReport {
    /// `id validBbox validConfig validImage validColor`
    pub fn format_line(result: &ValidationResult) -> String {
        result.to_string()
    }

    /// One JSON object per line.
    pub fn format_json(result: &ValidationResult) -> serde_json::Result<String> {
        serde_json::to_string(result)
    }

    pub fn csv_header() -> &'static str {
        "id,valid_bbox,valid_config,valid_image,valid_color"
    }

    pub fn format_csv(result: &ValidationResult) -> String {
        format!(
            "{},{},{},{},{}",
            csv_field(&result.id),
            result.bbox,
            result.config,
            result.image,
            result.color
        )
    }

    pub fn format(result: &ValidationResult, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(Self::format_line(result)),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::Csv => Ok(Self::format_csv(result)),
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Check;

    fn result() -> ValidationResult {
        ValidationResult {
            id: "jkl".to_string(),
            bbox: Check::Valid,
            config: Check::Valid,
            image: Check::Valid,
            color: Check::Invalid,
        }
    }

    #[test]
    fn test_text_line() {
        assert_eq!(
            ResultsReport::format(&result(), OutputFormat::Text).unwrap(),
            "jkl 0 0 0 1"
        );
    }

    #[test]
    fn test_csv_row_matches_header() {
        let row = ResultsReport::format_csv(&result());
        assert_eq!(row, "jkl,0,0,0,1");
        assert_eq!(
            row.split(',').count(),
            ResultsReport::csv_header().split(',').count()
        );
    }

    #[test]
    fn test_csv_quotes_awkward_ids() {
        let mut r = result();
        r.id = "a,b".to_string();
        assert!(ResultsReport::format_csv(&r).starts_with("\"a,b\","));
    }

    #[test]
    fn test_json_line() {
        let json = ResultsReport::format(&result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], "jkl");
        assert_eq!(value["valid_color"], 1);
        assert_eq!(value["valid_bbox"], 0);
    }
}
