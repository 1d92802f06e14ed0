//! Parameter-table header aliases.
//!
//! Upstream tables name their columns inconsistently between pages. Each known
//! header maps onto one [`Parameter`] slot; any other header is a grammar fault.

use crate::element::Parameter;
use crate::errors::TokenizeError;

/// The [`Parameter`] slot a table column fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    Property,
    Type,
    Description,
    Example,
    Ignored,
}

impl Column {
    pub(crate) fn from_header(header: &str) -> Result<Self, TokenizeError> {
        match header.trim() {
            "" | "Property" | "Field" | "Parameter" => Ok(Column::Property),
            "Type" | "HTTP method" => Ok(Column::Type),
            "Description" | "Endpoint" => Ok(Column::Description),
            "Example value" | "Example values" => Ok(Column::Example),
            "Updatable" => Ok(Column::Ignored),
            other => Err(TokenizeError::UnknownHeader {
                header: other.to_string(),
            }),
        }
    }
}

/// Builds one parameter row. Missing cells read as empty text.
pub(crate) fn row_to_parameter<S: AsRef<str>>(columns: &[Column], cells: &[S]) -> Parameter {
    let mut parameter = Parameter::default();
    for (idx, column) in columns.iter().enumerate() {
        let cell = cells.get(idx).map(|c| c.as_ref().trim()).unwrap_or_default();
        let slot = match column {
            Column::Property => &mut parameter.property,
            Column::Type => &mut parameter.ty,
            Column::Description => &mut parameter.description,
            Column::Example => &mut parameter.example_value,
            Column::Ignored => continue,
        };
        *slot = cell.to_string();
    }
    parameter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_map_to_slots() {
        assert_eq!(Column::from_header("Field").unwrap(), Column::Property);
        assert_eq!(Column::from_header("").unwrap(), Column::Property);
        assert_eq!(Column::from_header("HTTP method").unwrap(), Column::Type);
        assert_eq!(Column::from_header(" Endpoint ").unwrap(), Column::Description);
        assert_eq!(Column::from_header("Example values").unwrap(), Column::Example);
        assert_eq!(Column::from_header("Updatable").unwrap(), Column::Ignored);
    }

    #[test]
    fn unknown_header_is_fatal() {
        let err = Column::from_header("Default").unwrap_err();
        assert!(matches!(err, TokenizeError::UnknownHeader { ref header } if header == "Default"));
    }

    #[test]
    fn header_matching_is_case_sensitive() {
        assert!(Column::from_header("property").is_err());
    }

    #[test]
    fn row_skips_ignored_columns_and_fills_missing_cells() {
        let columns = [Column::Property, Column::Ignored, Column::Type, Column::Example];
        let row = row_to_parameter(&columns, &["`archived`", "Yes", "`boolean`"]);
        assert_eq!(row, Parameter::new("`archived`", "`boolean`", "", ""));
    }
}
