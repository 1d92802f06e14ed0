//! Directive blocks: `[block:<kind>]` … `[/block]` with a JSON body.

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use strum::EnumString;

use super::header::{Column, row_to_parameter};
use crate::element::{Block, Element};
use crate::errors::TokenizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum DirectiveKind {
    Parameters,
    Code,
    Callout,
    Image,
}

#[derive(Debug, Deserialize)]
struct ParametersDirective {
    #[serde(default)]
    data: HashMap<String, String>,
    cols: usize,
    rows: usize,
}

impl ParametersDirective {
    /// Rows and columns the `data` keys reach: `h-<col>` and `<row>-<col>`,
    /// never more than there are keys.
    fn extent(&self) -> (usize, usize) {
        let mut rows = 0;
        let mut cols = 0;
        for (row, col) in self.data.keys().filter_map(|key| key.split_once('-')) {
            if let Ok(col) = col.parse::<usize>() {
                cols = cols.max(col.saturating_add(1));
            }
            if let Ok(row) = row.parse::<usize>() {
                rows = rows.max(row.saturating_add(1));
            }
        }
        (rows.min(self.data.len()), cols.min(self.data.len()))
    }
}

#[derive(Debug, Deserialize)]
struct CodeDirective {
    #[serde(default)]
    codes: Vec<CodeVariant>,
}

#[derive(Debug, Deserialize)]
struct CodeVariant {
    code: String,
}

#[derive(Debug, Deserialize)]
struct CalloutDirective {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

/// Tokenizes one directive's JSON content into `out`.
pub(super) fn tokenize_directive(
    kind: &str,
    content: &str,
    line: usize,
    out: &mut VecDeque<Element>,
) -> Result<(), TokenizeError> {
    let directive =
        DirectiveKind::from_str(kind).map_err(|_| TokenizeError::UnsupportedDirective {
            kind: kind.to_string(),
            line,
        })?;

    match directive {
        DirectiveKind::Parameters => {
            let table: ParametersDirective = parse(kind, content, line)?;
            let (rows, cols) = table.extent();
            if table.rows > rows || table.cols > cols {
                return Err(TokenizeError::TableShape {
                    line,
                    rows: table.rows,
                    cols: table.cols,
                });
            }
            let columns = (0..table.cols)
                .map(|col| {
                    let header = table.data.get(&format!("h-{col}")).map(String::as_str);
                    Column::from_header(header.unwrap_or_default())
                })
                .collect::<Result<Vec<_>, _>>()?;

            for row in 0..table.rows {
                let cells: Vec<&str> = (0..table.cols)
                    .map(|col| {
                        table
                            .data
                            .get(&format!("{row}-{col}"))
                            .map(String::as_str)
                            .unwrap_or_default()
                    })
                    .collect();
                out.push_back(row_to_parameter(&columns, &cells).into());
            }
        }
        DirectiveKind::Code => {
            let code: CodeDirective = parse(kind, content, line)?;
            out.extend(
                code.codes
                    .into_iter()
                    .map(|variant| Block::code(variant.code).into()),
            );
        }
        DirectiveKind::Callout => {
            let callout: CalloutDirective = parse(kind, content, line)?;
            let text = [callout.title.trim(), callout.body.trim()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            out.push_back(Block::blockquote(text).into());
        }
        DirectiveKind::Image => {}
    }

    Ok(())
}

fn parse<T: DeserializeOwned>(kind: &str, content: &str, line: usize) -> Result<T, TokenizeError> {
    serde_json::from_str(content).map_err(|source| TokenizeError::MalformedDirective {
        kind: kind.to_string(),
        line,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Parameter;

    fn run(kind: &str, content: &str) -> Result<Vec<Element>, TokenizeError> {
        let mut out = VecDeque::new();
        tokenize_directive(kind, content, 1, &mut out)?;
        Ok(out.into_iter().collect())
    }

    #[test]
    fn parameters_use_header_aliases() {
        let content = r#"{"data": {"h-0": "Field", "h-1": "Type", "h-2": "Description", "h-3": "Example value",
            "0-0": "`object`", "0-1": "`string`", "0-2": "Always `\"user\"`", "0-3": "`\"user\"`"},
            "cols": 4, "rows": 1}"#;
        assert_eq!(
            run("parameters", content).unwrap(),
            vec![Element::from(Parameter::new(
                "`object`",
                "`string`",
                "Always `\"user\"`",
                "`\"user\"`"
            ))]
        );
    }

    #[test]
    fn parameters_with_unknown_header_fail() {
        let content = r#"{"data": {"h-0": "Name", "0-0": "x"}, "cols": 1, "rows": 1}"#;
        assert!(matches!(
            run("parameters", content),
            Err(TokenizeError::UnknownHeader { .. })
        ));
    }

    #[test]
    fn parameters_beyond_their_data_are_rejected() {
        let content = r#"{"data": {"h-0": "Property", "0-0": "id"}, "cols": 1, "rows": 1000000000000}"#;
        assert!(matches!(
            run("parameters", content),
            Err(TokenizeError::TableShape { rows: 1_000_000_000_000, cols: 1, .. })
        ));

        let content = r#"{"data": {"h-0": "Property", "0-0": "id"}, "cols": 4096, "rows": 1}"#;
        assert!(matches!(
            run("parameters", content),
            Err(TokenizeError::TableShape { cols: 4096, .. })
        ));
    }

    #[test]
    fn far_away_cell_does_not_widen_the_table() {
        let content = r#"{"data": {"h-0": "Property", "0-0": "id", "0-999999999": "x"}, "cols": 1000000000, "rows": 1}"#;
        assert!(matches!(
            run("parameters", content),
            Err(TokenizeError::TableShape { cols: 1_000_000_000, .. })
        ));
    }

    #[test]
    fn sparse_cells_within_the_extent_are_empty() {
        let content = r#"{"data": {"h-0": "Property", "h-1": "Type", "0-0": "id", "1-0": "name", "1-1": "string"}, "cols": 2, "rows": 2}"#;
        assert_eq!(
            run("parameters", content).unwrap(),
            vec![
                Element::from(Parameter::new("id", "", "", "")),
                Element::from(Parameter::new("name", "string", "", "")),
            ]
        );
    }

    #[test]
    fn code_yields_one_block_per_variant() {
        let content = r#"{"codes": [
            {"code": "curl https://api.notion.com/v1/users", "language": "curl"},
            {"code": "const users = await notion.users.list()", "language": "javascript", "name": "JS"}
        ]}"#;
        assert_eq!(
            run("code", content).unwrap(),
            vec![
                Element::from(Block::code("curl https://api.notion.com/v1/users")),
                Element::from(Block::code("const users = await notion.users.list()")),
            ]
        );
    }

    #[test]
    fn callout_without_title_keeps_body_only() {
        let content = r#"{"type": "warning", "body": "Limited to 100 items."}"#;
        assert_eq!(
            run("callout", content).unwrap(),
            vec![Element::from(Block::blockquote("Limited to 100 items."))]
        );
    }

    #[test]
    fn image_is_dropped_without_parsing() {
        assert!(run("image", "not even json").unwrap().is_empty());
    }

    #[test]
    fn malformed_json_names_the_directive() {
        let err = run("code", "{\"codes\": [").unwrap_err();
        assert!(
            matches!(err, TokenizeError::MalformedDirective { ref kind, line: 1, .. } if kind == "code")
        );
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        assert!(matches!(
            run("embed", "{}"),
            Err(TokenizeError::UnsupportedDirective { .. })
        ));
    }
}
