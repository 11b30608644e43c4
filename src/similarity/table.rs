// Paired-text tables: the request payload of the similarity model.
//
// Two encodings are accepted:
//   - JSON: an array of rows, each either an array whose first two items are
//     strings or an object whose first two values (in document order) are
//     strings
//   - tab-separated text: one row per non-blank line, at least two fields
// A payload starting with `[` is read as JSON when it parses as JSON at all,
// and as tab-separated text otherwise. Only the first two columns are
// compared; extra columns are ignored.

use serde_json::Value;

use crate::error::{HandlerError, Result};

/// One row: the two documents to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPair {
    pub first: String,
    pub second: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextTable {
    pub rows: Vec<TextPair>,
}

impl TextTable {
    /// Parse a request payload. `index` is the request's position in the
    /// batch and is reported on failure.
    pub fn parse(payload: &str, index: usize) -> Result<Self> {
        if !payload.trim_start().starts_with('[') {
            return Self::parse_tsv(payload, index);
        }
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Self::from_json(value, index),
            // a TSV whose first cell starts with '['; report the JSON error
            // if the text does not read as TSV either
            Err(json_err) => Self::parse_tsv(payload, index).map_err(|_| {
                HandlerError::MalformedTable {
                    index,
                    reason: format!("invalid JSON: {json_err}"),
                }
            }),
        }
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            rows: pairs
                .into_iter()
                .map(|(a, b)| TextPair {
                    first: a.into(),
                    second: b.into(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn from_json(value: Value, index: usize) -> Result<Self> {
        let malformed = |reason: String| HandlerError::MalformedTable { index, reason };

        let Value::Array(rows) = value else {
            return Err(malformed("expected a JSON array of rows".to_string()));
        };

        let rows = rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let cells: Vec<&Value> = match row {
                    Value::Array(items) => items.iter().take(2).collect(),
                    Value::Object(map) => map.values().take(2).collect(),
                    _ => return Err(malformed(format!("row {r} is neither an array nor an object"))),
                };
                match cells.as_slice() {
                    [Value::String(a), Value::String(b)] => Ok(TextPair {
                        first: a.clone(),
                        second: b.clone(),
                    }),
                    [_, _] => Err(malformed(format!("row {r}: first two columns must be strings"))),
                    _ => Err(malformed(format!("row {r} has fewer than two columns"))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rows })
    }

    fn parse_tsv(payload: &str, index: usize) -> Result<Self> {
        let mut rows = Vec::new();
        for (line_no, line) in payload.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(a), Some(b)) => rows.push(TextPair {
                    first: a.to_string(),
                    second: b.to_string(),
                }),
                _ => {
                    return Err(HandlerError::MalformedTable {
                        index,
                        reason: format!("line {} has no tab-separated second column", line_no + 1),
                    })
                }
            }
        }
        Ok(Self { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_rows() {
        let table = TextTable::parse(r#"[["a cat", "a dog", "ignored"], ["x", "y"]]"#, 0).unwrap();
        assert_eq!(table, TextTable::from_pairs([("a cat", "a dog"), ("x", "y")]));
    }

    #[test]
    fn test_json_object_rows_keep_document_order() {
        let table = TextTable::parse(r#"[{"zeta": "first", "alpha": "second"}]"#, 0).unwrap();
        assert_eq!(table.rows[0].first, "first");
        assert_eq!(table.rows[0].second, "second");
    }

    #[test]
    fn test_tsv_rows() {
        let table = TextTable::parse("one\ttwo\n\nthree\tfour\textra\r\n", 0).unwrap();
        assert_eq!(table, TextTable::from_pairs([("one", "two"), ("three", "four")]));
    }

    #[test]
    fn test_empty_payload_is_empty_table() {
        assert!(TextTable::parse("", 0).unwrap().is_empty());
        assert!(TextTable::parse("[]", 0).unwrap().is_empty());
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = TextTable::parse(r#"[["only one"]]"#, 3).unwrap_err();
        assert!(matches!(err, HandlerError::MalformedTable { index: 3, .. }));

        let err = TextTable::parse("no tab here", 1).unwrap_err();
        assert!(matches!(err, HandlerError::MalformedTable { index: 1, .. }));
    }

    #[test]
    fn test_non_string_cells_are_malformed() {
        let err = TextTable::parse("[[1, 2]]", 0).unwrap_err();
        assert!(matches!(err, HandlerError::MalformedTable { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        match TextTable::parse("[[\"a\", ", 2).unwrap_err() {
            HandlerError::MalformedTable { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.starts_with("invalid JSON"), "{reason}");
            }
            other => panic!("expected MalformedTable, got {other:?}"),
        }
    }

    #[test]
    fn test_tsv_with_bracketed_first_cell() {
        let table = TextTable::parse("[draft] river bank\tflood water\nx\ty\n", 0).unwrap();
        assert_eq!(
            table,
            TextTable::from_pairs([("[draft] river bank", "flood water"), ("x", "y")])
        );
    }

    #[test]
    fn test_valid_json_of_the_wrong_shape_stays_an_error() {
        let err = TextTable::parse(r#"["a\tb"]"#, 0).unwrap_err();
        assert!(matches!(err, HandlerError::MalformedTable { .. }));
    }
}
