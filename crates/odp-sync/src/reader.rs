//! Staged-object record reader
//!
//! Turns a staged CSV body into records keyed by header name. Short rows are
//! tolerated; a missing or empty trailing value becomes an explicit JSON
//! null rather than an omitted key. A header without the identifier column
//! is fatal for the object.

use odp_common::types::{identifier_of, Record};
use odp_common::{OdpError, Result};
use serde_json::Value;
use tracing::warn;

/// Records read from one staged object.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    /// Rows carrying a usable identifier, in file order.
    pub records: Vec<Record>,
    /// Rows dropped for a missing or empty identifier value.
    pub missing_identifier: usize,
}

/// CSV reader bound to an identifier column.
///
/// Restartable by construction: reading the same bytes again yields the
/// same sequence.
#[derive(Debug, Clone)]
pub struct CsvRecordReader {
    identifier_column: String,
}

impl CsvRecordReader {
    pub fn new(identifier_column: impl Into<String>) -> Self {
        Self {
            identifier_column: identifier_column.into(),
        }
    }

    pub fn read(&self, bytes: &[u8]) -> Result<ReadOutcome> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| OdpError::Parse(e.to_string()))?
            .clone();

        if !headers.iter().any(|h| h == self.identifier_column) {
            return Err(OdpError::MissingIdentifierColumn {
                column: self.identifier_column.clone(),
            });
        }

        let mut outcome = ReadOutcome::default();

        for row in reader.records() {
            let row = row.map_err(|e| OdpError::Parse(e.to_string()))?;

            let mut record = Record::new();
            for (index, header) in headers.iter().enumerate() {
                let value = match row.get(index) {
                    Some(v) if !v.is_empty() => Value::String(v.to_string()),
                    _ => Value::Null,
                };
                record.insert(header.to_string(), value);
            }

            if identifier_of(&record, &self.identifier_column).is_some() {
                outcome.records.push(record);
            } else {
                outcome.missing_identifier += 1;
            }
        }

        if outcome.missing_identifier > 0 {
            warn!(
                column = %self.identifier_column,
                rows = outcome.missing_identifier,
                "Dropped rows without an identifier value"
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader() -> CsvRecordReader {
        CsvRecordReader::new("_id")
    }

    #[test]
    fn test_reads_records_in_order() {
        let outcome = reader().read(b"_id,v\na,1\nb,2\n").unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0]["_id"], json!("a"));
        assert_eq!(outcome.records[1]["v"], json!("2"));
        assert_eq!(outcome.missing_identifier, 0);
    }

    #[test]
    fn test_missing_identifier_column_is_fatal() {
        let err = reader().read(b"x,y\n1,2\n").unwrap_err();
        assert!(matches!(
            err,
            OdpError::MissingIdentifierColumn { ref column } if column == "_id"
        ));
    }

    #[test]
    fn test_short_rows_become_nulls() {
        let outcome = reader().read(b"_id,v,w\na,1\n").unwrap();
        assert_eq!(outcome.records[0]["v"], json!("1"));
        assert_eq!(outcome.records[0]["w"], json!(null));
    }

    #[test]
    fn test_empty_values_become_explicit_nulls() {
        let outcome = reader().read(b"_id,v\na,\n").unwrap();
        let record = &outcome.records[0];
        assert!(record.contains_key("v"));
        assert_eq!(record["v"], json!(null));
    }

    #[test]
    fn test_rows_without_identifier_value_are_dropped() {
        let outcome = reader().read(b"_id,v\n,1\nb,2\n").unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0]["_id"], json!("b"));
        assert_eq!(outcome.missing_identifier, 1);
    }

    #[test]
    fn test_rereading_yields_same_sequence() {
        let bytes = b"_id,v\na,1\nb,2\n";
        let first = reader().read(bytes).unwrap();
        let second = reader().read(bytes).unwrap();
        assert_eq!(first.records, second.records);
    }
}
