//! Adapter for decoding session records
//!
//! Records arrive already captured; this module only decodes them from JSON
//! or NDJSON text and reports schema problems ahead of an averaging run.

use crate::error::ComputeError;
use crate::normalizer::PointNormalizer;
use crate::schema::fields::SessionSchema;
use crate::types::{AveragedRecord, CanonicalSequence, FieldValue, RawField, SessionRecord};

/// Adapter for decoding session record collections
pub struct SessionRecordAdapter;

impl SessionRecordAdapter {
    /// Parse a JSON string containing an array of session records
    pub fn parse_array(json: &str) -> Result<Vec<SessionRecord>, ComputeError> {
        serde_json::from_str(json).map_err(|e| {
            ComputeError::ParseError(format!("expected an array of session records: {}", e))
        })
    }

    /// Parse NDJSON (newline-delimited JSON), one session record per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SessionRecord>, ComputeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse a single session record object
    pub fn parse_record(json: &str) -> Result<SessionRecord, ComputeError> {
        serde_json::from_str(json).map_err(|e| {
            ComputeError::ParseError(format!("expected a session record object: {}", e))
        })
    }

    /// Parse either one record object or an array of records
    pub fn parse_document(json: &str) -> Result<Vec<SessionRecord>, ComputeError> {
        if json.trim_start().starts_with('[') {
            Self::parse_array(json)
        } else {
            Self::parse_record(json).map(|record| vec![record])
        }
    }

    /// Parse an averaged record, giving empty sequences the kind the schema
    /// declares for their field
    pub fn parse_averaged(json: &str, schema: &SessionSchema) -> Result<AveragedRecord, ComputeError> {
        let mut record: AveragedRecord = serde_json::from_str(json).map_err(|e| {
            ComputeError::ParseError(format!("expected an averaged record object: {}", e))
        })?;

        for (name, value) in record.fields.iter_mut() {
            if let FieldValue::Sequence(sequence) = value {
                if let (true, Some(kind)) = (sequence.is_empty(), schema.sequence_kind(name)) {
                    *sequence = CanonicalSequence::empty(kind);
                }
            }
        }
        Ok(record)
    }

    /// Check every schema field of every record, returning only the problems
    pub fn validate_records(records: &[SessionRecord], schema: &SessionSchema) -> Vec<RecordIssue> {
        let mut issues = Vec::new();

        for (index, record) in records.iter().enumerate() {
            for field in &schema.vector_fields {
                let problem = match record.get(&field.name) {
                    None => None,
                    Some(RawField::Sequence(sequence)) => {
                        PointNormalizer::normalize(sequence, field.kind).err()
                    }
                    Some(_) => Some(ComputeError::ShapeError(
                        "expected a sequence of samples".to_string(),
                    )),
                };
                if let Some(error) = problem {
                    issues.push(RecordIssue {
                        index,
                        field: field.name.clone(),
                        error: error.to_string(),
                    });
                }
            }

            for name in &schema.scalar_fields {
                match record.get(name) {
                    None | Some(RawField::Number(_)) => {}
                    Some(_) => issues.push(RecordIssue {
                        index,
                        field: name.clone(),
                        error: "expected a number".to_string(),
                    }),
                }
            }
        }

        issues
    }
}

/// A schema problem found in one field of one record
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecordIssue {
    pub index: usize,
    pub field: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let records = SessionRecordAdapter::parse_array(
            r#"[{"totalTime": 1.0}, {"mouseMovements": [[0, 0], [1, 1]]}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].contains("mouseMovements"));
    }

    #[test]
    fn test_parse_array_rejects_non_array() {
        let result = SessionRecordAdapter::parse_array(r#"{"totalTime": 1.0}"#);
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = "{\"hesitation\": 0.2}\n\n{\"hesitation\": 0.4}\n";
        let records = SessionRecordAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = "{\"hesitation\": 0.2}\nnot json\n";
        let err = SessionRecordAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_document_single_object() {
        let records = SessionRecordAdapter::parse_document(r#"  {"totalTime": 3}"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_averaged_keeps_empty_scalar_kind() {
        use crate::schema::{CURVATURES, MOUSE_MOVEMENTS};
        use crate::types::FieldKind;

        let mut record = AveragedRecord::new(2);
        record.fields.insert(
            CURVATURES.to_string(),
            FieldValue::Sequence(CanonicalSequence::empty(FieldKind::Scalars)),
        );
        record.fields.insert(
            MOUSE_MOVEMENTS.to_string(),
            FieldValue::Sequence(CanonicalSequence::empty(FieldKind::Points)),
        );
        let json = serde_json::to_string(&record).unwrap();

        let back =
            SessionRecordAdapter::parse_averaged(&json, &SessionSchema::kinematic()).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.sequence(CURVATURES).unwrap().kind(), FieldKind::Scalars);
    }

    #[test]
    fn test_validate_records_flags_bad_fields() {
        let records = SessionRecordAdapter::parse_array(
            r#"[
                {"mouseMovements": [[0, 0], [1, 1, 1]], "hesitation": 0.1},
                {"accelerations": 5, "totalTime": "long"},
                {"curvatures": [0.1, 0.2]}
            ]"#,
        )
        .unwrap();
        let issues = SessionRecordAdapter::validate_records(&records, &SessionSchema::kinematic());

        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].index, 0);
        assert_eq!(issues[0].field, "mouseMovements");
        assert!(issues.iter().any(|i| i.index == 1 && i.field == "accelerations"));
        assert!(issues.iter().any(|i| i.index == 1 && i.field == "totalTime"));
    }
}
