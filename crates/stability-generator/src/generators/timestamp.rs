//! Timestamp value generator.

use crate::generator::GenerateError;
use chrono::DateTime;
use stability_core::{GeneratedValue, SqlType};

/// Timestamp column built from epoch milliseconds.
///
/// For columns not marked as timestamp-bearing `millis` is the entity id,
/// which yields an instant just after the epoch.
pub fn from_epoch_millis(position: usize, millis: i64) -> Result<GeneratedValue, GenerateError> {
    DateTime::from_timestamp_millis(millis)
        .map(GeneratedValue::Timestamp)
        .ok_or(GenerateError::OutOfRange {
            position,
            sql_type: SqlType::Timestamp,
            value: millis,
        })
}
