//! Integer value generators.

use crate::generator::GenerateError;
use stability_core::{GeneratedValue, SqlType};

/// 32-bit integer column; fails if `source` does not fit.
pub fn int(position: usize, source: i64) -> Result<GeneratedValue, GenerateError> {
    i32::try_from(source)
        .map(GeneratedValue::Int)
        .map_err(|_| GenerateError::OutOfRange {
            position,
            sql_type: SqlType::Int,
            value: source,
        })
}

/// 64-bit integer column.
pub fn bigint(source: i64) -> GeneratedValue {
    GeneratedValue::BigInt(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_in_range() {
        assert_eq!(int(0, 7).unwrap(), GeneratedValue::Int(7));
        assert_eq!(
            int(0, i32::MAX as i64).unwrap(),
            GeneratedValue::Int(i32::MAX)
        );
    }

    #[test]
    fn test_int_out_of_range() {
        let err = int(2, i64::from(i32::MAX) + 1).unwrap_err();
        assert_eq!(
            err,
            GenerateError::OutOfRange {
                position: 2,
                sql_type: SqlType::Int,
                value: i64::from(i32::MAX) + 1,
            }
        );
    }

    #[test]
    fn test_bigint() {
        assert_eq!(bigint(1_700_000_000_000), GeneratedValue::BigInt(1_700_000_000_000));
    }
}
