//! Per-type value generators.
//!
//! [`generate_value`] dispatches on the closed [`SqlType`] domain; adding a
//! type to the domain forces a generator to be written here.

pub mod numeric;
pub mod pattern;
pub mod static_value;
pub mod timestamp;

use crate::generator::{GenerateError, RowSeed};
use stability_core::{GeneratedValue, SqlType};

/// Generate the value of one column.
///
/// `timestamp_bearing` is the table's explicit marking for `position`; the
/// column type alone never implies it.
pub fn generate_value(
    sql_type: SqlType,
    position: usize,
    seed: &RowSeed,
    timestamp_bearing: bool,
) -> Result<GeneratedValue, GenerateError> {
    match sql_type {
        SqlType::String => Ok(pattern::column_string(position, seed.entity_id)),

        SqlType::Float => Ok(static_value::float()),

        SqlType::Double => Ok(static_value::double()),

        SqlType::Int => numeric::int(position, seed.numeric_source(timestamp_bearing)),

        SqlType::BigInt => Ok(numeric::bigint(seed.numeric_source(timestamp_bearing))),

        SqlType::Bool => Ok(static_value::boolean()),

        SqlType::Date => Ok(static_value::date()),

        // Unmarked timestamp columns read the entity id as epoch millis.
        SqlType::Timestamp => {
            timestamp::from_epoch_millis(position, seed.numeric_source(timestamp_bearing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marking_switches_source() {
        let seed = RowSeed::new(9, 1_600_000_000_000);

        assert_eq!(
            generate_value(SqlType::BigInt, 0, &seed, false).unwrap(),
            GeneratedValue::BigInt(9)
        );
        assert_eq!(
            generate_value(SqlType::BigInt, 0, &seed, true).unwrap(),
            GeneratedValue::BigInt(1_600_000_000_000)
        );
    }

    #[test]
    fn test_fixed_values_ignore_marking() {
        let seed = RowSeed::new(1, 2);
        for marked in [false, true] {
            assert_eq!(
                generate_value(SqlType::Float, 0, &seed, marked).unwrap(),
                GeneratedValue::Float(1.3)
            );
            assert_eq!(
                generate_value(SqlType::Double, 0, &seed, marked).unwrap(),
                GeneratedValue::Double(1.4)
            );
        }
    }

    #[test]
    fn test_marked_int_overflows() {
        let seed = RowSeed::new(1, 1_600_000_000_000);
        let err = generate_value(SqlType::Int, 4, &seed, true).unwrap_err();
        assert!(matches!(err, GenerateError::OutOfRange { position: 4, .. }));
    }
}
