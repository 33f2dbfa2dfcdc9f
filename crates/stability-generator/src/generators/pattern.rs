//! String value generator.

use stability_core::GeneratedValue;

/// `col{position}-{entity_id}`: unique per column, shared by every row of
/// the same entity.
pub fn column_string(position: usize, entity_id: i64) -> GeneratedValue {
    GeneratedValue::String(format!("col{position}-{entity_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_string() {
        assert_eq!(
            column_string(0, 7),
            GeneratedValue::String("col0-7".to_string())
        );
        assert_eq!(
            column_string(12, 0),
            GeneratedValue::String("col12-0".to_string())
        );
    }
}
