//! Parameter metadata reported by a prepared request.

use crate::schema::TableDescriptor;

/// One declared input parameter of a prepared request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterColumn {
    /// 0-based parameter position
    pub position: usize,

    /// Type name as declared by the engine (e.g. `string`, `int64`)
    pub type_name: String,
}

/// Ordered input parameters of a prepared request.
///
/// Type names stay as the engine reported them; mapping them onto
/// [`crate::SqlType`] happens at generation time, where an unknown name is a
/// per-parameter-set error rather than a startup failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMetadata {
    columns: Vec<ParameterColumn>,
}

impl ParameterMetadata {
    pub fn new(columns: Vec<ParameterColumn>) -> Self {
        Self { columns }
    }

    /// Build metadata from declared type names, numbering them in order.
    pub fn from_type_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(position, name)| ParameterColumn {
                    position,
                    type_name: name.into(),
                })
                .collect(),
        )
    }

    /// Metadata a request over `table` reports: one parameter per column.
    pub fn from_table(table: &TableDescriptor) -> Self {
        Self::from_type_names(table.columns().iter().map(|c| c.column_type.ddl_name()))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ParameterColumn] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlType;

    #[test]
    fn test_from_table() {
        let table = TableDescriptor::new(
            "t",
            vec![
                ("a".to_string(), SqlType::String),
                ("b".to_string(), SqlType::Timestamp),
            ],
            [],
            [1],
            "",
        )
        .unwrap();

        let metadata = ParameterMetadata::from_table(&table);
        assert_eq!(metadata.column_count(), 2);
        assert_eq!(metadata.columns()[1].position, 1);
        assert_eq!(metadata.columns()[1].type_name, "timestamp");
    }
}
