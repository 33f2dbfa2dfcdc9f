//! Statement construction for the write and read paths.
//!
//! The write path renders rows as textual `INSERT` statements. The read path
//! binds generated parameter sets positionally onto a prepared request.

use crate::error::IterationError;
use rand::Rng;
use stability_core::{GeneratedValue, TableDescriptor};
use stability_engine::RequestHandle;
use stability_generator::RowGenerator;
use tracing::warn;

/// Bind attempts made by [`fill_batch`] and how many reached the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub attempts: usize,
    pub added: usize,
}

impl BatchOutcome {
    pub fn skipped(&self) -> usize {
        self.attempts - self.added
    }
}

/// Render `INSERT INTO <table> VALUES (...)` without a column list.
pub fn insert_statement(table: &str, row: &[GeneratedValue]) -> String {
    let values = row
        .iter()
        .map(GeneratedValue::to_sql_literal)
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {table} VALUES ({values})")
}

/// Generate one parameter set for `table` and bind it onto `handle`.
///
/// Generation happens before any bind, so a generation failure leaves the
/// handle untouched.
pub fn fill_single<R: Rng + ?Sized>(
    handle: &mut dyn RequestHandle,
    table: &TableDescriptor,
    generator: &RowGenerator,
    rng: &mut R,
) -> Result<(), IterationError> {
    let params = generator.next_parameters(table, handle.parameter_metadata(), rng)?;
    for (position, value) in params {
        handle.bind(position, value)?;
    }
    Ok(())
}

/// Make exactly `batch_size` bind attempts on a batched `handle`.
///
/// Each attempt generates a parameter set, binds it and moves it into the
/// batch. A failed attempt is logged and skipped; the batch may end up
/// empty and is still executable.
pub fn fill_batch<R: Rng + ?Sized>(
    handle: &mut dyn RequestHandle,
    table: &TableDescriptor,
    generator: &RowGenerator,
    rng: &mut R,
    batch_size: usize,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        attempts: 0,
        added: 0,
    };
    for _ in 0..batch_size {
        outcome.attempts += 1;
        let unit = fill_single(handle, table, generator, rng)
            .and_then(|()| handle.add_to_batch().map_err(IterationError::from));
        match unit {
            Ok(()) => outcome.added += 1,
            Err(e) => warn!("Skipping batch row for {}: {}", table.name(), e),
        }
    }
    outcome
}
