//! Validated workload settings.

use crate::error::ConfigError;

/// Immutable workload configuration, shared by every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSettings {
    /// Number of writer tasks
    pub write_threads: usize,
    /// Number of reader tasks
    pub read_threads: usize,
    /// Bind attempts per batched request
    pub batch_size: usize,
    /// Entity ids are drawn from `[0, pk_num)`
    pub pk_num: u32,
    /// A read is single-row when its draw is at or below this ratio
    pub request_ratio: f64,
    /// A read is ad-hoc when its draw is at or below this ratio
    pub procedure_ratio: f64,
    /// Provision the database before starting the pools
    pub need_create: bool,
    /// Main-table columns shared by every row of a batched request
    pub common_columns: Vec<String>,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            write_threads: 1,
            read_threads: 1,
            batch_size: 10,
            pk_num: 100_000,
            request_ratio: 0.5,
            procedure_ratio: 0.5,
            need_create: true,
            common_columns: Vec::new(),
        }
    }
}

impl WorkloadSettings {
    /// Check every invariant the workers rely on.
    pub fn validate(self) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("request_ratio", self.request_ratio),
            ("procedure_ratio", self.procedure_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Ratio { name, value });
            }
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size"));
        }
        if self.pk_num == 0 {
            return Err(ConfigError::Zero("pk_num"));
        }
        let max = i32::MAX as u32;
        if self.pk_num > max {
            return Err(ConfigError::PkNumTooLarge {
                value: self.pk_num,
                max,
            });
        }
        if self.write_threads == 0 && self.read_threads == 0 {
            return Err(ConfigError::Zero("write_threads + read_threads"));
        }
        Ok(self)
    }
}
