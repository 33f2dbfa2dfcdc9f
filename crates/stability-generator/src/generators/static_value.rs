//! Fixed-value generators.

use chrono::NaiveDate;
use stability_core::GeneratedValue;

pub const FLOAT_VALUE: f32 = 1.3;
pub const DOUBLE_VALUE: f64 = 1.4;
pub const BOOL_VALUE: bool = true;

/// Year, month and day of the fixed date value.
pub const DATE_VALUE: (i32, u32, u32) = (2020, 11, 27);

pub fn float() -> GeneratedValue {
    GeneratedValue::Float(FLOAT_VALUE)
}

pub fn double() -> GeneratedValue {
    GeneratedValue::Double(DOUBLE_VALUE)
}

pub fn boolean() -> GeneratedValue {
    GeneratedValue::Bool(BOOL_VALUE)
}

pub fn date() -> GeneratedValue {
    let (year, month, day) = DATE_VALUE;
    // 2020-11-27 is a valid calendar date
    GeneratedValue::Date(NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default())
}
