//! Shared coercions from driver-native values into [`Value`].
//!
//! Each driver decodes its own wire types; the helpers here cover the
//! representations more than one driver produces, so that a `DATE` column
//! lands in the same [`Value`] variant no matter which store it came from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hotelbench_core::{ResultRow, Value};
use mongodb::bson::{Bson, Document};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Microseconds in a day, for date-only columns normalized to midnight UTC.
pub(crate) const MICROS_PER_DAY: i64 = 86_400_000_000;

/// A calendar date, normalized to midnight UTC.
pub fn date_value(date: NaiveDate) -> Value {
    let days = date
        .signed_duration_since(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default())
        .num_days();
    Value::Timestamp(days * MICROS_PER_DAY)
}

/// A naive datetime, interpreted as UTC.
pub fn datetime_value(dt: NaiveDateTime) -> Value {
    Value::Timestamp(dt.and_utc().timestamp_micros())
}

/// A timezone-aware datetime.
pub fn utc_value(dt: DateTime<Utc>) -> Value {
    Value::Timestamp(dt.timestamp_micros())
}

/// A fixed-point decimal. Prices are well within `f64` range, so the lossy
/// conversion is acceptable at the report boundary.
pub fn decimal_value(d: Decimal) -> Value {
    match d.to_f64() {
        Some(f) => Value::Float(f),
        None => Value::String(d.to_string()),
    }
}

/// A UUID, carried as its hyphenated text form.
pub fn uuid_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

/// Convert a single BSON value.
pub fn bson_value(bson: Bson) -> Value {
    match bson {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(v) => Value::Int(v as i64),
        Bson::Int64(v) => Value::Int(v),
        Bson::Double(v) => Value::Float(v),
        Bson::String(s) => Value::String(s),
        Bson::DateTime(dt) => Value::Timestamp(dt.timestamp_millis() * 1_000),
        Bson::Decimal128(d) => match d.to_string().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::String(d.to_string()),
        },
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => Value::String(other.to_string()),
    }
}

/// Convert a whole BSON document, preserving field order.
pub fn document_to_row(doc: Document) -> ResultRow {
    doc.into_iter()
        .map(|(name, bson)| (name, bson_value(bson)))
        .collect()
}
