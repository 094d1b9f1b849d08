//! Cassandra translator.
//!
//! CQL has no joins, no grouping and only equality filtering without an
//! index, so most catalog queries scan broadly (`ALLOW FILTERING`) and finish
//! in a client-side [`Stage`] pipeline. The scan plus emulation cost is the
//! measurement: it is what an application on this store would actually pay
//! for these access patterns.
//!
//! The session is opened on first use so an unreachable cluster surfaces as
//! per-cell failures rather than aborting the whole run.

use async_trait::async_trait;
use hotelbench_core::pipeline::{in_year, key_set, lookup_map, month_bucket};
use hotelbench_core::{Direction, Error, QueryName, ResultRow, Stage, Translator, Value};
use scylla::frame::response::result::{CqlValue, Row};
use scylla::transport::errors::{DbError, QueryError};
use scylla::{Session, SessionBuilder};
use tokio::sync::OnceCell;

use crate::settings::CassandraSettings;

const BACKEND: &str = "cassandra";

pub struct CassandraTranslator {
    settings: CassandraSettings,
    session: OnceCell<Session>,
}

impl CassandraTranslator {
    pub fn new(settings: CassandraSettings) -> Self {
        Self {
            settings,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> Result<&Session, Error> {
        self.session
            .get_or_try_init(|| async {
                tracing::debug!(node = %self.settings.node, keyspace = %self.settings.keyspace, "opening session");
                SessionBuilder::new()
                    .known_node(&self.settings.node)
                    .user(&self.settings.username, &self.settings.password)
                    .use_keyspace(&self.settings.keyspace, false)
                    .build()
                    .await
                    .map_err(|e| Error::unavailable(BACKEND, e))
            })
            .await
    }

    async fn scan(&self, cql: &str) -> Result<Vec<ResultRow>, Error> {
        let session = self.session().await?;
        let result = session.query(cql, ()).await.map_err(classify)?;
        let names: Vec<String> = result
            .col_specs
            .iter()
            .map(|spec| spec.name.clone())
            .collect();
        Ok(result
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| normalize_row(&names, row))
            .collect())
    }
}

fn classify(e: QueryError) -> Error {
    match &e {
        QueryError::DbError(db, _) => match db {
            DbError::Overloaded
            | DbError::IsBootstrapping
            | DbError::Unavailable { .. }
            | DbError::ServerError => Error::unavailable(BACKEND, &e),
            _ => Error::translation(BACKEND, &e),
        },
        _ => Error::unavailable(BACKEND, &e),
    }
}

fn normalize_row(names: &[String], row: Row) -> ResultRow {
    names
        .iter()
        .zip(row.columns)
        .map(|(name, col)| {
            let value = col.map(cql_value).unwrap_or(Value::Null);
            (name.clone(), value)
        })
        .collect()
}

fn cql_value(v: CqlValue) -> Value {
    match v {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s),
        CqlValue::Boolean(b) => Value::Bool(b),
        CqlValue::TinyInt(v) => Value::Int(v as i64),
        CqlValue::SmallInt(v) => Value::Int(v as i64),
        CqlValue::Int(v) => Value::Int(v as i64),
        CqlValue::BigInt(v) => Value::Int(v),
        CqlValue::Counter(c) => Value::Int(c.0),
        CqlValue::Float(f) => Value::Float(f as f64),
        CqlValue::Double(f) => Value::Float(f),
        CqlValue::Decimal(d) => Value::Float(decimal_to_f64(&d)),
        CqlValue::Uuid(id) => Value::String(id.to_string()),
        // Milliseconds since the epoch on the wire.
        CqlValue::Timestamp(ts) => Value::Timestamp(ts.0 * 1_000),
        CqlValue::Date(date) => {
            // Wire value is days offset by 2^31 from the epoch.
            let days = date.0 as i64 - (1 << 31);
            Value::Timestamp(days * crate::normalize::MICROS_PER_DAY)
        }
        CqlValue::Inet(addr) => Value::String(addr.to_string()),
        CqlValue::Empty => Value::Null,
        other => Value::String(format!("{:?}", other)),
    }
}

/// Varint-with-scale decimal, decoded from its big-endian two's-complement
/// byte form. Prices in this schema are DECIMAL(10,2), far inside both i128
/// and f64 range.
fn decimal_to_f64(d: &scylla::frame::value::CqlDecimal) -> f64 {
    let (bytes, exponent) = d.as_signed_be_bytes_slice_and_exponent();
    let negative = bytes.first().map(|b| b & 0x80 != 0).unwrap_or(false);
    let mut int: i128 = if negative { -1 } else { 0 };
    for &b in bytes {
        int = (int << 8) | (b as i128 & 0xff);
    }
    int as f64 * 10f64.powi(-exponent)
}

fn numeric_above(row: &ResultRow, field: &str, threshold: f64) -> bool {
    row.get(field)
        .and_then(Value::as_numeric)
        .map(|v| v > threshold)
        .unwrap_or(false)
}

/// Bucket 2024 check-ins by month and count each bucket, month-ordered.
fn monthly_counts(reservations: Vec<ResultRow>) -> Vec<ResultRow> {
    let bucketed = reservations
        .into_iter()
        .filter_map(|row| {
            let check_in = row.get("check_in")?;
            if !in_year(check_in, 2024) {
                return None;
            }
            let month = month_bucket(check_in)?;
            let mut out = ResultRow::with_capacity(1);
            out.push("month", month);
            Some(out)
        })
        .collect();
    Stage::scan(bucketed)
        .group_count("month", "month", "count")
        .collect()
}

/// Join paid payments to their reservation's guest, sum per guest, top 5.
fn top_guests(reservations: &[ResultRow], paid_payments: Vec<ResultRow>) -> Vec<ResultRow> {
    let guests = lookup_map(reservations, "reservation_id", "guest_id");
    Stage::scan(paid_payments)
        .merge(&guests, "reservation_id", "guest_id")
        .group_sum("guest_id", "amount", "guest_id", "total_spent")
        .sort_by("total_spent", Direction::Desc)
        .limit(5)
        .collect()
}

/// Rooms whose id never appears in a reservation.
fn rooms_never_reserved(rooms: Vec<ResultRow>, reservations: &[ResultRow]) -> Vec<ResultRow> {
    let reserved = key_set(reservations, "room_id");
    Stage::scan(rooms)
        .anti_join(&reserved, "room_id")
        .limit(10)
        .collect()
}

#[async_trait]
impl Translator for CassandraTranslator {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn execute(&self, query: QueryName) -> Result<Vec<ResultRow>, Error> {
        Ok(match query {
            QueryName::HotelsInCity => {
                let rows = self
                    .scan("SELECT * FROM hotels WHERE city='Warsaw' ALLOW FILTERING")
                    .await?;
                Stage::scan(rows).limit(10).collect()
            }
            QueryName::AvailableRooms => {
                let rows = self
                    .scan("SELECT * FROM rooms WHERE status='available' ALLOW FILTERING")
                    .await?;
                Stage::scan(rows).limit(10).collect()
            }
            QueryName::SuiteRoomsAbove300 => {
                let rows = self
                    .scan("SELECT * FROM room_details WHERE room_type='suite' ALLOW FILTERING")
                    .await?;
                Stage::scan(rows)
                    .filter(|r| numeric_above(r, "price", 300.0))
                    .limit(10)
                    .collect()
            }
            QueryName::ConfirmedReservations => {
                let rows = self
                    .scan("SELECT * FROM reservations WHERE status='confirmed' ALLOW FILTERING")
                    .await?;
                Stage::scan(rows)
                    .filter(|r| r.get("check_in").map(|v| in_year(v, 2024)).unwrap_or(false))
                    .limit(10)
                    .collect()
            }
            QueryName::Reviews5StarsRecent => {
                let rows = self
                    .scan("SELECT * FROM reviews WHERE rating=5 ALLOW FILTERING")
                    .await?;
                Stage::scan(rows)
                    .sort_by("review_date", Direction::Desc)
                    .limit(10)
                    .collect()
            }
            QueryName::HighSalaryEmployees => {
                let rows = self.scan("SELECT * FROM employees ALLOW FILTERING").await?;
                Stage::scan(rows)
                    .filter(|r| numeric_above(r, "salary", 9000.0))
                    .sort_by("last_name", Direction::Asc)
                    .limit(10)
                    .collect()
            }
            QueryName::ExpensiveReservations => {
                let rows = self
                    .scan("SELECT * FROM reservations ALLOW FILTERING")
                    .await?;
                Stage::scan(rows)
                    .filter(|r| numeric_above(r, "total_price", 2000.0))
                    .sort_by("total_price", Direction::Desc)
                    .limit(10)
                    .collect()
            }
            QueryName::GmailGuests => {
                let rows = self.scan("SELECT * FROM guests ALLOW FILTERING").await?;
                Stage::scan(rows)
                    .filter(|r| {
                        r.get("email")
                            .and_then(Value::as_str)
                            .map(|e| e.contains("@gmail"))
                            .unwrap_or(false)
                    })
                    .limit(10)
                    .collect()
            }
            QueryName::PaypalPaidPayments => {
                let rows = self
                    .scan("SELECT * FROM payments WHERE method='paypal' AND status='paid' ALLOW FILTERING")
                    .await?;
                Stage::scan(rows).limit(10).collect()
            }
            QueryName::AvgPricePerRoomType => {
                let rows = self
                    .scan("SELECT * FROM room_details ALLOW FILTERING")
                    .await?;
                Stage::scan(rows)
                    .group_avg("room_type", "price", "room_type", "avg_price")
                    .collect()
            }
            QueryName::MonthlyReservationCount => {
                let rows = self
                    .scan("SELECT * FROM reservations ALLOW FILTERING")
                    .await?;
                monthly_counts(rows)
            }
            QueryName::TopGuestsTotalSpent => {
                let reservations = self
                    .scan("SELECT * FROM reservations ALLOW FILTERING")
                    .await?;
                let payments = self
                    .scan("SELECT * FROM payments WHERE status='paid' ALLOW FILTERING")
                    .await?;
                top_guests(&reservations, payments)
            }
            QueryName::TopHotelsByReviews => {
                let rows = self.scan("SELECT * FROM reviews ALLOW FILTERING").await?;
                Stage::scan(rows)
                    .group_count("hotel_id", "hotel_id", "review_count")
                    .sort_by("review_count", Direction::Desc)
                    .limit(5)
                    .collect()
            }
            QueryName::EmployeesAboveDeptAvg => {
                let rows = self.scan("SELECT * FROM employees ALLOW FILTERING").await?;
                Stage::scan(rows)
                    .retain_above_group_mean("department_id", "salary")
                    .limit(10)
                    .collect()
            }
            QueryName::RoomNeverReserved => {
                let reservations = self
                    .scan("SELECT room_id FROM reservations ALLOW FILTERING")
                    .await?;
                let rooms = self.scan("SELECT * FROM rooms ALLOW FILTERING").await?;
                rooms_never_reserved(rooms, &reservations)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scylla::frame::value::{CqlDate, CqlDecimal, CqlTimestamp};

    fn row(fields: &[(&str, Value)]) -> ResultRow {
        fields
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn decimal_decodes_from_varint_bytes() {
        // 12345 * 10^-2 = 123.45
        let d = CqlDecimal::from_signed_be_bytes_and_exponent(vec![0x30, 0x39], 2);
        assert!((decimal_to_f64(&d) - 123.45).abs() < 1e-9);

        // -1 * 10^0
        let d = CqlDecimal::from_signed_be_bytes_and_exponent(vec![0xff], 0);
        assert!((decimal_to_f64(&d) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn dates_and_timestamps_normalize_to_micros() {
        // Day after the epoch.
        let v = cql_value(CqlValue::Date(CqlDate((1 << 31) + 1)));
        assert_eq!(v, Value::Timestamp(86_400_000_000));

        let v = cql_value(CqlValue::Timestamp(CqlTimestamp(1_500)));
        assert_eq!(v, Value::Timestamp(1_500_000));
    }

    #[test]
    fn monthly_counts_buckets_only_2024() {
        let rows = vec![
            row(&[("check_in", Value::String("2024-03-10".into()))]),
            row(&[("check_in", Value::String("2024-03-22".into()))]),
            row(&[("check_in", Value::String("2024-07-01".into()))]),
            row(&[("check_in", Value::String("2023-03-15".into()))]),
        ];
        let counts = monthly_counts(rows);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].get("month"), Some(&Value::String("2024-03".into())));
        assert_eq!(counts[0].get("count"), Some(&Value::Int(2)));
        assert_eq!(counts[1].get("month"), Some(&Value::String("2024-07".into())));
    }

    #[test]
    fn top_guests_drops_orphan_payments() {
        let reservations = vec![
            row(&[("reservation_id", "r1".into()), ("guest_id", "g1".into())]),
            row(&[("reservation_id", "r2".into()), ("guest_id", "g2".into())]),
        ];
        let payments = vec![
            row(&[("reservation_id", "r1".into()), ("amount", 100.0.into())]),
            row(&[("reservation_id", "r1".into()), ("amount", 40.0.into())]),
            row(&[("reservation_id", "r2".into()), ("amount", 60.0.into())]),
            row(&[("reservation_id", "rX".into()), ("amount", 999.0.into())]),
        ];
        let top = top_guests(&reservations, payments);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].get("guest_id"), Some(&Value::String("g1".into())));
        assert_eq!(
            top[0].get("total_spent").and_then(Value::as_numeric),
            Some(140.0)
        );
    }

    #[test]
    fn never_reserved_keeps_unreferenced_rooms() {
        let reservations = vec![row(&[("room_id", "a".into())])];
        let rooms = vec![
            row(&[("room_id", "a".into()), ("status", "occupied".into())]),
            row(&[("room_id", "b".into()), ("status", "available".into())]),
        ];
        let free = rooms_never_reserved(rooms, &reservations);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].get("room_id"), Some(&Value::String("b".into())));
    }

    #[test]
    fn overload_classifies_as_unavailable() {
        let e = classify(QueryError::DbError(DbError::Overloaded, "overloaded".into()));
        assert!(matches!(e, Error::BackendUnavailable { .. }));

        let e = classify(QueryError::DbError(
            DbError::Invalid,
            "no viable alternative".into(),
        ));
        assert!(matches!(e, Error::Translation { .. }));
    }
}
