//! PostgreSQL translator.
//!
//! Every catalog query maps onto a single declarative statement; nothing is
//! emulated client-side. Rows are decoded column-by-column from the wire
//! type reported by the server, since the catalog returns heterogeneous
//! `SELECT *` shapes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hotelbench_core::{Error, QueryName, ResultRow, Translator, Value};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

use crate::normalize;
use crate::settings::PostgresSettings;

const BACKEND: &str = "postgresql";

/// Translator backed by a lazy sqlx connection pool. The first query opens
/// the connection, so an unreachable server fails per-cell instead of at
/// startup.
pub struct PostgresTranslator {
    pool: PgPool,
}

impl PostgresTranslator {
    pub fn connect(settings: &PostgresSettings) -> Result<Self, Error> {
        tracing::debug!("creating lazy pool");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy(&settings.url)
            .map_err(|e| Error::unavailable(BACKEND, e))?;
        Ok(Self { pool })
    }

    pub(crate) fn sql(query: QueryName) -> &'static str {
        match query {
            QueryName::HotelsInCity => "SELECT * FROM hotels WHERE city = 'Warsaw' LIMIT 10",
            QueryName::AvailableRooms => "SELECT * FROM rooms WHERE status = 'available' LIMIT 10",
            QueryName::SuiteRoomsAbove300 => {
                "SELECT * FROM room_details WHERE room_type = 'suite' AND price > 300 LIMIT 10"
            }
            QueryName::ConfirmedReservations => {
                "SELECT * FROM reservations \
                 WHERE status = 'confirmed' \
                 AND check_in BETWEEN '2024-01-01' AND '2024-12-31' \
                 LIMIT 10"
            }
            QueryName::Reviews5StarsRecent => {
                "SELECT * FROM reviews WHERE rating = 5 ORDER BY review_date DESC LIMIT 10"
            }
            QueryName::HighSalaryEmployees => {
                "SELECT * FROM employees WHERE salary > 9000 ORDER BY last_name LIMIT 10"
            }
            QueryName::ExpensiveReservations => {
                "SELECT * FROM reservations WHERE total_price > 2000 ORDER BY total_price DESC LIMIT 10"
            }
            QueryName::GmailGuests => "SELECT * FROM guests WHERE email LIKE '%@gmail%' LIMIT 10",
            QueryName::PaypalPaidPayments => {
                "SELECT * FROM payments WHERE method = 'paypal' AND status = 'paid' LIMIT 10"
            }
            QueryName::AvgPricePerRoomType => {
                "SELECT room_type, AVG(price) AS avg_price FROM room_details GROUP BY room_type"
            }
            QueryName::MonthlyReservationCount => {
                "SELECT TO_CHAR(check_in, 'YYYY-MM') AS month, COUNT(*) AS count \
                 FROM reservations \
                 WHERE check_in BETWEEN '2024-01-01' AND '2024-12-31' \
                 GROUP BY month \
                 ORDER BY month"
            }
            QueryName::TopGuestsTotalSpent => {
                "SELECT r.guest_id, SUM(p.amount) AS total_spent \
                 FROM payments p \
                 JOIN reservations r ON p.reservation_id = r.reservation_id \
                 WHERE p.status = 'paid' \
                 GROUP BY r.guest_id \
                 ORDER BY total_spent DESC \
                 LIMIT 5"
            }
            QueryName::TopHotelsByReviews => {
                "SELECT hotel_id, COUNT(*) AS review_count \
                 FROM reviews \
                 GROUP BY hotel_id \
                 ORDER BY review_count DESC \
                 LIMIT 5"
            }
            QueryName::EmployeesAboveDeptAvg => {
                "SELECT e.* \
                 FROM employees e \
                 JOIN ( \
                     SELECT department_id, AVG(salary) AS avg_salary \
                     FROM employees \
                     GROUP BY department_id \
                 ) d ON e.department_id = d.department_id \
                 WHERE e.salary > d.avg_salary \
                 LIMIT 10"
            }
            QueryName::RoomNeverReserved => {
                "SELECT rooms.* \
                 FROM rooms \
                 LEFT JOIN reservations ON rooms.room_id = reservations.room_id \
                 WHERE reservations.room_id IS NULL \
                 LIMIT 10"
            }
        }
    }

    fn normalize_row(row: &PgRow) -> ResultRow {
        let mut out = ResultRow::with_capacity(row.columns().len());
        for (idx, col) in row.columns().iter().enumerate() {
            let value = match col.type_info().name() {
                "BOOL" => row
                    .try_get::<Option<bool>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Bool),
                "INT2" => row
                    .try_get::<Option<i16>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| Value::Int(v as i64)),
                "INT4" => row
                    .try_get::<Option<i32>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| Value::Int(v as i64)),
                "INT8" => row
                    .try_get::<Option<i64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Int),
                "FLOAT4" => row
                    .try_get::<Option<f32>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| Value::Float(v as f64)),
                "FLOAT8" => row
                    .try_get::<Option<f64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Float),
                "NUMERIC" => row
                    .try_get::<Option<Decimal>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::decimal_value),
                "UUID" => row
                    .try_get::<Option<Uuid>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::uuid_value),
                "DATE" => row
                    .try_get::<Option<NaiveDate>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::date_value),
                "TIMESTAMP" => row
                    .try_get::<Option<NaiveDateTime>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::datetime_value),
                "TIMESTAMPTZ" => row
                    .try_get::<Option<DateTime<Utc>>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::utc_value),
                _ => row
                    .try_get::<Option<String>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::String),
            };
            out.push(col.name(), value.unwrap_or(Value::Null));
        }
        out
    }
}

/// Map an sqlx error onto the benchmark taxonomy. Server rejections and
/// decode failures are translation faults; everything else (connect, IO,
/// pool timeout) means the store is unreachable. Shared with the MySQL
/// translator, which runs on the same driver.
pub(crate) fn classify(backend: &str, e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnNotFound(_) => Error::translation(backend, e),
        _ => Error::unavailable(backend, e),
    }
}

#[async_trait]
impl Translator for PostgresTranslator {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn execute(&self, query: QueryName) -> Result<Vec<ResultRow>, Error> {
        let rows = sqlx::query(Self::sql(query))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(BACKEND, e))?;
        Ok(rows.iter().map(Self::normalize_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelbench_core::catalog::ALL_QUERIES;

    #[test]
    fn every_query_has_a_statement() {
        for query in ALL_QUERIES {
            let sql = PostgresTranslator::sql(query);
            assert!(sql.starts_with("SELECT"), "{query}: {sql}");
        }
    }

    #[test]
    fn grouped_statements_alias_their_aggregates() {
        assert!(PostgresTranslator::sql(QueryName::MonthlyReservationCount).contains("AS count"));
        assert!(PostgresTranslator::sql(QueryName::TopHotelsByReviews).contains("AS review_count"));
        assert!(PostgresTranslator::sql(QueryName::TopGuestsTotalSpent).contains("AS total_spent"));
        assert!(PostgresTranslator::sql(QueryName::AvgPricePerRoomType).contains("AS avg_price"));
    }

    #[test]
    fn top_n_statements_carry_their_limits() {
        assert!(PostgresTranslator::sql(QueryName::TopGuestsTotalSpent).ends_with("LIMIT 5"));
        assert!(PostgresTranslator::sql(QueryName::TopHotelsByReviews).ends_with("LIMIT 5"));
        assert!(PostgresTranslator::sql(QueryName::HotelsInCity).ends_with("LIMIT 10"));
    }

    #[test]
    fn connect_failures_classify_as_unavailable() {
        let e = classify(BACKEND, sqlx::Error::PoolTimedOut);
        assert!(matches!(e, Error::BackendUnavailable { .. }));

        let e = classify(BACKEND, sqlx::Error::ColumnNotFound("price".into()));
        assert!(matches!(e, Error::Translation { .. }));
    }
}
