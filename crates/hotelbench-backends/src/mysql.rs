//! MySQL translator.
//!
//! Same shape as the PostgreSQL translator; the dialect differences are the
//! month-bucketing function (`DATE_FORMAT` instead of `TO_CHAR`) and MySQL's
//! own type names on the wire.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use hotelbench_core::{Error, QueryName, ResultRow, Translator, Value};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo};

use crate::normalize;
use crate::postgres::classify;
use crate::settings::MySqlSettings;

const BACKEND: &str = "mysql";

pub struct MySqlTranslator {
    pool: MySqlPool,
}

impl MySqlTranslator {
    pub fn connect(settings: &MySqlSettings) -> Result<Self, Error> {
        tracing::debug!("creating lazy pool");
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect_lazy(&settings.url)
            .map_err(|e| Error::unavailable(BACKEND, e))?;
        Ok(Self { pool })
    }

    fn sql(query: QueryName) -> &'static str {
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
                "SELECT DATE_FORMAT(check_in, '%Y-%m') AS month, COUNT(*) AS count \
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

    fn normalize_row(row: &MySqlRow) -> ResultRow {
        let mut out = ResultRow::with_capacity(row.columns().len());
        for (idx, col) in row.columns().iter().enumerate() {
            let value = match col.type_info().name() {
                "BOOLEAN" => row
                    .try_get::<Option<bool>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Bool),
                "TINYINT" | "SMALLINT" | "INT" | "MEDIUMINT" | "BIGINT" => row
                    .try_get::<Option<i64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Int),
                "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "INT UNSIGNED"
                | "MEDIUMINT UNSIGNED" | "BIGINT UNSIGNED" => row
                    .try_get::<Option<u64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| Value::Int(v as i64)),
                "FLOAT" => row
                    .try_get::<Option<f32>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| Value::Float(v as f64)),
                "DOUBLE" => row
                    .try_get::<Option<f64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(Value::Float),
                "DECIMAL" => row
                    .try_get::<Option<Decimal>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::decimal_value),
                "DATE" => row
                    .try_get::<Option<NaiveDate>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::date_value),
                "DATETIME" | "TIMESTAMP" => row
                    .try_get::<Option<NaiveDateTime>, _>(idx)
                    .ok()
                    .flatten()
                    .map(normalize::datetime_value),
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

#[async_trait]
impl Translator for MySqlTranslator {
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
    fn dialect_diverges_only_on_month_bucketing() {
        for query in ALL_QUERIES {
            let mysql = MySqlTranslator::sql(query);
            let postgres = crate::postgres::PostgresTranslator::sql(query);
            if query == QueryName::MonthlyReservationCount {
                assert!(mysql.contains("DATE_FORMAT"));
                assert!(postgres.contains("TO_CHAR"));
            } else {
                assert_eq!(mysql, postgres, "{query}");
            }
        }
    }
}
