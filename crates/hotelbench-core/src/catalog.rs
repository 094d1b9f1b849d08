//! The query catalog: 15 named logical queries and their semantic contracts.
//!
//! The catalog is the single source of truth for what each query *means*.
//! Every backend translator must realize these contracts identically, however
//! differently its query language expresses them.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// The overall shape of a logical query, used to reason about which
/// translation strategy a backend needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Predicate + optional sort + limit over one entity.
    Filter,
    /// Grouped aggregation over one entity.
    GroupAggregate,
    /// Aggregation that traverses a foreign-key relation.
    Join,
    /// Rows of one entity with no counterpart in another.
    AntiJoin,
}

/// An enumerated identifier for one of the 15 logical queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    HotelsInCity,
    AvailableRooms,
    SuiteRoomsAbove300,
    ConfirmedReservations,
    Reviews5StarsRecent,
    HighSalaryEmployees,
    ExpensiveReservations,
    GmailGuests,
    PaypalPaidPayments,
    AvgPricePerRoomType,
    MonthlyReservationCount,
    TopGuestsTotalSpent,
    TopHotelsByReviews,
    EmployeesAboveDeptAvg,
    RoomNeverReserved,
}

/// All query names in canonical catalog order.
pub const ALL_QUERIES: [QueryName; 15] = [
    QueryName::HotelsInCity,
    QueryName::AvailableRooms,
    QueryName::SuiteRoomsAbove300,
    QueryName::ConfirmedReservations,
    QueryName::Reviews5StarsRecent,
    QueryName::HighSalaryEmployees,
    QueryName::ExpensiveReservations,
    QueryName::GmailGuests,
    QueryName::PaypalPaidPayments,
    QueryName::AvgPricePerRoomType,
    QueryName::MonthlyReservationCount,
    QueryName::TopGuestsTotalSpent,
    QueryName::TopHotelsByReviews,
    QueryName::EmployeesAboveDeptAvg,
    QueryName::RoomNeverReserved,
];

impl QueryName {
    /// Canonical string form, the universal join key across components.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::HotelsInCity => "hotels_in_city",
            QueryName::AvailableRooms => "available_rooms",
            QueryName::SuiteRoomsAbove300 => "suite_rooms_above_300",
            QueryName::ConfirmedReservations => "confirmed_reservations",
            QueryName::Reviews5StarsRecent => "reviews_5stars_recent",
            QueryName::HighSalaryEmployees => "high_salary_employees",
            QueryName::ExpensiveReservations => "expensive_reservations",
            QueryName::GmailGuests => "gmail_guests",
            QueryName::PaypalPaidPayments => "paypal_paid_payments",
            QueryName::AvgPricePerRoomType => "avg_price_per_room_type",
            QueryName::MonthlyReservationCount => "monthly_reservation_count",
            QueryName::TopGuestsTotalSpent => "top_guests_total_spent",
            QueryName::TopHotelsByReviews => "top_hotels_by_reviews",
            QueryName::EmployeesAboveDeptAvg => "employees_above_dept_avg",
            QueryName::RoomNeverReserved => "room_never_reserved",
        }
    }

    /// Resolve a name string against the catalog.
    pub fn parse(name: &str) -> Result<Self, Error> {
        ALL_QUERIES
            .iter()
            .copied()
            .find(|q| q.as_str() == name)
            .ok_or_else(|| Error::UnknownQuery(name.to_string()))
    }

    /// The semantic contract for this query.
    pub fn spec(&self) -> QuerySpec {
        match self {
            QueryName::HotelsInCity => QuerySpec {
                entity: "hotels",
                summary: "hotels where city = 'Warsaw'",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::AvailableRooms => QuerySpec {
                entity: "rooms",
                summary: "rooms where status = 'available'",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::SuiteRoomsAbove300 => QuerySpec {
                entity: "room_details",
                summary: "room details where room_type = 'suite' and price > 300",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::ConfirmedReservations => QuerySpec {
                entity: "reservations",
                summary: "confirmed reservations with check_in in 2024",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::Reviews5StarsRecent => QuerySpec {
                entity: "reviews",
                summary: "5-star reviews, most recent first",
                shape: QueryShape::Filter,
                order: Some(("review_date", Direction::Desc)),
                limit: Some(10),
            },
            QueryName::HighSalaryEmployees => QuerySpec {
                entity: "employees",
                summary: "employees with salary > 9000, by last name",
                shape: QueryShape::Filter,
                order: Some(("last_name", Direction::Asc)),
                limit: Some(10),
            },
            QueryName::ExpensiveReservations => QuerySpec {
                entity: "reservations",
                summary: "reservations with total_price > 2000, priciest first",
                shape: QueryShape::Filter,
                order: Some(("total_price", Direction::Desc)),
                limit: Some(10),
            },
            QueryName::GmailGuests => QuerySpec {
                entity: "guests",
                summary: "guests whose email contains '@gmail'",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::PaypalPaidPayments => QuerySpec {
                entity: "payments",
                summary: "paid payments made via paypal",
                shape: QueryShape::Filter,
                order: None,
                limit: Some(10),
            },
            QueryName::AvgPricePerRoomType => QuerySpec {
                entity: "room_details",
                summary: "average price grouped by room_type",
                shape: QueryShape::GroupAggregate,
                order: None,
                limit: None,
            },
            QueryName::MonthlyReservationCount => QuerySpec {
                entity: "reservations",
                summary: "2024 reservation count grouped by YYYY-MM of check_in",
                shape: QueryShape::GroupAggregate,
                order: Some(("month", Direction::Asc)),
                limit: None,
            },
            QueryName::TopGuestsTotalSpent => QuerySpec {
                entity: "payments",
                summary: "sum of paid amounts per guest via payment -> reservation -> guest",
                shape: QueryShape::Join,
                order: Some(("total_spent", Direction::Desc)),
                limit: Some(5),
            },
            QueryName::TopHotelsByReviews => QuerySpec {
                entity: "reviews",
                summary: "review count grouped by hotel_id",
                shape: QueryShape::GroupAggregate,
                order: Some(("review_count", Direction::Desc)),
                limit: Some(5),
            },
            QueryName::EmployeesAboveDeptAvg => QuerySpec {
                entity: "employees",
                summary: "employees earning more than their department's average",
                shape: QueryShape::Join,
                order: None,
                limit: Some(10),
            },
            QueryName::RoomNeverReserved => QuerySpec {
                entity: "rooms",
                summary: "rooms never referenced by any reservation",
                shape: QueryShape::AntiJoin,
                order: None,
                limit: Some(10),
            },
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryName::parse(s)
    }
}

/// The backend-agnostic semantic contract for one named query.
///
/// Sort ties break in the natural order of the underlying store; that is an
/// accepted source of non-bit-exact divergence across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySpec {
    /// Root entity the query reads from.
    pub entity: &'static str,
    /// Human-readable statement of the predicate/aggregation.
    pub summary: &'static str,
    /// Overall query shape.
    pub shape: QueryShape,
    /// Mandated sort, as (output field, direction).
    pub order: Option<(&'static str, Direction)>,
    /// Result cardinality cap. `None` means all groups/rows.
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_fifteen_queries() {
        assert_eq!(ALL_QUERIES.len(), 15);
    }

    #[test]
    fn name_roundtrip() {
        for q in ALL_QUERIES {
            assert_eq!(QueryName::parse(q.as_str()).unwrap(), q);
            assert_eq!(q.to_string(), q.as_str());
        }
    }

    #[test]
    fn unknown_name_is_classified() {
        let err = QueryName::parse("not_a_real_query").unwrap_err();
        assert!(matches!(err, Error::UnknownQuery(ref n) if n == "not_a_real_query"));
    }

    #[test]
    fn specs_match_contracts() {
        let spec = QueryName::TopGuestsTotalSpent.spec();
        assert_eq!(spec.limit, Some(5));
        assert_eq!(spec.order, Some(("total_spent", Direction::Desc)));
        assert_eq!(spec.shape, QueryShape::Join);

        let spec = QueryName::AvgPricePerRoomType.spec();
        assert_eq!(spec.limit, None);
        assert_eq!(spec.shape, QueryShape::GroupAggregate);

        let spec = QueryName::RoomNeverReserved.spec();
        assert_eq!(spec.shape, QueryShape::AntiJoin);
        assert_eq!(spec.entity, "rooms");
    }
}
