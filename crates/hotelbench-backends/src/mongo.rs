//! MongoDB translator.
//!
//! Point lookups go through `find` with filter/sort/limit; grouped queries
//! run aggregation pipelines. Pipelines that group rename the `$group` key
//! out of `_id` with a trailing `$project`, so grouped results carry the same
//! field names on every backend.

use async_trait::async_trait;
use futures::TryStreamExt;
use hotelbench_core::{Error, QueryName, ResultRow, Translator};
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, Database};

use crate::normalize::document_to_row;
use crate::settings::MongoSettings;

const BACKEND: &str = "mongodb";

pub struct MongoTranslator {
    db: Database,
}

impl MongoTranslator {
    pub async fn connect(settings: &MongoSettings) -> Result<Self, Error> {
        tracing::debug!(uri = %settings.uri, database = %settings.database, "connecting");
        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(classify)?;
        Ok(Self {
            db: client.database(&settings.database),
        })
    }

    fn coll(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn find(
        &self,
        coll: &str,
        filter: Document,
        sort: Option<Document>,
        limit: i64,
    ) -> Result<Vec<ResultRow>, Error> {
        let coll = self.coll(coll);
        let mut find = coll.find(filter).limit(limit);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        let docs: Vec<Document> = find
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        Ok(docs.into_iter().map(document_to_row).collect())
    }

    async fn aggregate(&self, coll: &str, pipeline: Vec<Document>) -> Result<Vec<ResultRow>, Error> {
        let docs: Vec<Document> = self
            .coll(coll)
            .aggregate(pipeline)
            .await
            .map_err(classify)?
            .try_collect()
            .await
            .map_err(classify)?;
        Ok(docs.into_iter().map(document_to_row).collect())
    }
}

fn classify(e: mongodb::error::Error) -> Error {
    match &*e.kind {
        ErrorKind::Command(_)
        | ErrorKind::BsonDeserialization(_)
        | ErrorKind::BsonSerialization(_)
        | ErrorKind::InvalidArgument { .. } => Error::translation(BACKEND, e),
        _ => Error::unavailable(BACKEND, e),
    }
}

/// Pipeline for each aggregation-backed catalog query.
///
/// Check-in dates are stored as ISO-8601 strings in this fixture, so the
/// month bucket is a plain `$substr` and the 2024 range is a lexicographic
/// string comparison.
fn pipeline(query: QueryName) -> Option<Vec<Document>> {
    let stages = match query {
        QueryName::AvgPricePerRoomType => vec![
            doc! { "$group": { "_id": "$room_type", "avg_price": { "$avg": "$price" } } },
            doc! { "$project": { "_id": 0, "room_type": "$_id", "avg_price": 1 } },
        ],
        QueryName::MonthlyReservationCount => vec![
            doc! { "$match": { "check_in": { "$gte": "2024-01-01", "$lte": "2024-12-31" } } },
            doc! { "$project": { "month": { "$substr": ["$check_in", 0, 7] } } },
            doc! { "$group": { "_id": "$month", "count": { "$sum": 1 } } },
            doc! { "$sort": { "_id": 1 } },
            doc! { "$project": { "_id": 0, "month": "$_id", "count": 1 } },
        ],
        QueryName::TopGuestsTotalSpent => vec![
            doc! { "$match": { "status": "paid" } },
            doc! { "$lookup": {
                "from": "reservations",
                "localField": "reservation_id",
                "foreignField": "_id",
                "as": "reservation",
            } },
            doc! { "$unwind": "$reservation" },
            doc! { "$group": {
                "_id": "$reservation.guest_id",
                "total_spent": { "$sum": "$amount" },
            } },
            doc! { "$sort": { "total_spent": -1 } },
            doc! { "$limit": 5 },
            doc! { "$project": { "_id": 0, "guest_id": "$_id", "total_spent": 1 } },
        ],
        QueryName::TopHotelsByReviews => vec![
            doc! { "$group": { "_id": "$hotel_id", "review_count": { "$sum": 1 } } },
            doc! { "$sort": { "review_count": -1 } },
            doc! { "$limit": 5 },
            doc! { "$project": { "_id": 0, "hotel_id": "$_id", "review_count": 1 } },
        ],
        QueryName::EmployeesAboveDeptAvg => vec![
            doc! { "$group": { "_id": "$department_id", "avg_salary": { "$avg": "$salary" } } },
            doc! { "$lookup": {
                "from": "employees",
                "localField": "_id",
                "foreignField": "department_id",
                "as": "employees",
            } },
            doc! { "$unwind": "$employees" },
            doc! { "$match": { "$expr": { "$gt": ["$employees.salary", "$avg_salary"] } } },
            doc! { "$replaceRoot": { "newRoot": "$employees" } },
            doc! { "$limit": 10 },
        ],
        QueryName::RoomNeverReserved => vec![
            doc! { "$lookup": {
                "from": "reservations",
                "localField": "_id",
                "foreignField": "room_id",
                "as": "res",
            } },
            doc! { "$match": { "res": { "$size": 0 } } },
            doc! { "$limit": 10 },
            // Drop the join scaffold so the rows read like plain room docs.
            doc! { "$project": { "res": 0 } },
        ],
        _ => return None,
    };
    Some(stages)
}

#[async_trait]
impl Translator for MongoTranslator {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn execute(&self, query: QueryName) -> Result<Vec<ResultRow>, Error> {
        match query {
            QueryName::HotelsInCity => {
                self.find("hotels", doc! { "city": "Warsaw" }, None, 10).await
            }
            QueryName::AvailableRooms => {
                self.find("rooms", doc! { "status": "available" }, None, 10)
                    .await
            }
            QueryName::SuiteRoomsAbove300 => {
                self.find(
                    "room_details",
                    doc! { "room_type": "suite", "price": { "$gt": 300 } },
                    None,
                    10,
                )
                .await
            }
            QueryName::ConfirmedReservations => {
                self.find(
                    "reservations",
                    doc! {
                        "status": "confirmed",
                        "check_in": { "$gte": "2024-01-01", "$lte": "2024-12-31" },
                    },
                    None,
                    10,
                )
                .await
            }
            QueryName::Reviews5StarsRecent => {
                self.find(
                    "reviews",
                    doc! { "rating": 5 },
                    Some(doc! { "review_date": -1 }),
                    10,
                )
                .await
            }
            QueryName::HighSalaryEmployees => {
                self.find(
                    "employees",
                    doc! { "salary": { "$gt": 9000 } },
                    Some(doc! { "last_name": 1 }),
                    10,
                )
                .await
            }
            QueryName::ExpensiveReservations => {
                self.find(
                    "reservations",
                    doc! { "total_price": { "$gt": 2000 } },
                    Some(doc! { "total_price": -1 }),
                    10,
                )
                .await
            }
            QueryName::GmailGuests => {
                self.find(
                    "guests",
                    doc! { "email": { "$regex": "@gmail" } },
                    None,
                    10,
                )
                .await
            }
            QueryName::PaypalPaidPayments => {
                self.find(
                    "payments",
                    doc! { "method": "paypal", "status": "paid" },
                    None,
                    10,
                )
                .await
            }
            QueryName::AvgPricePerRoomType => {
                self.aggregate("room_details", pipeline(query).unwrap_or_default())
                    .await
            }
            QueryName::MonthlyReservationCount => {
                self.aggregate("reservations", pipeline(query).unwrap_or_default())
                    .await
            }
            QueryName::TopGuestsTotalSpent => {
                self.aggregate("payments", pipeline(query).unwrap_or_default())
                    .await
            }
            QueryName::TopHotelsByReviews => {
                self.aggregate("reviews", pipeline(query).unwrap_or_default())
                    .await
            }
            QueryName::EmployeesAboveDeptAvg => {
                self.aggregate("employees", pipeline(query).unwrap_or_default())
                    .await
            }
            QueryName::RoomNeverReserved => {
                self.aggregate("rooms", pipeline(query).unwrap_or_default())
                    .await
            }
        }
    }
}
