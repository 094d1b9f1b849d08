//! Staged client-side query emulation.
//!
//! Backends whose query language cannot filter, sort, group or join
//! server-side (the wide-column store in particular) fetch a broad row set
//! and run the rest of the query here, as an explicit sequence of stages:
//! scan, filter, index-by-key, merge, group, sort, limit. Join emulation
//! matches relational semantics exactly: `merge` is an inner join (rows
//! without a match are dropped) and `anti_join` keeps only rows whose key has
//! zero matches.
//!
//! Grouped stages fold in f64 and emit groups in key order; a group with no
//! numeric values produces no output row rather than dividing by zero.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::Direction;
use crate::row::ResultRow;
use crate::value::{GroupKey, Value};

/// One stage boundary of the client-side pipeline.
///
/// Each method consumes the stage and returns the next one, so a translation
/// reads as the sequence of relational operations it emulates.
#[derive(Debug)]
pub struct Stage {
    rows: Vec<ResultRow>,
}

impl Stage {
    /// Start a pipeline from a scanned row set.
    pub fn scan(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// Keep rows matching the predicate.
    pub fn filter(mut self, pred: impl Fn(&ResultRow) -> bool) -> Self {
        self.rows.retain(|r| pred(r));
        self
    }

    /// Stable sort by one field. Missing fields sort as null (first).
    pub fn sort_by(mut self, field: &str, direction: Direction) -> Self {
        self.rows.sort_by(|a, b| {
            let av = a.get(field).unwrap_or(&Value::Null);
            let bv = b.get(field).unwrap_or(&Value::Null);
            match direction {
                Direction::Asc => av.compare(bv),
                Direction::Desc => bv.compare(av),
            }
        });
        self
    }

    /// Truncate to the first `n` rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Inner-join merge: attach `map[row[key_field]]` as `out_field`,
    /// dropping rows whose key is absent from the map or not a valid key.
    pub fn merge(
        mut self,
        map: &HashMap<GroupKey, Value>,
        key_field: &str,
        out_field: &str,
    ) -> Self {
        self.rows = self
            .rows
            .into_iter()
            .filter_map(|row| {
                let key = row.get(key_field)?.group_key()?;
                let pulled = map.get(&key)?.clone();
                let mut merged = row;
                merged.push(out_field, pulled);
                Some(merged)
            })
            .collect();
        self
    }

    /// Anti-join: keep rows whose `key_field` never appears in `keys`.
    /// Rows without a usable key cannot match anything and are kept.
    pub fn anti_join(mut self, keys: &HashSet<GroupKey>, key_field: &str) -> Self {
        self.rows.retain(|row| {
            match row.get(key_field).and_then(Value::group_key) {
                Some(key) => !keys.contains(&key),
                None => true,
            }
        });
        self
    }

    /// Group by `key_field` and average `value_field`, emitting
    /// `{key_out, avg_out}` rows in key order. Non-numeric and null values
    /// do not contribute; keys whose group has no numeric values are omitted.
    pub fn group_avg(self, key_field: &str, value_field: &str, key_out: &str, avg_out: &str) -> Self {
        let mut groups: BTreeMap<GroupKey, (f64, u64)> = BTreeMap::new();
        for row in &self.rows {
            let Some(key) = row.get(key_field).and_then(Value::group_key) else {
                continue;
            };
            if let Some(v) = row.get(value_field).and_then(Value::as_numeric) {
                let entry = groups.entry(key).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }
        let rows = groups
            .into_iter()
            .filter(|(_, (_, count))| *count > 0)
            .map(|(key, (sum, count))| {
                let mut row = ResultRow::with_capacity(2);
                row.push(key_out, key_to_value(key));
                row.push(avg_out, sum / count as f64);
                row
            })
            .collect();
        Stage { rows }
    }

    /// Group by `key_field` and sum `value_field`, emitting
    /// `{key_out, sum_out}` rows in key order.
    pub fn group_sum(self, key_field: &str, value_field: &str, key_out: &str, sum_out: &str) -> Self {
        let mut groups: BTreeMap<GroupKey, f64> = BTreeMap::new();
        for row in &self.rows {
            let Some(key) = row.get(key_field).and_then(Value::group_key) else {
                continue;
            };
            if let Some(v) = row.get(value_field).and_then(Value::as_numeric) {
                *groups.entry(key).or_insert(0.0) += v;
            }
        }
        let rows = groups
            .into_iter()
            .map(|(key, sum)| {
                let mut row = ResultRow::with_capacity(2);
                row.push(key_out, key_to_value(key));
                row.push(sum_out, sum);
                row
            })
            .collect();
        Stage { rows }
    }

    /// Group by `key_field` and count rows, emitting `{key_out, count_out}`
    /// rows in key order.
    pub fn group_count(self, key_field: &str, key_out: &str, count_out: &str) -> Self {
        let mut groups: BTreeMap<GroupKey, i64> = BTreeMap::new();
        for row in &self.rows {
            if let Some(key) = row.get(key_field).and_then(Value::group_key) {
                *groups.entry(key).or_insert(0) += 1;
            }
        }
        let rows = groups
            .into_iter()
            .map(|(key, count)| {
                let mut row = ResultRow::with_capacity(2);
                row.push(key_out, key_to_value(key));
                row.push(count_out, count);
                row
            })
            .collect();
        Stage { rows }
    }

    /// Correlated comparison: keep rows whose `value_field` exceeds the mean
    /// of `value_field` over all rows sharing the same `key_field`. Emulates
    /// the derived-table join the relational backends use for the
    /// above-department-average query.
    pub fn retain_above_group_mean(mut self, key_field: &str, value_field: &str) -> Self {
        let mut sums: HashMap<GroupKey, (f64, u64)> = HashMap::new();
        for row in &self.rows {
            let Some(key) = row.get(key_field).and_then(Value::group_key) else {
                continue;
            };
            if let Some(v) = row.get(value_field).and_then(Value::as_numeric) {
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }
        self.rows.retain(|row| {
            let key = match row.get(key_field).and_then(Value::group_key) {
                Some(k) => k,
                None => return false,
            };
            let value = match row.get(value_field).and_then(Value::as_numeric) {
                Some(v) => v,
                None => return false,
            };
            match sums.get(&key) {
                Some((sum, count)) if *count > 0 => value > sum / *count as f64,
                _ => false,
            }
        });
        self
    }

    /// Finish the pipeline.
    pub fn collect(self) -> Vec<ResultRow> {
        self.rows
    }

    /// Number of rows currently in the stage.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the stage is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn key_to_value(key: GroupKey) -> Value {
    match key {
        GroupKey::Bool(b) => Value::Bool(b),
        GroupKey::Int(i) => Value::Int(i),
        GroupKey::Text(s) => Value::String(s),
    }
}

/// Index rows by `key_field`, pulling `value_field`. This is the lookup side
/// of a staged join. Later duplicates of the same key win.
pub fn lookup_map(rows: &[ResultRow], key_field: &str, value_field: &str) -> HashMap<GroupKey, Value> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let Some(key) = row.get(key_field).and_then(Value::group_key) else {
            continue;
        };
        let value = row.get(value_field).cloned().unwrap_or(Value::Null);
        map.insert(key, value);
    }
    map
}

/// Collect the distinct keys of `key_field`, the probe side of an anti-join.
pub fn key_set(rows: &[ResultRow], key_field: &str) -> HashSet<GroupKey> {
    rows.iter()
        .filter_map(|row| row.get(key_field).and_then(Value::group_key))
        .collect()
}

/// Bucket a check-in value into its `YYYY-MM` month. Handles both native
/// timestamps and ISO-8601 date strings, the two encodings the fixture
/// stores use.
pub fn month_bucket(value: &Value) -> Option<String> {
    match value {
        Value::Timestamp(us) => {
            let dt = chrono::DateTime::from_timestamp_micros(*us)?;
            Some(dt.format("%Y-%m").to_string())
        }
        Value::String(s) => s.get(..7).map(str::to_string),
        _ => None,
    }
}

/// Whether a check-in value falls within the given calendar year.
pub fn in_year(value: &Value, year: i32) -> bool {
    match value {
        Value::Timestamp(us) => chrono::DateTime::from_timestamp_micros(*us)
            .map(|dt| {
                use chrono::Datelike;
                dt.year() == year
            })
            .unwrap_or(false),
        Value::String(s) => s.starts_with(&format!("{:04}-", year)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> ResultRow {
        fields
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }

    fn room_details() -> Vec<ResultRow> {
        vec![
            row(&[("room_type", "suite".into()), ("price", 400.0.into())]),
            row(&[("room_type", "suite".into()), ("price", 200.0.into())]),
            row(&[("room_type", "single".into()), ("price", 100.0.into())]),
            row(&[("room_type", "double".into()), ("price", Value::Null)]),
        ]
    }

    #[test]
    fn filter_sort_limit() {
        let rows = Stage::scan(room_details())
            .filter(|r| r.get("price").and_then(Value::as_numeric).unwrap_or(0.0) > 150.0)
            .sort_by("price", Direction::Desc)
            .limit(1)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("price"), Some(&Value::Float(400.0)));
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let rows = Stage::scan(vec![
            row(&[("name", "first".into()), ("rank", Value::Int(1))]),
            row(&[("name", "second".into()), ("rank", Value::Int(1))]),
        ])
        .sort_by("rank", Direction::Asc)
        .collect();
        assert_eq!(rows[0].get("name"), Some(&Value::String("first".into())));
    }

    #[test]
    fn group_avg_skips_groups_without_numeric_values() {
        let rows = Stage::scan(room_details())
            .group_avg("room_type", "price", "room_type", "avg_price")
            .collect();
        // "double" has only a null price, so it yields no group.
        assert_eq!(rows.len(), 2);
        let suite = rows
            .iter()
            .find(|r| r.get("room_type") == Some(&Value::String("suite".into())))
            .unwrap();
        let avg = suite.get("avg_price").unwrap().as_numeric().unwrap();
        assert!((avg - 300.0).abs() < 1e-6);
    }

    #[test]
    fn group_count_and_sum() {
        let payments = vec![
            row(&[("guest_id", "g1".into()), ("amount", 100.0.into())]),
            row(&[("guest_id", "g1".into()), ("amount", 50.0.into())]),
            row(&[("guest_id", "g2".into()), ("amount", 10.0.into())]),
        ];
        let sums = Stage::scan(payments.clone())
            .group_sum("guest_id", "amount", "guest_id", "total_spent")
            .collect();
        assert_eq!(sums.len(), 2);
        assert_eq!(
            sums[0].get("total_spent").and_then(Value::as_numeric),
            Some(150.0)
        );

        let counts = Stage::scan(payments)
            .group_count("guest_id", "guest_id", "count")
            .collect();
        assert_eq!(counts[0].get("count"), Some(&Value::Int(2)));
        assert_eq!(counts[1].get("count"), Some(&Value::Int(1)));
    }

    #[test]
    fn merge_is_an_inner_join() {
        let reservations = vec![
            row(&[("reservation_id", "r1".into()), ("guest_id", "g1".into())]),
            row(&[("reservation_id", "r2".into()), ("guest_id", "g2".into())]),
        ];
        let map = lookup_map(&reservations, "reservation_id", "guest_id");

        let payments = vec![
            row(&[("reservation_id", "r1".into()), ("amount", 10.0.into())]),
            row(&[("reservation_id", "rX".into()), ("amount", 99.0.into())]),
        ];
        let rows = Stage::scan(payments)
            .merge(&map, "reservation_id", "guest_id")
            .collect();
        // The payment referencing an unknown reservation is dropped.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("guest_id"), Some(&Value::String("g1".into())));
    }

    #[test]
    fn anti_join_keeps_only_unmatched_rows() {
        let reservations = vec![
            row(&[("room_id", "room-1".into())]),
            row(&[("room_id", "room-2".into())]),
        ];
        let reserved = key_set(&reservations, "room_id");

        let rooms = vec![
            row(&[("room_id", "room-1".into())]),
            row(&[("room_id", "room-3".into())]),
        ];
        let rows = Stage::scan(rooms).anti_join(&reserved, "room_id").collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("room_id"), Some(&Value::String("room-3".into())));
    }

    #[test]
    fn above_group_mean_matches_hand_computation() {
        let employees = vec![
            row(&[("last_name", "a".into()), ("department_id", "d1".into()), ("salary", 100.0.into())]),
            row(&[("last_name", "b".into()), ("department_id", "d1".into()), ("salary", 200.0.into())]),
            row(&[("last_name", "c".into()), ("department_id", "d2".into()), ("salary", 50.0.into())]),
        ];
        // d1 mean = 150, d2 mean = 50 (sole member is never strictly above).
        let rows = Stage::scan(employees)
            .retain_above_group_mean("department_id", "salary")
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("last_name"), Some(&Value::String("b".into())));
    }

    #[test]
    fn month_bucketing_handles_both_encodings() {
        // 2024-03-15 00:00:00 UTC
        let ts = Value::Timestamp(1_710_460_800_000_000);
        assert_eq!(month_bucket(&ts), Some("2024-03".to_string()));
        assert_eq!(
            month_bucket(&Value::String("2024-03-15".into())),
            Some("2024-03".to_string())
        );
        assert_eq!(month_bucket(&Value::Null), None);
        assert_eq!(month_bucket(&Value::String("2024".into())), None);
        // A malformed value whose seventh byte splits a multibyte character
        // must yield None, not panic.
        assert_eq!(month_bucket(&Value::String("ąąąą".into())), None);

        assert!(in_year(&ts, 2024));
        assert!(!in_year(&ts, 2023));
        assert!(in_year(&Value::String("2024-12-31".into()), 2024));
        assert!(!in_year(&Value::String("2023-01-01".into()), 2024));
    }
}
