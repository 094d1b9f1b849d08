//! Integration checks against live stores.
//!
//! These run the real catalog against seeded databases and are ignored by
//! default; bring the stores up (see the HOTELBENCH_* env vars in
//! `settings.rs`) and run with `--ignored`.

use std::collections::BTreeMap;

use hotelbench_backends::{connect, BackendKind, Settings, ALL_BACKENDS};
use hotelbench_core::catalog::ALL_QUERIES;
use hotelbench_core::{QueryName, Runner, Translator, Value};

#[tokio::test]
#[ignore = "requires live stores"]
async fn every_backend_answers_the_full_catalog() {
    let settings = Settings::from_env();
    for kind in ALL_BACKENDS {
        let translator = connect(kind, &settings)
            .await
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        for query in ALL_QUERIES {
            let rows = translator
                .execute(query)
                .await
                .unwrap_or_else(|e| panic!("{kind}/{query}: {e}"));
            // LIMIT-bounded queries never exceed their cap.
            if let Some(limit) = query.spec().limit {
                assert!(rows.len() <= limit, "{kind}/{query}: {} rows", rows.len());
            }
        }
    }
}

#[tokio::test]
#[ignore = "requires live stores"]
async fn room_type_averages_agree_across_all_backends() {
    let settings = Settings::from_env();
    let mut per_backend: Vec<(BackendKind, BTreeMap<String, f64>)> = Vec::new();

    for kind in ALL_BACKENDS {
        let translator = connect(kind, &settings).await.unwrap();
        let rows = translator
            .execute(QueryName::AvgPricePerRoomType)
            .await
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        let averages: BTreeMap<String, f64> = rows
            .iter()
            .map(|row| {
                let room_type = row
                    .get("room_type")
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| panic!("{kind}: row without room_type"))
                    .to_string();
                let avg = row
                    .get("avg_price")
                    .and_then(Value::as_numeric)
                    .unwrap_or_else(|| panic!("{kind}: row without avg_price"));
                (room_type, avg)
            })
            .collect();
        per_backend.push((kind, averages));
    }

    let (reference_kind, reference) = &per_backend[0];
    for (kind, averages) in &per_backend[1..] {
        assert_eq!(
            averages.keys().collect::<Vec<_>>(),
            reference.keys().collect::<Vec<_>>(),
            "{kind} vs {reference_kind}: room_type key sets differ"
        );
        for (room_type, avg) in averages {
            let expected = reference[room_type];
            assert!(
                (avg - expected).abs() < 1e-6,
                "{kind} vs {reference_kind}: {room_type} {avg} != {expected}"
            );
        }
    }
}

#[tokio::test]
#[ignore = "requires live stores"]
async fn relational_backends_agree_on_row_counts() {
    let settings = Settings::from_env();
    let translators = vec![
        connect(BackendKind::Postgres, &settings).await.unwrap(),
        connect(BackendKind::MySql, &settings).await.unwrap(),
    ];
    let runner = Runner::new(translators);
    let reports = runner.run_all().await;

    let (pg, my) = reports.split_at(ALL_QUERIES.len());
    for (a, b) in pg.iter().zip(my) {
        assert_eq!(a.query, b.query);
        assert_eq!(
            a.row_count, b.row_count,
            "{}: postgres={} mysql={}",
            a.query, a.row_count, b.row_count
        );
    }
}
