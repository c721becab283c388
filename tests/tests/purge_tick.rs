//! Integration tests for a single purge tick over mock tables.

use aggregation_core::{AggregationDefinition, Granularity, PurgeAnnotation};
use aggregation_table::{
    AppContext, AttributeType, MemoryTable, TableDefinition, TableError, TableRegistry, Value,
    AGG_TIMESTAMP,
};
use std::sync::Arc;
use worker::{AggregationTables, PurgeTask};
use integration_tests::fixtures::{table_id, TICK_TIME};
use integration_tests::mocks::DeleteCall;
use integration_tests::setup::TestAggregation;
use telemetry::metrics;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

fn call(table: &str, cutoff: i64) -> DeleteCall {
    DeleteCall {
        table: table.to_string(),
        cutoff,
        record_count: 1,
    }
}

#[tokio::test]
async fn test_tick_deletes_per_granularity_cutoff() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Seconds, Granularity::Hours])
        .with_purge(
            PurgeAnnotation::new()
                .with_enable("true")
                .with_interval("1 min")
                .with_retention("hours", "7 d"),
        );
    let task = aggregation.task().unwrap();

    let report = task.run_at(TICK_TIME).await.unwrap();

    assert_eq!(
        aggregation.calls(),
        vec![
            call("Trades_SECONDS", TICK_TIME - 30_000),
            call("Trades_HOURS", TICK_TIME - WEEK_MS),
        ]
    );
    assert_eq!(report.purged.len(), 2);
    assert_eq!(report.now_millis, TICK_TIME);
}

#[tokio::test]
async fn test_retain_all_granularities_are_never_deleted() {
    let aggregation = TestAggregation::new(
        "Trades",
        &[Granularity::Days, Granularity::Months, Granularity::Years],
    )
    .with_purge(PurgeAnnotation::new().with_retention("days", "all"));
    let task = aggregation.task().unwrap();

    let report = task.run_at(TICK_TIME).await.unwrap();

    assert!(report.purged.is_empty());
    assert!(aggregation.calls().is_empty());
    assert_eq!(aggregation.table(Granularity::Months).compilations(), 0);
}

#[tokio::test]
async fn test_explicit_retain_all_override_skips_table() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Minutes, Granularity::Months])
        .with_purge(PurgeAnnotation::new().with_retention("months", "ALL"));
    let task = aggregation.task().unwrap();

    task.run_at(TICK_TIME).await.unwrap();

    let tables: Vec<String> = aggregation.calls().into_iter().map(|c| c.table).collect();
    assert_eq!(tables, vec![table_id("Trades", Granularity::Minutes)]);
}

#[tokio::test]
async fn test_first_failure_aborts_rest_of_tick() {
    let aggregation = TestAggregation::new(
        "Trades",
        &[Granularity::Seconds, Granularity::Minutes, Granularity::Hours],
    );
    aggregation.table(Granularity::Seconds).set_fail_delete(true);
    let task = aggregation.task().unwrap();

    let err = task.run_at(TICK_TIME).await.unwrap_err();

    assert_eq!(err.table, "Trades_SECONDS");
    assert_eq!(err.granularity, Granularity::Seconds);
    assert_eq!(err.cutoff, TICK_TIME - 30_000);
    assert!(err.to_string().contains("Trades_SECONDS"));

    // The failing call was attempted; nothing after it was.
    assert_eq!(
        aggregation.calls(),
        vec![call("Trades_SECONDS", TICK_TIME - 30_000)]
    );
}

#[tokio::test]
async fn test_failure_midway_keeps_earlier_deletes() {
    let aggregation = TestAggregation::new(
        "Trades",
        &[Granularity::Seconds, Granularity::Minutes, Granularity::Hours],
    );
    aggregation.table(Granularity::Minutes).set_fail_compile(true);
    let task = aggregation.task().unwrap();

    let err = task.run_at(TICK_TIME).await.unwrap_err();

    assert_eq!(err.table, "Trades_MINUTES");
    let tables: Vec<String> = aggregation.calls().into_iter().map(|c| c.table).collect();
    assert_eq!(tables, vec!["Trades_SECONDS".to_string()]);
}

#[tokio::test]
async fn test_conditions_compiled_once_across_ticks() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Seconds, Granularity::Hours]);
    let task = aggregation.task().unwrap();

    for i in 0..3 {
        task.run_at(TICK_TIME + i * 1_000).await.unwrap();
    }

    assert_eq!(aggregation.table(Granularity::Seconds).compilations(), 1);
    assert_eq!(aggregation.table(Granularity::Hours).compilations(), 1);

    let seconds: Vec<i64> = aggregation
        .calls()
        .into_iter()
        .filter(|c| c.table == "Trades_SECONDS")
        .map(|c| c.cutoff)
        .collect();
    assert_eq!(
        seconds,
        vec![TICK_TIME - 30_000, TICK_TIME - 29_000, TICK_TIME - 28_000]
    );
}

#[tokio::test]
async fn test_failed_compilation_retried_next_tick() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Seconds]);
    let seconds = aggregation.table(Granularity::Seconds);
    seconds.set_fail_compile(true);
    let task = aggregation.task().unwrap();

    assert!(task.run_at(TICK_TIME).await.is_err());
    assert!(aggregation.calls().is_empty());

    seconds.set_fail_compile(false);
    task.run_at(TICK_TIME).await.unwrap();

    assert_eq!(seconds.compilations(), 1);
    assert_eq!(
        aggregation.calls(),
        vec![call("Trades_SECONDS", TICK_TIME - 30_000)]
    );
}

#[tokio::test]
async fn test_ticks_do_not_accumulate_parameters() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Seconds]);
    let task = aggregation.task().unwrap();

    task.run_at(TICK_TIME).await.unwrap();
    aggregation.clear_calls();
    task.run_at(TICK_TIME + 5_000).await.unwrap();

    assert_eq!(
        aggregation.calls(),
        vec![call("Trades_SECONDS", TICK_TIME - 25_000)]
    );
}

#[tokio::test]
async fn test_disabled_task_issues_no_deletes() {
    let aggregation = TestAggregation::new("Trades", &[Granularity::Seconds])
        .with_purge(PurgeAnnotation::new().with_enable("FALSE").with_interval("1 sec"));
    let task = aggregation.task().unwrap();

    assert!(!task.is_purging_enabled());
    task.run_at(TICK_TIME).await.unwrap();

    assert!(aggregation.calls().is_empty());
}

#[tokio::test]
async fn test_tick_updates_metrics() {
    let aggregation = TestAggregation::new("Metered", &[Granularity::Seconds, Granularity::Minutes]);
    let task = aggregation.task().unwrap();
    let before = metrics().snapshot();

    task.run_at(TICK_TIME).await.unwrap();

    // Metrics are process-wide and other tests run concurrently.
    let after = metrics().snapshot();
    assert!(after.purge_ticks > before.purge_ticks);
    assert!(after.tables_purged >= before.tables_purged + 2);
    assert!(after.condition_compilations >= before.condition_compilations + 2);
}

#[tokio::test]
async fn test_mistyped_timestamp_column_fails_tick() {
    let definition = AggregationDefinition::new("Trades", [Granularity::Seconds]);
    let seconds = Arc::new(MemoryTable::new(
        TableDefinition::new("Trades_SECONDS").attribute(AGG_TIMESTAMP, AttributeType::String),
    ));
    seconds.insert(vec![Value::from("0")]).unwrap();

    let mut tables = AggregationTables::new();
    tables.insert(Granularity::Seconds, seconds.clone());
    let task = PurgeTask::init(
        &definition,
        tables,
        AppContext::new("purge-tests"),
        TableRegistry::new(),
    )
    .unwrap();

    let err = task.run_at(TICK_TIME).await.unwrap_err();

    assert_eq!(err.table, "Trades_SECONDS");
    assert!(matches!(err.source, TableError::TypeMismatch { .. }));
    assert_eq!(seconds.len(), 1);
}
