use std::collections::HashMap;
use std::sync::Arc;

use orders_etl::consumer::OrdersConsumer;
use orders_etl::envelope::RawMessage;
use orders_etl::storage::{OrderStore, SqliteStore};
use orders_etl::transport::{FileQueue, Transport};
use tempfile::tempdir;

fn harness(dir: &tempfile::TempDir) -> (OrdersConsumer, Arc<SqliteStore>, Arc<FileQueue>) {
    let transport = Arc::new(FileQueue::open(dir.path().join("queue"), "orders").unwrap());
    let store = Arc::new(SqliteStore::open(dir.path().join("orders.db")).unwrap());
    store.migrate().unwrap();
    let consumer = OrdersConsumer::new(transport.clone(), store.clone());
    (consumer, store, transport)
}

fn message(source: &str, pairs: &[(&str, &str)]) -> Vec<u8> {
    let data: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RawMessage::new(source, data).to_bytes().unwrap()
}

#[tokio::test]
async fn offline_order_flows_to_clean_sink() {
    let dir = tempdir().unwrap();
    let (consumer, store, transport) = harness(&dir);

    let body = message(
        "offline",
        &[
            ("id", "OF-1"),
            ("date", "01/11/2025"),
            ("cust_id", "C-1"),
            ("name", "Nguyen Van A"),
            ("total", "200"),
            ("order_status", "DONE"),
        ],
    );
    transport.publish(&body).await.unwrap();

    let delivery = transport.receive().await.unwrap().unwrap();
    consumer.process_delivery(delivery).await.unwrap();

    // The delivery was acknowledged only after the commit.
    assert!(transport.receive().await.unwrap().is_none());

    let rows = store.list_clean(100).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, "OF-1");
    assert_eq!(rows[0].source, "offline");
    assert_eq!(rows[0].order_date, "2025-11-01");
    assert_eq!(rows[0].customer_id, "C-1");
    assert_eq!(rows[0].customer_name, "Nguyen Van A");
    assert_eq!(rows[0].total_amount, 200.0);
    assert_eq!(rows[0].status, "DONE");
    assert!(store.list_error(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_order_flows_to_error_sink_with_reasons() {
    let dir = tempdir().unwrap();
    let (consumer, store, transport) = harness(&dir);

    let body = message(
        "online",
        &[
            ("order_id", "ON-2"),
            ("order_date", "2025-13-45"),
            ("customer_name", "Pham 123 456 789"),
            ("total_amount", "abc"),
            ("status", ""),
        ],
    );
    transport.publish(&body).await.unwrap();

    let delivery = transport.receive().await.unwrap().unwrap();
    consumer.process_delivery(delivery).await.unwrap();

    let rows = store.list_error(100).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, "ON-2");
    assert!(rows[0].error_reason.contains("total_amount not numeric"));
    assert!(rows[0].error_reason.contains("order_date invalid format"));
    assert!(store.list_clean(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn redelivery_moves_order_between_sinks_but_keeps_stale_row() {
    let dir = tempdir().unwrap();
    let (consumer, store, _transport) = harness(&dir);

    let bad = message(
        "online",
        &[
            ("order_id", "ON-3"),
            ("order_date", "2025-11-01"),
            ("customer_name", "Le Thi Nga"),
            ("total_amount", "-50"),
            ("status", "PAID"),
        ],
    );
    consumer.handle_message(&bad).await.unwrap();
    assert_eq!(store.list_error(100).await.unwrap().len(), 1);

    // The corrected order arrives later under the same business key.
    let good = message(
        "online",
        &[
            ("order_id", "ON-3"),
            ("order_date", "2025-11-01"),
            ("customer_name", "Le Thi Nga"),
            ("total_amount", "50"),
            ("status", "PAID"),
        ],
    );
    consumer.handle_message(&good).await.unwrap();

    let clean_rows = store.list_clean(100).await.unwrap();
    assert_eq!(clean_rows.len(), 1);
    assert_eq!(clean_rows[0].total_amount, 50.0);

    // The error sink keeps its stale row; nothing cleans it up.
    assert_eq!(store.list_error(100).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reprocessing_the_same_message_upserts_one_row() {
    let dir = tempdir().unwrap();
    let (consumer, store, _transport) = harness(&dir);

    let body = message(
        "online",
        &[
            ("order_id", "ON-4"),
            ("order_date", "2025-11-01"),
            ("customer_name", "Le Thi Nga"),
            ("total_amount", "120.5"),
            ("status", "PAID"),
        ],
    );

    consumer.handle_message(&body).await.unwrap();
    consumer.handle_message(&body).await.unwrap();

    let rows = store.list_clean(100).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_amount, 120.5);
}

#[tokio::test]
async fn dirty_fields_are_repaired_before_validation() {
    let dir = tempdir().unwrap();
    let (consumer, store, _transport) = harness(&dir);

    let body = message(
        "online",
        &[
            ("order_id", " ON-5 "),
            ("order_date", " 26/11/2025 "),
            ("customer_name", "  le   thi9  nga "),
            ("total_amount", "$1,200.50"),
            ("status", " paid "),
        ],
    );
    consumer.handle_message(&body).await.unwrap();

    let rows = store.list_clean(100).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, "ON-5");
    assert_eq!(rows[0].order_date, "2025-11-26");
    assert_eq!(rows[0].customer_name, "Le Thi Nga");
    assert_eq!(rows[0].total_amount, 1200.5);
    assert_eq!(rows[0].status, "PAID");
}
