use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::{CleanOrder, ErrorOrder, RoutedOrder};
use crate::envelope::{payload_digest, RawMessage};
use crate::error::Result;
use crate::pipeline::{auto_fix, normalize, OrderValidator};
use crate::storage::OrderStore;
use crate::transport::{Delivery, Transport};

/// How long to sleep when the queue is drained before polling again.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Ingestion worker: pulls one delivery at a time, drives it through
/// normalization, auto-fix and validation, and persists the outcome before
/// acknowledging. Any fault leaves the message with the transport for
/// redelivery.
pub struct OrdersConsumer {
    transport: Arc<dyn Transport>,
    store: Arc<dyn OrderStore>,
    validator: OrderValidator,
}

impl OrdersConsumer {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn OrderStore>) -> Self {
        Self {
            transport,
            store,
            validator: OrderValidator::new(),
        }
    }

    /// Consume until a shutdown signal arrives. The in-flight message always
    /// reaches its ack-or-requeue decision before the loop exits.
    pub async fn run(&self) -> Result<()> {
        info!("consumer started, waiting for deliveries");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested, stopping consumer");
                    break;
                }
                next = self.transport.receive() => {
                    match next? {
                        Some(delivery) => self.process_delivery(delivery).await?,
                        None => tokio::time::sleep(POLL_INTERVAL).await,
                    }
                }
            }
        }
        Ok(())
    }

    /// Drive one delivery to its ack-or-requeue decision.
    pub async fn process_delivery(&self, delivery: Delivery) -> Result<()> {
        match self.handle_message(&delivery.body).await {
            Ok(()) => self.transport.ack(&delivery).await,
            Err(e) => {
                crate::metrics::orders::requeued();
                error!(
                    payload_sha256 = %payload_digest(&delivery.body),
                    error = %e,
                    "failed to handle delivery, requeueing"
                );
                self.transport.nack(&delivery, true).await
            }
        }
    }

    /// Normalize, auto-fix, validate and persist one raw message.
    pub async fn handle_message(&self, body: &[u8]) -> Result<()> {
        let message = RawMessage::from_bytes(body)?;
        let canonical = normalize(&message.source, &message.data);

        // Snapshot before repair: the audit sink stores what actually arrived.
        let raw_record = canonical.clone();

        let fix = auto_fix(&canonical);
        if fix.was_fixed {
            crate::metrics::orders::auto_fixed();
            info!(
                source = %message.source,
                order_id = %fix.order.order_id,
                "auto-fixed order fields"
            );
        }

        let mut candidate = fix.order;
        let verdict = self.validator.validate(&mut candidate);

        let routed = if verdict.is_valid {
            RoutedOrder::Clean(CleanOrder::try_from(&candidate)?)
        } else {
            RoutedOrder::Error(ErrorOrder::from_rejected(&candidate, &verdict.errors))
        };

        if let Err(e) = self.store.persist(&raw_record, &routed).await {
            error!(
                source = %message.source,
                order_id = %candidate.order_id,
                stage = "persist",
                error = %e,
                "persistence failed"
            );
            return Err(e);
        }

        match &routed {
            RoutedOrder::Clean(record) => {
                crate::metrics::orders::accepted();
                info!(
                    source = %message.source,
                    order_id = %record.order_id,
                    "accepted order -> orders_clean"
                );
            }
            RoutedOrder::Error(record) => {
                crate::metrics::orders::rejected();
                warn!(
                    source = %message.source,
                    order_id = %record.order_id,
                    reasons = %record.error_reason,
                    "rejected order -> orders_error"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::transport::FileQueue;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn consumer_with(
        dir: &tempfile::TempDir,
    ) -> (OrdersConsumer, Arc<InMemoryStore>, Arc<FileQueue>) {
        let transport = Arc::new(FileQueue::open(dir.path(), "orders").unwrap());
        let store = Arc::new(InMemoryStore::new());
        let consumer = OrdersConsumer::new(transport.clone(), store.clone());
        (consumer, store, transport)
    }

    fn offline_message() -> Vec<u8> {
        let mut data = HashMap::new();
        data.insert("id".to_string(), "OF-1".to_string());
        data.insert("date".to_string(), "01/11/2025".to_string());
        data.insert("cust_id".to_string(), "C-1".to_string());
        data.insert("name".to_string(), "Nguyen Van A".to_string());
        data.insert("total".to_string(), "200".to_string());
        data.insert("order_status".to_string(), "DONE".to_string());
        RawMessage::new("offline", data).to_bytes().unwrap()
    }

    #[tokio::test]
    async fn valid_offline_message_lands_in_clean_sink() {
        let dir = tempdir().unwrap();
        let (consumer, store, _) = consumer_with(&dir);

        consumer.handle_message(&offline_message()).await.unwrap();

        let rows = store.list_clean(100).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "OF-1");
        assert_eq!(rows[0].order_date, "2025-11-01");
        assert_eq!(rows[0].customer_name, "Nguyen Van A");
        assert_eq!(rows[0].total_amount, 200.0);
        assert_eq!(rows[0].status, "DONE");
        assert!(store.list_error(100).await.unwrap().is_empty());

        // The audit sink keeps the pre-fix normalized record.
        assert_eq!(store.raw("OF-1").unwrap().order_date, "01/11/2025");
    }

    #[tokio::test]
    async fn fixed_name_but_bad_amount_routes_to_error_sink() {
        let dir = tempdir().unwrap();
        let (consumer, store, _) = consumer_with(&dir);

        let mut data = HashMap::new();
        data.insert("order_id".to_string(), "ON-9".to_string());
        data.insert("order_date".to_string(), "2025-11-01".to_string());
        data.insert("customer_name".to_string(), "John123".to_string());
        data.insert("total_amount".to_string(), "-50".to_string());
        data.insert("status".to_string(), "PENDING".to_string());
        let body = RawMessage::new("online", data).to_bytes().unwrap();

        consumer.handle_message(&body).await.unwrap();

        let rows = store.list_error(100).await.unwrap();
        assert_eq!(rows.len(), 1);
        // Auto-fix repaired the name, so the only violation is the amount.
        assert_eq!(rows[0].customer_name, "John");
        assert_eq!(rows[0].error_reason, "total_amount must be > 0");
        assert!(store.list_clean(100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_payload_is_an_error() {
        let dir = tempdir().unwrap();
        let (consumer, _store, _) = consumer_with(&dir);
        assert!(consumer.handle_message(b"not json").await.is_err());
    }

    #[tokio::test]
    async fn process_acks_good_delivery_and_requeues_bad_one() {
        let dir = tempdir().unwrap();
        let (consumer, _store, transport) = consumer_with(&dir);

        transport.publish(b"not json").await.unwrap();
        transport.publish(&offline_message()).await.unwrap();

        // The malformed payload is nacked with requeue, so it stays first in
        // line; no quarantine exists for it.
        let bad = transport.receive().await.unwrap().unwrap();
        consumer.process_delivery(bad.clone()).await.unwrap();
        let again = transport.receive().await.unwrap().unwrap();
        assert_eq!(again.offset, bad.offset);
    }
}
