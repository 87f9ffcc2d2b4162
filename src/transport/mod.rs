use async_trait::async_trait;

use crate::error::Result;

pub mod file_queue;

pub use file_queue::FileQueue;

/// One message handed to a consumer. The offsets locate the line inside the
/// delivery log and double as the acknowledgement cursor.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub body: Vec<u8>,
    /// Byte offset of this line's start in the delivery log.
    pub offset: u64,
    /// Byte offset just past this line; where an ack moves the consumer.
    pub next_offset: u64,
}

/// At-least-once message transport with manual acknowledgement.
///
/// `receive` hands back the next unacknowledged delivery, or None when the
/// queue is drained. A delivery stays owned by the transport until it is
/// acked or nacked; nacking with `requeue` makes it eligible for redelivery.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, body: &[u8]) -> Result<()>;
    async fn receive(&self) -> Result<Option<Delivery>>;
    async fn ack(&self, delivery: &Delivery) -> Result<()>;
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<()>;
}
