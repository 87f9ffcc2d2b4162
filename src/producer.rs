use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::envelope::RawMessage;
use crate::error::Result;
use crate::transport::Transport;

/// Publish rows to the orders queue with the given source label.
pub async fn publish_rows<I>(transport: &dyn Transport, source: &str, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = HashMap<String, String>>,
{
    let mut count = 0;
    for row in rows {
        let message = RawMessage::new(source, row);
        transport.publish(&message.to_bytes()?).await?;
        count += 1;
    }
    crate::metrics::orders::published(count);
    Ok(count)
}

/// Publish every row of a CSV file (the online channel's batch producer).
pub async fn publish_csv(transport: &dyn Transport, source: &str, path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut count = 0;
    for row in reader.deserialize::<HashMap<String, String>>() {
        let row = row?;
        let order_id = row
            .get("order_id")
            .or_else(|| row.get("id"))
            .cloned()
            .unwrap_or_default();
        let message = RawMessage::new(source, row);
        transport.publish(&message.to_bytes()?).await?;
        info!(source, order_id = %order_id, "published order");
        count += 1;
    }
    crate::metrics::orders::published(count);
    Ok(count)
}

/// Parse an uploaded CSV document into field mappings, one per data row.
pub fn parse_csv_rows(text: &str) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize::<HashMap<String, String>>() {
        rows.push(row?);
    }
    Ok(rows)
}
