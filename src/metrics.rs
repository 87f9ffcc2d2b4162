use std::net::SocketAddr;

pub fn init_metrics() {
    let port: u16 = std::env::var("ORDERS_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

/// Counters for the order ingestion pipeline.
pub mod orders {
    pub fn accepted() {
        ::metrics::counter!("orders_accepted_total").increment(1);
    }

    pub fn rejected() {
        ::metrics::counter!("orders_rejected_total").increment(1);
    }

    pub fn auto_fixed() {
        ::metrics::counter!("orders_auto_fixed_total").increment(1);
    }

    pub fn requeued() {
        ::metrics::counter!("orders_requeued_total").increment(1);
    }

    pub fn published(count: usize) {
        ::metrics::counter!("orders_published_total").increment(count as u64);
    }
}
