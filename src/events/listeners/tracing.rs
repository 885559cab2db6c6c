use async_trait::async_trait;

use crate::events::{LedgerEvent, Listener};

/// Emits events as `tracing` events with the group as a structured field.
///
/// Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &LedgerEvent) {
        tracing::info!(
            target: "chorepool::events",
            event_name = event.name(),
            group_id = event.group_id(),
            at = %event.timestamp(),
            fields = %super::logging::fields(event),
            "ledger event"
        );
    }
}
