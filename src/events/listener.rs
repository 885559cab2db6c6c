use async_trait::async_trait;

use super::LedgerEvent;

/// Trait for handling ledger and session events asynchronously.
///
/// Listeners run inline on the request task after the change committed, so
/// slow work belongs on a spawned task.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &LedgerEvent);
}
