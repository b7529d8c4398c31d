//! Bridges bus events into registry calls.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::bus::BusEvent;
use crate::registry::PlayerRegistry;

/// Drain the bus event channel until every sender is gone, feeding each
/// event to the registry. Runs as its own task so slow registry work
/// never blocks the bus streams.
pub async fn run(mut events: UnboundedReceiver<BusEvent>, registry: Arc<PlayerRegistry>) {
    while let Some(event) = events.recv().await {
        match event {
            BusEvent::NameOwnerChanged { service } => {
                registry.handle_name_owner_changed(&service).await;
            }
            BusEvent::PropertiesChanged { service, update } => {
                registry.handle_player_update(&service, update).await;
            }
        }
    }
    log::debug!("bus event channel closed; dispatcher stopping");
}
