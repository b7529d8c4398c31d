//! The player-bus capability: everything the registry needs from D-Bus,
//! behind a trait so tests can substitute their own bus.

pub mod mpris;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Well-known name prefix every MPRIS player registers under.
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Errors from the underlying bus connection.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("could not connect to the session bus: {0}")]
    Connect(#[source] zbus::Error),
    #[error("bus call failed: {0}")]
    Call(#[from] zbus::Error),
    #[error("bus call rejected: {0}")]
    Rejected(#[from] zbus::fdo::Error),
    #[error("bus call timed out after {0:?}")]
    Timeout(Duration),
}

pub type BusResult<T> = Result<T, BusError>;

/// Track fields published by a player, reduced to plain strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
}

/// One property-change notification from a player.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlayerUpdate {
    /// New track metadata, when the change set carried the metadata entry.
    /// `None` means the change was about something else entirely.
    pub metadata: Option<TrackMetadata>,
}

/// Events forwarded from the bus to the dispatch loop.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A well-known name changed hands somewhere on the bus.
    NameOwnerChanged { service: String },
    /// A subscribed player reported changed properties.
    PropertiesChanged { service: String, update: PlayerUpdate },
}

/// Where bus adapters deliver their events.
pub type EventSender = mpsc::UnboundedSender<BusEvent>;

/// Handle for one player's metadata subscription.
///
/// Returned by [`PlayerBus::subscribe_metadata`] and handed back to
/// [`PlayerBus::unsubscribe_metadata`]; the registry holds at most one at
/// a time. Dropping the handle also stops the forwarding.
#[derive(Debug)]
pub struct MetadataSubscription {
    service: String,
    task: Option<JoinHandle<()>>,
}

impl MetadataSubscription {
    pub(crate) fn new(service: String, task: Option<JoinHandle<()>>) -> Self {
        Self { service, task }
    }

    /// The service this subscription follows.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub(crate) fn take_task(&mut self) -> Option<JoinHandle<()>> {
        self.task.take()
    }
}

impl Drop for MetadataSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Handle for the global name-ownership watch; dropping it stops the
/// forwarding task.
#[derive(Debug)]
pub struct OwnershipWatch {
    task: Option<JoinHandle<()>>,
}

impl OwnershipWatch {
    pub(crate) fn new(task: Option<JoinHandle<()>>) -> Self {
        Self { task }
    }
}

impl Drop for OwnershipWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// What the registry needs from the bus. The production implementation
/// is [`mpris::MprisBus`].
#[async_trait::async_trait]
pub trait PlayerBus: Send + Sync {
    /// Every service name currently registered on the bus, player or not.
    async fn list_names(&self) -> BusResult<Vec<String>>;

    /// The player's advertised identity, e.g. "VLC media player". Errors
    /// leave the caller to fall back to a derived name.
    async fn identity(&self, service: &str) -> BusResult<String>;

    /// The player's current track metadata.
    async fn metadata(&self, service: &str) -> BusResult<TrackMetadata>;

    /// Start forwarding `service`'s player property changes into `events`
    /// as [`BusEvent::PropertiesChanged`].
    async fn subscribe_metadata(
        &self,
        service: &str,
        events: EventSender,
    ) -> BusResult<MetadataSubscription>;

    /// Tear down a subscription created by
    /// [`subscribe_metadata`](Self::subscribe_metadata).
    fn unsubscribe_metadata(&self, subscription: MetadataSubscription);

    /// Start forwarding name-ownership changes (players appearing and
    /// vanishing, among everything else) into `events` as
    /// [`BusEvent::NameOwnerChanged`].
    async fn watch_ownership(&self, events: EventSender) -> BusResult<OwnershipWatch>;
}
