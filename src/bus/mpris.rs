//! zbus-backed [`PlayerBus`] against the user's session bus.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use zbus::Connection;
use zbus::fdo::{DBusProxy, PropertiesProxy};
use zbus::proxy::CacheProperties;
use zbus::zvariant::{OwnedValue, Value};

use super::{
    BusError, BusEvent, BusResult, EventSender, MetadataSubscription, OwnershipWatch, PlayerBus,
    PlayerUpdate, TrackMetadata,
};

/// Object path every MPRIS player exports.
const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
/// Interface carrying the track metadata property.
const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Metadata entry keys, per the Freedesktop xesam vocabulary.
const META_ARTIST: &str = "xesam:artist";
const META_TITLE: &str = "xesam:title";
const META_ALBUM: &str = "xesam:album";

/// Upper bound for a single call; an unresponsive player must not stall
/// roster refreshes indefinitely.
const BUS_CALL_TIMEOUT: Duration = Duration::from_secs(2);

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2",
    gen_blocking = false
)]
trait MediaPlayer2 {
    #[zbus(property)]
    fn identity(&self) -> zbus::Result<String>;
}

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2",
    gen_blocking = false
)]
trait MprisPlayer {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;
}

/// [`PlayerBus`] talking to the real session bus.
#[derive(Debug)]
pub struct MprisBus {
    connection: Connection,
    dbus: DBusProxy<'static>,
}

impl MprisBus {
    /// Connect to the session bus. Failure here is fatal to the caller:
    /// without a bus there is nothing to observe.
    pub async fn connect() -> BusResult<Self> {
        let connection = Connection::session().await.map_err(BusError::Connect)?;
        let dbus = DBusProxy::new(&connection)
            .await
            .map_err(BusError::Connect)?;
        log::info!("connected to the session bus as {:?}", connection.unique_name());
        Ok(Self { connection, dbus })
    }

    async fn identity_proxy(&self, service: &str) -> BusResult<MediaPlayer2Proxy<'static>> {
        let proxy = MediaPlayer2Proxy::builder(&self.connection)
            .destination(service.to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }

    async fn player_proxy(&self, service: &str) -> BusResult<MprisPlayerProxy<'static>> {
        let proxy = MprisPlayerProxy::builder(&self.connection)
            .destination(service.to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }
}

#[async_trait::async_trait]
impl PlayerBus for MprisBus {
    async fn list_names(&self) -> BusResult<Vec<String>> {
        let names = bounded(self.dbus.list_names()).await??;
        Ok(names.into_iter().map(|name| name.to_string()).collect())
    }

    async fn identity(&self, service: &str) -> BusResult<String> {
        let proxy = self.identity_proxy(service).await?;
        let identity = bounded(proxy.identity()).await??;
        Ok(identity)
    }

    async fn metadata(&self, service: &str) -> BusResult<TrackMetadata> {
        let proxy = self.player_proxy(service).await?;
        let raw = bounded(proxy.metadata()).await??;
        Ok(metadata_from_map(&raw))
    }

    async fn subscribe_metadata(
        &self,
        service: &str,
        events: EventSender,
    ) -> BusResult<MetadataSubscription> {
        let proxy = PropertiesProxy::builder(&self.connection)
            .destination(service.to_owned())?
            .path(MPRIS_OBJECT_PATH)?
            .build()
            .await?;
        let mut changes = bounded(proxy.receive_properties_changed()).await??;

        let forwarded = service.to_owned();
        let task = tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let Ok(args) = signal.args() else { continue };
                if args.interface_name().as_str() != PLAYER_INTERFACE {
                    continue;
                }
                let update = PlayerUpdate {
                    metadata: args
                        .changed_properties()
                        .get("Metadata")
                        .map(metadata_from_value),
                };
                let event = BusEvent::PropertiesChanged {
                    service: forwarded.clone(),
                    update,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            log::debug!("property stream for {forwarded} ended");
        });

        log::debug!("subscribed to property changes of {service}");
        Ok(MetadataSubscription::new(service.to_owned(), Some(task)))
    }

    fn unsubscribe_metadata(&self, mut subscription: MetadataSubscription) {
        log::debug!("unsubscribing from {}", subscription.service());
        if let Some(task) = subscription.take_task() {
            task.abort();
        }
    }

    async fn watch_ownership(&self, events: EventSender) -> BusResult<OwnershipWatch> {
        let mut changes = bounded(self.dbus.receive_name_owner_changed()).await??;
        let task = tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let Ok(args) = signal.args() else { continue };
                let event = BusEvent::NameOwnerChanged {
                    service: args.name().to_string(),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            log::debug!("name owner stream ended");
        });
        Ok(OwnershipWatch::new(Some(task)))
    }
}

/// Apply the adapter-wide timeout to one bus call.
async fn bounded<F: Future>(call: F) -> BusResult<F::Output> {
    tokio::time::timeout(BUS_CALL_TIMEOUT, call)
        .await
        .map_err(|_| BusError::Timeout(BUS_CALL_TIMEOUT))
}

fn metadata_from_map(map: &HashMap<String, OwnedValue>) -> TrackMetadata {
    TrackMetadata {
        artist: map.get(META_ARTIST).and_then(first_string),
        title: map.get(META_TITLE).and_then(single_string),
        album: map.get(META_ALBUM).and_then(single_string),
    }
}

/// Parse the `a{sv}` metadata dict out of a property-change value.
/// Anything unreadable counts as an empty dict rather than an error.
fn metadata_from_value(value: &Value<'_>) -> TrackMetadata {
    value
        .try_to_owned()
        .ok()
        .and_then(|owned| HashMap::<String, OwnedValue>::try_from(owned).ok())
        .map(|map| metadata_from_map(&map))
        .unwrap_or_default()
}

/// `xesam:artist` is specified as a list of strings; the published string
/// uses the first one. Some players send a plain string instead.
fn first_string(value: &OwnedValue) -> Option<String> {
    match &**value {
        Value::Array(items) => items.iter().next().and_then(string_value),
        other => string_value(other),
    }
}

fn single_string(value: &OwnedValue) -> Option<String> {
    string_value(value)
}

fn string_value(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) if !s.is_empty() => Some(s.as_str().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Str;

    fn owned(value: Value<'_>) -> OwnedValue {
        value.try_to_owned().expect("plain values always convert")
    }

    #[test]
    fn test_metadata_from_map_reads_xesam_fields() {
        let mut map = HashMap::new();
        map.insert(
            META_ARTIST.to_string(),
            owned(Value::new(vec!["Noisia", "The Upbeats"])),
        );
        map.insert(META_TITLE.to_string(), owned(Value::new("Dustup")));
        map.insert(META_ALBUM.to_string(), owned(Value::new("Outer Edges")));

        let metadata = metadata_from_map(&map);
        assert_eq!(metadata.artist.as_deref(), Some("Noisia"));
        assert_eq!(metadata.title.as_deref(), Some("Dustup"));
        assert_eq!(metadata.album.as_deref(), Some("Outer Edges"));
    }

    #[test]
    fn test_metadata_from_map_tolerates_missing_and_odd_entries() {
        let mut map = HashMap::new();
        map.insert(META_ARTIST.to_string(), owned(Value::new(Vec::<String>::new())));
        map.insert(META_TITLE.to_string(), owned(Value::new(7_i64)));

        let metadata = metadata_from_map(&map);
        assert_eq!(metadata.artist, None);
        assert_eq!(metadata.title, None);
        assert_eq!(metadata.album, None);
    }

    #[test]
    fn test_scalar_artist_is_accepted() {
        let mut map = HashMap::new();
        map.insert(META_ARTIST.to_string(), owned(Value::new("Solo")));
        assert_eq!(metadata_from_map(&map).artist.as_deref(), Some("Solo"));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let mut map = HashMap::new();
        map.insert(META_TITLE.to_string(), owned(Value::Str(Str::from(""))));
        assert_eq!(metadata_from_map(&map).title, None);
    }
}
