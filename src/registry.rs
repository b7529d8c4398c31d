//! Roster and active-player bookkeeping.
//!
//! Every mutable fact about players lives here: which ones exist, which
//! one is active, and the single metadata subscription that follows the
//! active one. All mutation happens behind one lock, and every mutation
//! ends with one redraw request sent after the lock is released;
//! collaborators read cloned snapshots.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bus::{
    EventSender, MPRIS_PREFIX, MetadataSubscription, PlayerBus, PlayerUpdate, TrackMetadata,
};
use crate::format::TrackFormatter;
use crate::refresh::RefreshSignal;
use crate::sink::OutputSink;

/// One discovered player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Well-known bus name, unique per running player instance.
    pub bus_name: String,
    /// Name shown in the menu: the advertised identity, or the bus name
    /// with the MPRIS prefix stripped when no identity is readable.
    pub display_name: String,
}

/// Roster and selection as the renderer sees them.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub players: Vec<Player>,
    pub active: Option<String>,
}

impl RosterSnapshot {
    /// Whether `bus_name` is the active selection.
    pub fn is_active(&self, bus_name: &str) -> bool {
        self.active.as_deref() == Some(bus_name)
    }
}

#[derive(Default)]
struct RegistryState {
    roster: Vec<Player>,
    active: Option<String>,
    subscription: Option<MetadataSubscription>,
}

/// Whether a bus name follows the MPRIS player naming convention.
pub fn is_player_service(service: &str) -> bool {
    service.starts_with(MPRIS_PREFIX)
}

/// Display name derived locally from a service address.
fn derived_name(service: &str) -> String {
    service
        .strip_prefix(MPRIS_PREFIX)
        .unwrap_or(service)
        .to_string()
}

/// The selection rule: keep the candidate when it is rostered, otherwise
/// the first entry, otherwise nothing.
fn resolve_selection(roster: &[Player], candidate: Option<String>) -> Option<String> {
    match candidate {
        Some(name) if roster.iter().any(|p| p.bus_name == name) => Some(name),
        _ => roster.first().map(|p| p.bus_name.clone()),
    }
}

pub struct PlayerRegistry {
    bus: Arc<dyn PlayerBus>,
    formatter: TrackFormatter,
    sink: Arc<OutputSink>,
    refresh: Arc<RefreshSignal>,
    events: EventSender,
    state: Mutex<RegistryState>,
}

impl PlayerRegistry {
    pub fn new(
        bus: Arc<dyn PlayerBus>,
        formatter: TrackFormatter,
        sink: Arc<OutputSink>,
        refresh: Arc<RefreshSignal>,
        events: EventSender,
    ) -> Self {
        Self {
            bus,
            formatter,
            sink,
            refresh,
            events,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Rebuild the roster from the bus and reconcile the selection.
    pub async fn refresh_roster(&self) {
        let mut state = self.state.lock().await;
        self.rebuild_roster(&mut state).await;
        let candidate = state.active.clone();
        self.apply_selection(&mut state, candidate).await;
        drop(state);
        self.refresh.request_redraw();
    }

    /// Make `candidate` the active player, with fallback to the first
    /// roster entry and then to no selection at all.
    pub async fn select_active(&self, candidate: Option<String>) {
        let mut state = self.state.lock().await;
        self.apply_selection(&mut state, candidate).await;
        drop(state);
        self.refresh.request_redraw();
    }

    /// Select the roster entry at `index`. An out-of-range index is
    /// ignored outright: no state change, no redraw.
    pub async fn select_by_index(&self, index: usize) {
        let candidate = {
            let state = self.state.lock().await;
            let Some(player) = state.roster.get(index) else {
                log::debug!("selection index {index} out of range; ignored");
                return;
            };
            player.bus_name.clone()
        };
        self.select_active(Some(candidate)).await;
    }

    /// A name changed hands on the bus. Names outside the player
    /// convention are none of ours and cause no side effects.
    pub async fn handle_name_owner_changed(&self, service: &str) {
        if !is_player_service(service) {
            return;
        }
        log::debug!("player set changed ({service}); refreshing roster");
        self.refresh_roster().await;
    }

    /// A property change arrived. Stragglers from a previous subscription
    /// and changes that do not carry metadata are dropped without a redraw.
    pub async fn handle_player_update(&self, service: &str, update: PlayerUpdate) {
        let state = self.state.lock().await;
        if state.active.as_deref() != Some(service) {
            log::debug!("ignoring update from {service}: not the active player");
            return;
        }
        let Some(metadata) = update.metadata else {
            return;
        };
        self.publish(&metadata);
        drop(state);
        self.refresh.request_redraw();
    }

    /// Consistent roster+selection copy for the renderer thread. Must not
    /// be called from inside the async runtime.
    pub fn snapshot_blocking(&self) -> RosterSnapshot {
        let state = self.state.blocking_lock();
        RosterSnapshot {
            players: state.roster.clone(),
            active: state.active.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> RosterSnapshot {
        let state = self.state.lock().await;
        RosterSnapshot {
            players: state.roster.clone(),
            active: state.active.clone(),
        }
    }

    async fn rebuild_roster(&self, state: &mut RegistryState) {
        let names = match self.bus.list_names().await {
            Ok(names) => names,
            Err(e) => {
                // Transient bus trouble; keep the roster we have.
                log::warn!("could not list bus names: {e}");
                return;
            }
        };

        let mut roster = Vec::new();
        for name in names {
            if !is_player_service(&name) {
                continue;
            }
            let display_name = match self.bus.identity(&name).await {
                Ok(identity) if !identity.is_empty() => identity,
                Ok(_) => derived_name(&name),
                Err(e) => {
                    log::debug!("no identity for {name} ({e}); using derived name");
                    derived_name(&name)
                }
            };
            roster.push(Player {
                bus_name: name,
                display_name,
            });
        }
        log::debug!("roster rebuilt with {} player(s)", roster.len());
        state.roster = roster;
    }

    /// The one place where the selection and the metadata subscription
    /// change. The old subscription is always dropped first, then the
    /// resolved player (if any) gets a fresh one plus an immediate
    /// metadata publish; no player means an empty publish.
    async fn apply_selection(&self, state: &mut RegistryState, candidate: Option<String>) {
        let resolved = resolve_selection(&state.roster, candidate);

        if let Some(subscription) = state.subscription.take() {
            self.bus.unsubscribe_metadata(subscription);
        }
        state.active = resolved.clone();

        let Some(service) = resolved else {
            self.write_output("");
            return;
        };

        // A failed subscription leaves the selection standing without
        // live updates; the next ownership event lands back here and
        // tries again.
        match self.bus.subscribe_metadata(&service, self.events.clone()).await {
            Ok(subscription) => state.subscription = Some(subscription),
            Err(e) => log::warn!("could not subscribe to {service}: {e}"),
        }

        let metadata = match self.bus.metadata(&service).await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::debug!("no metadata from {service} ({e}); treating as empty");
                TrackMetadata::default()
            }
        };
        self.publish(&metadata);
    }

    fn publish(&self, metadata: &TrackMetadata) {
        let text = self.formatter.format(metadata);
        self.write_output(&text);
    }

    fn write_output(&self, text: &str) {
        if let Err(e) = self.sink.write(text) {
            log::warn!("could not write {}: {e}", self.sink.path().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, BusEvent, BusResult, OwnershipWatch};
    use crate::config::FormatConfig;
    use crate::refresh::Wake;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    const VLC: &str = "org.mpris.MediaPlayer2.vlc";
    const SPOTIFY: &str = "org.mpris.MediaPlayer2.spotify";

    #[derive(Default)]
    struct FakeBus {
        names: StdMutex<Vec<String>>,
        identities: StdMutex<HashMap<String, String>>,
        metadata: StdMutex<HashMap<String, TrackMetadata>>,
        subscribes: StdMutex<Vec<String>>,
        unsubscribes: StdMutex<Vec<String>>,
        broken_subscriptions: StdMutex<Vec<String>>,
        list_calls: AtomicUsize,
    }

    impl FakeBus {
        fn set_names(&self, names: &[&str]) {
            *self.names.lock().unwrap() = names.iter().map(|s| s.to_string()).collect();
        }

        fn set_identity(&self, service: &str, identity: &str) {
            self.identities
                .lock()
                .unwrap()
                .insert(service.to_string(), identity.to_string());
        }

        fn set_metadata(&self, service: &str, metadata: TrackMetadata) {
            self.metadata
                .lock()
                .unwrap()
                .insert(service.to_string(), metadata);
        }

        fn break_subscription(&self, service: &str) {
            self.broken_subscriptions
                .lock()
                .unwrap()
                .push(service.to_string());
        }

        fn repair_subscription(&self, service: &str) {
            self.broken_subscriptions
                .lock()
                .unwrap()
                .retain(|s| s != service);
        }

        /// Subscribes minus unsubscribes for one service.
        fn balance(&self, service: &str) -> isize {
            let subs = self
                .subscribes
                .lock()
                .unwrap()
                .iter()
                .filter(|s| *s == service)
                .count() as isize;
            let unsubs = self
                .unsubscribes
                .lock()
                .unwrap()
                .iter()
                .filter(|s| *s == service)
                .count() as isize;
            subs - unsubs
        }
    }

    #[async_trait::async_trait]
    impl PlayerBus for FakeBus {
        async fn list_names(&self) -> BusResult<Vec<String>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.names.lock().unwrap().clone())
        }

        async fn identity(&self, service: &str) -> BusResult<String> {
            self.identities
                .lock()
                .unwrap()
                .get(service)
                .cloned()
                .ok_or(BusError::Timeout(Duration::ZERO))
        }

        async fn metadata(&self, service: &str) -> BusResult<TrackMetadata> {
            self.metadata
                .lock()
                .unwrap()
                .get(service)
                .cloned()
                .ok_or(BusError::Timeout(Duration::ZERO))
        }

        async fn subscribe_metadata(
            &self,
            service: &str,
            _events: EventSender,
        ) -> BusResult<MetadataSubscription> {
            if self
                .broken_subscriptions
                .lock()
                .unwrap()
                .iter()
                .any(|s| s == service)
            {
                return Err(BusError::Timeout(Duration::ZERO));
            }
            self.subscribes.lock().unwrap().push(service.to_string());
            Ok(MetadataSubscription::new(service.to_string(), None))
        }

        fn unsubscribe_metadata(&self, subscription: MetadataSubscription) {
            self.unsubscribes
                .lock()
                .unwrap()
                .push(subscription.service().to_string());
        }

        async fn watch_ownership(&self, _events: EventSender) -> BusResult<OwnershipWatch> {
            Ok(OwnershipWatch::new(None))
        }
    }

    struct Harness {
        bus: Arc<FakeBus>,
        registry: PlayerRegistry,
        refresh: Arc<RefreshSignal>,
        sink: Arc<OutputSink>,
        sink_path: PathBuf,
        _events_rx: mpsc::UnboundedReceiver<BusEvent>,
    }

    impl Harness {
        fn new(tag: &str) -> Self {
            let bus = Arc::new(FakeBus::default());
            let refresh = Arc::new(RefreshSignal::new());
            let sink_path = std::env::temp_dir().join(format!(
                "mpristext-registry-{}-{}",
                tag,
                std::process::id()
            ));
            let sink = Arc::new(OutputSink::new(sink_path.clone()));
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let registry = PlayerRegistry::new(
                bus.clone(),
                TrackFormatter::new(&FormatConfig::default()),
                sink.clone(),
                refresh.clone(),
                events_tx,
            );
            Self {
                bus,
                registry,
                refresh,
                sink,
                sink_path,
                _events_rx: events_rx,
            }
        }

        /// Consume the pending redraw so later assertions start clean.
        fn drain_redraw(&self) {
            assert_eq!(self.refresh.wait(), Wake::Redraw);
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.sink_path);
        }
    }

    fn track(artist: &str, title: &str) -> TrackMetadata {
        TrackMetadata {
            artist: Some(artist.to_string()),
            title: Some(title.to_string()),
            album: None,
        }
    }

    #[test]
    fn test_player_service_prefix_filter() {
        assert!(is_player_service("org.mpris.MediaPlayer2.vlc"));
        assert!(is_player_service("org.mpris.MediaPlayer2.vlc.instance42"));
        assert!(!is_player_service("org.freedesktop.Notifications"));
        assert!(!is_player_service(":1.42"));
        assert!(!is_player_service("org.mpris.MediaPlayer2"));
    }

    #[test]
    fn test_derived_name_strips_the_prefix() {
        assert_eq!(derived_name("org.mpris.MediaPlayer2.vlc"), "vlc");
        assert_eq!(
            derived_name("org.mpris.MediaPlayer2.vlc.instance42"),
            "vlc.instance42"
        );
    }

    #[test]
    fn test_resolve_selection_fallback_matrix() {
        let roster = vec![
            Player {
                bus_name: VLC.to_string(),
                display_name: "VLC".to_string(),
            },
            Player {
                bus_name: SPOTIFY.to_string(),
                display_name: "Spotify".to_string(),
            },
        ];

        // Present candidate is kept.
        assert_eq!(
            resolve_selection(&roster, Some(SPOTIFY.to_string())),
            Some(SPOTIFY.to_string())
        );
        // Vanished candidate falls back to the first entry.
        assert_eq!(
            resolve_selection(&roster, Some("org.mpris.MediaPlayer2.gone".to_string())),
            Some(VLC.to_string())
        );
        // No candidate picks the first entry too.
        assert_eq!(resolve_selection(&roster, None), Some(VLC.to_string()));
        // Empty roster resolves to nothing no matter the candidate.
        assert_eq!(resolve_selection(&[], Some(VLC.to_string())), None);
        assert_eq!(resolve_selection(&[], None), None);
    }

    #[tokio::test]
    async fn test_refresh_discovers_players_and_publishes_first() {
        let h = Harness::new("discover");
        h.bus
            .set_names(&[":1.7", VLC, "org.freedesktop.Notifications"]);
        h.bus.set_identity(VLC, "VLC media player");
        h.bus.set_metadata(VLC, track("Noisia", "Collider"));

        h.registry.refresh_roster().await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].bus_name, VLC);
        assert_eq!(snapshot.players[0].display_name, "VLC media player");
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
        assert_eq!(h.bus.balance(VLC), 1);

        let expected = "Noisia    \"Collider\"            ";
        assert_eq!(h.sink.state().last_written, expected);
        assert_eq!(fs::read_to_string(&h.sink_path).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_identity_failure_falls_back_to_derived_name() {
        let h = Harness::new("derived");
        h.bus.set_names(&[SPOTIFY]);

        h.registry.refresh_roster().await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.players[0].display_name, "spotify");
    }

    #[tokio::test]
    async fn test_selection_survives_refresh_when_still_present() {
        let h = Harness::new("survive");
        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_identity(SPOTIFY, "Spotify");

        h.registry.refresh_roster().await;
        h.registry.select_by_index(1).await;
        h.registry.refresh_roster().await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(SPOTIFY));
        assert_eq!(h.bus.balance(SPOTIFY), 1);
        assert_eq!(h.bus.balance(VLC), 0);
    }

    #[tokio::test]
    async fn test_select_active_switches_subscription_and_output() {
        let h = Harness::new("select");
        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_identity(SPOTIFY, "Spotify");
        h.bus.set_metadata(VLC, track("Noisia", "Collider"));
        h.bus.set_metadata(SPOTIFY, track("Camo & Krooked", "Atlas"));

        h.registry.refresh_roster().await;
        h.drain_redraw();
        h.registry.select_active(Some(SPOTIFY.to_string())).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(SPOTIFY));
        assert_eq!(h.bus.balance(SPOTIFY), 1);
        assert_eq!(h.bus.balance(VLC), 0);
        assert_eq!(
            h.sink.state().last_written,
            "Camo & Krooked    \"Atlas\"            "
        );
        assert!(h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_select_active_unknown_candidate_falls_back_to_first() {
        let h = Harness::new("selectgone");
        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_identity(SPOTIFY, "Spotify");
        h.bus.set_metadata(VLC, track("Noisia", "Collider"));

        h.registry.refresh_roster().await;
        h.registry
            .select_active(Some("org.mpris.MediaPlayer2.gone".to_string()))
            .await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
        assert_eq!(h.bus.balance(VLC), 1);
        assert_eq!(h.bus.balance(SPOTIFY), 0);
        assert_eq!(
            h.sink.state().last_written,
            "Noisia    \"Collider\"            "
        );
    }

    #[tokio::test]
    async fn test_select_active_with_empty_roster_clears_output() {
        let h = Harness::new("selectnone");

        h.registry.select_active(Some(VLC.to_string())).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active, None);
        assert_eq!(h.bus.balance(VLC), 0);
        // The empty publish still happens: the sink file exists and is empty.
        assert_eq!(fs::read_to_string(&h.sink_path).unwrap(), "");
        assert!(h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_vanished_active_falls_back_to_first() {
        let h = Harness::new("vanish");
        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_identity(SPOTIFY, "Spotify");

        h.registry.refresh_roster().await;
        h.registry.select_by_index(1).await;

        h.bus.set_names(&[VLC]);
        h.registry.handle_name_owner_changed(SPOTIFY).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
        assert_eq!(h.bus.balance(SPOTIFY), 0);
        assert_eq!(h.bus.balance(VLC), 1);
    }

    #[tokio::test]
    async fn test_empty_roster_clears_selection_and_sink() {
        let h = Harness::new("empty");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_metadata(VLC, track("A", "B"));

        h.registry.refresh_roster().await;
        assert!(!h.sink.state().last_written.is_empty());

        h.bus.set_names(&[]);
        h.registry.handle_name_owner_changed(VLC).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active, None);
        assert!(snapshot.players.is_empty());
        assert_eq!(h.bus.balance(VLC), 0);
        assert_eq!(h.sink.state().last_written, "");
    }

    #[tokio::test]
    async fn test_select_by_index_out_of_range_is_inert() {
        let h = Harness::new("oob");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;
        h.drain_redraw();
        let before = h.sink.state();

        h.registry.select_by_index(5).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
        assert_eq!(h.bus.balance(VLC), 1);
        assert_eq!(h.sink.state(), before);
        assert!(!h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_foreign_name_change_causes_no_side_effects() {
        let h = Harness::new("foreign");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;
        h.drain_redraw();
        let listed = h.bus.list_calls.load(Ordering::SeqCst);

        h.registry
            .handle_name_owner_changed("org.freedesktop.Notifications")
            .await;

        assert_eq!(h.bus.list_calls.load(Ordering::SeqCst), listed);
        assert!(!h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_player_name_change_triggers_refresh() {
        let h = Harness::new("appear");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;

        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(SPOTIFY, "Spotify");
        h.registry.handle_name_owner_changed(SPOTIFY).await;

        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.players.len(), 2);
        // The previous selection still stands.
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
    }

    #[tokio::test]
    async fn test_metadata_update_for_active_player_publishes() {
        let h = Harness::new("update");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;
        h.drain_redraw();

        let update = PlayerUpdate {
            metadata: Some(track("Camo & Krooked", "Atlas")),
        };
        h.registry.handle_player_update(VLC, update).await;

        assert_eq!(
            h.sink.state().last_written,
            "Camo & Krooked    \"Atlas\"            "
        );
        assert!(h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_update_from_nonactive_player_is_dropped() {
        let h = Harness::new("stale");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;
        h.drain_redraw();
        let before = h.sink.state();

        let update = PlayerUpdate {
            metadata: Some(track("Ghost", "Straggler")),
        };
        h.registry.handle_player_update(SPOTIFY, update).await;

        assert_eq!(h.sink.state(), before);
        assert!(!h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_update_without_metadata_entry_is_dropped() {
        let h = Harness::new("nometa");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");

        h.registry.refresh_roster().await;
        h.drain_redraw();
        let before = h.sink.state();

        h.registry
            .handle_player_update(VLC, PlayerUpdate::default())
            .await;

        assert_eq!(h.sink.state(), before);
        assert!(!h.refresh.redraw_pending());
    }

    #[tokio::test]
    async fn test_subscription_balance_over_reselections() {
        let h = Harness::new("balance");
        h.bus.set_names(&[VLC, SPOTIFY]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_identity(SPOTIFY, "Spotify");

        h.registry.refresh_roster().await;
        h.registry.select_by_index(1).await;
        h.registry.select_by_index(0).await;
        h.registry.select_by_index(0).await;
        h.registry.select_by_index(1).await;

        // Exactly one live subscription, and it follows the active player.
        assert_eq!(h.bus.balance(SPOTIFY), 1);
        assert_eq!(h.bus.balance(VLC), 0);

        h.bus.set_names(&[]);
        h.registry.refresh_roster().await;
        assert_eq!(h.bus.balance(SPOTIFY), 0);
        assert_eq!(h.bus.balance(VLC), 0);
    }

    #[tokio::test]
    async fn test_failed_subscription_keeps_selection_until_refresh() {
        let h = Harness::new("resub");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");
        h.bus.set_metadata(VLC, track("Noisia", "Collider"));
        h.bus.break_subscription(VLC);

        h.registry.refresh_roster().await;

        // Selection and publish stand even though no subscription exists.
        let snapshot = h.registry.snapshot().await;
        assert_eq!(snapshot.active.as_deref(), Some(VLC));
        assert_eq!(h.bus.balance(VLC), 0);
        assert_eq!(
            h.sink.state().last_written,
            "Noisia    \"Collider\"            "
        );

        // The next ownership event reruns the selection and subscribes.
        h.bus.repair_subscription(VLC);
        h.registry.handle_name_owner_changed(VLC).await;
        assert_eq!(h.bus.balance(VLC), 1);
        assert_eq!(h.registry.snapshot().await.active.as_deref(), Some(VLC));
    }

    #[tokio::test]
    async fn test_metadata_failure_publishes_empty_fields() {
        let h = Harness::new("nofetch");
        h.bus.set_names(&[VLC]);
        h.bus.set_identity(VLC, "VLC");
        // No metadata behind VLC: the fetch fails and the publish still
        // happens with empty fields.
        h.registry.refresh_roster().await;

        assert_eq!(h.sink.state().last_written, "            ");
    }
}
