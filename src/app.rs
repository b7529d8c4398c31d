//! Wires the pieces together and runs them until exit.

use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use ratatui::DefaultTerminal;
use tokio::runtime::Handle;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use crate::bus::PlayerBus;
use crate::bus::mpris::MprisBus;
use crate::config::Config;
use crate::format::TrackFormatter;
use crate::input;
use crate::listener;
use crate::refresh::RefreshSignal;
use crate::registry::PlayerRegistry;
use crate::render;
use crate::sink::OutputSink;

pub async fn run(config: Config, terminal: DefaultTerminal) -> color_eyre::Result<()> {
    let refresh = Arc::new(RefreshSignal::new());
    let sink = Arc::new(OutputSink::new(config.output.file.clone()));

    // Fail before touching the bus if the output file is not writable.
    sink.write("")
        .wrap_err_with(|| format!("cannot write {}", sink.path().display()))?;

    let bus: Arc<dyn PlayerBus> = Arc::new(
        MprisBus::connect()
            .await
            .wrap_err("cannot connect to the session bus")?,
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let registry = Arc::new(PlayerRegistry::new(
        bus.clone(),
        TrackFormatter::new(&config.format),
        sink.clone(),
        refresh.clone(),
        events_tx.clone(),
    ));

    // The ownership watch must be standing before the first roster scan,
    // or players appearing in between would go unnoticed.
    let _ownership_watch = bus
        .watch_ownership(events_tx)
        .await
        .wrap_err("cannot watch bus name changes")?;
    registry.refresh_roster().await;

    let dispatcher = tokio::spawn(listener::run(events_rx, registry.clone()));
    spawn_signal_tasks(&refresh)?;

    // Rendering and input both block on OS calls; each gets its own thread.
    let render_thread = {
        let registry = registry.clone();
        let sink = sink.clone();
        let refresh = refresh.clone();
        std::thread::spawn(move || render::run(terminal, registry, sink, refresh))
    };
    let input_thread = {
        let runtime = Handle::current();
        let registry = registry.clone();
        let refresh = refresh.clone();
        std::thread::spawn(move || input::run(runtime, registry, refresh))
    };

    tokio::task::spawn_blocking(move || {
        if input_thread.join().is_err() {
            log::error!("input thread panicked");
        }
        if render_thread.join().is_err() {
            log::error!("render thread panicked");
        }
    })
    .await?;

    // Both loops are gone; nothing consumes bus events anymore.
    dispatcher.abort();
    Ok(())
}

fn spawn_signal_tasks(refresh: &Arc<RefreshSignal>) -> color_eyre::Result<()> {
    let mut resize = signal(SignalKind::window_change())?;
    let winch_refresh = refresh.clone();
    tokio::spawn(async move {
        while resize.recv().await.is_some() {
            winch_refresh.request_redraw();
        }
    });

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let exit_refresh = refresh.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => log::info!("Received SIGINT, shutting down gracefully"),
            _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down gracefully"),
        }
        exit_refresh.request_exit();
    });

    Ok(())
}
