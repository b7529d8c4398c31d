//! Drawing loop on a dedicated thread.

use std::sync::Arc;

use ratatui::DefaultTerminal;

use crate::refresh::{RefreshSignal, Wake};
use crate::registry::PlayerRegistry;
use crate::sink::OutputSink;
use crate::ui;

/// Sleep until woken, then draw one frame from fresh state copies.
/// Redraw requests that pile up while a frame is in flight collapse
/// into a single wake, so the loop never draws stale bursts.
pub fn run(
    mut terminal: DefaultTerminal,
    registry: Arc<PlayerRegistry>,
    sink: Arc<OutputSink>,
    refresh: Arc<RefreshSignal>,
) {
    loop {
        match refresh.wait() {
            Wake::Exit => break,
            Wake::Redraw => {}
        }

        let roster = registry.snapshot_blocking();
        let output = sink.state();
        let path = sink.path().display().to_string();

        let drawn = terminal.draw(|frame| ui::screen::render(frame, &roster, &output, &path));
        if let Err(e) = drawn {
            log::error!("could not draw frame: {e}");
            refresh.request_exit();
            break;
        }
    }

    // Parting frame; failures no longer matter.
    let _ = terminal.draw(|frame| ui::screen::render_exit(frame));
}
