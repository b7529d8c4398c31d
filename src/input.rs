//! Keyboard handling on a dedicated thread.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::runtime::Handle;

use crate::refresh::RefreshSignal;
use crate::registry::PlayerRegistry;

/// How long each poll waits before re-checking the exit flag.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Read keys until exit. Digits select a roster entry by position,
/// `q` quits, everything else is ignored.
pub fn run(runtime: Handle, registry: Arc<PlayerRegistry>, refresh: Arc<RefreshSignal>) {
    while !refresh.should_exit() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                log::error!("could not poll terminal events: {e}");
                refresh.request_exit();
                break;
            }
        }

        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                log::error!("could not read terminal event: {e}");
                refresh.request_exit();
                break;
            }
        };

        let Event::Key(key) = event else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                log::info!("quit requested");
                refresh.request_exit();
                break;
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let index = (c as u8 - b'0') as usize;
                runtime.block_on(registry.select_by_index(index));
            }
            _ => {}
        }
    }
}
