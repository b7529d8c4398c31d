//! Redraw and exit coordination between the actors.
//!
//! One mutex+condvar pair carries two flags: `needs_redraw`, raised by
//! anything that changes what the screen should show, and `should_exit`,
//! raised once when shutdown is requested. Redraw requests coalesce:
//! however many arrive while the renderer is busy, it wakes once and
//! repaints once.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
struct State {
    needs_redraw: bool,
    should_exit: bool,
}

/// What a renderer wait woke up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Something changed; repaint the screen.
    Redraw,
    /// Shutdown was requested; draw the exit screen and stop.
    Exit,
}

/// Shared redraw/exit signal.
///
/// `needs_redraw` starts raised so the first frame paints before any bus
/// or keyboard event arrives. `should_exit` is sticky: once raised, every
/// subsequent [`wait`](Self::wait) returns [`Wake::Exit`].
#[derive(Debug)]
pub struct RefreshSignal {
    state: Mutex<State>,
    wakeup: Condvar,
}

impl RefreshSignal {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                needs_redraw: true,
                should_exit: false,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Ask for a repaint. Callable from any thread; repeated calls before
    /// the renderer wakes collapse into a single redraw.
    pub fn request_redraw(&self) {
        let mut state = self.lock_state();
        state.needs_redraw = true;
        self.wakeup.notify_all();
    }

    /// Ask for shutdown and wake everyone currently waiting.
    pub fn request_exit(&self) {
        let mut state = self.lock_state();
        state.should_exit = true;
        self.wakeup.notify_all();
    }

    /// Whether shutdown has been requested. Cheap enough for poll loops.
    pub fn should_exit(&self) -> bool {
        self.lock_state().should_exit
    }

    /// Block until there is something to do. Exit wins over redraw; a
    /// redraw wake clears the flag, so the caller owns exactly one repaint.
    pub fn wait(&self) -> Wake {
        let mut state = self.lock_state();
        loop {
            if state.should_exit {
                return Wake::Exit;
            }
            if state.needs_redraw {
                state.needs_redraw = false;
                return Wake::Redraw;
            }
            state = match self.wakeup.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    #[cfg(test)]
    pub(crate) fn redraw_pending(&self) -> bool {
        self.lock_state().needs_redraw
    }

    // The state is two bools; a poisoned lock still holds a usable value.
    fn lock_state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}
