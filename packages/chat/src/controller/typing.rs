//! Typing signal debounce.
//!
//! Every input emits `typing=true` and restarts an idle timer. When the timer
//! expires (or the burst is ended explicitly) exactly one `typing=false` is
//! emitted for the burst.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::{connection::ChatLink, domain::UserId};

struct PendingStop {
    receiver_id: UserId,
    /// Set by whoever emits `typing=false` first.
    fired: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

pub struct TypingDebouncer {
    link: Arc<dyn ChatLink>,
    idle: Duration,
    pending: Option<PendingStop>,
}

impl TypingDebouncer {
    pub fn new(link: Arc<dyn ChatLink>, idle: Duration) -> Self {
        Self {
            link,
            idle,
            pending: None,
        }
    }

    /// Register an input towards `receiver_id`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&mut self, receiver_id: &UserId) {
        if let Some(pending) = self.pending.take() {
            if pending.receiver_id != *receiver_id {
                Self::fire(&self.link, pending);
            } else {
                pending.timer.abort();
            }
        }

        self.link.send_typing(receiver_id, true);

        let fired = Arc::new(AtomicBool::new(false));
        let timer = {
            let link = Arc::clone(&self.link);
            let receiver_id = receiver_id.clone();
            let fired = Arc::clone(&fired);
            let idle = self.idle;
            tokio::spawn(async move {
                tokio::time::sleep(idle).await;
                if !fired.swap(true, Ordering::AcqRel) {
                    tracing::trace!("Typing idle, sending typing=false to '{}'", receiver_id);
                    link.send_typing(&receiver_id, false);
                }
            })
        };

        self.pending = Some(PendingStop {
            receiver_id: receiver_id.clone(),
            fired,
            timer,
        });
    }

    /// End the current burst now, emitting `typing=false` unless the timer already did.
    pub fn stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            Self::fire(&self.link, pending);
        }
    }

    /// Drop the current burst without emitting anything.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
        }
    }

    /// Whether a burst is open and its `typing=false` not yet sent.
    pub fn is_active(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.fired.load(Ordering::Acquire))
    }

    fn fire(link: &Arc<dyn ChatLink>, pending: PendingStop) {
        pending.timer.abort();
        if !pending.fired.swap(true, Ordering::AcqRel) {
            link.send_typing(&pending.receiver_id, false);
        }
    }
}

impl Drop for TypingDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
