use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Slot {
    next_token: u64,
    active: Option<(u64, mpsc::UnboundedSender<()>)>,
}

/// Producer side of the "load more" signal (scroll threshold, key press,
/// timer). Signals sent while nobody is subscribed are dropped.
#[derive(Debug, Clone, Default)]
pub struct TriggerSource {
    slot: Arc<Mutex<Slot>>,
}

impl TriggerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one signal. Returns whether a subscriber was registered.
    pub fn signal(&self) -> bool {
        match &lock(&self.slot).active {
            Some((_, tx)) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.slot).active.is_some()
    }

    /// Register the single consumer. A newer subscription replaces an older
    /// one, which then yields no further signals.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = lock(&self.slot);
        let token = slot.next_token;
        slot.next_token += 1;
        slot.active = Some((token, tx));
        Subscription {
            token,
            rx,
            slot: self.slot.clone(),
        }
    }
}

/// Consumer handle. Dropping it (or calling [`Subscription::dispose`]) is the
/// only way to unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    token: u64,
    rx: mpsc::UnboundedReceiver<()>,
    slot: Arc<Mutex<Slot>>,
}

impl Subscription {
    /// Wait for the next signal. `None` once superseded by a newer subscription.
    pub async fn next(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take a pending signal without waiting.
    pub fn try_next(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if matches!(&slot.active, Some((token, _)) if *token == self.token) {
            slot.active = None;
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
