//! Cross-view refresh signal.
//!
//! A `watch` channel carrying a generation counter. Triggers bump the
//! counter; subscribers wake on change and refetch. Several triggers between
//! two wake-ups coalesce into one, which is fine because every wake-up does
//! a full refetch of current store state.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct RefreshSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_modify(|generation| *generation += 1);
        tracing::debug!(generation = *self.tx.borrow(), "refresh triggered");
    }

    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Subscribe to future triggers. Triggers that happened before the call
    /// are considered seen.
    pub fn subscribe(&self) -> RefreshSubscriber {
        RefreshSubscriber {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RefreshSubscriber {
    rx: watch::Receiver<u64>,
}

impl RefreshSubscriber {
    /// Wait for the next trigger and return its generation.
    ///
    /// Returns `None` once every clone of the signal is dropped and the
    /// last generation has been observed.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generations_increase() {
        let signal = RefreshSignal::new();
        let mut sub = signal.subscribe();

        signal.trigger();
        assert_eq!(sub.changed().await, Some(1));
        signal.trigger();
        signal.trigger();
        assert_eq!(sub.changed().await, Some(3));
        assert_eq!(signal.generation(), 3);
    }

    #[tokio::test]
    async fn dropping_the_signal_ends_subscribers() {
        let signal = RefreshSignal::new();
        let mut sub = signal.subscribe();
        let clone = signal.clone();

        drop(signal);
        clone.trigger();
        drop(clone);

        assert_eq!(sub.changed().await, Some(1));
        assert_eq!(sub.changed().await, None);
    }
}
