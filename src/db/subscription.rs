// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live query handles.

use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::MoodEvent;

/// One delivery from a live query: the complete current window, or the
/// error reported by the backend.
pub type EventWindow = Result<Vec<MoodEvent>>;

const WINDOW_BUFFER: usize = 16;

/// A live event query.
///
/// Every item is the full window at that moment, not a delta. The backend
/// listener stays registered until `close` is awaited or the handle is
/// dropped, so owners must keep it no longer than the screen it feeds.
pub struct EventSubscription {
    windows: mpsc::Receiver<EventWindow>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl EventSubscription {
    /// Run `worker` in the background, handing it the window sender and a
    /// shutdown signal it must honour by tearing down its listener.
    pub fn spawn<F, Fut>(worker: F) -> Self
    where
        F: FnOnce(mpsc::Sender<EventWindow>, oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (window_tx, window_rx) = mpsc::channel(WINDOW_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(worker(window_tx, shutdown_rx));

        Self {
            windows: window_rx,
            shutdown: Some(shutdown_tx),
            worker: Some(handle),
        }
    }

    /// A subscription that delivers a single window and then ends, with no
    /// backend listener behind it.
    pub fn ready(events: Vec<MoodEvent>) -> Self {
        let (window_tx, window_rx) = mpsc::channel(1);
        // Capacity is 1 and the channel is fresh, so this cannot fail.
        let _ = window_tx.try_send(Ok(events));

        Self {
            windows: window_rx,
            shutdown: None,
            worker: None,
        }
    }

    /// Next window. `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<EventWindow> {
        self.windows.recv().await
    }

    /// Next window if one is already buffered.
    pub fn try_next(&mut self) -> Option<EventWindow> {
        self.windows.try_recv().ok()
    }

    /// True if a backend listener is attached.
    pub fn is_live(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Tear down the backend listener and wait for it to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Subscription worker ended abnormally");
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        // The worker owns the listener; signalling is enough for it to
        // unregister in the background.
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionalState;

    #[tokio::test]
    async fn test_ready_yields_once_then_ends() {
        let event = MoodEvent::new("t", "r", EmotionalState::Sad, None);
        let mut sub = EventSubscription::ready(vec![event.clone()]);

        assert!(!sub.is_live());
        assert_eq!(sub.next().await.unwrap().unwrap(), vec![event]);
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_signals_worker() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let sub = EventSubscription::spawn(move |windows, shutdown| async move {
            let _ = windows.send(Ok(Vec::new())).await;
            let _ = shutdown.await;
            let _ = seen_tx.send(());
        });

        sub.close().await;
        assert!(seen_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_signals_worker() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let sub = EventSubscription::spawn(move |_windows, shutdown| async move {
            let _ = shutdown.await;
            let _ = seen_tx.send(());
        });

        drop(sub);
        assert!(seen_rx.await.is_ok());
    }
}
