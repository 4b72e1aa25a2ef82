//! Best-effort telemetry.
//!
//! Handlers record side events (`level_create`, `draft_delete`, ...) after
//! their primary write through [`Tracker::fire`], which never fails the
//! request. `POST /t` uses [`Tracker::send`] so the client sees the outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::database::models::event::{self, Event};
use crate::database::models::ModelResult;
use crate::database::Database;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &Event) -> ModelResult<()>;
}

/// Writes events to the `events` table.
#[derive(Clone, Debug)]
pub struct PgEventSink {
    db: Database,
}

impl PgEventSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventSink for PgEventSink {
    async fn send(&self, event: &Event) -> ModelResult<()> {
        event::insert(self.db.pool(), event).await
    }
}

#[derive(Clone)]
pub struct Tracker {
    sink: Arc<dyn EventSink>,
    in_flight: Arc<AtomicUsize>,
}

impl Tracker {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Events handed to [`Tracker::fire`] that have not reached the sink yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn send(&self, event: &Event) -> ModelResult<()> {
        self.sink.send(event).await
    }

    /// Sends in the background; a failure is logged and dropped.
    pub fn fire(&self, event: Event) {
        let sink = Arc::clone(&self.sink);
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::AcqRel);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&event).await {
                warn!(event_type = %event.event_type, "dropped tracking event: {}", e);
            }
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<Event>>,
        notify: Notify,
    }

    #[async_trait]
    impl EventSink for Recording {
        async fn send(&self, event: &Event) -> ModelResult<()> {
            self.events.lock().unwrap().push(event.clone());
            self.notify.notify_one();
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventSink for Failing {
        async fn send(&self, _event: &Event) -> ModelResult<()> {
            Err(crate::database::models::ModelError::Invalid("sink down".to_string()))
        }
    }

    #[tokio::test]
    async fn fire_delivers_in_the_background() {
        let sink = Arc::new(Recording::default());
        let tracker = Tracker::new(sink.clone());

        tracker.fire(Event::new("level_create").uid(3).level(9));
        sink.notify.notified().await;

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level_id, Some(9));
    }

    #[derive(Default)]
    struct Gated {
        release: Notify,
    }

    #[async_trait]
    impl EventSink for Gated {
        async fn send(&self, _event: &Event) -> ModelResult<()> {
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn in_flight_counts_undelivered_events() {
        let sink = Arc::new(Gated::default());
        let tracker = Tracker::new(sink.clone());
        assert_eq!(tracker.in_flight(), 0);

        tracker.fire(Event::new("draft_delete"));
        assert_eq!(tracker.in_flight(), 1);

        sink.release.notify_one();
        while tracker.in_flight() > 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn send_surfaces_sink_errors() {
        let tracker = Tracker::new(Arc::new(Failing));
        assert!(tracker.send(&Event::new("game_start")).await.is_err());
        // fire swallows the same failure
        tracker.fire(Event::new("game_start"));
    }
}
