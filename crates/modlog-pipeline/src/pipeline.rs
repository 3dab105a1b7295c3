//! The event loop tying normalization, correlation and dispatch together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::correlate::AuditCorrelator;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::normalize::normalize;
use crate::platform::EventSource;
use crate::raw::RawEvent;

/// Default time [`Pipeline::run`] waits for in-flight records once the
/// source closes.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs every raw event through normalize, correlate and dispatch.
#[derive(Debug, Clone)]
pub struct Pipeline {
    correlator: Arc<AuditCorrelator>,
    dispatcher: Arc<Dispatcher>,
    drain_timeout: Duration,
}

impl Pipeline {
    pub fn new(correlator: AuditCorrelator, dispatcher: Dispatcher) -> Self {
        Self {
            correlator: Arc::new(correlator),
            dispatcher: Arc::new(dispatcher),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Normalizes `event` and spawns one task per produced record.
    ///
    /// Returns immediately; the handles resolve to each record's outcome.
    /// Records from one event are independent: a slow audit fetch or a
    /// failed send for one never delays or affects another.
    pub fn handle(&self, event: RawEvent) -> Vec<JoinHandle<DispatchOutcome>> {
        let trace_id = Uuid::new_v4();
        let span = tracing::info_span!("event", %trace_id, kind = event.kind());

        let records = {
            let _enter = span.enter();
            normalize(event, Utc::now())
        };
        if records.len() == 0 {
            tracing::trace!(parent: &span, "event produced no records");
        }

        records
            .map(|record| {
                let correlator = Arc::clone(&self.correlator);
                let dispatcher = Arc::clone(&self.dispatcher);
                let record_span = tracing::debug_span!(
                    parent: &span,
                    "record",
                    guild_id = %record.guild_id,
                    event_type = %record.event_type,
                );
                tokio::spawn(
                    async move {
                        let record = correlator.enrich(record).await;
                        dispatcher.dispatch(&record).await
                    }
                    .instrument(record_span),
                )
            })
            .collect()
    }

    /// Pulls events from `source` until it closes, then waits up to the
    /// drain timeout for records still in flight. Records unfinished at the
    /// deadline are aborted and counted in the log.
    ///
    /// Each event is handed off without waiting for earlier ones to finish.
    pub async fn run<S: EventSource>(&self, mut source: S) {
        tracing::info!("event pipeline started");
        let mut in_flight: Vec<JoinHandle<DispatchOutcome>> = Vec::new();
        while let Some(event) = source.next_event().await {
            in_flight.retain(|handle| !handle.is_finished());
            in_flight.extend(self.handle(event));
        }

        tracing::info!(in_flight = in_flight.len(), "event source closed, draining records");
        let drain = async {
            for handle in in_flight.iter_mut() {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "record task failed");
                }
            }
        };
        if tokio::time::timeout(self.drain_timeout, drain).await.is_err() {
            let mut abandoned = 0usize;
            for handle in in_flight.iter().filter(|handle| !handle.is_finished()) {
                handle.abort();
                abandoned += 1;
            }
            tracing::warn!(abandoned, "drain timeout reached, in-flight records dropped");
        }
        tracing::info!("pipeline stopped");
    }
}
