//! Dispatcher - dedup, priority routing and batched delivery

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use contracts::{
    ContractError, DestinationKey, DispatchConfig, DispatcherSettings, EmailNotification, Message,
    Priority, Transport, EMAIL_NOTIFICATIONS,
};
use observability::{DeliveryMode, DeliveryStatsAggregator, DeliverySummary};

use crate::batch::BatchBuffers;
use crate::dedup::DedupCache;
use crate::error::DispatchError;
use crate::fingerprint::fingerprint;
use crate::metrics::{DispatcherMetrics, MetricsSnapshot};

/// Result of a successful `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// HIGH priority message handed to the transport
    Delivered { id: Uuid },
    /// Buffered; the flush timer is armed
    Enqueued { id: Uuid, pending: usize },
    /// Buffer reached `batch_size` and was flushed within the call
    Flushed { id: Uuid, batch_len: usize },
    /// Same `(kind, payload)` seen within the dedup window; nothing sent
    DuplicateSuppressed { fingerprint: String },
}

impl SubmitOutcome {
    /// Id of the new message, if one was created
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Delivered { id } | Self::Enqueued { id, .. } | Self::Flushed { id, .. } => {
                Some(*id)
            }
            Self::DuplicateSuppressed { .. } => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateSuppressed { .. })
    }
}

/// A batch flush that failed; its messages are not requeued
#[derive(Debug, Clone)]
pub struct FlushFailure {
    pub destination: DestinationKey,
    pub error: String,
    pub messages: Vec<Message>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<T> {
    config: DispatchConfig,
    transport: T,
}

impl<T> DispatcherBuilder<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatchConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Build the dispatcher
    ///
    /// # Errors
    /// `Configuration` if the batching settings are out of range
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(transport = %self.transport.name(), destinations = self.config.destinations.len())
    )]
    pub fn build(self) -> Result<Dispatcher<T>, DispatchError> {
        self.config.check().map_err(DispatchError::Configuration)?;

        let settings = self.config.dispatcher.clone();
        let (failures, _) = broadcast::channel(settings.failure_channel_capacity);

        info!(
            batch_size = settings.batch_size,
            batch_delay_ms = settings.batch_delay_ms,
            dedup_capacity = settings.dedup_capacity,
            "Dispatcher created"
        );

        Ok(Dispatcher {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    dedup: DedupCache::new(settings.dedup_capacity),
                    buffers: BatchBuffers::new(),
                    timer: None,
                    timer_generation: 0,
                    closed: false,
                }),
                transport: self.transport,
                config: self.config,
                settings,
                failures,
                metrics: DispatcherMetrics::new(),
                stats: Mutex::new(DeliveryStatsAggregator::new()),
            }),
        })
    }
}

/// Mutable dispatcher state, guarded by one lock
struct State {
    dedup: DedupCache,
    buffers: BatchBuffers,
    /// Armed flush timer
    timer: Option<ArmedTimer>,
    /// Bumped on every arm; a timer task only acts if it still owns the current one
    timer_generation: u64,
    closed: bool,
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner<T> {
    transport: T,
    config: DispatchConfig,
    settings: DispatcherSettings,
    state: Mutex<State>,
    failures: broadcast::Sender<FlushFailure>,
    metrics: DispatcherMetrics,
    stats: Mutex<DeliveryStatsAggregator>,
}

/// Cloneable handle to a running dispatcher
pub struct Dispatcher<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What `submit` decided under the lock
enum Route {
    SendNow(Message),
    Flush(Vec<Message>),
    Buffered(usize),
}

impl<T> Dispatcher<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Submit a message
    ///
    /// HIGH is sent before this returns; MEDIUM/LOW are buffered per
    /// destination and flushed on `batch_size` or when the timer fires.
    ///
    /// # Errors
    /// - `Configuration` if the destination does not resolve (no state is touched)
    /// - `Transport` if an immediate send or synchronous flush fails
    /// - `ShutDown` after `shutdown()`
    #[instrument(
        name = "dispatcher_submit",
        skip(self, payload),
        fields(destination = %destination, kind = %kind)
    )]
    pub async fn submit(
        &self,
        destination: &str,
        kind: &str,
        payload: Value,
        priority: Option<Priority>,
    ) -> Result<SubmitOutcome, DispatchError> {
        let priority = priority.unwrap_or_default();

        let target = match self.inner.config.resolve(destination) {
            Ok(target) => target,
            Err(e) => {
                self.inner.metrics.inc_configuration_errors();
                observability::record_configuration_error(destination);
                warn!(error = %e, "Submission rejected");
                return Err(DispatchError::Configuration(e));
            }
        };

        let fingerprint = fingerprint(kind, &payload);
        let message = Message::new(target.name.clone(), kind, payload, priority);
        let id = message.id;

        let route = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(DispatchError::ShutDown);
            }

            if !state.dedup.insert(fingerprint.clone(), id) {
                drop(state);
                self.inner.metrics.inc_duplicates();
                observability::record_duplicate(destination);
                warn!(fingerprint = %fingerprint, "Duplicate message suppressed");
                return Ok(SubmitOutcome::DuplicateSuppressed { fingerprint });
            }
            observability::record_dedup_size(state.dedup.len());

            if priority.is_immediate() {
                Route::SendNow(message)
            } else {
                let pending = state.buffers.push(message);
                if pending >= self.inner.settings.batch_size {
                    let batch = state.buffers.take(destination);
                    if state.buffers.is_empty() {
                        Self::disarm_timer(&mut state);
                    }
                    Route::Flush(batch)
                } else {
                    self.arm_timer(&mut state);
                    Route::Buffered(pending)
                }
            }
        };

        self.inner.metrics.inc_submitted();
        observability::record_submission(destination, priority.as_str());

        match route {
            Route::SendNow(message) => {
                self.inner.send_single(message).await?;
                Ok(SubmitOutcome::Delivered { id })
            }
            Route::Flush(batch) => {
                observability::record_buffer_depth(destination, 0);
                match self.inner.deliver_batch(target.name, batch).await {
                    Ok(batch_len) => Ok(SubmitOutcome::Flushed { id, batch_len }),
                    Err(failure) => Err(DispatchError::transport(
                        failure.destination.as_str(),
                        failure.source,
                    )),
                }
            }
            Route::Buffered(pending) => {
                observability::record_buffer_depth(destination, pending);
                debug!(message_id = %id, pending, "Message buffered");
                Ok(SubmitOutcome::Enqueued { id, pending })
            }
        }
    }

    /// Submit a typed email notification to `emailNotifications`
    ///
    /// Priority defaults to HIGH.
    pub async fn send_email_notification(
        &self,
        notification: EmailNotification,
        priority: Option<Priority>,
    ) -> Result<SubmitOutcome, DispatchError> {
        let kind = notification.kind.as_str();
        let payload = serde_json::to_value(&notification)
            .map_err(|e| DispatchError::Payload(ContractError::Encode(e)))?;

        self.submit(
            EMAIL_NOTIFICATIONS,
            kind,
            payload,
            Some(priority.unwrap_or(Priority::High)),
        )
        .await
    }

    /// Flush every non-empty buffer now and disarm the timer
    ///
    /// Returns the failed flushes; their messages are dropped.
    #[instrument(name = "dispatcher_flush_all", skip(self))]
    pub async fn flush_all(&self) -> Vec<FlushFailure> {
        let batches = {
            let mut state = self.inner.lock_state();
            Self::disarm_timer(&mut state);
            state.buffers.take_all()
        };
        self.inner.deliver_all(batches).await
    }

    /// Stop accepting submissions and drain the buffers
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Vec<FlushFailure> {
        self.inner.lock_state().closed = true;
        let failures = self.flush_all().await;
        info!(failed_flushes = failures.len(), "Dispatcher shutdown complete");
        failures
    }

    /// Receive failures of timer-driven flushes
    pub fn subscribe_failures(&self) -> broadcast::Receiver<FlushFailure> {
        self.inner.failures.subscribe()
    }

    /// Buffered messages for one destination
    pub fn pending(&self, destination: &str) -> usize {
        self.inner.lock_state().buffers.pending(destination)
    }

    /// Buffered messages across all destinations
    pub fn pending_total(&self) -> usize {
        self.inner.lock_state().buffers.total()
    }

    /// Fingerprints currently held by the dedup cache
    pub fn dedup_len(&self) -> usize {
        self.inner.lock_state().dedup.len()
    }

    pub fn timer_armed(&self) -> bool {
        self.inner.lock_state().timer.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock_state().closed
    }

    /// Get dispatcher counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Aggregated delivery statistics
    pub fn delivery_summary(&self) -> DeliverySummary {
        self.inner
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary()
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    fn arm_timer(&self, state: &mut State) {
        if state.timer.is_some() {
            return;
        }

        state.timer_generation = state.timer_generation.wrapping_add(1);
        let generation = state.timer_generation;
        let inner = Arc::clone(&self.inner);
        let delay = self.inner.settings.batch_delay();
        debug!(delay_ms = self.inner.settings.batch_delay_ms, generation, "Flush timer armed");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.on_timer(generation).await;
        });
        state.timer = Some(ArmedTimer { generation, handle });
    }

    /// Disarm the current timer
    ///
    /// The abort only cancels a task still sleeping; one that already woke
    /// finds its generation stale in `on_timer` and leaves the state alone.
    fn disarm_timer(state: &mut State) {
        if let Some(timer) = state.timer.take() {
            timer.handle.abort();
        }
    }
}

/// A failed batch, with the original transport error
struct BatchFailure {
    destination: DestinationKey,
    source: ContractError,
    messages: Vec<Message>,
}

impl BatchFailure {
    fn into_flush_failure(self) -> FlushFailure {
        FlushFailure {
            destination: self.destination,
            error: self.source.to_string(),
            messages: self.messages,
        }
    }
}

impl<T> Inner<T>
where
    T: Transport + Send + Sync + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer body: take everything, disarm, deliver, publish failures
    #[instrument(name = "dispatcher_timer_flush", skip(self))]
    async fn on_timer(&self, generation: u64) {
        let batches = {
            let mut state = self.lock_state();
            let current = state
                .timer
                .as_ref()
                .is_some_and(|timer| timer.generation == generation);
            if !current {
                debug!("Stale flush timer, skipping");
                return;
            }
            state.timer = None;
            state.buffers.take_all()
        };

        for failure in self.deliver_all(batches).await {
            if self.failures.send(failure).is_err() {
                debug!("No failure subscribers");
            }
        }
    }

    /// Deliver batches one destination at a time
    async fn deliver_all(&self, batches: Vec<(DestinationKey, Vec<Message>)>) -> Vec<FlushFailure> {
        let mut failures = Vec::new();
        for (destination, messages) in batches {
            observability::record_buffer_depth(destination.as_str(), 0);
            if let Err(failure) = self.deliver_batch(destination, messages).await {
                failures.push(failure.into_flush_failure());
            }
        }
        failures
    }

    async fn send_single(&self, mut message: Message) -> Result<(), DispatchError> {
        let key = message.destination.clone();
        let destination = self
            .config
            .resolve(&key)
            .map_err(DispatchError::Configuration)?;

        message.record_attempt();
        let started = Instant::now();
        let result = self.transport.send_one(&destination, &message).await;
        self.record_delivery(&key, DeliveryMode::Single, 1, result.is_ok(), started);

        match result {
            Ok(()) => {
                self.metrics.inc_immediate_sends();
                info!(destination = %key, message_id = %message.id, "Message delivered");
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_send_failures();
                error!(destination = %key, message_id = %message.id, error = %e, "Send failed");
                Err(DispatchError::transport(key.as_str(), e))
            }
        }
    }

    /// One `send_batch` call; on failure the messages are handed back, not requeued
    async fn deliver_batch(
        &self,
        key: DestinationKey,
        mut messages: Vec<Message>,
    ) -> Result<usize, BatchFailure> {
        let len = messages.len();
        let destination = match self.config.resolve(&key) {
            Ok(destination) => destination,
            Err(source) => {
                self.metrics.record_flush_failure(len);
                observability::record_flush_failure(key.as_str(), len);
                return Err(BatchFailure {
                    destination: key,
                    source,
                    messages,
                });
            }
        };

        for message in &mut messages {
            message.record_attempt();
        }

        let started = Instant::now();
        let result = self.transport.send_batch(&destination, &messages).await;
        self.record_delivery(&key, DeliveryMode::Batch, len, result.is_ok(), started);

        match result {
            Ok(()) => {
                self.metrics.record_batch(len);
                info!(destination = %key, batch_len = len, "Batch flushed");
                Ok(len)
            }
            Err(source) => {
                self.metrics.record_flush_failure(len);
                observability::record_flush_failure(key.as_str(), len);
                error!(
                    destination = %key,
                    lost = len,
                    error = %source,
                    "Batch flush failed, messages dropped"
                );
                Err(BatchFailure {
                    destination: key,
                    source,
                    messages,
                })
            }
        }
    }

    fn record_delivery(
        &self,
        destination: &DestinationKey,
        mode: DeliveryMode,
        messages: usize,
        success: bool,
        started: Instant,
    ) {
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_delivery(destination.as_str(), mode, messages, success, latency_ms);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(destination.as_str(), mode, messages, success, latency_ms);
    }
}
