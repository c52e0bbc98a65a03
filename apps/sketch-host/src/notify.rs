use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use sketch_core::{Notifier, SceneEvent};

/// Logs each event name and product id at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn emit(&self, event: &SceneEvent) {
        log::info!("{} '{}'", event.name(), event.descriptor().id);
    }
}

/// Forwards each event to every sink, in the order they were added.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for FanoutNotifier {
    fn emit(&self, event: &SceneEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Fans events out over a tokio broadcast channel.
///
/// Subscribers only see events emitted after they subscribed; an event sent
/// while nobody listens is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SceneEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn emit(&self, event: &SceneEvent) {
        if self.sender.send(event.clone()).is_err() {
            log::trace!("No subscribers for {}", event.name());
        }
    }
}

/// Take every event currently buffered for `receiver`.
///
/// Events the receiver lagged behind on are skipped with a warning; the
/// remaining ones are still returned.
pub fn drain_events(receiver: &mut broadcast::Receiver<SceneEvent>) -> Vec<SceneEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                log::warn!("{} scene events dropped", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    events
}
