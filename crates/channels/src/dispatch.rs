//! Event dispatch: a single ordered consumer fanning events out to attached
//! listeners and to pending waits.
//!
//! Producers (the chat runtime, the HTTP bridge) only ever enqueue. The
//! [`DispatchLoop`] drains the queue in arrival order; for each event it
//! publishes to every [`EventSubscription`] and spawns one task per matching
//! listener so a listener that itself awaits an interaction never stalls the
//! loop.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    serde_json::Value,
    tokio::sync::{RwLock, broadcast, mpsc},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    event::{BotEvent, EventKind},
    listener::{EventListener, ListenerId},
};

/// Buffered events per subscription before a slow waiter starts lagging.
const BUS_CAPACITY: usize = 256;

struct ListenerEntry {
    id: ListenerId,
    kinds: Vec<EventKind>,
    listener: Arc<dyn EventListener>,
}

type ListenerTable = Arc<RwLock<Vec<ListenerEntry>>>;

/// Cloneable producer/registration handle for the dispatch channel.
#[derive(Clone)]
pub struct EventDispatcher {
    queue: mpsc::UnboundedSender<BotEvent>,
    bus: broadcast::Sender<Arc<BotEvent>>,
    listeners: ListenerTable,
    next_id: Arc<AtomicU64>,
}

/// The consuming half; run it once with [`DispatchLoop::run`].
pub struct DispatchLoop {
    queue: mpsc::UnboundedReceiver<BotEvent>,
    bus: broadcast::Sender<Arc<BotEvent>>,
    listeners: ListenerTable,
}

impl EventDispatcher {
    pub fn new() -> (Self, DispatchLoop) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        let listeners: ListenerTable = Arc::new(RwLock::new(Vec::new()));
        let dispatcher = Self {
            queue: queue_tx,
            bus: bus.clone(),
            listeners: Arc::clone(&listeners),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        let dispatch_loop = DispatchLoop {
            queue: queue_rx,
            bus,
            listeners,
        };
        (dispatcher, dispatch_loop)
    }

    /// Enqueue an event. Never blocks; fails only once the loop is gone.
    pub fn dispatch(&self, event: BotEvent) -> Result<()> {
        self.queue.send(event).map_err(|_| Error::Closed)
    }

    /// Enqueue a synthetic event of kind `Custom(name)`.
    pub fn dispatch_custom(&self, name: impl Into<String>, payload: Value) -> Result<()> {
        self.dispatch(BotEvent::custom(name, payload))
    }

    /// Start observing events. Only events processed after this call are seen,
    /// so subscribe before triggering whatever the caller is waiting on.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.bus.subscribe(),
        }
    }

    /// Attach a listener to the live dispatch channel.
    pub async fn add_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let kinds = listener.kinds();
        info!(listener = listener.name(), id = id.0, "event listener attached");
        self.listeners.write().await.push(ListenerEntry {
            id,
            kinds,
            listener,
        });
        id
    }

    /// Detach a listener. Returns false if it was not attached.
    pub async fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().await;
        let Some(pos) = listeners.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = listeners.remove(pos);
        info!(listener = entry.listener.name(), id = id.0, "event listener detached");
        true
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Await the next event of `kind` accepted by `predicate`.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first.
    pub async fn wait_for<F>(
        &self,
        kind: EventKind,
        timeout: Option<Duration>,
        predicate: F,
    ) -> Result<Option<Arc<BotEvent>>>
    where
        F: FnMut(&BotEvent) -> bool,
    {
        self.subscribe()
            .next_matching(&kind, timeout, predicate)
            .await
    }
}

impl DispatchLoop {
    /// Drain the queue until it closes or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("event dispatch loop started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                next = self.queue.recv() => match next {
                    Some(event) => self.process(event).await,
                    None => break,
                },
            }
        }
        info!("event dispatch loop stopped");
    }

    async fn process(&self, event: BotEvent) {
        let event = Arc::new(event);
        let kind = event.kind();

        let targets: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .await
            .iter()
            .filter(|e| e.kinds.contains(&kind))
            .map(|e| Arc::clone(&e.listener))
            .collect();

        debug!(
            kind = %kind,
            listeners = targets.len(),
            waiters = self.bus.receiver_count(),
            "dispatching event"
        );

        // No subscribers is not an error.
        let _ = self.bus.send(Arc::clone(&event));

        for listener in targets {
            let event = Arc::clone(&event);
            tokio::spawn(async move {
                if let Err(e) = listener.handle(&event).await {
                    warn!(listener = listener.name(), error = %e, "event listener failed");
                }
            });
        }
    }
}

/// A live view of the dispatch channel.
pub struct EventSubscription {
    rx: broadcast::Receiver<Arc<BotEvent>>,
}

impl EventSubscription {
    /// Next event of any kind. A lagging subscription skips what it missed.
    pub async fn recv(&mut self) -> Result<Arc<BotEvent>> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscription lagged");
                },
                Err(broadcast::error::RecvError::Closed) => return Err(Error::Closed),
            }
        }
    }

    /// Next event of `kind` accepted by `predicate`, or `Ok(None)` on timeout.
    ///
    /// `predicate` sees every event of `kind` in arrival order, including the
    /// ones it rejects.
    pub async fn next_matching<F>(
        &mut self,
        kind: &EventKind,
        timeout: Option<Duration>,
        mut predicate: F,
    ) -> Result<Option<Arc<BotEvent>>>
    where
        F: FnMut(&BotEvent) -> bool,
    {
        let wait = async {
            loop {
                let event = self.recv().await?;
                if event.is(kind) && predicate(&event) {
                    return Ok(event);
                }
            }
        };
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(found) => found.map(Some),
                Err(_) => Ok(None),
            },
            None => wait.await.map(Some),
        }
    }
}
