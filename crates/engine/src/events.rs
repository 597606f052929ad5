//! In-process glob-pattern pub/sub event bus (spec §6, "Event bus contract")
//!
//! On every committed insert the engine publishes one message on channel
//! `key` carrying the stats record. Subscribers register a glob pattern;
//! a worker thread drains the publish channel and delivers to every
//! subscriber whose pattern matches. Delivery is best-effort, unordered
//! across channels, ordered within a channel. Subscriber panics/errors
//! are caught, logged, and recorded in `last_error` — never propagated.

use bucketdb_core::DataStats;
use glob::Pattern;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

/// One published data event.
#[derive(Debug, Clone)]
pub struct DataEvent {
    /// The channel the event was published on (the metric key).
    pub channel: String,
    /// The stats record produced by the commit that triggered this event.
    pub stats: DataStats,
}

struct Subscription {
    pattern: Pattern,
    callback: Box<dyn Fn(&DataEvent) + Send + 'static>,
}

/// The engine's event bus: a worker thread draining a channel of
/// published events and routing each to matching subscribers.
pub struct EventBus {
    sender: Option<mpsc::Sender<DataEvent>>,
    subscribers: Arc<Mutex<Vec<Subscription>>>,
    last_error: Arc<Mutex<Option<String>>>,
    worker: Option<JoinHandle<()>>,
}

impl EventBus {
    /// Start the worker thread. If `enabled` is false, `publish` is a
    /// no-op and no thread is spawned.
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return EventBus {
                sender: None,
                subscribers: Arc::new(Mutex::new(Vec::new())),
                last_error: Arc::new(Mutex::new(None)),
                worker: None,
            };
        }

        let (tx, rx) = mpsc::channel::<DataEvent>();
        let subscribers: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let last_error = Arc::new(Mutex::new(None));

        let worker_subscribers = subscribers.clone();
        let worker_last_error = last_error.clone();
        let worker = std::thread::Builder::new()
            .name("bucketdb-events".to_string())
            .spawn(move || {
                for event in rx {
                    let subs = worker_subscribers.lock();
                    for sub in subs.iter() {
                        if sub.pattern.matches(&event.channel) {
                            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                                (sub.callback)(&event)
                            }));
                            if let Err(panic) = result {
                                let message = panic
                                    .downcast_ref::<&str>()
                                    .map(|s| s.to_string())
                                    .or_else(|| panic.downcast_ref::<String>().cloned())
                                    .unwrap_or_else(|| "subscriber panicked".to_string());
                                tracing::error!(channel = %event.channel, %message, "data listener panicked");
                                *worker_last_error.lock() = Some(message);
                            }
                        }
                    }
                }
            })
            .expect("failed to spawn bucketdb-events worker thread");

        EventBus {
            sender: Some(tx),
            subscribers,
            last_error,
            worker: Some(worker),
        }
    }

    /// Register a callback for channels matching `pattern` (`*` wildcards).
    ///
    /// # Panics
    /// Panics if `pattern` is not a valid glob pattern.
    pub fn subscribe(&self, pattern: &str, callback: impl Fn(&DataEvent) + Send + 'static) {
        let pattern = Pattern::new(pattern).expect("invalid glob pattern");
        self.subscribers.lock().push(Subscription {
            pattern,
            callback: Box::new(callback),
        });
    }

    /// Publish an event on `channel`. A no-op if the bus was built with
    /// `enabled = false`.
    pub fn publish(&self, channel: String, stats: DataStats) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(DataEvent { channel, stats });
        }
    }

    /// The most recent subscriber failure, if any, per the `Internal`
    /// error taxonomy's `last_error` diagnostic field.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    #[test]
    fn subscriber_matching_glob_receives_event() {
        let bus = EventBus::new(true);
        let (tx, rx) = mpsc::channel();
        bus.subscribe("cpu.*", move |event| {
            let _ = tx.send(event.channel.clone());
        });
        bus.publish("cpu.load".to_string(), DataStats::empty("cpu.load"));
        let received = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(received, "cpu.load");
    }

    #[test]
    fn subscriber_not_matching_glob_is_silent() {
        let bus = EventBus::new(true);
        let (tx, rx) = mpsc::channel::<String>();
        bus.subscribe("mem.*", move |event| {
            let _ = tx.send(event.channel.clone());
        });
        bus.publish("cpu.load".to_string(), DataStats::empty("cpu.load"));
        assert_eq!(rx.recv_timeout(Duration::from_millis(200)), Err(RecvTimeoutError::Timeout));
    }

    #[test]
    fn disabled_bus_publish_is_a_no_op() {
        let bus = EventBus::new(false);
        bus.subscribe("*", |_| panic!("should never be called"));
        bus.publish("cpu.load".to_string(), DataStats::empty("cpu.load"));
        // no panic propagates and no thread was spawned
        assert!(bus.worker.is_none());
    }

    #[test]
    fn panicking_subscriber_is_caught_and_recorded() {
        let bus = EventBus::new(true);
        bus.subscribe("*", |_| panic!("boom"));
        let (tx, rx) = mpsc::channel();
        bus.subscribe("*", move |event| {
            let _ = tx.send(event.channel.clone());
        });
        bus.publish("cpu.load".to_string(), DataStats::empty("cpu.load"));
        // the second subscriber still runs despite the first panicking
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "cpu.load");
        // give the worker a moment to record the error after the panic unwinds
        std::thread::sleep(Duration::from_millis(50));
        assert!(bus.last_error().unwrap().contains("boom"));
    }
}
