// Spoken feedback queue
// Producers enqueue without ever waiting; one background worker drains the
// queue and speaks each message to completion before taking the next.

use crate::core::config::FeedbackConfig;
use crate::models::feedback::{FeedbackError, FeedbackMessage, FeedbackResult, FeedbackStats};
use crate::platform::SpeechRenderer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Extra time shutdown waits beyond the drain timeout for an utterance in flight
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ==============================================================================
// Queue
// ==============================================================================

#[derive(Debug, Clone)]
enum QueueSender {
    Unbounded(mpsc::UnboundedSender<FeedbackMessage>),
    Bounded {
        tx: mpsc::Sender<FeedbackMessage>,
        capacity: usize,
    },
}

enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<FeedbackMessage>),
    Bounded(mpsc::Receiver<FeedbackMessage>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<FeedbackMessage> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.recv().await,
            QueueReceiver::Bounded(rx) => rx.recv().await,
        }
    }

    fn try_recv(&mut self) -> Result<FeedbackMessage, TryRecvError> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.try_recv(),
            QueueReceiver::Bounded(rx) => rx.try_recv(),
        }
    }
}

fn queue(capacity: Option<usize>) -> (QueueSender, QueueReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (
                QueueSender::Bounded { tx, capacity },
                QueueReceiver::Bounded(rx),
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    spoken: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> FeedbackStats {
        FeedbackStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            spoken: self.spoken.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// ==============================================================================
// Producer Handle
// ==============================================================================

/// Cheap, clonable producer side of the feedback queue
#[derive(Debug, Clone)]
pub struct FeedbackHandle {
    tx: QueueSender,
    counters: Arc<Counters>,
}

impl FeedbackHandle {
    /// Queue an utterance. Never blocks.
    ///
    /// A bounded queue that is full drops the new message and returns
    /// `QueueSaturation`; callers log it and carry on.
    pub fn enqueue(&self, message: impl Into<FeedbackMessage>) -> FeedbackResult<()> {
        let message = message.into();
        match &self.tx {
            QueueSender::Unbounded(tx) => {
                tx.send(message).map_err(|_| FeedbackError::Closed)?;
            }
            QueueSender::Bounded { tx, capacity } => match tx.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(message)) => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(utterance = message.text(), capacity, "Feedback queue full, dropping message");
                    return Err(FeedbackError::QueueSaturation {
                        capacity: *capacity,
                    });
                }
                Err(TrySendError::Closed(_)) => return Err(FeedbackError::Closed),
            },
        }

        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> FeedbackStats {
        self.counters.snapshot()
    }
}

// ==============================================================================
// Channel
// ==============================================================================

/// Owns the speech worker thread for the lifetime of a session
pub struct FeedbackChannel {
    handle: FeedbackHandle,
    shutdown_tx: watch::Sender<Option<Instant>>,
    done_rx: std_mpsc::Receiver<()>,
    worker: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WorkerTiming {
    poll_timeout: Duration,
    idle_sleep: Duration,
}

impl FeedbackChannel {
    /// Start the worker thread. It runs until `shutdown` or drop.
    pub fn spawn(
        renderer: Box<dyn SpeechRenderer>,
        config: &FeedbackConfig,
    ) -> FeedbackResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let (tx, rx) = queue(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(None);
        let (done_tx, done_rx) = std_mpsc::channel();
        let counters = Arc::new(Counters::default());

        let timing = WorkerTiming {
            poll_timeout: Duration::from_millis(config.poll_timeout_ms.max(1)),
            idle_sleep: Duration::from_millis(config.idle_sleep_ms),
        };
        let worker_counters = counters.clone();

        let worker = std::thread::Builder::new()
            .name("feedback-worker".to_string())
            .spawn(move || {
                runtime.block_on(run_worker(rx, shutdown_rx, renderer, worker_counters, timing));
                let _ = done_tx.send(());
            })?;

        info!(
            capacity = ?config.queue_capacity,
            poll_timeout_ms = config.poll_timeout_ms,
            "Feedback worker started"
        );

        Ok(Self {
            handle: FeedbackHandle { tx, counters },
            shutdown_tx,
            done_rx,
            worker: Some(worker),
            drain_timeout: Duration::from_millis(config.drain_timeout_ms),
        })
    }

    pub fn handle(&self) -> FeedbackHandle {
        self.handle.clone()
    }

    pub fn enqueue(&self, message: impl Into<FeedbackMessage>) -> FeedbackResult<()> {
        self.handle.enqueue(message)
    }

    pub fn stats(&self) -> FeedbackStats {
        self.handle.stats()
    }

    /// Stop the worker: queued messages keep being spoken until the drain
    /// timeout, anything left after that is dropped. Never blocks longer than
    /// the drain timeout plus a short grace period.
    pub fn shutdown(&mut self) -> FeedbackStats {
        let Some(worker) = self.worker.take() else {
            return self.stats();
        };

        let deadline = Instant::now() + self.drain_timeout;
        self.shutdown_tx.send_replace(Some(deadline));

        match self.done_rx.recv_timeout(self.drain_timeout + SHUTDOWN_GRACE) {
            Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                if worker.join().is_err() {
                    error!("Feedback worker panicked");
                }
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                warn!("Feedback worker still speaking after the drain timeout, detaching it");
            }
        }

        let stats = self.stats();
        info!(
            enqueued = stats.enqueued,
            spoken = stats.spoken,
            dropped = stats.dropped,
            failed = stats.failed,
            "Feedback worker stopped"
        );
        stats
    }
}

impl Drop for FeedbackChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ==============================================================================
// Worker
// ==============================================================================

async fn run_worker(
    mut rx: QueueReceiver,
    mut shutdown: watch::Receiver<Option<Instant>>,
    mut renderer: Box<dyn SpeechRenderer>,
    counters: Arc<Counters>,
    timing: WorkerTiming,
) {
    loop {
        let deadline = *shutdown.borrow();
        if let Some(deadline) = deadline {
            drain(&mut rx, renderer.as_mut(), &counters, deadline);
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Channel owner vanished without a deadline
                    drain(&mut rx, renderer.as_mut(), &counters, Instant::now());
                    break;
                }
            }

            received = tokio::time::timeout(timing.poll_timeout, rx.recv()) => match received {
                Ok(Some(message)) => speak(renderer.as_mut(), &counters, message),
                Ok(None) => {
                    debug!("All feedback producers gone");
                    break;
                }
                Err(_) => {
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(timing.idle_sleep) => {}
                    }
                }
            },
        }
    }
}

fn drain(
    rx: &mut QueueReceiver,
    renderer: &mut dyn SpeechRenderer,
    counters: &Counters,
    deadline: Instant,
) {
    let mut dropped = 0u64;
    while let Ok(message) = rx.try_recv() {
        if Instant::now() < deadline {
            speak(renderer, counters, message);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        counters.dropped.fetch_add(dropped, Ordering::Relaxed);
        warn!(dropped, "Drain timeout reached, dropping queued feedback");
    }
}

fn speak(renderer: &mut dyn SpeechRenderer, counters: &Counters, message: FeedbackMessage) {
    match renderer.speak(message.text()) {
        Ok(()) => {
            counters.spoken.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(utterance = message.text(), error = %e, "Speech failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{SpeechError, SpeechResult};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSpeech {
        spoken: Arc<Mutex<Vec<String>>>,
        delay: Duration,
    }

    impl SpeechRenderer for RecordingSpeech {
        fn speak(&mut self, text: &str) -> SpeechResult<()> {
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Reports when it starts speaking and then waits to be released
    struct GatedSpeech {
        started: std_mpsc::Sender<String>,
        gate: std_mpsc::Receiver<()>,
    }

    impl SpeechRenderer for GatedSpeech {
        fn speak(&mut self, text: &str) -> SpeechResult<()> {
            let _ = self.started.send(text.to_string());
            let _ = self.gate.recv();
            Ok(())
        }
    }

    struct BrokenSpeech;

    impl SpeechRenderer for BrokenSpeech {
        fn speak(&mut self, _text: &str) -> SpeechResult<()> {
            Err(SpeechError::CommandFailed {
                program: "tts".to_string(),
                status: "exit status: 1".to_string(),
            })
        }
    }

    fn config(capacity: Option<usize>, drain_timeout_ms: u64) -> FeedbackConfig {
        FeedbackConfig {
            queue_capacity: capacity,
            poll_timeout_ms: 20,
            idle_sleep_ms: 5,
            drain_timeout_ms,
        }
    }

    #[test]
    fn test_messages_spoken_in_fifo_order() {
        let speech = RecordingSpeech::default();
        let spoken = speech.spoken.clone();
        let mut channel = FeedbackChannel::spawn(Box::new(speech), &config(None, 2_000)).unwrap();

        let handle = channel.handle();
        for i in 0..5 {
            handle.enqueue(format!("message {}", i)).unwrap();
        }

        let stats = channel.shutdown();
        assert_eq!(stats.enqueued, 5);
        assert_eq!(stats.spoken, 5);
        assert_eq!(
            *spoken.lock().unwrap(),
            (0..5).map(|i| format!("message {}", i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_enqueue_does_not_wait_for_slow_speech() {
        let speech = RecordingSpeech {
            delay: Duration::from_millis(50),
            ..Default::default()
        };
        let mut channel = FeedbackChannel::spawn(Box::new(speech), &config(None, 100)).unwrap();

        let started = Instant::now();
        for i in 0..20 {
            channel.enqueue(format!("utterance {}", i)).unwrap();
        }
        // 20 utterances take a second to speak; queuing them must not
        assert!(started.elapsed() < Duration::from_millis(50));

        let stats = channel.shutdown();
        assert_eq!(stats.enqueued, 20);
        assert_eq!(stats.spoken + stats.dropped, 20);
        assert!(stats.dropped > 0);
    }

    #[test]
    fn test_bounded_queue_drops_newest_when_full() {
        let (started_tx, started_rx) = std_mpsc::channel();
        let (gate_tx, gate_rx) = std_mpsc::channel();
        let speech = GatedSpeech {
            started: started_tx,
            gate: gate_rx,
        };
        let mut channel = FeedbackChannel::spawn(Box::new(speech), &config(Some(2), 2_000)).unwrap();

        channel.enqueue("first").unwrap();
        // Worker is now busy with "first" and the queue is empty
        assert_eq!(
            started_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "first"
        );

        channel.enqueue("second").unwrap();
        channel.enqueue("third").unwrap();
        assert!(matches!(
            channel.enqueue("fourth"),
            Err(FeedbackError::QueueSaturation { capacity: 2 })
        ));

        for _ in 0..3 {
            gate_tx.send(()).unwrap();
        }
        let stats = channel.shutdown();
        assert_eq!(stats.enqueued, 3);
        assert_eq!(stats.spoken, 3);
        assert_eq!(stats.dropped, 1);

        let order: Vec<String> = started_rx.try_iter().collect();
        assert_eq!(order, vec!["second".to_string(), "third".to_string()]);
    }

    #[test]
    fn test_shutdown_wakes_idle_worker_promptly() {
        let settings = FeedbackConfig {
            queue_capacity: None,
            poll_timeout_ms: 10_000,
            idle_sleep_ms: 10_000,
            drain_timeout_ms: 2_000,
        };
        let mut channel =
            FeedbackChannel::spawn(Box::new(RecordingSpeech::default()), &settings).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        channel.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_enqueue_after_shutdown_is_closed() {
        let mut channel =
            FeedbackChannel::spawn(Box::new(RecordingSpeech::default()), &config(None, 100)).unwrap();
        let handle = channel.handle();
        channel.shutdown();

        assert!(matches!(handle.enqueue("late"), Err(FeedbackError::Closed)));
        // A second shutdown is a no-op
        channel.shutdown();
    }

    #[test]
    fn test_speech_failures_are_counted() {
        let mut channel = FeedbackChannel::spawn(Box::new(BrokenSpeech), &config(Some(8), 1_000)).unwrap();
        channel.enqueue("one").unwrap();
        channel.enqueue("two").unwrap();

        let stats = channel.shutdown();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.spoken, 0);
    }
}
