//! Cancellable periodic task driving the countdown.
//!
//! A running ticker owns one worker thread that sends a message into the
//! event loop every interval. `start` always cancels the previous worker
//! first, so at most one is alive. `stop` is idempotent and joins the
//! worker: once it returns, no further message is sent.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Interval of the countdown refresh
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Start/stop contract for a periodic task
pub trait Ticker {
    /// Cancel any running task, then schedule a new one
    fn start(&mut self);
    /// Cancel the running task, if any
    fn stop(&mut self);
    #[cfg(test)]
    fn is_running(&self) -> bool;
}

/// Shared flag a worker waits on between ticks
#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    /// Returns `true` if stopped, `false` if the interval elapsed
    fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        if *stopped {
            return true;
        }
        let (stopped, _) = cvar
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *stopped
    }
}

struct Worker {
    signal: StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn stop(mut self) {
        self.signal.trigger();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Thread-backed ticker sending `make_msg()` every `interval`
pub struct IntervalTicker<M: Send + 'static> {
    interval: Duration,
    sender: Sender<M>,
    make_msg: Arc<dyn Fn() -> M + Send + Sync>,
    worker: Option<Worker>,
}

impl<M: Send + 'static> IntervalTicker<M> {
    pub fn new(
        interval: Duration,
        sender: Sender<M>,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            interval,
            sender,
            make_msg: Arc::new(make_msg),
            worker: None,
        }
    }
}

impl<M: Send + 'static> Ticker for IntervalTicker<M> {
    fn start(&mut self) {
        self.stop();

        let signal = StopSignal::new();
        let worker_signal = signal.clone();
        let sender = self.sender.clone();
        let make_msg = Arc::clone(&self.make_msg);
        let interval = self.interval;

        let thread = thread::spawn(move || loop {
            if worker_signal.wait_timeout(interval) {
                break;
            }
            if sender.send(make_msg()).is_err() {
                // Receiver dropped
                break;
            }
        });

        self.worker = Some(Worker {
            signal,
            thread: Some(thread),
        });
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl<M: Send + 'static> Drop for IntervalTicker<M> {
    fn drop(&mut self) {
        self.stop();
    }
}
