//! The per-session operation queue.
//!
//! Each session owns one worker thread fed by an unbounded FIFO channel.
//! Submitting returns the number of operations now pending, the caller's
//! backpressure signal, together with a [`Completion`] handle that
//! resolves once, when the operation has run. Because a single worker
//! drains the channel in order, completions are delivered in submission
//! order; nothing can overtake.
//!
//! `quit` enqueues a drain marker: operations already queued still run,
//! then the worker exits and the exit notification fires exactly once.

use framemill_core::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, trace};

/// Successful result of one operation: the destination buffer travels
/// back to the caller together with the number of bytes written into it.
#[derive(Debug)]
pub struct OperationOutput {
    /// The destination buffer, returned to the caller.
    pub dst: Vec<u8>,
    /// Bytes actually written.
    pub bytes_written: usize,
}

/// Result delivered through a [`Completion`].
pub type OperationResult = Result<OperationOutput>;

/// One queued unit of work.
type Job = Box<dyn FnOnce() -> OperationResult + Send + 'static>;

enum Command {
    Run {
        job: Job,
        reply: mpsc::Sender<OperationResult>,
    },
    Quit,
}

/// Receiving side of one operation's completion.
#[derive(Debug)]
pub struct Completion {
    rx: mpsc::Receiver<OperationResult>,
}

impl Completion {
    /// Block until the operation completes and take its result.
    pub fn wait(self) -> OperationResult {
        self.rx.recv().map_err(|_| Error::WorkerLost)?
    }

    /// Non-blocking poll; `None` while the operation is still pending.
    pub fn poll(&self) -> Option<OperationResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(Error::WorkerLost)),
        }
    }
}

/// A FIFO queue with one dedicated worker thread.
pub struct OperationQueue {
    name: &'static str,
    tx: Option<mpsc::Sender<Command>>,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl OperationQueue {
    /// Create the queue and start its worker thread.
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker = std::thread::Builder::new()
            .name(format!("framemill-{name}"))
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        Command::Run { job, reply } => {
                            let started = Instant::now();
                            let result = job();
                            worker_pending.fetch_sub(1, Ordering::AcqRel);
                            trace!(
                                elapsed_us = started.elapsed().as_micros() as u64,
                                ok = result.is_ok(),
                                "operation finished"
                            );
                            // The submitter may have dropped its handle.
                            let _ = reply.send(result);
                        }
                        Command::Quit => break,
                    }
                }
                debug!("worker exited");
            })
            .expect("failed to spawn session worker");

        Self {
            name,
            tx: Some(tx),
            pending,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue name, used for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of operations queued and not yet completed.
    pub fn depth(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Enqueue a job. Returns the queue depth after enqueueing and the
    /// operation's completion handle.
    pub fn submit(&self, job: Job) -> Result<(usize, Completion)> {
        let tx = self.tx.as_ref().ok_or(Error::WorkerLost)?;
        let (reply, rx) = mpsc::channel();
        let depth = self.pending.fetch_add(1, Ordering::AcqRel) + 1;
        tx.send(Command::Run { job, reply }).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            Error::WorkerLost
        })?;
        trace!(queue = self.name, depth, "operation queued");
        Ok((depth, Completion { rx }))
    }

    /// Stop accepting work. Already-queued operations still run.
    pub fn quit(&mut self) {
        if let Some(tx) = self.tx.take() {
            debug!(queue = self.name, "draining");
            let _ = tx.send(Command::Quit);
        }
    }

    /// Block until the worker has drained and exited. Idempotent.
    pub fn wait_exit(&self) -> Result<()> {
        if let Some(worker) = self.worker.lock().take() {
            worker.join().map_err(|_| Error::WorkerLost)?;
        }
        Ok(())
    }
}

impl Drop for OperationQueue {
    fn drop(&mut self) {
        self.quit();
        let _ = self.wait_exit();
    }
}
