//! Fixed-capacity worker pool.
//!
//! ## Handoff protocol
//!
//! Each worker owns one slot behind its own `parking_lot::Mutex` — there is
//! no global lock. `dispatch` scans slots in ascending id order (first-fit,
//! deterministic) and binds the connection under the slot lock. The worker
//! thread holds that same lock for the entire Running phase, so:
//!
//! - a held lock is an accurate Busy signal (`try_lock` failure ⇒ a session
//!   is running or a dispatch is mid-assignment, both Busy);
//! - teardown (close connection, clear slot, mark free) happens atomically
//!   with respect to dispatch — Busy=false is never observable while the
//!   old connection is still open.
//!
//! An idle worker watches an atomic assignment flag on a bounded sleep and
//! never touches the slot lock, so an idle poll can never be mistaken for
//! Busy. The poll interval only bounds pickup latency; `is_busy` reflects
//! true state at all times.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{OratioError, Result};
use crate::recognizer::RecognizerFactory;
use crate::session::{self, SessionConfig};

/// Idle-state poll interval; bounds how long a dispatched connection waits
/// before its worker picks it up.
const IDLE_POLL: Duration = Duration::from_millis(100);

struct Slot {
    free: bool,
    conn: Option<TcpStream>,
}

struct Worker {
    id: usize,
    slot: Mutex<Slot>,
    /// Wakeup hint for the idle loop; the slot contents stay authoritative.
    assigned: AtomicBool,
}

impl Worker {
    fn new(id: usize) -> Self {
        Self {
            id,
            slot: Mutex::new(Slot {
                free: true,
                conn: None,
            }),
            assigned: AtomicBool::new(false),
        }
    }

    fn is_busy(&self) -> bool {
        match self.slot.try_lock() {
            Some(slot) => !slot.free,
            // Lock held for the duration of a running session, or by a
            // dispatch assigning a connection right now.
            None => true,
        }
    }
}

/// A fixed, ordered collection of workers. Sized once at startup; never
/// grows or shrinks. At most one session runs per worker at any time.
pub struct WorkerPool {
    workers: Vec<Arc<Worker>>,
}

impl WorkerPool {
    /// Allocate `count` workers (all Free) and start each worker's loop on
    /// its own OS thread. The threads live for the rest of the process.
    pub fn start(
        count: usize,
        factory: Arc<dyn RecognizerFactory>,
        config: SessionConfig,
    ) -> Result<Self> {
        if count == 0 {
            return Err(OratioError::InvalidConfig(
                "worker pool size must be at least 1".into(),
            ));
        }

        let workers: Vec<_> = (0..count).map(|id| Arc::new(Worker::new(id))).collect();
        for worker in &workers {
            let worker = Arc::clone(worker);
            let factory = Arc::clone(&factory);
            let config = config.clone();
            // Detached on purpose: worker threads live for the rest of the
            // process, there is nothing to join.
            let _ = thread::Builder::new()
                .name(format!("worker-{}", worker.id))
                .spawn(move || worker_loop(worker, factory, config))?;
        }

        info!(workers = count, "worker pool started");
        Ok(Self { workers })
    }

    /// Bind `conn` to the first free worker (lowest id). If every worker is
    /// busy the connection is closed immediately and `false` is returned —
    /// there is no backlog, and no worker state is touched.
    pub fn dispatch(&self, conn: TcpStream) -> bool {
        for worker in &self.workers {
            if let Some(mut slot) = worker.slot.try_lock() {
                if slot.free {
                    slot.free = false;
                    slot.conn = Some(conn);
                    worker.assigned.store(true, Ordering::Release);
                    debug!(worker = worker.id, "connection dispatched");
                    return true;
                }
            }
        }
        info!("no free worker, rejecting connection");
        drop(conn);
        false
    }

    /// True iff at least one worker currently runs a session. Used by
    /// shutdown sequencing to let in-flight sessions drain.
    pub fn is_busy(&self) -> bool {
        self.workers.iter().any(|w| w.is_busy())
    }

    /// Sleep-poll until every worker is free again.
    pub fn drain(&self, poll: Duration) {
        while self.is_busy() {
            thread::sleep(poll);
        }
    }

    #[cfg(test)]
    fn busy_states(&self) -> Vec<bool> {
        self.workers.iter().map(|w| w.is_busy()).collect()
    }
}

fn worker_loop(worker: Arc<Worker>, factory: Arc<dyn RecognizerFactory>, config: SessionConfig) {
    debug!(worker = worker.id, "worker ready");
    loop {
        // Idle: watch the assignment flag without touching the slot lock,
        // so dispatch and is_busy never misread an idle poll as Busy.
        if !worker.assigned.load(Ordering::Acquire) {
            thread::sleep(IDLE_POLL);
            continue;
        }

        let mut slot = worker.slot.lock();
        debug!(worker = worker.id, "worker running");
        if let Some(stream) = slot.conn.as_mut() {
            match stream.try_clone() {
                Ok(mut reader) => {
                    let mut recognizer = factory.create_recognizer();
                    let outcome =
                        session::run(&config, recognizer.as_mut(), &mut reader, &mut *stream);
                    info!(worker = worker.id, ?outcome, "session ended");
                }
                Err(e) => {
                    warn!(worker = worker.id, error = %e, "could not split connection");
                }
            }
        }

        // Teardown order under the lock held since pickup: close the
        // connection, clear the slot, then mark free.
        slot.conn = None;
        slot.free = true;
        worker.assigned.store(false, Ordering::Release);
    }
}
