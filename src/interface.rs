//! Threaded interface for submitting and controlling mapping jobs.
//!
//! This module provides a minimal, thread-per-job runner that accepts a pair
//! of rulesets, runs the mapper on a background thread, and delivers the
//! outcome back to the caller. It uses cooperative cancellation via an
//! `Arc<AtomicBool>`: the search loop checks the token once per step.
//!
//! The goal is to keep threading concerns here without invasive changes to
//! the mapper. Callers can submit jobs and cancel them by id.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::construct::Ruleset;
use crate::error::{Result, RulemapError};
use crate::mapper::{MapOutcome, Mapper, MapperSettings};

/// Cancellation token shared with the worker thread.
#[derive(Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
    pub fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// Opaque job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

/// Handle to a running or completed mapping job.
pub struct JobHandle {
    pub id: JobId,
    cancel: CancelToken,
    started: Instant,
    join: Option<JoinHandle<()>>,
    results: Receiver<MapOutcome>,
}
impl JobHandle {
    /// Request cancellation (cooperative). The worker may take a short time to observe it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
    /// Wait for the job to finish and collect its outcome.
    pub fn wait(mut self) -> Option<MapOutcome> {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        self.results.try_recv().ok()
    }
}

/// Job submission options.
pub struct JobOptions {
    pub settings: MapperSettings,
    pub timeout: Option<Duration>,
}
impl Default for JobOptions {
    fn default() -> Self {
        Self {
            settings: MapperSettings::default(),
            timeout: None,
        }
    }
}

/// How often the timeout watchdog rechecks whether its job still runs.
const WATCHDOG_TICK: Duration = Duration::from_millis(1);

/// Registry managing job lifecycles. Workers remove their own entry when
/// they finish, so the registry only ever holds running jobs.
pub struct MapperInterface {
    next_id: Mutex<u64>,
    active: Arc<Mutex<HashMap<JobId, CancelToken>>>,
}

impl MapperInterface {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(0),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allocate_id(&self) -> Result<JobId> {
        let mut guard = self
            .next_id
            .lock()
            .map_err(|e| RulemapError::Lock(e.to_string()))?;
        *guard += 1;
        Ok(JobId(*guard))
    }

    /// Spawns a worker thread that maps `source` onto `target` and delivers
    /// the outcome through the returned handle. The worker deregisters
    /// itself when it finishes. With a timeout set, a watchdog thread
    /// cancels the token once the deadline passes; it polls the registry so
    /// it can exit as soon as the job is gone.
    pub fn submit(
        &self,
        source: Ruleset,
        target: Ruleset,
        options: JobOptions,
    ) -> Result<JobHandle> {
        let id = self.allocate_id()?;
        let cancel = CancelToken::new();
        {
            let mut active = self
                .active
                .lock()
                .map_err(|e| RulemapError::Lock(e.to_string()))?;
            active.insert(id, cancel.clone());
        }
        let (sender, results) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let settings = options.settings.clone();
        let registry = Arc::clone(&self.active);
        let join = std::thread::spawn(move || {
            let mapper = Mapper::new(&source, &target, settings);
            let outcome = mapper.run(&worker_cancel);
            let _ = sender.send(outcome);
            if let Ok(mut active) = registry.lock() {
                active.remove(&id);
            }
        });
        if let Some(timeout) = options.timeout {
            let watchdog = cancel.clone();
            let registry = Arc::clone(&self.active);
            let deadline = Instant::now() + timeout;
            std::thread::spawn(move || {
                while Instant::now() < deadline {
                    match registry.lock() {
                        Ok(active) if active.contains_key(&id) => {}
                        _ => return,
                    }
                    std::thread::sleep(WATCHDOG_TICK);
                }
                watchdog.cancel();
            });
        }
        Ok(JobHandle {
            id,
            cancel,
            started: Instant::now(),
            join: Some(join),
            results,
        })
    }

    /// Cancel a job by id. Returns false when the id is unknown (already
    /// finished, or never submitted).
    pub fn cancel(&self, id: JobId) -> Result<bool> {
        let mut active = self
            .active
            .lock()
            .map_err(|e| RulemapError::Lock(e.to_string()))?;
        match active.remove(&id) {
            Some(token) => {
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drops the bookkeeping of a finished job.
    pub fn forget(&self, id: JobId) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|e| RulemapError::Lock(e.to_string()))?;
        active.remove(&id);
        Ok(())
    }

    pub fn active_jobs(&self) -> Result<usize> {
        let active = self
            .active
            .lock()
            .map_err(|e| RulemapError::Lock(e.to_string()))?;
        Ok(active.len())
    }
}

impl Default for MapperInterface {
    fn default() -> Self {
        Self::new()
    }
}
