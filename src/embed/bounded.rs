//! Timeout wrapper for embedding providers.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::EmbeddingProvider;
use crate::types::{ScriptureError, ScriptureResult};

/// Workers that may outlive their caller before new calls are refused.
pub const MAX_STALLED_WORKERS: usize = 1;

const RUNNING: u8 = 0;
const DONE: u8 = 1;
const ABANDONED: u8 = 2;

/// Runs each call of the wrapped provider on a helper thread and gives up
/// after `timeout`.
///
/// A call that times out keeps running detached and its result is dropped.
/// While [`MAX_STALLED_WORKERS`] such calls are still running, new calls
/// fail immediately with `ProviderUnavailable` instead of spawning another
/// worker, so a hung provider costs a bounded number of threads.
pub struct BoundedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    stalled: Arc<AtomicUsize>,
}

impl BoundedEmbedder {
    /// Wrap `inner`, bounding every single-text call by `timeout`.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            stalled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timed-out calls whose worker thread has not finished yet.
    pub fn stalled_workers(&self) -> usize {
        self.stalled.load(Ordering::Acquire)
    }

    fn unavailable(&self, reason: String) -> ScriptureError {
        ScriptureError::ProviderUnavailable {
            provider: self.inner.name().to_string(),
            reason,
        }
    }

    fn run<T, F>(&self, timeout: Duration, call: F) -> ScriptureResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn EmbeddingProvider) -> ScriptureResult<T> + Send + 'static,
    {
        let stalled = self.stalled_workers();
        if stalled >= MAX_STALLED_WORKERS {
            return Err(self.unavailable(format!(
                "{stalled} earlier call(s) still running after timing out"
            )));
        }

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(AtomicU8::new(RUNNING));
        let worker_state = Arc::clone(&state);
        let worker_stalled = Arc::clone(&self.stalled);
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("scheck-embed".to_string())
            .spawn(move || {
                let result = call(inner.as_ref());
                if worker_state
                    .compare_exchange(RUNNING, DONE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // caller gave up and counted this worker as stalled
                    worker_stalled.fetch_sub(1, Ordering::AcqRel);
                    log::debug!("stalled embedding worker finished");
                }
                // receiver may be gone after a timeout
                let _ = tx.send(result);
            })
            .map_err(|e| self.unavailable(format!("could not spawn worker: {e}")))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                // count first so the worker never decrements below zero
                self.stalled.fetch_add(1, Ordering::AcqRel);
                if state
                    .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // finished right at the deadline
                    self.stalled.fetch_sub(1, Ordering::AcqRel);
                    if let Ok(result) = rx.recv() {
                        return result;
                    }
                }
                log::warn!(
                    "embedding provider '{}' timed out after {} ms",
                    self.inner.name(),
                    timeout.as_millis()
                );
                Err(self.unavailable(format!(
                    "timed out after {} ms",
                    timeout.as_millis()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(self.unavailable("worker exited without a result".to_string()))
            }
        }
    }
}

impl EmbeddingProvider for BoundedEmbedder {
    fn embed(&self, text: &str) -> ScriptureResult<Vec<f32>> {
        let text = text.to_string();
        self.run(self.timeout, move |provider| provider.embed(&text))
    }

    fn embed_batch(&self, texts: &[&str]) -> ScriptureResult<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let count = u32::try_from(texts.len().max(1)).unwrap_or(u32::MAX);
        let timeout = self.timeout.saturating_mul(count);
        self.run(timeout, move |provider| {
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            provider.embed_batch(&refs)
        })
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
