//! Handles to asynchronously running computations.
//!
//! A [`Task`] wraps a computation spawned onto the runtime the moment the
//! handle is created. It settles exactly once to a `Result` and can be
//! observed two ways: a non-blocking [`Task::is_complete`] check, and an
//! awaiting [`Task::join`] that any number of observers may call
//! concurrently.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

/// An unexpected fault inside a task's computation: a panic, or an execution
/// unit dropped by the runtime before it could settle.
///
/// Faults are converted into the caller's error type via `E: From<Fault>`,
/// so a task is never left unsettled forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault(String);

impl Fault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Extract a readable reason from a panic payload.
    fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "task panicked".to_string());
        Self(reason)
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle to a computation that will eventually settle to a
/// `Result<V, E>`.
///
/// The computation starts running as soon as the handle is created; there is
/// no separate start step. Cloning the handle is cheap and shares the
/// underlying result slot. Dropping every handle does **not** cancel the
/// computation; it runs to completion and its result is discarded.
pub struct Task<V, E> {
    /// Written by the execution unit itself, readable without touching the
    /// result slot.
    settled: Arc<AtomicBool>,
    /// Single-write, multi-read result slot.
    result: Shared<BoxFuture<'static, Result<V, E>>>,
}

impl<V, E> Clone for Task<V, E> {
    fn clone(&self) -> Self {
        Self {
            settled: Arc::clone(&self.settled),
            result: self.result.clone(),
        }
    }
}

impl<V, E> fmt::Debug for Task<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("settled", &self.settled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<V, E> Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<Fault> + 'static,
{
    /// Schedule `compute` onto the runtime immediately and return a handle
    /// to its eventual result. Never blocks the caller.
    ///
    /// A panic inside `compute` settles the task to `Err(Fault)` rather
    /// than tearing down the execution unit silently.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a tokio runtime.
    pub fn spawn<F>(compute: F) -> Self
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        let settled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&settled);
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(compute).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(E::from(Fault::from_panic(payload.as_ref()))),
            };
            flag.store(true, Ordering::Release);
            result
        });
        let result = async move {
            match handle.await {
                Ok(result) => result,
                // The runtime dropped the execution unit before it settled.
                Err(join_err) => Err(E::from(Fault::new(join_err.to_string()))),
            }
        }
        .boxed()
        .shared();
        Self { settled, result }
    }

    /// Wrap an already-settled result in a completed task.
    pub fn ready(result: Result<V, E>) -> Self {
        Self {
            settled: Arc::new(AtomicBool::new(true)),
            result: async move { result }.boxed().shared(),
        }
    }

    /// Non-blocking completion check.
    pub fn is_complete(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Wait until the task settles, then return its result.
    ///
    /// Safe for any number of concurrent observers; every caller sees the
    /// same settled result.
    pub async fn join(&self) -> Result<V, E> {
        self.result.clone().await
    }

    /// Derive a task whose success value is `f` applied to this task's
    /// success value. The continuation runs on a new execution unit; the
    /// caller is not blocked.
    pub fn map<V2, F>(&self, f: F) -> Task<V2, E>
    where
        V2: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> V2 + Send + 'static,
    {
        let inner = self.clone();
        Task::spawn(async move { inner.join().await.map(f) })
    }

    /// Derive a task by chaining `f` onto this task's success value. Like
    /// [`Task::map`], the continuation runs on a new execution unit.
    pub fn and_then<V2, F, Fut>(&self, f: F) -> Task<V2, E>
    where
        V2: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V2, E>> + Send + 'static,
    {
        let inner = self.clone();
        Task::spawn(async move {
            match inner.join().await {
                Ok(value) => f(value).await,
                Err(err) => Err(err),
            }
        })
    }
}
