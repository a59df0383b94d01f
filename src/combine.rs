//! Merge policies for folding two workflow results into one.
//!
//! The result-level policies are pure functions over `std::result::Result`;
//! the task-level composers lift a policy over two [`Task`]s by awaiting
//! inside a freshly spawned task, so folding never blocks the caller.

use crate::task::{Fault, Task};

/// Keep whichever side is available.
///
/// Both succeed: join the values. Exactly one succeeds: keep it; a
/// supplemental failure never sinks the preferred result, and vice versa.
/// Both fail: the preferred side's error surfaces.
pub fn both_or_either<V, E>(
    preferred: Result<V, E>,
    supplemental: Result<V, E>,
    combine: impl FnOnce(V, V) -> V,
) -> Result<V, E> {
    match (preferred, supplemental) {
        (Ok(p), Ok(s)) => Ok(combine(p, s)),
        (Ok(p), Err(_)) => Ok(p),
        (Err(_), Ok(s)) => Ok(s),
        (Err(p), Err(_)) => Err(p),
    }
}

/// Never lose a preferred success, never mask a preferred failure.
///
/// Both succeed: join the values. Preferred succeeds alone: keep its value
/// unchanged. Preferred fails: its error propagates regardless of the
/// supplemental outcome.
pub fn both_or_preferred<V, E>(
    preferred: Result<V, E>,
    supplemental: Result<V, E>,
    combine: impl FnOnce(V, V) -> V,
) -> Result<V, E> {
    match (preferred, supplemental) {
        (Ok(p), Ok(s)) => Ok(combine(p, s)),
        (Ok(p), Err(_)) => Ok(p),
        (Err(p), _) => Err(p),
    }
}

/// Fold two tasks into one under `policy`, awaiting both inside a new task.
pub fn compose<V, E, P>(policy: P, first: &Task<V, E>, second: &Task<V, E>) -> Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<Fault> + 'static,
    P: FnOnce(Result<V, E>, Result<V, E>) -> Result<V, E> + Send + 'static,
{
    let first = first.clone();
    let second = second.clone();
    Task::spawn(async move {
        let a = first.join().await;
        let b = second.join().await;
        policy(a, b)
    })
}

/// Fold `slow` into `preferred` only if it has already settled.
///
/// Waits for `preferred`, then snapshots `slow.is_complete()` at that
/// instant. Settled: fold under `policy`. Still running: return preferred's
/// result unchanged and invoke `on_abandon`. The slow task is never
/// awaited, never cancelled, and its eventual result is discarded.
pub fn fold_if_complete<V, E, P, A>(
    policy: P,
    preferred: &Task<V, E>,
    slow: &Task<V, E>,
    on_abandon: A,
) -> Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<Fault> + 'static,
    P: FnOnce(Result<V, E>, Result<V, E>) -> Result<V, E> + Send + 'static,
    A: FnOnce() + Send + 'static,
{
    let preferred = preferred.clone();
    let slow = slow.clone();
    Task::spawn(async move {
        let settled = preferred.join().await;
        if slow.is_complete() {
            // Already settled; this join returns immediately.
            let supplemental = slow.join().await;
            policy(settled, supplemental)
        } else {
            on_abandon();
            settled
        }
    })
}
