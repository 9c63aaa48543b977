use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// Acquire `lock`, recovering the guard if a previous holder panicked.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(
            op,
            target_module = target,
            lock_kind = "mutex.lock",
            result = "poisoned_recovered",
            "Recovered from poisoned lock; guarded state may be stale"
        );
        poisoned.into_inner()
    })
}
