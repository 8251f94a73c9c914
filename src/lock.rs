use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Cache state is a best-effort copy of the database, so a poisoned lock is
/// logged and used as-is.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                "Recovered from poisoned cache lock (module: {}, op: {}); state may be stale",
                target, op
            );
            poisoned.into_inner()
        }
    }
}
