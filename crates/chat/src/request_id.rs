use std::sync::atomic::{AtomicU64, Ordering};

static LAST: AtomicU64 = AtomicU64::new(0);

/// A process-unique request ID of the form `req_{n}`.
///
/// `n` is the current Unix time in milliseconds, bumped past the last
/// issued value so two calls in the same millisecond never collide.
pub fn next_request_id() -> String {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let prev = LAST
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    format!("req_{}", now.max(prev + 1))
}
