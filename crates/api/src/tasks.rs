//! Best-effort side-effect helper.
//!
//! The post-finish chain (module-status resync, path generation, path
//! refresh) must never fail the primary operation. Wrapping each step
//! in [`best_effort`] turns failures into structured warnings and keeps
//! the policy in one testable place instead of scattered try/catch.

use std::fmt::Display;
use std::future::Future;

/// Await a fallible side effect, logging (not propagating) any error.
///
/// Returns `Some(value)` on success, `None` on failure.
pub async fn best_effort<T, E>(
    label: &'static str,
    fut: impl Future<Output = Result<T, E>>,
) -> Option<T>
where
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(task = label, error = %error, "Best-effort task failed");
            None
        }
    }
}
