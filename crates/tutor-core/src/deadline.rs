//! Time and cancellation bounds for external calls.
//!
//! Every call to an upstream service goes through [`run_bounded`], which
//! races the call against a per-stage timeout and the request's
//! cancellation token. Whichever finishes first wins; the losing future is
//! dropped, which aborts any in-flight HTTP request it owned.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run `fut` under a timeout and a cancellation token.
///
/// Returns [`Error::Timeout`] if `timeout` elapses first and
/// [`Error::Cancelled`] if `cancel` fires first. A token that is already
/// cancelled short-circuits without polling `fut`.
pub async fn run_bounded<F, T>(
    stage: &str,
    timeout: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled(stage.to_string()));
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled(stage.to_string())),
        outcome = tokio::time::timeout(timeout, fut) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} exceeded {}s",
                stage,
                timeout.as_secs_f32()
            ))),
        },
    }
}
