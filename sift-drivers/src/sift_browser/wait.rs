use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// How a bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
}

impl WaitOutcome {
    pub fn is_ready(self) -> bool {
        self == WaitOutcome::Ready
    }
}

/// Poll `condition` every `poll_every` until it reports `true` or `deadline`
/// elapses, whichever comes first.
///
/// The condition is raced against the deadline, so a single slow poll cannot
/// extend the wait past `deadline`. Polls that fail count as "not yet".
pub async fn wait_until<F, Fut, E>(deadline: Duration, poll_every: Duration, mut condition: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let poll = async {
        loop {
            if let Ok(true) = condition().await {
                return;
            }
            sleep(poll_every).await;
        }
    };

    tokio::select! {
        _ = poll => WaitOutcome::Ready,
        _ = sleep(deadline) => WaitOutcome::TimedOut,
    }
}

/// Remaining time until `started + budget`, saturating at zero.
pub fn remaining(started: Instant, budget: Duration) -> Duration {
    budget.saturating_sub(started.elapsed())
}
