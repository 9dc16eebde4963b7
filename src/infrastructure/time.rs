use crate::domain::ports::{Clock, ScheduledTask, Scheduler, TimerHandle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Runs delays on `tokio::time` and deferred tasks on `tokio::spawn`.
///
/// Must be used from within a tokio runtime. Under a paused test clock the
/// delays follow virtual time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        let abort = handle.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}
