use super::payment::{CreatePaymentRequest, PaymentCreated, PaymentStatus, PaymentStatusView};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// The contract every payment backend implements.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentCreated>;
    async fn get_payment_status(&self, id: &str) -> Result<PaymentStatusView>;
    async fn handle_3d_secure(&self, id: &str, code: &str) -> Result<bool>;
    async fn simulate_webhook(&self, id: &str, status: PaymentStatus) -> Result<()>;
    async fn cleanup(&self);
}

/// A string key-value store holding serialized payments.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Source of uniformly distributed floats in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Delays and deferred work.
///
/// Implementations must not block the calling task while waiting.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

/// Cancels a task registered with `Scheduler::schedule`.
pub struct TimerHandle {
    cancel: Box<dyn FnOnce() + Send + Sync>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    pub fn cancel(self) {
        (self.cancel)()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

pub type PaymentServiceBox = Arc<dyn PaymentService>;
pub type KeyValueStoreBox = Box<dyn KeyValueStore>;
pub type RandomSourceBox = Arc<dyn RandomSource>;
pub type SchedulerBox = Arc<dyn Scheduler>;
pub type ClockBox = Arc<dyn Clock>;
pub type KeyValueStoreFactory = Box<dyn Fn() -> KeyValueStoreBox + Send + Sync>;
