use crate::config::MockConfig;
use crate::domain::payment::{
    CreatePaymentRequest, PaymentCreated, PaymentStatus, PaymentStatusView, SimulatedPayment,
};
use crate::domain::ports::{
    ClockBox, KeyValueStoreBox, PaymentService, RandomSourceBox, SchedulerBox, TimerHandle,
};
use crate::error::{PaymentError, Result};
use crate::infrastructure::random::ThreadRandom;
use crate::infrastructure::time::{SystemClock, TokioScheduler};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Prefix of the durable mirror keys, followed by the payment id.
pub const STORAGE_KEY_PREFIX: &str = "mock_payment_";
/// The only 3-D Secure code the simulator accepts.
pub const ACCEPTED_3DS_CODE: &str = "123";
/// Latency of a status lookup, independent of `api_delay`.
pub const STATUS_CHECK_DELAY: Duration = Duration::from_millis(500);
/// Latency of a 3-D Secure verification.
pub const CHALLENGE_DELAY: Duration = Duration::from_millis(1_000);
const DEFAULT_LOCALE: &str = "en";

// Lifecycle events go to `info` in debug mode and `debug` otherwise.
macro_rules! lifecycle {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

pub fn storage_key(id: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, id)
}

/// Simulates the asynchronous lifecycle of an AllSecure payment.
///
/// Payments live in an in-memory map and are mirrored, best effort, to an
/// optional durable store so that a fresh instance can still answer status
/// queries. Resolution happens through a delayed simulated webhook that
/// captures or fails the payment according to `success_rate`.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct MockPaymentService {
    inner: Arc<Inner>,
}

// A delayed resolution, tagged so a fired task only unregisters itself.
struct PendingTimer {
    generation: u64,
    handle: TimerHandle,
}

struct Inner {
    config: MockConfig,
    payments: RwLock<HashMap<String, SimulatedPayment>>,
    timers: Mutex<HashMap<String, PendingTimer>>,
    next_generation: AtomicU64,
    store: Option<KeyValueStoreBox>,
    random: RandomSourceBox,
    scheduler: SchedulerBox,
    clock: ClockBox,
}

/// Builds a `MockPaymentService`, replacing any of its collaborators.
pub struct MockPaymentServiceBuilder {
    config: MockConfig,
    store: Option<KeyValueStoreBox>,
    random: RandomSourceBox,
    scheduler: SchedulerBox,
    clock: ClockBox,
}

impl MockPaymentServiceBuilder {
    /// Durable mirror. Without one, payments only live in memory.
    pub fn store(mut self, store: KeyValueStoreBox) -> Self {
        self.store = Some(store);
        self
    }

    pub fn random(mut self, random: RandomSourceBox) -> Self {
        self.random = random;
        self
    }

    pub fn scheduler(mut self, scheduler: SchedulerBox) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    /// Fails if the configured probabilities are outside `[0, 1]`.
    pub fn build(self) -> Result<MockPaymentService> {
        self.config.validate()?;
        Ok(MockPaymentService {
            inner: Arc::new(Inner {
                config: self.config,
                payments: RwLock::new(HashMap::new()),
                timers: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                store: self.store,
                random: self.random,
                scheduler: self.scheduler,
                clock: self.clock,
            }),
        })
    }
}

impl MockPaymentService {
    pub fn builder(config: MockConfig) -> MockPaymentServiceBuilder {
        MockPaymentServiceBuilder {
            config,
            store: None,
            random: Arc::new(ThreadRandom),
            scheduler: Arc::new(TokioScheduler),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a simulator with the default collaborators and no durable store.
    pub fn new(config: MockConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Number of delayed resolutions not yet fired or cancelled.
    pub async fn pending_timer_count(&self) -> usize {
        self.inner.timers.lock().await.len()
    }
}

impl Inner {
    /// Looks a payment up in memory, then in the durable mirror.
    ///
    /// A payment found only in the mirror is copied back into memory.
    async fn find(&self, id: &str) -> Option<SimulatedPayment> {
        if let Some(payment) = self.payments.read().await.get(id) {
            return Some(payment.clone());
        }

        let payment = self.load(id).await?;
        let mut payments = self.payments.write().await;
        Some(payments.entry(id.to_string()).or_insert(payment).clone())
    }

    async fn load(&self, id: &str) -> Option<SimulatedPayment> {
        let store = self.store.as_ref()?;
        let raw = match store.get(&storage_key(id)).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(payment_id = %id, error = %e, "failed to read payment mirror");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(payment) => Some(payment),
            Err(e) => {
                tracing::warn!(payment_id = %id, error = %e, "discarding malformed payment mirror");
                None
            }
        }
    }

    async fn persist(&self, payment: &SimulatedPayment) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let result = match serde_json::to_string(payment) {
            Ok(json) => store.put(&storage_key(&payment.id), json).await,
            Err(e) => Err(PaymentError::from(e)),
        };
        if let Err(e) = result {
            tracing::warn!(payment_id = %payment.id, error = %e, "failed to write payment mirror");
        }
    }

    /// Applies `status` to a known payment and mirrors the result.
    ///
    /// Returns `None` without side effects when the payment is unknown.
    async fn update_status(&self, id: &str, status: PaymentStatus) -> Option<SimulatedPayment> {
        self.find(id).await?;

        let updated = {
            let now = self.clock.now();
            let mut payments = self.payments.write().await;
            let payment = payments.get_mut(id)?;
            payment.apply_status(status, now);
            payment.clone()
        };

        self.persist(&updated).await;
        Some(updated)
    }

    /// Schedules the simulated webhook that settles `id` after `webhook_delay`.
    ///
    /// The registry stays locked until the new timer is recorded, so even a
    /// zero delay cannot fire before its own entry exists.
    async fn schedule_resolution(self: &Arc<Self>, id: &str) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(self);
        let task_id = id.to_string();

        let mut timers = self.timers.lock().await;
        let handle = self.scheduler.schedule(
            self.config.webhook_delay(),
            Box::pin(async move {
                {
                    let mut timers = inner.timers.lock().await;
                    if timers
                        .get(&task_id)
                        .is_some_and(|timer| timer.generation == generation)
                    {
                        timers.remove(&task_id);
                    }
                }

                let status = if inner.random.next_f64() < inner.config.success_rate {
                    PaymentStatus::Captured
                } else {
                    PaymentStatus::Failed
                };
                lifecycle!(inner.config.debug_mode, payment_id = %task_id, %status, "simulated webhook fired");
                inner.update_status(&task_id, status).await;
            }),
        );

        let timer = PendingTimer { generation, handle };
        if let Some(previous) = timers.insert(id.to_string(), timer) {
            previous.handle.cancel();
        }
    }
}

#[async_trait]
impl PaymentService for MockPaymentService {
    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentCreated> {
        let inner = &self.inner;
        inner.scheduler.sleep(inner.config.api_delay()).await;

        let locale = request
            .locale
            .clone()
            .filter(|locale| !locale.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let payment = SimulatedPayment::new(request, inner.clock.now());
        let id = payment.id.clone();

        inner
            .payments
            .write()
            .await
            .insert(id.clone(), payment.clone());
        inner.persist(&payment).await;

        let requires_3ds = inner.random.next_f64() < inner.config.require_3ds_rate;
        if !requires_3ds {
            inner.schedule_resolution(&id).await;
        }

        let mut redirect_url = format!("/{}/payment/mock?id={}", locale, id);
        if requires_3ds {
            redirect_url.push_str("&require3ds=true");
        }

        lifecycle!(
            inner.config.debug_mode,
            payment_id = %id,
            amount = %payment.amount.value(),
            currency = %payment.currency,
            requires_3ds,
            "mock payment created"
        );

        Ok(PaymentCreated {
            id,
            redirect_url,
            status: PaymentStatus::Pending,
            requires_3ds,
        })
    }

    async fn get_payment_status(&self, id: &str) -> Result<PaymentStatusView> {
        self.inner.scheduler.sleep(STATUS_CHECK_DELAY).await;

        self.inner
            .find(id)
            .await
            .map(|payment| payment.view())
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))
    }

    async fn handle_3d_secure(&self, id: &str, code: &str) -> Result<bool> {
        let inner = &self.inner;
        inner.scheduler.sleep(CHALLENGE_DELAY).await;

        let passed = code == ACCEPTED_3DS_CODE;
        lifecycle!(inner.config.debug_mode, payment_id = %id, passed, "3-D Secure challenge answered");

        if passed {
            if inner.find(id).await.is_some() {
                inner.schedule_resolution(id).await;
            }
        } else {
            inner.update_status(id, PaymentStatus::Failed).await;
        }

        Ok(passed)
    }

    async fn simulate_webhook(&self, id: &str, status: PaymentStatus) -> Result<()> {
        match self.inner.update_status(id, status).await {
            Some(payment) => {
                lifecycle!(
                    self.inner.config.debug_mode,
                    payment_id = %id,
                    status = %payment.status,
                    "webhook applied"
                );
            }
            None => {
                tracing::debug!(payment_id = %id, "webhook for unknown payment ignored");
            }
        }
        Ok(())
    }

    async fn cleanup(&self) {
        let timers: Vec<TimerHandle> = {
            let mut timers = self.inner.timers.lock().await;
            timers.drain().map(|(_, timer)| timer.handle).collect()
        };

        if !timers.is_empty() {
            tracing::debug!(count = timers.len(), "cancelling pending payment resolutions");
        }
        for handle in timers {
            handle.cancel();
        }
    }
}
