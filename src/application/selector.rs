use super::simulator::MockPaymentService;
use crate::config::{PaymentConfig, PaymentMode};
use crate::domain::ports::{
    ClockBox, KeyValueStoreFactory, PaymentServiceBox, RandomSourceBox, SchedulerBox,
};
use crate::error::{PaymentError, Result};
use crate::infrastructure::random::ThreadRandom;
use crate::infrastructure::time::{SystemClock, TokioScheduler};
use std::sync::{Arc, OnceLock};

/// Builds the payment service matching a `PaymentConfig`.
///
/// Only mock mode has an implementation. The collaborators held here are
/// handed to every simulator the factory builds; the store factory is called
/// once per simulator.
pub struct PaymentServiceFactory {
    store_factory: Option<KeyValueStoreFactory>,
    random: RandomSourceBox,
    scheduler: SchedulerBox,
    clock: ClockBox,
}

impl Default for PaymentServiceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentServiceFactory {
    pub fn new() -> Self {
        Self {
            store_factory: None,
            random: Arc::new(ThreadRandom),
            scheduler: Arc::new(TokioScheduler),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_store_factory(mut self, store_factory: KeyValueStoreFactory) -> Self {
        self.store_factory = Some(store_factory);
        self
    }

    pub fn with_random(mut self, random: RandomSourceBox) -> Self {
        self.random = random;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerBox) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a new payment service for `config`.
    ///
    /// # Errors
    ///
    /// * `Configuration` if mock mode has no mock sub-configuration or its
    ///   rates are invalid.
    /// * `NotImplemented` for sandbox and production.
    /// * `UnknownMode` for anything else, including a missing mode.
    pub fn create(&self, config: &PaymentConfig) -> Result<PaymentServiceBox> {
        let Some(raw_mode) = config.mode.as_deref() else {
            return Err(PaymentError::UnknownMode("<unset>".to_string()));
        };

        match raw_mode.parse::<PaymentMode>()? {
            PaymentMode::Mock => {
                let mock = config.mock.clone().ok_or_else(|| {
                    PaymentError::Configuration(
                        "mock mode requires a mock configuration".to_string(),
                    )
                })?;

                let mut builder = MockPaymentService::builder(mock)
                    .random(Arc::clone(&self.random))
                    .scheduler(Arc::clone(&self.scheduler))
                    .clock(Arc::clone(&self.clock));
                if let Some(store_factory) = &self.store_factory {
                    builder = builder.store(store_factory());
                }

                tracing::debug!("using mock payment service");
                Ok(Arc::new(builder.build()?))
            }
            mode @ (PaymentMode::Sandbox | PaymentMode::Production) => {
                Err(PaymentError::NotImplemented {
                    mode: mode.to_string(),
                })
            }
        }
    }
}

/// Creates a payment service with the default collaborators and no durable
/// store.
pub fn create_payment_service(config: &PaymentConfig) -> Result<PaymentServiceBox> {
    PaymentServiceFactory::new().create(config)
}

/// Lazily builds one payment service and hands out the same instance on every
/// call.
///
/// A failed build is not remembered; the next call tries again.
pub struct MemoizedPaymentService {
    factory: PaymentServiceFactory,
    config: PaymentConfig,
    instance: OnceLock<PaymentServiceBox>,
}

impl MemoizedPaymentService {
    pub fn new(factory: PaymentServiceFactory, config: PaymentConfig) -> Self {
        Self {
            factory,
            config,
            instance: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<PaymentServiceBox> {
        if let Some(service) = self.instance.get() {
            return Ok(Arc::clone(service));
        }

        let service = self.factory.create(&self.config)?;
        Ok(Arc::clone(self.instance.get_or_init(|| service)))
    }
}
