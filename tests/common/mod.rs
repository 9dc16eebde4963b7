#![allow(dead_code)]

use async_trait::async_trait;
use paysim::application::simulator::MockPaymentService;
use paysim::config::MockConfig;
use paysim::domain::payment::{Amount, BuyerInfo, CreatePaymentRequest, PaymentStatusView};
use paysim::domain::ports::{KeyValueStore, RandomSource};
use paysim::error::{PaymentError, Result};
use paysim::infrastructure::in_memory::InMemoryKeyValueStore;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays a fixed sequence of draws, repeating the last one once exhausted.
pub struct SequenceRandom {
    draws: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl SequenceRandom {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: Mutex::new(draws.iter().copied().collect()),
            last: Mutex::new(draws.last().copied().unwrap_or(0.0)),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        match self.draws.lock().unwrap().pop_front() {
            Some(draw) => {
                *self.last.lock().unwrap() = draw;
                draw
            }
            None => *self.last.lock().unwrap(),
        }
    }
}

/// A store whose every operation fails, like a full or missing browser storage.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn put(&self, _key: &str, _value: String) -> Result<()> {
        Err(PaymentError::Storage("quota exceeded".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(PaymentError::Storage("storage unavailable".to_string()))
    }
}

pub fn config() -> MockConfig {
    MockConfig {
        success_rate: 0.8,
        require_3ds_rate: 0.3,
        api_delay_ms: 100,
        webhook_delay_ms: 2_000,
        debug_mode: true,
    }
}

pub fn request() -> CreatePaymentRequest {
    CreatePaymentRequest {
        amount: Amount::new(dec!(1500)).unwrap(),
        currency: "RSD".parse().unwrap(),
        listing_id: "456".to_string(),
        buyer_info: BuyerInfo {
            name: Some("Marko Petrović".to_string()),
            email: Some("marko@example.com".to_string()),
            phone: None,
        },
        locale: Some("sr".to_string()),
    }
}

pub fn simulator(config: MockConfig, draws: &[f64]) -> MockPaymentService {
    MockPaymentService::builder(config)
        .random(Arc::new(SequenceRandom::new(draws)))
        .build()
        .unwrap()
}

pub fn simulator_with_store(
    config: MockConfig,
    draws: &[f64],
    store: &InMemoryKeyValueStore,
) -> MockPaymentService {
    MockPaymentService::builder(config)
        .random(Arc::new(SequenceRandom::new(draws)))
        .store(Box::new(store.clone()))
        .build()
        .unwrap()
}

pub fn assert_completion_invariant(view: &PaymentStatusView) {
    assert_eq!(
        view.completed_at.is_some(),
        view.status.is_terminal(),
        "completedAt must be set exactly for terminal statuses, got {:?} with {:?}",
        view.status,
        view.completed_at
    );
}
