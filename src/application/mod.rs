//! Application layer: the mock payment simulator and the selector that
//! chooses a payment backend from configuration.
//!
//! `MockPaymentService` keeps its state behind `tokio` locks inside an `Arc`
//! and runs delayed webhooks as spawned tasks, so it can be shared freely
//! between callers.

pub mod selector;
pub mod simulator;
