mod common;

use common::{FailingStore, assert_completion_invariant, config, request, simulator_with_store};
use paysim::application::simulator::{MockPaymentService, storage_key};
use paysim::domain::payment::{PaymentStatus, SimulatedPayment};
use paysim::domain::ports::{KeyValueStore, PaymentService};
use paysim::error::PaymentError;
use paysim::infrastructure::in_memory::InMemoryKeyValueStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_payment_survives_fresh_instance() {
    let store = InMemoryKeyValueStore::new();
    let first = simulator_with_store(config(), &[0.1], &store);

    let created = first.create_payment(request()).await.unwrap();
    let original = first.get_payment_status(&created.id).await.unwrap();

    // A new page load: same storage, empty memory.
    let second = simulator_with_store(config(), &[0.1], &store);
    let reloaded = second.get_payment_status(&created.id).await.unwrap();

    assert_eq!(reloaded, original);
}

#[tokio::test(start_paused = true)]
async fn test_mirror_follows_resolution() {
    let store = InMemoryKeyValueStore::new();
    let service = simulator_with_store(config(), &[0.5, 0.5], &store);

    let created = service.create_payment(request()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let raw = store.get(&storage_key(&created.id)).await.unwrap().unwrap();
    let mirrored: SimulatedPayment = serde_json::from_str(&raw).unwrap();
    assert_eq!(mirrored.status, PaymentStatus::Captured);
    assert!(mirrored.completed_at.is_some());
    assert_eq!(mirrored.buyer_info.email.as_deref(), Some("marko@example.com"));
}

#[tokio::test(start_paused = true)]
async fn test_webhook_with_raw_terminal_spelling_is_stamped() {
    let store = InMemoryKeyValueStore::new();
    let first = simulator_with_store(config(), &[0.1], &store);
    let created = first.create_payment(request()).await.unwrap();

    first
        .simulate_webhook(&created.id, PaymentStatus::Other("captured".to_string()))
        .await
        .unwrap();

    let live = first.get_payment_status(&created.id).await.unwrap();
    assert_eq!(live.status, PaymentStatus::Captured);
    assert_completion_invariant(&live);

    let second = simulator_with_store(config(), &[0.1], &store);
    let reloaded = second.get_payment_status(&created.id).await.unwrap();
    assert_completion_invariant(&reloaded);
    assert_eq!(reloaded, live);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_instance_can_answer_challenge() {
    let store = InMemoryKeyValueStore::new();
    let first = simulator_with_store(config(), &[0.1], &store);
    let created = first.create_payment(request()).await.unwrap();
    assert!(created.requires_3ds);

    let second = simulator_with_store(config(), &[0.1], &store);
    assert!(!second.handle_3d_secure(&created.id, "000").await.unwrap());

    let status = first.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Pending, "first instance keeps its own copy");

    let third = simulator_with_store(config(), &[0.1], &store);
    let status = third.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_mirror_is_a_miss() {
    let store = InMemoryKeyValueStore::new();
    store
        .put(&storage_key("broken"), "{not json".to_string())
        .await
        .unwrap();

    let service = simulator_with_store(config(), &[0.5], &store);
    assert!(matches!(
        service.get_payment_status("broken").await,
        Err(PaymentError::NotFound(id)) if id == "broken"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_storage_failures_are_absorbed() {
    let service = MockPaymentService::builder(config())
        .random(Arc::new(common::SequenceRandom::new(&[0.9, 0.1])))
        .store(Box::new(FailingStore))
        .build()
        .unwrap();

    let created = service.create_payment(request()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_000)).await;

    let status = service.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Captured);

    assert!(matches!(
        service.get_payment_status("unknown").await,
        Err(PaymentError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_without_store_memory_still_works() {
    let service = common::simulator(config(), &[0.1]);
    let created = service.create_payment(request()).await.unwrap();

    service
        .simulate_webhook(&created.id, PaymentStatus::Captured)
        .await
        .unwrap();
    let status = service.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Captured);
}
