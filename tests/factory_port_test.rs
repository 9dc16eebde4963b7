mod common;

use common::{SequenceRandom, request};
use paysim::application::selector::{MemoizedPaymentService, PaymentServiceFactory};
use paysim::config::{MockConfig, PaymentConfig};
use paysim::domain::payment::PaymentStatus;
use paysim::domain::ports::{KeyValueStoreBox, KeyValueStoreFactory, PaymentServiceBox};
use paysim::error::PaymentError;
use paysim::infrastructure::in_memory::InMemoryKeyValueStore;
use paysim::infrastructure::random::FixedRandom;
use std::sync::Arc;
use std::time::Duration;

fn shared_store_factory(store: &InMemoryKeyValueStore) -> KeyValueStoreFactory {
    let store = store.clone();
    Box::new(move || Box::new(store.clone()) as KeyValueStoreBox)
}

#[tokio::test(start_paused = true)]
async fn test_factory_builds_working_mock() {
    let factory = PaymentServiceFactory::new().with_random(Arc::new(SequenceRandom::new(&[0.9, 0.1])));
    let service = factory
        .create(&PaymentConfig::mock(common::config()))
        .unwrap();

    let created = service.create_payment(request()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_000)).await;

    let status = service.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Captured);
}

#[tokio::test(start_paused = true)]
async fn test_factory_services_share_durable_store() {
    let store = InMemoryKeyValueStore::new();
    let factory = PaymentServiceFactory::new()
        .with_random(Arc::new(FixedRandom(0.1)))
        .with_store_factory(shared_store_factory(&store));
    let config = PaymentConfig::mock(common::config());

    let checkout = factory.create(&config).unwrap();
    let created = checkout.create_payment(request()).await.unwrap();

    let status_page = factory.create(&config).unwrap();
    let status = status_page.get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.id, created.id);
    assert_eq!(status.status, PaymentStatus::Pending);
}

#[test]
fn test_factory_errors() {
    let factory = PaymentServiceFactory::new();

    let missing_mock = PaymentConfig {
        mode: Some("mock".to_string()),
        ..PaymentConfig::default()
    };
    assert!(matches!(
        factory.create(&missing_mock),
        Err(PaymentError::Configuration(_))
    ));

    let sandbox = PaymentConfig {
        mode: Some("sandbox".to_string()),
        ..PaymentConfig::mock(MockConfig::default())
    };
    let err = factory.create(&sandbox).err().unwrap();
    assert!(err.to_string().contains("'sandbox' is not implemented yet"));

    let unknown = PaymentConfig {
        mode: Some("paypal".to_string()),
        ..PaymentConfig::mock(MockConfig::default())
    };
    assert!(matches!(
        factory.create(&unknown),
        Err(PaymentError::UnknownMode(mode)) if mode == "paypal"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_memoized_service_keeps_state() {
    let memo = MemoizedPaymentService::new(
        PaymentServiceFactory::new().with_random(Arc::new(FixedRandom(0.1))),
        PaymentConfig::mock(common::config()),
    );

    let created = memo.get().unwrap().create_payment(request()).await.unwrap();

    // No durable store: only the memoized instance knows the payment.
    let status = memo.get().unwrap().get_payment_status(&created.id).await.unwrap();
    assert_eq!(status.id, created.id);
}

#[tokio::test(start_paused = true)]
async fn test_service_as_trait_object_across_tasks() {
    let service: PaymentServiceBox = PaymentServiceFactory::new()
        .with_random(Arc::new(FixedRandom(0.1)))
        .create(&PaymentConfig::mock(common::config()))
        .unwrap();

    // Verify Send + Sync by spawning tasks
    let creator = Arc::clone(&service);
    let id = tokio::spawn(async move { creator.create_payment(request()).await.unwrap().id })
        .await
        .unwrap();

    let resolver = Arc::clone(&service);
    let webhook_id = id.clone();
    tokio::spawn(async move {
        resolver
            .simulate_webhook(&webhook_id, PaymentStatus::Captured)
            .await
            .unwrap()
    })
    .await
    .unwrap();

    let status = service.get_payment_status(&id).await.unwrap();
    assert_eq!(status.status, PaymentStatus::Captured);
    service.cleanup().await;
}
