//! Order fulfillment against in-memory catalog, customers and storage.

mod support;

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use tokio_test::{assert_err, assert_ok};

use common::AppError;
use domain::{Identity, ItemRequest, OrderStatus, PaymentMethod};
use order_service_lib::repository::OrderFilter;
use order_service_lib::service::{CreateOrder, OrderService};

use support::{admin, customer, product, Harness};

fn order_for(customer_id: i64, items: &[(i64, i32)]) -> CreateOrder {
    CreateOrder {
        customer_id,
        payment_method: PaymentMethod::Pix,
        notes: None,
        items: items
            .iter()
            .map(|&(product_id, quantity)| ItemRequest {
                product_id,
                quantity,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_create_then_cancel_restores_stock() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);

    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::new(17980, 2));
    assert_eq!(order.items[0].unit_price, Decimal::new(8990, 2));
    assert!(order.is_consistent());
    assert_eq!(h.catalog.stock(10), 48);

    let cancelled = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.total, Decimal::new(17980, 2));
    assert_eq!(h.catalog.stock(10), 50);
}

#[tokio::test]
async fn test_cancelling_twice_restores_once() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&admin(), order_for(1, &[(10, 2)]))
        .await
        .unwrap();

    h.service
        .update_status(&admin(), order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    h.service
        .update_status(&admin(), order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    let again = h
        .service
        .update_status(&admin(), order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(again.status, OrderStatus::Cancelled);
    assert_eq!(h.catalog.stock(10), 50);
    assert_eq!(h.catalog.restorations.lock().as_slice(), &[(10, 2)]);
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let h = Harness::new(vec![product(10, 1000, 5), product(11, 500, 1)], &[1]);

    let err = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2), (11, 3)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { product_id: 11 }));
    assert_eq!(h.catalog.stock(10), 5);
    assert_eq!(h.catalog.stock(11), 1);
    assert!(h.catalog.deductions.lock().is_empty());
    assert!(h.repo.all().is_empty());
}

#[tokio::test]
async fn test_failed_deduction_rolls_back_earlier_items() {
    let h = Harness::new(
        vec![product(1, 1000, 10), product(2, 1000, 10), product(3, 1000, 10)],
        &[1],
    );
    h.catalog.fail_deduction_for(3);

    let err = h
        .service
        .create(&customer(1), order_for(1, &[(1, 1), (2, 2), (3, 3)]))
        .await
        .unwrap_err();

    assert!(err.is_service_unavailable());
    assert_eq!(h.catalog.stock(1), 10);
    assert_eq!(h.catalog.stock(2), 10);
    assert_eq!(h.catalog.stock(3), 10);
    // Newest deduction is undone first
    assert_eq!(h.catalog.restorations.lock().as_slice(), &[(2, 2), (1, 1)]);
    assert!(h.repo.all().is_empty());
}

#[tokio::test]
async fn test_rollback_failure_is_reported() {
    let h = Harness::new(vec![product(1, 1000, 10), product(2, 1000, 5)], &[1]);
    h.catalog.fail_deduction_for(2);
    h.catalog.fail_restore_for(1);

    let err = h
        .service
        .create(&customer(1), order_for(1, &[(1, 4), (2, 1)]))
        .await
        .unwrap_err();

    // The restoration failure wins over the deduction failure
    assert!(matches!(err, AppError::ServiceUnavailable(ref what) if what.contains("restore")));
    // Restoration failed, so the first deduction is still outstanding
    assert_eq!(h.catalog.stock(1), 6);
}

#[tokio::test]
async fn test_persist_failure_releases_reservation() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    h.repo.fail_create.store(true, Ordering::SeqCst);

    let err = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(h.catalog.stock(10), 50);
}

#[tokio::test]
async fn test_local_validation_happens_before_peer_calls() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);

    let empty = h.service.create(&customer(1), order_for(1, &[])).await;
    let zero = h.service.create(&customer(1), order_for(1, &[(10, 0)])).await;
    let duplicated = h
        .service
        .create(&customer(1), order_for(1, &[(10, 1), (10, 2)]))
        .await;

    for result in [empty, zero, duplicated] {
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
    assert_eq!(h.catalog.stock(10), 50);
}

#[tokio::test]
async fn test_unknown_customer_or_product_is_not_found() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);

    let err = h
        .service
        .create(&admin(), order_for(2, &[(10, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref what) if what == "Customer 2"));

    let err = h
        .service
        .create(&admin(), order_for(1, &[(99, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref what) if what == "Product 99"));
}

#[tokio::test]
async fn test_customer_cannot_order_for_someone_else() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1, 2]);

    let err = h
        .service
        .create(&customer(1), order_for(2, &[(10, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(h.catalog.stock(10), 50);
}

#[tokio::test]
async fn test_invalid_identity_is_unauthorized() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);

    let err = h
        .service
        .create(&Identity::invalid(), order_for(1, &[(10, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn test_ownership_on_reads_and_updates() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1, 2]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 1)]))
        .await
        .unwrap();

    assert_ok!(h.service.get(&customer(1), order.id).await);
    assert_ok!(h.service.get(&admin(), order.id).await);
    assert!(matches!(
        h.service.get(&customer(2), order.id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        h.service
            .update_status(&customer(2), order.id, OrderStatus::Cancelled)
            .await,
        Err(AppError::Forbidden)
    ));
    assert_eq!(h.catalog.stock(10), 49);
}

#[tokio::test]
async fn test_customer_may_only_cancel() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 1)]))
        .await
        .unwrap();

    let err = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn test_disallowed_transition_is_conflict() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&admin(), order_for(1, &[(10, 1)]))
        .await
        .unwrap();

    let err = h
        .service
        .update_status(&admin(), order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_with_catalog_down_keeps_status() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.catalog.fail_restore_for(10);

    let err = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();

    assert!(err.is_service_unavailable());
    let stored = h.service.get(&customer(1), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(h.catalog.stock(10), 48);
}

#[tokio::test]
async fn test_failed_cancellation_write_re_reserves_stock() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.repo.fail_update.store(true, Ordering::SeqCst);

    assert_err!(
        h.service
            .update_status(&customer(1), order.id, OrderStatus::Cancelled)
            .await
    );
    assert_eq!(h.catalog.stock(10), 48);
}

#[tokio::test]
async fn test_partial_restore_is_undone_and_retry_restores_once() {
    let h = Harness::new(vec![product(10, 8990, 50), product(20, 1500, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2), (20, 3)]))
        .await
        .unwrap();
    h.catalog.fail_restore_for(10);

    let err = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(err.is_service_unavailable());
    // Product 20 was given back, then taken again when product 10 failed
    assert_eq!(h.catalog.stock(10), 48);
    assert_eq!(h.catalog.stock(20), 47);
    let stored = h.service.get(&customer(1), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);

    h.catalog.allow_restore_for(10);
    let cancelled = assert_ok!(
        h.service
            .update_status(&customer(1), order.id, OrderStatus::Cancelled)
            .await
    );
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(h.catalog.stock(10), 50);
    assert_eq!(h.catalog.stock(20), 50);
}

#[tokio::test]
async fn test_failed_re_deduction_after_partial_restore_is_reported() {
    let h = Harness::new(vec![product(10, 8990, 50), product(20, 1500, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2), (20, 3)]))
        .await
        .unwrap();
    h.catalog.fail_restore_for(10);
    h.catalog.fail_deduction_for(20);

    let err = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();

    // The re-deduction failure wins over the restore failure
    assert!(matches!(err, AppError::ServiceUnavailable(ref what) if what == "catalog"));
    assert_eq!(h.catalog.stock(20), 50);
}

#[tokio::test]
async fn test_failed_cancellation_write_and_re_reservation_are_both_reported() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.repo.fail_update.store(true, Ordering::SeqCst);
    h.catalog.fail_deduction_for(10);

    let err = h
        .service
        .update_status(&customer(1), order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(ref msg) if msg.contains("re-reserve")));
    assert_eq!(h.catalog.stock(10), 50);
    let stored = h.service.get(&customer(1), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_failed_delete_leaves_order_cancelled() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.repo.fail_delete.store(true, Ordering::SeqCst);

    assert_err!(h.service.delete(&customer(1), order.id).await);
    let stored = h.service.get(&customer(1), order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert_eq!(h.catalog.stock(10), 50);

    h.repo.fail_delete.store(false, Ordering::SeqCst);
    assert_ok!(h.service.delete(&customer(1), order.id).await);
    assert_eq!(h.catalog.stock(10), 50);
    assert_eq!(h.catalog.restorations.lock().len(), 1);
    assert!(h.repo.all().is_empty());
}

#[tokio::test]
async fn test_delete_pending_restores_stock() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&customer(1), order_for(1, &[(10, 2)]))
        .await
        .unwrap();

    h.service.delete(&customer(1), order.id).await.unwrap();

    assert_eq!(h.catalog.stock(10), 50);
    assert!(h.repo.all().is_empty());
}

#[tokio::test]
async fn test_delete_cancelled_does_not_restore_again() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&admin(), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.service
        .update_status(&admin(), order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    h.service.delete(&admin(), order.id).await.unwrap();

    assert_eq!(h.catalog.stock(10), 50);
    assert_eq!(h.catalog.restorations.lock().len(), 1);
}

#[tokio::test]
async fn test_delete_confirmed_is_conflict() {
    let h = Harness::new(vec![product(10, 8990, 50)], &[1]);
    let order = h
        .service
        .create(&admin(), order_for(1, &[(10, 2)]))
        .await
        .unwrap();
    h.service
        .update_status(&admin(), order.id, OrderStatus::Confirmed)
        .await
        .unwrap();

    let err = h.service.delete(&admin(), order.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.catalog.stock(10), 48);
}

#[tokio::test]
async fn test_listing_is_scoped_for_customers() {
    let h = Harness::new(vec![product(10, 1000, 50)], &[1, 2]);
    h.service
        .create(&customer(1), order_for(1, &[(10, 1)]))
        .await
        .unwrap();
    h.service
        .create(&customer(2), order_for(2, &[(10, 1)]))
        .await
        .unwrap();

    let own = h
        .service
        .list(&customer(1), OrderFilter::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert!(own.iter().all(|o| o.customer_id == 1));

    let foreign = h
        .service
        .list(
            &customer(1),
            OrderFilter {
                customer_id: Some(2),
                status: None,
            },
        )
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden)));

    let everything = h.service.list(&admin(), OrderFilter::default()).await.unwrap();
    assert_eq!(everything.len(), 2);

    let pending_of_two = h
        .service
        .list(
            &admin(),
            OrderFilter {
                customer_id: Some(2),
                status: Some(OrderStatus::Pending),
            },
        )
        .await
        .unwrap();
    assert_eq!(pending_of_two.len(), 1);
}
