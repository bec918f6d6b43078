//! Integration tests for the email delivery claim protocol.

mod helpers;

use std::time::Duration;

use chrono::Utc;

use hearth_core::ErrorKind;
use hearth_core::types::{NotificationId, UserId};
use hearth_database::NotificationStore;
use hearth_entity::EmailDeliveryStatus;

const LEASE: Duration = Duration::from_secs(120);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_exactly_one_winner() {
    let app = helpers::TestApp::new();
    let notification = app.notify(UserId::new()).await;

    let claims = (0..16).map(|_| {
        let service = app.service.clone();
        tokio::spawn(async move { service.try_claim_email_delivery(notification.id, LEASE).await })
    });
    let results = futures::future::join_all(claims).await;

    let mut winners = 0;
    for result in results {
        match result.expect("claim task panicked") {
            Ok(claimed) => {
                winners += 1;
                assert_eq!(claimed.email_status, EmailDeliveryStatus::Processing);
            }
            Err(e) => assert_eq!(e.kind, ErrorKind::NotClaimable),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_expired_lease_is_recovered() {
    let app = helpers::TestApp::new();
    let notification = app.notify(UserId::new()).await;

    app.service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap();
    assert!(app.store.set_email_locked_until(
        notification.id,
        Some(Utc::now() - chrono::Duration::minutes(1)),
    ));

    let candidates = app.service.get_email_delivery_candidates(10).await.unwrap();
    assert_eq!(candidates, vec![notification.id]);

    let reclaimed = app
        .service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap();
    assert!(reclaimed.email_locked_until.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_live_lease_blocks_second_claim() {
    let app = helpers::TestApp::new();
    let notification = app.notify(UserId::new()).await;

    app.service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap();

    let err = app
        .service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotClaimable);
    assert!(app.service.get_email_delivery_candidates(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_candidates_are_oldest_first_and_capped() {
    let app = helpers::TestApp::new();
    let user = UserId::new();
    let base = Utc::now() - chrono::Duration::hours(1);

    let mut ids = Vec::new();
    for minutes in [30, 10, 20] {
        let row = helpers::information(user).into_notification(base + chrono::Duration::minutes(minutes));
        ids.push((minutes, app.store.insert(&row).await.unwrap().id));
    }
    ids.sort();
    let oldest_first: Vec<NotificationId> = ids.into_iter().map(|(_, id)| id).collect();

    let candidates = app.service.get_email_delivery_candidates(10).await.unwrap();
    assert_eq!(candidates, oldest_first);

    let capped = app.service.get_email_delivery_candidates(2).await.unwrap();
    assert_eq!(capped, oldest_first[..2].to_vec());
}

#[tokio::test]
async fn test_outcomes_release_the_lease() {
    let app = helpers::TestApp::new();
    let notification = app.notify(UserId::new()).await;

    app.service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap();
    app.service
        .mark_email_delivery_as_pending(notification.id)
        .await
        .unwrap();

    let row = app.service.get_by_id(notification.id).await.unwrap();
    assert_eq!(row.email_status, EmailDeliveryStatus::Pending);
    assert!(row.email_locked_until.is_none());

    app.service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap();
    app.service
        .mark_email_delivery_succeeded(notification.id)
        .await
        .unwrap();

    let err = app
        .service
        .try_claim_email_delivery(notification.id, LEASE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotClaimable);
}

#[tokio::test]
async fn test_unknown_notification() {
    let app = helpers::TestApp::new();
    let id = NotificationId::new();

    let err = app.service.try_claim_email_delivery(id, LEASE).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app.service.mark_email_delivery_as_failed(id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
