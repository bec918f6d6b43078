//! Integration tests for notification creation and read state.

mod helpers;

use hearth_core::ErrorKind;
use hearth_core::types::UserId;
use hearth_dispatch::DeliveryError;
use hearth_entity::{
    DeliveryChannel, NewNotification, NotificationCategory, NotificationChannels, NotificationType,
};

#[tokio::test]
async fn test_invalid_notification_is_rejected_per_field() {
    let mut app = helpers::TestApp::new();
    let input = NewNotification {
        user_id: UserId::new(),
        notification_type: NotificationType::None,
        category: NotificationCategory::System,
        code_message: String::new(),
        ..NewNotification::default()
    };

    let err = app.service.create_notification(input).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.details.iter().any(|d| d.starts_with("code_message:")));
    assert!(err.details.iter().any(|d| d.starts_with("notification_type:")));
    assert!(!err.details.iter().any(|d| d.starts_with("category:")));

    assert!(app.store.is_empty());
    assert!(app.intake.as_mut().unwrap().drain().is_empty());
}

#[tokio::test]
async fn test_past_expiry_is_rejected() {
    let app = helpers::TestApp::new();
    let input = NewNotification {
        expires_at: Some(chrono::Utc::now().date_naive() - chrono::Duration::days(1)),
        ..helpers::information(UserId::new())
    };

    let err = app.service.create_notification(input).await.unwrap_err();
    assert_eq!(err.details, vec!["expires_at: must be in the future".to_string()]);
}

#[tokio::test]
async fn test_action_required_guard() {
    let app = helpers::TestApp::new();
    let user = UserId::new();
    let confirm = app
        .service
        .create_notification(NewNotification {
            notification_type: NotificationType::EmailConfirmation,
            category: NotificationCategory::Security,
            action_label_code: Some("notifications.confirm_email".to_string()),
            ..helpers::information(user)
        })
        .await
        .unwrap();
    assert!(confirm.is_action_required);

    let err = app.service.mark_as_read(user, confirm.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ActionRequired);
    assert!(!app.service.get_by_id(confirm.id).await.unwrap().is_read);

    let marked = app
        .service
        .action_made(user, NotificationType::EmailConfirmation)
        .await
        .unwrap();
    assert_eq!(marked, 1);
    assert!(app.service.get_by_id(confirm.id).await.unwrap().is_read);
}

#[tokio::test]
async fn test_mark_all_as_read_skips_action_required() {
    let app = helpers::TestApp::new();
    let user = UserId::new();
    app.notify(user).await;
    app.notify(user).await;
    let invitation = app
        .service
        .create_notification(NewNotification {
            notification_type: NotificationType::ProjectInvitation,
            action_label_code: Some("notifications.accept_invitation".to_string()),
            ..helpers::information(user)
        })
        .await
        .unwrap();

    let marked = app.service.mark_all_as_read(user).await.unwrap();
    assert_eq!(marked, 2);

    let unread = app.service.get_unread(user, None).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, invitation.id);
    assert_eq!(app.service.count_unread(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_queries_are_scoped_and_ordered() {
    let app = helpers::TestApp::new();
    let user = UserId::new();
    let first = app.notify(user).await;
    let security = app
        .service
        .create_notification(NewNotification {
            notification_type: NotificationType::Security,
            category: NotificationCategory::Security,
            ..helpers::information(user)
        })
        .await
        .unwrap();
    app.notify(UserId::new()).await;

    let all = app.service.get_all_for_user(user).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].created_at >= all[1].created_at);

    let only_security = app
        .service
        .get_unread(user, Some(NotificationCategory::Security))
        .await
        .unwrap();
    assert_eq!(only_security.len(), 1);
    assert_eq!(only_security[0].id, security.id);

    app.service.mark_as_read(user, first.id).await.unwrap();
    assert_eq!(app.service.count_unread(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_creation_fans_out_to_everything_but_email() {
    let email = helpers::ScriptedSender::succeeding(DeliveryChannel::Email);
    let sms = helpers::ScriptedSender::succeeding(DeliveryChannel::Sms);
    let app = helpers::TestApp::with_senders(helpers::senders(&[&email, &sms]));
    let user = app.add_user(NotificationChannels::EMAIL | NotificationChannels::SMS);

    app.notify(user).await;

    assert_eq!(sms.calls(), 1);
    assert_eq!(email.calls(), 0);
}

#[tokio::test]
async fn test_fan_out_failure_does_not_fail_creation() {
    let sms = helpers::ScriptedSender::failing(
        DeliveryChannel::Sms,
        DeliveryError::Transient("gateway returned 503 Service Unavailable".to_string()),
    );
    let mut app = helpers::TestApp::with_senders(helpers::senders(&[&sms]));
    let user = app.add_user(NotificationChannels::SMS);

    let created = app.notify(user).await;

    assert_eq!(sms.calls(), 1);
    assert_eq!(app.intake.as_mut().unwrap().drain(), vec![created.id]);
}

#[tokio::test]
async fn test_channel_limit_narrows_fan_out() {
    let sms = helpers::ScriptedSender::succeeding(DeliveryChannel::Sms);
    let push = helpers::ScriptedSender::succeeding(DeliveryChannel::Push);
    let app = helpers::TestApp::with_senders(helpers::senders(&[&sms, &push]));
    let user = app.add_user(NotificationChannels::SMS | NotificationChannels::PUSH);

    app.service
        .create_notification(NewNotification {
            limit_notification_channels: NotificationChannels::IN_APP | NotificationChannels::PUSH,
            ..helpers::information(user)
        })
        .await
        .unwrap();

    assert_eq!(sms.calls(), 0);
    assert_eq!(push.calls(), 1);
}
