//! Session lifecycle against the in-memory backend and its change feed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, timeout};

use notifyhub_core::config::RealtimeConfig;
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_database::{MemoryNotificationRepository, NotificationPersistence};
use notifyhub_entity::notification::classifier::classify;
use notifyhub_entity::{
    NotificationCategory, NotificationFilter, NotificationKind, NotificationPayload,
    NotificationRecord, Priority, RawType, ReadState,
};
use notifyhub_realtime::{NotificationSession, SessionDeps, SyncStatus};
use notifyhub_service::{NotificationDispatcher, NotificationDraft};

const WAIT: Duration = Duration::from_secs(5);

fn config() -> RealtimeConfig {
    RealtimeConfig {
        reconnect_initial_ms: 100,
        reconnect_max_ms: 400,
        ..RealtimeConfig::default()
    }
}

fn deps(repo: &Arc<MemoryNotificationRepository>) -> SessionDeps {
    SessionDeps {
        persistence: repo.clone(),
        dispatcher: NotificationDispatcher::new(repo.clone()),
    }
}

fn record(owner: UserId, title: &str) -> NotificationRecord {
    let c = classify(Some(RawType::Info), Some(NotificationCategory::System));
    NotificationRecord {
        id: NotificationId::new(),
        recipient_id: owner,
        title: title.to_string(),
        message: "body".to_string(),
        raw_type: RawType::Info,
        category: Some(NotificationCategory::System),
        kind: c.kind,
        priority: c.priority,
        action_url: None,
        action_label: None,
        payload: NotificationPayload::None,
        created_at: Utc::now(),
        expires_at: None,
        read_state: ReadState::Unread,
        read_at: None,
    }
}

async fn wait_for_status(session: &NotificationSession, status: SyncStatus) {
    let mut rx = session.sync_status_changes();
    timeout(WAIT, rx.wait_for(|s| *s == status))
        .await
        .expect("status not reached")
        .expect("sync loop exited");
}

async fn wait_for_len(session: &NotificationSession, len: usize) {
    timeout(WAIT, async {
        while session.visible_notifications(NotificationFilter::default()).count() != len {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("store never reached expected size");
}

#[tokio::test]
async fn test_no_session_without_identity() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let session = NotificationSession::start(&None::<UserId>, deps(&repo), &config());
    assert!(session.is_none());
}

#[tokio::test]
async fn test_booking_confirmed_shows_in_badge_and_dropdown() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_status(&session, SyncStatus::Live).await;

    let record = session
        .notify(
            NotificationDraft::new("Booking Confirmed", "Your consultation is booked")
                .with_type_name("success")
                .with_category_name("consultation")
                .with_action("/dashboard?tab=upcoming", None),
        )
        .await
        .unwrap();

    assert_eq!(record.recipient_id, user);
    assert_eq!(record.kind, NotificationKind::AppointmentReminder);
    assert_eq!(record.priority, Priority::Medium);
    assert_eq!(session.unread_count(), 1);

    let visible = session.visible_notifications(NotificationFilter::unread()).to_vec();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, record.id);

    session.end().await;
}

#[tokio::test]
async fn test_feed_events_merge_into_seeded_store() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    let a = record(user, "A");
    let b = record(user, "B");
    repo.insert(&a).await.unwrap();
    repo.insert(&b).await.unwrap();

    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_status(&session, SyncStatus::Live).await;
    wait_for_len(&session, 2).await;

    let c = record(user, "C");
    repo.insert(&c).await.unwrap();
    wait_for_len(&session, 3).await;

    let titles: Vec<String> = session
        .visible_notifications(NotificationFilter::default())
        .iter()
        .map(|r| r.title.clone())
        .collect();
    assert_eq!(titles.len(), 3);
    for title in ["A", "B", "C"] {
        assert!(titles.iter().any(|t| t == title), "missing {title}");
    }
    assert_eq!(session.unread_count(), 3);

    session.end().await;
}

#[tokio::test]
async fn test_login_backlog_does_not_toast() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    for title in ["Older", "Old", "Recent"] {
        repo.insert(&record(user, title)).await.unwrap();
    }

    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    let mut toasts = session.toasts();
    wait_for_status(&session, SyncStatus::Live).await;
    wait_for_len(&session, 3).await;
    assert_eq!(session.unread_count(), 3);
    assert!(toasts.try_next().is_none());

    let fresh = record(user, "Fresh");
    repo.insert(&fresh).await.unwrap();
    let toast = timeout(WAIT, toasts.next()).await.expect("no toast for live arrival");
    assert_eq!(toast.map(|r| r.id), Some(fresh.id));
    assert!(toasts.try_next().is_none());

    session.end().await;
}

#[tokio::test]
async fn test_duplicate_delivery_counted_once() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_status(&session, SyncStatus::Live).await;

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    let _sub = session.on_change(move |change| {
        counter.fetch_add(change.inserted.len(), Ordering::SeqCst);
    });

    // Stored locally by notify and delivered again by the feed.
    session
        .notify(NotificationDraft::new("Payment Received", "Payment of $50.00 received"))
        .await
        .unwrap();

    // Feed order guarantees the duplicate above was applied first.
    repo.insert(&record(user, "marker")).await.unwrap();
    wait_for_len(&session, 2).await;

    assert_eq!(session.unread_count(), 2);
    assert_eq!(changes.load(Ordering::SeqCst), 2);

    session.end().await;
}

#[tokio::test]
async fn test_reconnect_reseeds_without_dropping_local_records() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    repo.insert(&record(user, "before")).await.unwrap();

    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_status(&session, SyncStatus::Live).await;
    wait_for_len(&session, 1).await;

    repo.close_feeds().await;
    wait_for_status(&session, SyncStatus::Stale).await;

    // Written while the feed is down; only the re-seed can bring it in.
    repo.insert(&record(user, "during outage")).await.unwrap();

    wait_for_status(&session, SyncStatus::Live).await;
    wait_for_len(&session, 2).await;
    assert_eq!(session.unread_count(), 2);

    session.end().await;
}

#[tokio::test]
async fn test_mark_all_read_and_delete_persist() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    let a = record(user, "A");
    let b = record(user, "B");
    repo.insert(&a).await.unwrap();
    repo.insert(&b).await.unwrap();

    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_len(&session, 2).await;

    session.mark_all_read().await;
    assert_eq!(session.unread_count(), 0);

    assert!(session.delete(a.id).await.unwrap());
    assert!(session.visible_notifications(NotificationFilter::default()).iter().all(|r| r.id != a.id));

    let persisted = repo
        .query(user, notifyhub_database::NotificationQuerySpec::default())
        .await
        .unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, b.id);
    assert_eq!(persisted[0].read_state, ReadState::Read);

    session.end().await;
}

#[tokio::test]
async fn test_end_releases_sync_loop() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let user = UserId::new();
    let session = NotificationSession::start(&Some(user), deps(&repo), &config()).unwrap();
    wait_for_status(&session, SyncStatus::Live).await;

    let status = session.sync_status_changes();
    timeout(WAIT, session.end()).await.expect("session did not end");
    assert!(status.has_changed().is_err());
}
