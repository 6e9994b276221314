//! Alert session tests against an in-memory transport.
//!
//! Every test runs on a paused tokio clock, so transport delays and the poll
//! timer fire in a fixed order.

use std::sync::Arc;
use std::time::Duration;

use alertview_client::{MockCall, MockOp, MockTransport, TransportError};
use alertview_core::{Alert, AlertId, AlertViewConfig, Severity, SeverityFilter};
use alertview_tui::{AlertSession, BadgeSource, NoticeLevel, PageMode};
use chrono::{TimeZone, Utc};

fn alert(id: i64, severity: Severity, is_read: bool) -> Alert {
    let ts = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + chrono::Duration::minutes(id);
    Alert::new(id, format!("alert {}", id), severity, ts).with_read(is_read)
}

fn session(mock: &Arc<MockTransport>, mode: PageMode) -> AlertSession {
    AlertSession::new(
        mock.clone(),
        tokio::runtime::Handle::current(),
        mode,
        &AlertViewConfig::default(),
    )
}

/// Start a full-list session and apply its first fetch.
async fn loaded(mock: &Arc<MockTransport>) -> AlertSession {
    alertview_core::logging::init_test_logging();
    let mut s = session(mock, PageMode::FullList);
    s.start();
    assert!(s.process_next().await);
    assert!(s.cache().is_loaded());
    s
}

fn assert_consistent(s: &AlertSession) {
    assert_eq!(s.cache().unread_count(), s.cache().recount_unread());
    assert_eq!(s.panel_badge().count, s.cache().unread_count());
}

fn server_500(path: &str) -> TransportError {
    TransportError::from_http_status(path, 500, r#"{"error": "boom"}"#)
}

// ============================================================
// Badges and mark-all
// ============================================================

#[tokio::test(start_paused = true)]
async fn test_fetch_then_mark_all_hides_badge() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Low, true),
    ]));
    let mut s = loaded(&mock).await;

    assert_eq!(s.panel_badge().text().as_deref(), Some("1"));
    assert_eq!(s.sidebar_badge().source(), BadgeSource::Cache);
    assert_eq!(s.sidebar_badge().count(), Some(1));

    assert!(s.mark_all_read());
    assert!(!s.panel_badge().should_display());
    assert_consistent(&s);

    s.process_next().await;
    assert!(s.cache().pending_ids().is_empty());
    assert!(!s.panel_badge().should_display());
    assert!(s.rendered().rows().all(|row| row.mark_read.is_none()));
    assert!(mock.alerts().iter().all(|a| a.is_read));

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_is_sent_even_when_nothing_unread() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, true)]));
    let mut s = loaded(&mock).await;

    assert!(s.mark_all_read());
    s.process_next().await;
    assert_eq!(mock.call_count(MockOp::MarkAllRead), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_failure_reverts_only_its_own_ids() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::High, false),
        alert(3, Severity::High, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.set_delay(MockOp::MarkRead, Duration::from_secs(30));
    mock.fail_next(MockOp::MarkAllRead, server_500("/alerts/mark-all-read/"));

    assert!(s.mark_read(AlertId(2)));
    assert!(s.mark_all_read());
    assert_eq!(s.panel_badge().count, 0);

    // Bulk failure arrives first.
    s.process_next().await;
    let cache = s.cache();
    assert!(!cache.get(AlertId(1)).unwrap().is_read);
    assert!(cache.get(AlertId(2)).unwrap().is_read);
    assert!(!cache.get(AlertId(3)).unwrap().is_read);
    assert_eq!(s.panel_badge().count, 2);
    assert_consistent(&s);

    let notices = s.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("mark all"));

    s.process_next().await;
    assert!(s.cache().pending_ids().is_empty());
    assert!(s.cache().get(AlertId(2)).unwrap().is_read);
    assert_consistent(&s);
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_success_outlives_late_single_failure() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Medium, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.set_delay(MockOp::MarkRead, Duration::from_secs(30));
    mock.fail_next(
        MockOp::MarkRead,
        TransportError::network("/alerts/2/mark-read/", "connection reset"),
    );

    assert!(s.mark_read(AlertId(2)));
    assert!(s.mark_all_read());

    // Bulk success arrives first; the server now holds everything read.
    s.process_next().await;
    assert!(mock.alerts().iter().all(|a| a.is_read));
    assert_eq!(s.panel_badge().count, 0);

    s.process_next().await;
    assert!(s.cache().get(AlertId(2)).unwrap().is_read);
    assert!(s.cache().pending_ids().is_empty());
    assert!(!s.panel_badge().should_display());
    assert_consistent(&s);

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Marked 1 alert as read");
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_before_mark_all_success_keeps_alert_read() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Medium, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.set_delay(MockOp::MarkAllRead, Duration::from_secs(30));
    mock.fail_next(MockOp::MarkRead, server_500("/alerts/2/mark-read/"));

    assert!(s.mark_read(AlertId(2)));
    assert!(s.mark_all_read());

    // The single failure lands while the bulk request is still in flight.
    s.process_next().await;
    assert!(s.cache().get(AlertId(2)).unwrap().is_read);
    assert!(s.cache().is_pending(AlertId(2)));
    assert_eq!(s.panel_badge().count, 0);
    assert!(s.take_notices().is_empty());

    s.process_next().await;
    assert!(s.cache().pending_ids().is_empty());
    assert_eq!(s.panel_badge().count, 0);
    assert!(mock.alerts().iter().all(|a| a.is_read));
    assert_consistent(&s);
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_then_mark_all_failure_reverts_both() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Medium, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.set_delay(MockOp::MarkAllRead, Duration::from_secs(30));
    mock.fail_next(MockOp::MarkRead, server_500("/alerts/2/mark-read/"));
    mock.fail_next(MockOp::MarkAllRead, server_500("/alerts/mark-all-read/"));

    assert!(s.mark_read(AlertId(2)));
    assert!(s.mark_all_read());

    s.process_next().await;
    assert!(s.cache().get(AlertId(2)).unwrap().is_read);

    s.process_next().await;
    assert!(!s.cache().get(AlertId(1)).unwrap().is_read);
    assert!(!s.cache().get(AlertId(2)).unwrap().is_read);
    assert!(s.cache().pending_ids().is_empty());
    assert_eq!(s.panel_badge().count, 2);
    assert_consistent(&s);

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("mark all"));
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_with_nothing_unread_reports_all_read() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, true)]));
    let mut s = loaded(&mock).await;

    assert!(s.mark_all_read());
    s.process_next().await;
    let notices = s.take_notices();
    assert_eq!(notices[0].message, "All alerts marked as read");
}

// ============================================================
// Single mark-read
// ============================================================

#[tokio::test(start_paused = true)]
async fn test_mark_read_failure_reverts_and_restores_affordance() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(5, Severity::Medium, false),
        alert(6, Severity::Low, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.fail_next(MockOp::MarkRead, server_500("/alerts/5/mark-read/"));

    assert!(s.mark_read(AlertId(5)));
    assert!(s.row(AlertId(5)).unwrap().mark_read.is_none());
    assert_eq!(s.panel_badge().count, 1);

    s.process_next().await;
    assert!(!s.cache().get(AlertId(5)).unwrap().is_read);
    assert!(s.row(AlertId(5)).unwrap().mark_read.is_some());
    assert_eq!(s.panel_badge().count, 2);
    assert_consistent(&s);

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("500"));
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_twice_sends_one_request() {
    let mock = Arc::new(
        MockTransport::with_alerts(vec![alert(1, Severity::High, false)])
            .with_delay(MockOp::MarkRead, Duration::from_secs(2)),
    );
    let mut s = loaded(&mock).await;

    assert!(s.mark_read(AlertId(1)));
    assert!(!s.mark_read(AlertId(1)));
    s.process_next().await;
    assert!(!s.mark_read(AlertId(1)));

    assert_eq!(mock.call_count(MockOp::MarkRead), 1);
    assert!(s.cache().get(AlertId(1)).unwrap().is_read);
    assert_eq!(s.panel_badge().count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_unknown_id_is_ignored() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, false)]));
    let mut s = loaded(&mock).await;
    assert!(!s.mark_read(AlertId(99)));
    assert_eq!(mock.call_count(MockOp::MarkRead), 0);
}

// ============================================================
// Polling
// ============================================================

#[tokio::test(start_paused = true)]
async fn test_poll_racing_mark_read_keeps_alert_read() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(7, Severity::High, false),
        alert(8, Severity::Low, false),
    ]));
    let mut s = loaded(&mock).await;
    mock.set_delay(MockOp::List, Duration::from_secs(1));
    mock.set_delay(MockOp::MarkRead, Duration::from_secs(5));

    // The fetch is issued first and snapshots 7 as unread.
    s.poll_now();
    assert!(s.mark_read(AlertId(7)));

    s.process_next().await;
    assert!(s.cache().get(AlertId(7)).unwrap().is_read);
    assert!(s.cache().is_pending(AlertId(7)));
    assert_eq!(s.cache().generation(), 2);
    assert_consistent(&s);

    s.process_next().await;
    assert!(s.cache().get(AlertId(7)).unwrap().is_read);
    assert!(!s.cache().is_pending(AlertId(7)));
    assert_eq!(s.panel_badge().count, 1);
    assert_eq!(
        mock.calls(),
        vec![MockCall::List, MockCall::List, MockCall::MarkRead(AlertId(7))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_keeps_state_and_polling_continues() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, false)]));
    let mut s = loaded(&mock).await;
    mock.fail_next(MockOp::List, server_500("/alerts/"));

    // Tick, then the failed fetch.
    s.process_next().await;
    s.process_next().await;
    assert_eq!(s.cache().len(), 1);
    assert_eq!(s.cache().generation(), 1);
    assert!(s.take_notices().is_empty());

    mock.set_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Low, false),
    ]);
    s.process_next().await;
    s.process_next().await;
    assert_eq!(s.cache().len(), 2);
    assert_eq!(s.panel_badge().count, 2);
    assert_eq!(mock.call_count(MockOp::List), 3);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_polls_apply_in_completion_order() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, false)]));
    let mut s = loaded(&mock).await;

    mock.set_delay(MockOp::List, Duration::from_secs(20));
    s.poll_now();
    // Let the slow fetch take its snapshot.
    tokio::time::sleep(Duration::from_millis(1)).await;

    mock.set_alerts(vec![alert(2, Severity::Low, false)]);
    mock.set_delay(MockOp::List, Duration::from_secs(5));
    s.poll_now();
    assert_eq!(s.in_flight_polls(), 2);

    s.process_next().await;
    assert!(s.cache().get(AlertId(2)).is_some());

    s.process_next().await;
    assert!(s.cache().get(AlertId(1)).is_some());
    assert!(s.cache().get(AlertId(2)).is_none());
    assert_eq!(s.in_flight_polls(), 0);
    assert_eq!(s.cache().generation(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_session_stops_polling() {
    let mock = Arc::new(MockTransport::with_alerts(vec![alert(1, Severity::High, false)]));
    let s = loaded(&mock).await;
    drop(s);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(mock.call_count(MockOp::List), 1);
}

// ============================================================
// Filtering and badge-only pages
// ============================================================

#[tokio::test(start_paused = true)]
async fn test_filter_projects_without_touching_cache() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::Low, false),
        alert(3, Severity::Medium, false),
        alert(4, Severity::High, false),
    ]));
    let mut s = loaded(&mock).await;

    s.set_filter(SeverityFilter::High);
    assert_eq!(s.view().visible_count, 2);
    assert_eq!(s.view().row_ids(), vec![AlertId(1), AlertId(4)]);
    assert_eq!(s.cache().len(), 4);
    assert_eq!(s.panel_badge().count, 4);

    // A mark under the filter is reflected in the projection.
    s.mark_read(AlertId(4));
    let row = s.view().groups[0].items.iter().find(|i| i.id == AlertId(4)).unwrap();
    assert!(!row.is_unread());

    s.set_filter(SeverityFilter::All);
    assert_eq!(s.view().visible_count, 4);
}

#[tokio::test(start_paused = true)]
async fn test_badge_only_session_uses_count_endpoint() {
    let mock = Arc::new(MockTransport::with_alerts(vec![
        alert(1, Severity::High, false),
        alert(2, Severity::High, false),
        alert(3, Severity::High, true),
    ]));
    let mut s = session(&mock, PageMode::BadgeOnly);
    s.start();
    s.process_next().await;

    assert_eq!(s.sidebar_badge().source(), BadgeSource::Remote);
    assert_eq!(s.sidebar_badge().count(), Some(2));
    assert!(s.cache().is_empty());
    assert!(!s.mark_all_read());

    // Next tick refreshes the remote count.
    mock.set_alerts(vec![
        alert(1, Severity::High, true),
        alert(2, Severity::High, true),
        alert(3, Severity::High, true),
    ]);
    s.process_next().await;
    s.process_next().await;
    assert_eq!(s.sidebar_badge().count(), Some(0));
    assert!(!s.sidebar_badge().should_display());
    assert_eq!(mock.call_count(MockOp::List), 0);
    assert_eq!(mock.call_count(MockOp::UnreadCount), 2);
}
