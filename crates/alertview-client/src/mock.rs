//! In-memory alert store for tests and offline demos.
//!
//! [`MockTransport`] behaves like a tiny server: it owns a list of alerts,
//! list calls snapshot it when they start, and mutations apply when they
//! finish. Per-operation delays and scripted failures make it possible to
//! reproduce completion-order races deterministically under a paused tokio
//! clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alertview_core::{Alert, AlertId};
use async_trait::async_trait;
use tokio::time::Duration;

use crate::error::{Result, TransportError};
use crate::transport::{AlertTransport, mark_read_path};

/// Transport operation, used to key delays and scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    List,
    UnreadCount,
    MarkRead,
    MarkAllRead,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    List,
    UnreadCount,
    MarkRead(AlertId),
    MarkAllRead,
}

#[derive(Debug, Default)]
struct MockState {
    alerts: Vec<Alert>,
    delays: HashMap<MockOp, Duration>,
    failures: HashMap<MockOp, VecDeque<TransportError>>,
    calls: Vec<MockCall>,
}

/// Scriptable in-memory transport.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `alerts` (server order).
    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        let mock = Self::new();
        mock.set_alerts(alerts);
        mock
    }

    /// Set a delay applied to every call of `op`.
    pub fn with_delay(self, op: MockOp, delay: Duration) -> Self {
        self.set_delay(op, delay);
        self
    }

    /// Replace the server-side alert list.
    pub fn set_alerts(&self, alerts: Vec<Alert>) {
        self.lock().alerts = alerts;
    }

    /// Change the delay for `op`.
    pub fn set_delay(&self, op: MockOp, delay: Duration) {
        self.lock().delays.insert(op, delay);
    }

    /// Make the next call of `op` fail with `error`. Failures queue up.
    pub fn fail_next(&self, op: MockOp, error: TransportError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Current server-side alerts.
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    /// Calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of one kind.
    pub fn call_count(&self, op: MockOp) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(
                    (op, call),
                    (MockOp::List, MockCall::List)
                        | (MockOp::UnreadCount, MockCall::UnreadCount)
                        | (MockOp::MarkRead, MockCall::MarkRead(_))
                        | (MockOp::MarkAllRead, MockCall::MarkAllRead)
                )
            })
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // Poisoning only means a test thread panicked; the state itself is intact.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and pull its delay and scripted failure.
    fn begin(&self, op: MockOp, call: MockCall) -> (Duration, Option<TransportError>) {
        let mut state = self.lock();
        state.calls.push(call);
        let delay = state.delays.get(&op).copied().unwrap_or(Duration::ZERO);
        let failure = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
        (delay, failure)
    }

    async fn wait(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AlertTransport for MockTransport {
    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        let (delay, failure) = self.begin(MockOp::List, MockCall::List);
        let snapshot = self.alerts();
        Self::wait(delay).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    async fn fetch_unread_count(&self) -> Result<usize> {
        let (delay, failure) = self.begin(MockOp::UnreadCount, MockCall::UnreadCount);
        let count = self.lock().alerts.iter().filter(|a| !a.is_read).count();
        Self::wait(delay).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    async fn mark_read(&self, id: AlertId) -> Result<()> {
        let (delay, failure) = self.begin(MockOp::MarkRead, MockCall::MarkRead(id));
        Self::wait(delay).await;
        if let Some(err) = failure {
            return Err(err);
        }

        let mut state = self.lock();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.is_read = true;
                Ok(())
            }
            None => Err(TransportError::from_http_status(
                mark_read_path(id),
                404,
                r#"{"error": "Not found"}"#,
            )),
        }
    }

    async fn mark_all_read(&self) -> Result<()> {
        let (delay, failure) = self.begin(MockOp::MarkAllRead, MockCall::MarkAllRead);
        Self::wait(delay).await;
        if let Some(err) = failure {
            return Err(err);
        }

        for alert in self.lock().alerts.iter_mut() {
            alert.is_read = true;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
