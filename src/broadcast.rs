use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::schedule::RefreshEvent;

pub type SessionId = Uuid;

/// One connected display
#[derive(Debug, Clone)]
pub struct ViewerSession {
    id: SessionId,
    sender: mpsc::Sender<RefreshEvent>,
}

impl ViewerSession {
    pub fn new(sender: mpsc::Sender<RefreshEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Session plus the receiving end the connection task reads from
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<RefreshEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    async fn deliver(&self, event: RefreshEvent, timeout: Duration) -> Result<(), &'static str> {
        match tokio::time::timeout(timeout, self.sender.send(event)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err("connection closed"),
            Err(_) => Err("send timed out"),
        }
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: Vec<SessionId>,
}

/// Fan-out of refresh events to every connected viewer.
///
/// Each broadcast works on a copy of the session set, so registrations made
/// while it runs are not blocked and do not receive it. A session whose send
/// fails or times out is unregistered.
pub struct SyncBroadcaster {
    sessions: Arc<RwLock<HashMap<SessionId, ViewerSession>>>,
    send_timeout: Duration,
}

impl SyncBroadcaster {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            send_timeout,
        }
    }

    pub async fn register(&self, session: ViewerSession) -> SessionId {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
        tracing::info!(session = %id, viewers = sessions.len(), "viewer connected");
        id
    }

    pub async fn unregister(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, viewers = sessions.len(), "viewer disconnected");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn broadcast(&self, event: RefreshEvent) -> BroadcastReport {
        let snapshot: Vec<ViewerSession> = self.sessions.read().await.values().cloned().collect();
        if snapshot.is_empty() {
            return BroadcastReport::default();
        }

        let timeout = self.send_timeout;
        let outcomes = join_all(snapshot.iter().map(|session| {
            let event = event.clone();
            async move { (session.id(), session.deliver(event, timeout).await) }
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    tracing::warn!(session = %id, reason, "dropping viewer");
                    report.dropped.push(id);
                }
            }
        }

        if !report.dropped.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &report.dropped {
                sessions.remove(id);
            }
        }

        tracing::debug!(
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "refresh broadcast"
        );
        report
    }
}
