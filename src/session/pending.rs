//! The pending-request model for one outstanding graph query.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::cluster::Node;
use crate::graph::options::OptionsMap;
use crate::session::errors::ExecutionError;
use crate::session::runtime::Row;

/// Outcome of one dispatched request, delivered on the completion channel.
pub(crate) type RequestOutcome = Result<Vec<Row>, ExecutionError>;

/// The wire-level attributes of one graph request.
#[derive(Debug, Clone)]
pub struct RequestFrame {
    pub id: Uuid,
    pub query: String,
    /// JSON-encoded named parameters, as a single UTF-8 payload.
    pub parameters: Option<String>,
    /// Resolved custom payload attached to the request.
    pub payload: OptionsMap,
}

impl RequestFrame {
    pub(crate) fn new(query: impl Into<String>, parameters: Option<String>, payload: OptionsMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            parameters,
            payload,
        }
    }
}

/// One outstanding graph request, owned by the dispatch path until it
/// completes or its timeout cancels it.
///
/// The routing plan is replaced at most once (by the analytics redirection
/// protocol, before dispatch). Completion is single-assignment: whichever of
/// the send task or the caller's timeout arrives first wins, and every later
/// attempt is a no-op.
pub(crate) struct PendingGraphRequest {
    frame: RequestFrame,
    deadline: Instant,
    plan: Mutex<Vec<Arc<Node>>>,
    plan_replaced: AtomicBool,
    completion: Mutex<Option<oneshot::Sender<RequestOutcome>>>,
}

impl PendingGraphRequest {
    pub(crate) fn new(
        frame: RequestFrame,
        plan: Vec<Arc<Node>>,
        deadline: Instant,
    ) -> (Arc<Self>, oneshot::Receiver<RequestOutcome>) {
        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(Self {
            frame,
            deadline,
            plan: Mutex::new(plan),
            plan_replaced: AtomicBool::new(false),
            completion: Mutex::new(Some(tx)),
        });
        (pending, rx)
    }

    pub(crate) fn id(&self) -> Uuid {
        self.frame.id
    }

    pub(crate) fn frame(&self) -> &RequestFrame {
        &self.frame
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Deadline budget left for this request, saturating at zero.
    pub(crate) fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Replace the routing plan. Applied at most once; later calls are
    /// ignored.
    pub(crate) fn replace_plan(&self, plan: Vec<Arc<Node>>) {
        if self.plan_replaced.swap(true, Ordering::AcqRel) {
            log::warn!("request {}: routing plan already replaced, ignoring", self.id());
            return;
        }
        *self.plan.lock().unwrap_or_else(PoisonError::into_inner) = plan;
    }

    pub(crate) fn plan_snapshot(&self) -> Vec<Arc<Node>> {
        self.plan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deliver the request's outcome. No-op if already completed/cancelled.
    pub(crate) fn complete(&self, outcome: RequestOutcome) {
        let sender = self
            .completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // The receiver may be gone if the caller stopped waiting; that
            // is equivalent to a completed request.
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => log::debug!("request {}: already completed, dropping outcome", self.id()),
        }
    }

    /// Cancel the request (timeout path): later completion attempts and the
    /// redirection continuation become no-ops.
    pub(crate) fn cancel(&self) {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
