//! # Session Coordinator
//!
//! Owns the session state and serializes every call to the collaborators:
//! 1. Reject a submit while another predict call is in flight
//! 2. Mark the session loading and clear the last error
//! 3. Await the prediction service without holding the state lock
//! 4. Install the new list, or record the failure and keep the stale one
//!
//! Feedback goes the other way: the local acceptance is recorded first and
//! the remote call is spawned and forgotten. A lost acknowledgement is
//! logged and counted, never shown to the user, never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use model::{PreferenceInput, RecommendationList, SnackId};
use snack_client::{ClientError, FeedbackSink, Predictor};

use crate::error::SessionError;
use crate::store::{SessionPhase, SessionState};
use crate::view::SessionView;

/// Shown to the user when a predict call fails
pub const PREDICTION_FAILED_MESSAGE: &str = "Failed to get recommendations. Is the backend running?";

/// Diagnostic counters for fire-and-forget feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackStats {
    pub dispatched: u64,
    pub acknowledged: u64,
    pub failed: u64,
    pub last_failure: Option<String>,
}

#[derive(Debug, Default)]
struct FeedbackCounters {
    dispatched: AtomicU64,
    acknowledged: AtomicU64,
    failed: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl FeedbackCounters {
    fn record_failure(&self, id: SnackId, err: &ClientError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(format!("snack {id}: {err}"));
    }

    fn snapshot(&self) -> FeedbackStats {
        FeedbackStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_failure: self
                .last_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Releases the in-flight flag if a request future is dropped before its
/// response is applied. The late response is then never seen.
struct InFlightGuard {
    state: Arc<Mutex<SessionState>>,
    armed: bool,
}

impl InFlightGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("Recommendation request dropped before it resolved, ignoring its result");
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .abandon_request();
        }
    }
}

/// One user's recommendation session.
///
/// Cloning yields another handle to the same session; all handles share one
/// state, one in-flight slot and one set of accepted ids.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    predictor: Arc<dyn Predictor>,
    feedback: Arc<dyn FeedbackSink>,
    counters: Arc<FeedbackCounters>,
}

impl Session {
    pub fn new(predictor: Arc<dyn Predictor>, feedback: Arc<dyn FeedbackSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            predictor,
            feedback,
            counters: Arc::new(FeedbackCounters::default()),
        }
    }

    /// Lock the state. Never held across an `.await`.
    ///
    /// Every mutation leaves the state consistent before it can panic, so a
    /// poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch recommendations for `input` and install them.
    ///
    /// # Errors
    /// - `AlreadyInFlight` if another request has not resolved; nothing is
    ///   sent and the state is untouched
    /// - `PredictionFailure` if the service fails; the error message is
    ///   stored and the previous list and cursor are kept
    pub async fn request_recommendations(
        &self,
        input: PreferenceInput,
    ) -> Result<RecommendationList, SessionError> {
        if let Err(err) = self.lock().begin_request() {
            debug!("Rejected submit: {}", err);
            return Err(err);
        }
        let guard = InFlightGuard {
            state: Arc::clone(&self.state),
            armed: true,
        };

        info!("Requesting recommendations ({})", input);
        let start_time = Instant::now();
        let outcome = self.predictor.predict(&input).await;
        let elapsed = start_time.elapsed();

        guard.disarm();
        let mut state = self.lock();
        match outcome {
            Ok(list) => {
                info!("Installed {} recommendations in {:.2?}", list.len(), elapsed);
                state.resolve_success(list.clone());
                Ok(list)
            }
            Err(source) => {
                warn!("Prediction failed after {:.2?}: {}", elapsed, source);
                state.resolve_failure(PREDICTION_FAILED_MESSAGE);
                Err(SessionError::PredictionFailure {
                    message: PREDICTION_FAILED_MESSAGE.to_string(),
                    source,
                })
            }
        }
    }

    /// Send feedback for `id` in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime. The handle may be awaited
    /// or dropped; the task runs to completion either way.
    pub fn submit_feedback(&self, id: SnackId) -> JoinHandle<()> {
        let sink = Arc::clone(&self.feedback);
        let counters = Arc::clone(&self.counters);
        counters.dispatched.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            match sink.record_feedback(id).await {
                Ok(ack) => {
                    counters.acknowledged.fetch_add(1, Ordering::Relaxed);
                    debug!("Feedback for snack {} acknowledged: {}", id, ack.status);
                }
                Err(err) => {
                    counters.record_failure(id, &err);
                    warn!("Feedback for snack {} lost: {}", id, err);
                }
            }
        })
    }

    /// Accept `id`: record it locally, then send feedback.
    ///
    /// The local acceptance always succeeds. Feedback is only dispatched the
    /// first time an id is accepted; the returned handle is `None` when the
    /// id was already accepted.
    pub fn accept(&self, id: SnackId) -> Option<JoinHandle<()>> {
        let newly_accepted = self.lock().mark_accepted(id);
        if newly_accepted {
            info!("Accepted snack {}", id);
            Some(self.submit_feedback(id))
        } else {
            debug!("Snack {} already accepted", id);
            None
        }
    }

    /// Accept whatever is under the cursor, if anything.
    pub fn accept_current(&self) -> Option<(SnackId, Option<JoinHandle<()>>)> {
        let id = self.with_state(|state| crate::view::current(state).map(|rec| rec.id))?;
        Some((id, self.accept(id)))
    }

    pub fn mark_accepted(&self, id: SnackId) -> bool {
        self.lock().mark_accepted(id)
    }

    pub fn advance_cursor(&self) -> usize {
        self.lock().advance_cursor()
    }

    pub fn retreat_cursor(&self) -> usize {
        self.lock().retreat_cursor()
    }

    /// Run `f` against the current state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    pub fn view(&self, alternatives: usize) -> SessionView {
        self.with_state(|state| SessionView::project(state, alternatives))
    }

    pub fn feedback_stats(&self) -> FeedbackStats {
        self.counters.snapshot()
    }
}
