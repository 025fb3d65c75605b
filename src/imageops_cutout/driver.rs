//! Event loop running an [`InteractiveSession`] against a live editor.
//!
//! The editor pushes [`SessionEvent`]s through a [`SessionHandle`]; every
//! segmentation request runs on its own tokio task and reports back through
//! an internal channel, so slow answers never block new gestures.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::imageops_cutout::classify::{classify_or_fallback, Classifier};
use crate::imageops_cutout::extractor::Extraction;
use crate::imageops_cutout::host::{EditorHost, Notice};
use crate::imageops_cutout::policy::ExtractionPolicy;
use crate::imageops_cutout::segmenter::{PromptSegmenter, SegmentResult};
use crate::imageops_cutout::session::{Gesture, GestureOutcome, InteractiveSession, PromptTicket};

/// Input to a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Gesture(Gesture),
    UpdatePolicy(ExtractionPolicy),
    /// Re-issue the gesture the segmenter last failed on
    Retry,
    Commit,
    Cancel,
}

/// How a driven session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Committed(Extraction),
    Cancelled,
}

/// Sending side of a running session
///
/// Dropping every handle cancels the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
}

type SendResult = Result<(), mpsc::error::SendError<SessionEvent>>;

impl SessionHandle {
    pub async fn send(&self, event: SessionEvent) -> SendResult {
        self.events.send(event).await
    }

    pub async fn gesture(&self, gesture: Gesture) -> SendResult {
        self.send(SessionEvent::Gesture(gesture)).await
    }

    pub async fn update_policy(&self, policy: ExtractionPolicy) -> SendResult {
        self.send(SessionEvent::UpdatePolicy(policy)).await
    }

    pub async fn retry(&self) -> SendResult {
        self.send(SessionEvent::Retry).await
    }

    pub async fn commit(&self) -> SendResult {
        self.send(SessionEvent::Commit).await
    }

    pub async fn cancel(&self) -> SendResult {
        self.send(SessionEvent::Cancel).await
    }

    /// Whether the session has ended
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

/// Creates the event channel for [`drive_session`].
pub fn session_channel(capacity: usize) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
    let (events, receiver) = mpsc::channel(capacity.max(1));
    (SessionHandle { events }, receiver)
}

/// Runs `session` until it is committed or cancelled.
///
/// Rules:
/// * a gesture cancels the request of the gesture before it
/// * answers are applied in gesture order; superseded answers are dropped
/// * a commit arriving while a gesture is being segmented waits for its answer
/// * when every [`SessionHandle`] is dropped the session is cancelled
///
/// Selection updates go to [`EditorHost::preview_mask`], user-facing problems
/// to [`EditorHost::report`] and the cutout to
/// [`EditorHost::commit_extraction`].
///
/// Must be called within a tokio runtime.
pub async fn drive_session<S, H>(
    mut session: InteractiveSession,
    segmenter: Arc<S>,
    host: &mut H,
    mut events: mpsc::Receiver<SessionEvent>,
) -> SessionOutcome
where
    S: PromptSegmenter + 'static,
    H: EditorHost + ?Sized,
{
    let (results_tx, mut results) = mpsc::unbounded_channel::<(u64, SegmentResult)>();
    let mut commit_requested = false;

    let spawn = |session: &InteractiveSession, ticket: PromptTicket| {
        let segmenter = Arc::clone(&segmenter);
        let source = Arc::clone(session.source());
        let results_tx = results_tx.clone();
        tokio::spawn(async move {
            let result = match segmenter.initialize().await {
                Ok(()) => ticket.run(segmenter.as_ref(), &source).await,
                Err(error) => Err(error),
            };
            // The driver may already be gone.
            let _ = results_tx.send((ticket.seq, result));
        });
    };

    info!(mode = ?session.mode(), "session started");
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    debug!("event channel closed");
                    session.cancel();
                    return SessionOutcome::Cancelled;
                };

                match event {
                    SessionEvent::Gesture(gesture) => match session.begin_gesture(gesture) {
                        Ok(ticket) => spawn(&session, ticket),
                        Err(error) => notify(host, &error),
                    },
                    SessionEvent::Retry => match session.retry() {
                        Ok(ticket) => spawn(&session, ticket),
                        Err(error) => notify(host, &error),
                    },
                    SessionEvent::UpdatePolicy(policy) => {
                        if let Err(error) = session.set_policy(policy) {
                            warn!(%error, "policy update rejected");
                        }
                    }
                    SessionEvent::Commit if session.is_awaiting_segmenter() => {
                        debug!("commit deferred until the pending gesture resolves");
                        commit_requested = true;
                    }
                    SessionEvent::Commit => {
                        if let Some(outcome) = try_commit(&mut session, host) {
                            return outcome;
                        }
                    }
                    SessionEvent::Cancel => {
                        session.cancel();
                        return SessionOutcome::Cancelled;
                    }
                }
            }
            Some((seq, result)) = results.recv() => {
                match session.complete_gesture(seq, result) {
                    Ok(GestureOutcome::Merged) => {
                        if let Some(mask) = session.current_mask() {
                            host.preview_mask(mask);
                        }
                    }
                    Ok(GestureOutcome::Hover(mask)) => host.preview_mask(&mask),
                    Ok(GestureOutcome::HoverCleared | GestureOutcome::Stale) => {}
                    Err(error) => notify(host, &error),
                }

                if commit_requested && !session.is_awaiting_segmenter() {
                    commit_requested = false;
                    if let Some(outcome) = try_commit(&mut session, host) {
                        return outcome;
                    }
                }
            }
        }
    }
}

/// Runs `session` like [`drive_session`], then labels a committed cutout.
///
/// The category goes to [`EditorHost::categorize`] once the cutout has been
/// handed to [`EditorHost::commit_extraction`]. A failing or slow classifier
/// yields the fallback category after the session's `classify_timeout`.
pub async fn drive_classified_session<S, C, H>(
    session: InteractiveSession,
    segmenter: Arc<S>,
    classifier: &C,
    host: &mut H,
    events: mpsc::Receiver<SessionEvent>,
) -> SessionOutcome
where
    S: PromptSegmenter + 'static,
    C: Classifier + ?Sized,
    H: EditorHost + ?Sized,
{
    let timeout = session.config().classify_timeout;
    let outcome = drive_session(session, segmenter, &mut *host, events).await;

    if let SessionOutcome::Committed(extraction) = &outcome {
        let category = classify_or_fallback(classifier, &extraction.image, timeout).await;
        info!(%category, "cutout classified");
        host.categorize(extraction.origin, category);
    }
    outcome
}

fn try_commit<H>(session: &mut InteractiveSession, host: &mut H) -> Option<SessionOutcome>
where
    H: EditorHost + ?Sized,
{
    match session.commit() {
        Ok(extraction) => {
            host.commit_extraction(&extraction.image, extraction.origin);
            Some(SessionOutcome::Committed(extraction))
        }
        Err(error) => {
            notify(host, &error);
            None
        }
    }
}

fn notify<H>(host: &mut H, error: &SessionError)
where
    H: EditorHost + ?Sized,
{
    match Notice::from_error(error) {
        Some(notice) => host.report(&notice),
        None => debug!(%error, "session event ignored"),
    }
}
