//! Interactive refinement of a selection.
//!
//! A session collects gestures (clicks, shift-clicks, strokes, hovers) on one
//! source image, sends each to a [`PromptSegmenter`], folds the answers into
//! a running mask and finally extracts the cutout once.
//!
//! Requests are split into [`InteractiveSession::begin_gesture`], which hands
//! out a [`PromptTicket`], and [`InteractiveSession::complete_gesture`], which
//! takes the segmenter's answer back. Every ticket carries a sequence number;
//! only the answer to the most recent gesture is applied, so answers arriving
//! out of order can never reorder the user's adds and subtracts.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, SegmenterError, SessionError};
use crate::imageops_cutout::extractor::{extract_with_origin, Extraction};
use crate::imageops_cutout::mask::Mask;
use crate::imageops_cutout::mask_algebra::{merge, MergeOp};
use crate::imageops_cutout::policy::{ExtractionPolicy, PromptMode, SessionConfig};
use crate::imageops_cutout::raster::RasterBuffer;
use crate::imageops_cutout::segmenter::{PointLabel, PromptPoint, PromptSegmenter, SegmentResult};
use crate::utils::pixel_at;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No selection yet
    Idle,
    /// A click is being segmented
    AutoPoint,
    /// Stroke mode: a stroke is being segmented or more strokes are expected
    Scribbling,
    /// A selection is shown and waits for more gestures, commit or cancel
    Previewing,
    /// The cutout was produced; terminal
    Committed,
    /// The user gave up; terminal
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Cancelled)
    }
}

/// What a gesture asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Preview the object under the pointer without changing the selection
    Hover,
    /// Add the object to the selection
    Add,
    /// Remove the object from the selection
    Subtract,
}

impl Intent {
    fn label(self) -> PointLabel {
        match self {
            Self::Subtract => PointLabel::Negative,
            Self::Hover | Self::Add => PointLabel::Positive,
        }
    }
}

/// One user gesture in image-space coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub points: Vec<PromptPoint>,
    pub intent: Intent,
}

impl Gesture {
    /// A plain click, adding to the selection
    pub fn click(x: f64, y: f64) -> Self {
        Self::stroke([(x, y)], Intent::Add)
    }

    /// A click with the subtract modifier held
    pub fn subtract_click(x: f64, y: f64) -> Self {
        Self::stroke([(x, y)], Intent::Subtract)
    }

    pub fn hover(x: f64, y: f64) -> Self {
        Self::stroke([(x, y)], Intent::Hover)
    }

    /// An ordered stroke; every point takes the label of `intent`
    pub fn stroke<I>(points: I, intent: Intent) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let label = intent.label();
        Self {
            points: points
                .into_iter()
                .map(|(x, y)| PromptPoint { x, y, label })
                .collect(),
            intent,
        }
    }

    /// The stroke as sent to a segmenter. Subtract intent is applied when
    /// merging, so the segmenter is asked for the touched region itself.
    fn region_points(&self) -> Vec<PromptPoint> {
        self.points
            .iter()
            .map(|point| PromptPoint::positive(point.x, point.y))
            .collect()
    }

    fn merge_op(&self) -> Option<MergeOp> {
        match self.intent {
            Intent::Hover => None,
            Intent::Add => Some(MergeOp::Add),
            Intent::Subtract => Some(MergeOp::Subtract),
        }
    }
}

/// The request a segmenter receives for one gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Point { x: f64, y: f64 },
    Scribble(Vec<PromptPoint>),
}

/// A segmentation request handed out by [`InteractiveSession::begin_gesture`]
#[derive(Debug, Clone)]
pub struct PromptTicket {
    pub seq: u64,
    pub prompt: Prompt,
    pub cancel: CancellationToken,
}

impl PromptTicket {
    /// Sends the prompt to `segmenter`, resolving early with
    /// `SegmenterError::Cancelled` if the ticket is cancelled meanwhile.
    pub async fn run<S>(&self, segmenter: &S, image: &RasterBuffer) -> SegmentResult
    where
        S: PromptSegmenter + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return Err(SegmenterError::Cancelled);
        }

        let request = async {
            match &self.prompt {
                Prompt::Point { x, y } => {
                    segmenter
                        .segment_with_point(image, *x, *y, &self.cancel)
                        .await
                }
                Prompt::Scribble(points) => {
                    segmenter
                        .segment_with_scribbles(image, points, &self.cancel)
                        .await
                }
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SegmenterError::Cancelled),
            result = request => result,
        }
    }
}

/// What happened to a segmenter answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Merged into the selection, see [`InteractiveSession::current_mask`]
    Merged,
    /// Preview mask for a hover gesture, selection unchanged
    Hover(Mask),
    /// Nothing to preview under the pointer
    HoverCleared,
    /// A newer gesture superseded this one; the answer was dropped
    Stale,
}

#[derive(Debug)]
struct Pending {
    seq: u64,
    gesture: Gesture,
    cancel: CancellationToken,
}

/// State of one extraction workflow on one source image
#[derive(Debug)]
pub struct InteractiveSession {
    source: Arc<RasterBuffer>,
    config: SessionConfig,
    state: SessionState,
    points: Vec<PromptPoint>,
    current_mask: Option<Mask>,
    hover_mask: Option<Mask>,
    next_seq: u64,
    pending: Option<Pending>,
    pending_hover: Option<Pending>,
    retryable: Option<Gesture>,
}

impl InteractiveSession {
    pub fn new(source: impl Into<Arc<RasterBuffer>>, config: SessionConfig) -> Self {
        Self {
            source: source.into(),
            config,
            state: SessionState::Idle,
            points: Vec::new(),
            current_mask: None,
            hover_mask: None,
            next_seq: 0,
            pending: None,
            pending_hover: None,
            retryable: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> PromptMode {
        self.config.mode
    }

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.config.policy
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<RasterBuffer> {
        &self.source
    }

    /// Points of every gesture merged so far, in gesture order
    pub fn accumulated_points(&self) -> &[PromptPoint] {
        &self.points
    }

    pub fn current_mask(&self) -> Option<&Mask> {
        self.current_mask.as_ref()
    }

    /// Latest hover preview, if any
    pub fn hover_mask(&self) -> Option<&Mask> {
        self.hover_mask.as_ref()
    }

    /// Whether a selection-changing gesture is waiting for the segmenter
    pub fn is_awaiting_segmenter(&self) -> bool {
        self.pending.is_some()
    }

    /// Sequence number of the newest selection-changing gesture
    pub fn latest_seq(&self) -> Option<u64> {
        self.pending.as_ref().map(|pending| pending.seq)
    }

    /// Validates a gesture and issues the segmentation request for it.
    ///
    /// A selection-changing gesture cancels every request still in flight;
    /// a hover only cancels the previous hover.
    ///
    /// # Errors
    ///
    /// * `SessionError::SessionClosed` - After commit or cancel
    /// * `SessionError::Pipeline(Error::OutOfBounds)` - When a point lies
    ///   outside the image; the gesture is discarded and nothing changes
    /// * `SessionError::EmptyGesture` - When the gesture has no point
    #[instrument(level = "debug", skip(self, gesture), fields(intent = ?gesture.intent))]
    pub fn begin_gesture(&mut self, gesture: Gesture) -> Result<PromptTicket, SessionError> {
        self.ensure_open()?;

        let (width, height) = self.source.dimensions();
        let first = gesture.points.first().ok_or(SessionError::EmptyGesture)?;
        for point in &gesture.points {
            pixel_at(point.x, point.y, width, height)?;
        }

        let prompt = match (self.config.mode, gesture.points.len()) {
            (PromptMode::Auto, 1) => Prompt::Point {
                x: first.x,
                y: first.y,
            },
            _ => Prompt::Scribble(gesture.region_points()),
        };

        self.next_seq += 1;
        let seq = self.next_seq;
        let cancel = CancellationToken::new();

        if let Some(previous) = self.pending_hover.take() {
            previous.cancel.cancel();
        }

        if gesture.intent == Intent::Hover {
            self.pending_hover = Some(Pending {
                seq,
                gesture,
                cancel: cancel.clone(),
            });
        } else {
            if let Some(previous) = self.pending.take() {
                debug!(superseded = previous.seq, seq, "cancelling in-flight gesture");
                previous.cancel.cancel();
            }
            self.pending = Some(Pending {
                seq,
                gesture,
                cancel: cancel.clone(),
            });
            self.state = match self.config.mode {
                PromptMode::Auto => SessionState::AutoPoint,
                PromptMode::Scribble => SessionState::Scribbling,
            };
        }

        debug!(seq, state = ?self.state, "gesture issued");
        Ok(PromptTicket {
            seq,
            prompt,
            cancel,
        })
    }

    /// Applies the segmenter's answer to the gesture numbered `seq`.
    ///
    /// # Errors
    ///
    /// * `SessionError::SessionClosed` - After commit or cancel
    /// * `SessionError::NoObjectDetected` - The segmenter found nothing; the
    ///   selection is unchanged
    /// * `SessionError::BackendUnavailable` - The segmenter failed; the
    ///   selection and accumulated points are unchanged and
    ///   [`InteractiveSession::retry`] re-issues the gesture
    #[instrument(level = "debug", skip(self, result))]
    pub fn complete_gesture(
        &mut self,
        seq: u64,
        result: SegmentResult,
    ) -> Result<GestureOutcome, SessionError> {
        self.ensure_open()?;

        if self.pending_hover.as_ref().is_some_and(|p| p.seq == seq) {
            self.pending_hover = None;
            return self.complete_hover(result);
        }

        let Some(pending) = self.pending.take_if(|pending| pending.seq == seq) else {
            debug!(seq, "discarding stale segmenter answer");
            return Ok(GestureOutcome::Stale);
        };

        let resting = self.resting_state();
        match result {
            Err(error) => {
                warn!(seq, %error, "segmentation failed");
                self.state = resting;
                self.retryable = Some(pending.gesture);
                Err(error.into())
            }
            Ok(None) => {
                info!(seq, "no object detected");
                self.state = resting;
                self.retryable = None;
                Err(SessionError::NoObjectDetected)
            }
            Ok(Some(category)) => {
                let (width, height) = self.source.dimensions();
                let incoming = Mask::from(category).resize_nearest(width, height);
                let op = pending.gesture.merge_op().unwrap_or(MergeOp::Add);

                let merged = merge(self.current_mask.as_ref(), &incoming, op);
                debug!(seq, ?op, foreground = merged.foreground_count(), "gesture merged");

                self.current_mask = Some(merged);
                self.points.extend(pending.gesture.points);
                self.retryable = None;
                self.state = self.resting_state();
                Ok(GestureOutcome::Merged)
            }
        }
    }

    // Hover failures are not worth a message; the preview just disappears.
    fn complete_hover(&mut self, result: SegmentResult) -> Result<GestureOutcome, SessionError> {
        match result {
            Ok(Some(category)) => {
                let (width, height) = self.source.dimensions();
                let mask = Mask::from(category).resize_nearest(width, height);
                self.hover_mask = Some(mask.clone());
                Ok(GestureOutcome::Hover(mask))
            }
            Ok(None) => {
                self.hover_mask = None;
                Ok(GestureOutcome::HoverCleared)
            }
            Err(error) => {
                debug!(%error, "hover preview failed");
                self.hover_mask = None;
                Ok(GestureOutcome::HoverCleared)
            }
        }
    }

    /// Segments one gesture end to end with `segmenter`.
    pub async fn prompt<S>(
        &mut self,
        segmenter: &S,
        gesture: Gesture,
    ) -> Result<GestureOutcome, SessionError>
    where
        S: PromptSegmenter + ?Sized,
    {
        let ticket = self.begin_gesture(gesture)?;
        let source = Arc::clone(&self.source);
        let result = match segmenter.initialize().await {
            Ok(()) => ticket.run(segmenter, &source).await,
            Err(error) => Err(error),
        };
        self.complete_gesture(ticket.seq, result)
    }

    /// Re-issues the last gesture the segmenter failed on.
    ///
    /// # Errors
    ///
    /// * `SessionError::NothingToRetry` - When the last gesture did not fail
    pub fn retry(&mut self) -> Result<PromptTicket, SessionError> {
        self.ensure_open()?;
        let gesture = self.retryable.take().ok_or(SessionError::NothingToRetry)?;
        self.begin_gesture(gesture)
    }

    /// Replaces the extraction policy, e.g. when the user moves a slider.
    ///
    /// # Errors
    ///
    /// * `SessionError::Pipeline(Error::InvalidPolicy)` - The policy is rejected
    ///   and the previous one kept
    pub fn set_policy(&mut self, policy: ExtractionPolicy) -> Result<(), SessionError> {
        self.ensure_open()?;
        policy.validate()?;
        self.config.policy = policy;
        Ok(())
    }

    /// Extracts the cutout with the current selection and policy.
    ///
    /// # Errors
    ///
    /// * `SessionError::Pipeline(Error::EmptySelection)` - Nothing selected,
    ///   or the policy erased the selection; the session stays open so the
    ///   user can adjust settings and try again
    #[instrument(level = "debug", skip(self))]
    pub fn commit(&mut self) -> Result<Extraction, SessionError> {
        self.ensure_open()?;
        let mask = self.current_mask.as_ref().ok_or(Error::EmptySelection)?;

        let extraction = extract_with_origin(&self.source, mask, &self.config.policy)?;

        self.cancel_in_flight();
        self.state = SessionState::Committed;
        self.current_mask = None;
        self.hover_mask = None;
        info!(
            width = extraction.image.width(),
            height = extraction.image.height(),
            "session committed"
        );
        Ok(extraction)
    }

    /// Discards the selection and every accumulated point.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.cancel_in_flight();
        self.points.clear();
        self.current_mask = None;
        self.hover_mask = None;
        self.retryable = None;
        self.state = SessionState::Cancelled;
        info!("session cancelled");
    }

    fn cancel_in_flight(&mut self) {
        for pending in [self.pending.take(), self.pending_hover.take()]
            .into_iter()
            .flatten()
        {
            pending.cancel.cancel();
        }
    }

    fn resting_state(&self) -> SessionState {
        match (&self.current_mask, self.config.mode) {
            (None, _) => SessionState::Idle,
            (Some(_), PromptMode::Auto) => SessionState::Previewing,
            (Some(_), PromptMode::Scribble) => SessionState::Scribbling,
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            Err(SessionError::SessionClosed(self.state))
        } else {
            Ok(())
        }
    }
}
