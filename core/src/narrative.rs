//! Narrative provider: flavor text for the day's event and the closing
//! review.
//!
//! The provider is an external, possibly slow or absent service. Calls are
//! dispatched through `PendingNarrative`, which runs the blocking call off
//! the tick driver and is polled without blocking. Every outcome other
//! than a well-formed success (error, malformed payload, lost worker,
//! timeout) resolves to the caller's fallback.

use crate::{
    day_controller::{DailyEvent, EventEffect},
    locale::Language,
    types::Money,
};
use serde::{Deserialize, Serialize};
use std::sync::{
    mpsc::{self, Receiver, TryRecvError},
    Arc,
};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("narrative provider unavailable")]
    Unavailable,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out")]
    TimedOut,

    #[error("worker exited without a result")]
    WorkerLost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub day:        u32,
    pub reputation: u32,
    pub language:   Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub day:      u32,
    pub served:   u32,
    pub burnt:    u32,
    pub earned:   Money,
    pub language: Language,
}

/// An external source of flavor text. Implementations may block.
pub trait Narrator: Send + Sync {
    fn daily_event(&self, request: &EventRequest) -> Result<DailyEvent, NarrativeError>;

    fn day_review(&self, request: &ReviewRequest) -> Result<String, NarrativeError>;
}

/// A provider that is never configured. Every call fails, so the session
/// always runs on fallback content.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

impl Narrator for OfflineNarrator {
    fn daily_event(&self, _request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        Err(NarrativeError::Unavailable)
    }

    fn day_review(&self, _request: &ReviewRequest) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable)
    }
}

#[derive(Deserialize)]
struct RawEvent {
    title:       Option<String>,
    description: Option<String>,
    effect:      Option<String>,
}

/// Parse a provider's `{title, description, effect}` JSON payload.
pub fn parse_daily_event(payload: &str) -> Result<DailyEvent, NarrativeError> {
    let raw: RawEvent = serde_json::from_str(payload.trim())
        .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| NarrativeError::Malformed("missing title".into()))?;
    let description = raw
        .description
        .ok_or_else(|| NarrativeError::Malformed("missing description".into()))?;
    let effect = raw
        .effect
        .as_deref()
        .and_then(EventEffect::from_tag)
        .ok_or_else(|| NarrativeError::Malformed(format!("bad effect: {:?}", raw.effect)))?;

    Ok(DailyEvent { title, description, effect })
}

/// A review must carry some text to count as content.
pub fn check_review(text: String) -> Result<String, NarrativeError> {
    if text.trim().is_empty() {
        Err(NarrativeError::Malformed("empty review".into()))
    } else {
        Ok(text)
    }
}

/// How provider calls are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Background thread per request; results arrive on a later poll.
    #[default]
    Threaded,
    /// Call on the requesting thread; the result is ready at the first
    /// poll. For headless runs on simulated time and for tests.
    Inline,
}

/// One in-flight provider request. Resolves exactly once.
pub struct PendingNarrative<T> {
    rx:       Receiver<Result<T, NarrativeError>>,
    deadline: Duration,
}

impl<T: Send + 'static> PendingNarrative<T> {
    pub fn dispatch<F>(mode: Dispatch, deadline: Duration, job: F) -> Self
    where
        F: FnOnce() -> Result<T, NarrativeError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        match mode {
            Dispatch::Inline => {
                let _ = tx.send(job());
            }
            Dispatch::Threaded => {
                thread::spawn(move || {
                    // Receiver gone means the session moved on.
                    let _ = tx.send(job());
                });
            }
        }
        Self { rx, deadline }
    }

    /// Non-blocking check. `None` while still waiting; past the deadline a
    /// silent worker counts as a timeout.
    pub fn poll(&self, now: Duration) -> Option<Result<T, NarrativeError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Disconnected) => Some(Err(NarrativeError::WorkerLost)),
            Err(TryRecvError::Empty) if now >= self.deadline => Some(Err(NarrativeError::TimedOut)),
            Err(TryRecvError::Empty) => None,
        }
    }
}

/// Start a daily-event request against `narrator`.
pub fn request_event(
    narrator: &Arc<dyn Narrator>,
    mode: Dispatch,
    deadline: Duration,
    request: EventRequest,
) -> PendingNarrative<DailyEvent> {
    let narrator = Arc::clone(narrator);
    PendingNarrative::dispatch(mode, deadline, move || narrator.daily_event(&request))
}

/// Start a day-review request against `narrator`.
pub fn request_review(
    narrator: &Arc<dyn Narrator>,
    mode: Dispatch,
    deadline: Duration,
    request: ReviewRequest,
) -> PendingNarrative<String> {
    let narrator = Arc::clone(narrator);
    PendingNarrative::dispatch(mode, deadline, move || {
        narrator.day_review(&request).and_then(check_review)
    })
}
