//! Progress reporting: a callback trait and a per-session registry.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as each image goes through text extraction.
//!
//! A web host that runs reports in the background and lets the browser poll
//! for progress can use [`ProgressRegistry`] together with
//! [`SessionProgress`]: the pipeline is the only writer for its session, any
//! number of request handlers read the latest snapshot.
//!
//! # Example
//!
//! ```rust
//! use promo_report::{ProgressRegistry, ReportConfig, SessionProgress};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ProgressRegistry::new());
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(SessionProgress::new(Arc::clone(&registry), "abc123")))
//!     .build()
//!     .unwrap();
//!
//! // later, from a polling endpoint:
//! let snapshot = registry.get("abc123");
//! assert!(snapshot.is_none()); // nothing has started yet
//! # let _ = config;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Called by the pipeline as it processes each image.
///
/// Images are processed concurrently, so `on_image_*` methods may be called
/// from different tasks at the same time. All methods default to no-ops.
pub trait ReportProgressCallback: Send + Sync {
    /// Called once before any image is processed.
    fn on_report_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before the text-extraction request for an image.
    ///
    /// `image_num` is 1-indexed.
    fn on_image_start(&self, image_num: usize, total_images: usize) {
        let _ = (image_num, total_images);
    }

    /// Called when text was extracted from an image.
    fn on_image_complete(&self, image_num: usize, total_images: usize, text_len: usize) {
        let _ = (image_num, total_images, text_len);
    }

    /// Called when extraction failed after all retries.
    fn on_image_error(&self, image_num: usize, total_images: usize, error: &str) {
        let _ = (image_num, total_images, error);
    }

    /// Called before the aggregated text is sent for analysis.
    fn on_analysis_start(&self) {}

    /// Called once after the document has been rendered.
    fn on_report_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

// ── Session registry ─────────────────────────────────────────────────────

/// Stage of a report session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extracting,
    Analysing,
    Done,
}

/// Snapshot of one session's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub stage: Stage,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`; `0.0` when `total` is zero.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Session id → latest [`Progress`].
///
/// Writers replace the whole snapshot; readers copy it out. A poisoned lock
/// is recovered rather than propagated since the data is plain counters.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    sessions: RwLock<HashMap<String, Progress>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) tracking a session.
    pub fn begin(&self, session: &str, total: usize) {
        self.replace(
            session,
            Progress {
                completed: 0,
                total,
                stage: Stage::Extracting,
            },
        );
    }

    /// Mark one more unit of work done. Unknown sessions are ignored.
    pub fn advance(&self, session: &str) {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = map.get(session).copied() {
            map.insert(
                session.to_string(),
                Progress {
                    completed: (p.completed + 1).min(p.total),
                    ..p
                },
            );
        }
    }

    /// Move a session to another stage, keeping its counters.
    pub fn set_stage(&self, session: &str, stage: Stage) {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = map.get(session).copied() {
            map.insert(session.to_string(), Progress { stage, ..p });
        }
    }

    /// Overwrite the snapshot for a session.
    pub fn replace(&self, session: &str, progress: Progress) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.to_string(), progress);
    }

    pub fn get(&self, session: &str) -> Option<Progress> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
            .copied()
    }

    /// Stop tracking a session, returning its last snapshot.
    pub fn finish(&self, session: &str) -> Option<Progress> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session)
    }

    /// Ids of all tracked sessions, sorted.
    pub fn sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

/// Forwards pipeline events for one session into a [`ProgressRegistry`].
pub struct SessionProgress {
    registry: Arc<ProgressRegistry>,
    session: String,
}

impl SessionProgress {
    pub fn new(registry: Arc<ProgressRegistry>, session: impl Into<String>) -> Self {
        Self {
            registry,
            session: session.into(),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }
}

impl ReportProgressCallback for SessionProgress {
    fn on_report_start(&self, total_images: usize) {
        self.registry.begin(&self.session, total_images);
    }

    fn on_image_complete(&self, _image_num: usize, _total: usize, _text_len: usize) {
        self.registry.advance(&self.session);
    }

    fn on_image_error(&self, _image_num: usize, _total: usize, _error: &str) {
        self.registry.advance(&self.session);
    }

    fn on_analysis_start(&self) {
        self.registry.set_stage(&self.session, Stage::Analysing);
    }

    fn on_report_complete(&self, _total: usize, _success_count: usize) {
        self.registry.set_stage(&self.session, Stage::Done);
    }
}
