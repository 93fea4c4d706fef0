//! Progress reporting for UI surfaces
//!
//! A [`ProgressSink`] receives the poller's updates. Plain closures taking
//! `(&TaskStatus, Option<&str>)` are sinks, so simple callers never need to
//! implement the trait. [`LoadingOverlay`] is the stateful sink for a
//! blocking "please wait" panel.

use crate::error::Result;
use crate::types::{TaskHandle, TaskStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Receiver of task progress
///
/// `on_progress` is called after every status query, from the polling
/// sequence only and never concurrently. `progress` is the latest progress text
/// seen so far in the run, which may come from an earlier status.
pub trait ProgressSink {
    /// A task was accepted and polling is about to start
    fn on_started(&mut self, _task: &TaskHandle) {}

    /// A status query returned
    fn on_progress(&mut self, status: &TaskStatus, progress: Option<&str>);

    /// The run is over, successfully or not
    fn on_finished(&mut self, _outcome: &Result<TaskStatus>) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&TaskStatus, Option<&str>),
{
    fn on_progress(&mut self, status: &TaskStatus, progress: Option<&str>) {
        self(status, progress)
    }
}

/// Sink that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _status: &TaskStatus, _progress: Option<&str>) {}
}

/// Text and timeout for a [`LoadingOverlay`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Heading
    pub title: String,
    /// Body text shown until progress arrives
    pub message: String,
    /// Hide automatically after this long; `None` keeps it up until hidden
    pub timeout: Option<Duration>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            title: "Processing...".to_string(),
            message: "Please wait while we process your request.".to_string(),
            timeout: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl OverlayConfig {
    /// Overlay for a full timetable run
    pub fn timetable_generation() -> Self {
        Self {
            title: "Generating Timetable".to_string(),
            message: "Starting timetable generation process...".to_string(),
            ..Default::default()
        }
    }

    /// Overlay for uploading and previewing input files
    pub fn data_upload() -> Self {
        Self {
            title: "Processing Data".to_string(),
            message: "Uploading and validating your files...".to_string(),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Whether the overlay is on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayState {
    /// Not shown
    Hidden,
    /// Shown and blocking input
    Visible,
}

/// What a UI should currently render
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayView {
    /// Visibility
    pub state: OverlayState,
    /// Heading
    pub title: String,
    /// Body text
    pub message: String,
    /// Latest progress text, if any
    pub details: Option<String>,
    /// When the overlay was last shown
    pub shown_at: Option<Instant>,
}

impl OverlayView {
    fn hidden(config: &OverlayConfig) -> Self {
        Self {
            state: OverlayState::Hidden,
            title: config.title.clone(),
            message: config.message.clone(),
            details: None,
            shown_at: None,
        }
    }

    /// Time since the overlay was shown, while it is visible
    pub fn elapsed(&self) -> Option<Duration> {
        match self.state {
            OverlayState::Visible => self.shown_at.map(|t| t.elapsed()),
            OverlayState::Hidden => None,
        }
    }
}

/// Blocking progress panel with an automatic timeout
///
/// Showing the overlay starts a timer task that hides it after
/// [`OverlayConfig::timeout`]. Hiding, showing again or dropping the overlay
/// aborts that timer, so at most one timer exists per overlay.
///
/// The timer is spawned on the current tokio runtime; outside a runtime the
/// overlay still works but never times out.
pub struct LoadingOverlay {
    config: OverlayConfig,
    view: Arc<watch::Sender<OverlayView>>,
    generation: Arc<AtomicU64>,
    timer: Option<JoinHandle<()>>,
}

impl LoadingOverlay {
    /// Hidden overlay using `config`
    pub fn new(config: OverlayConfig) -> Self {
        let (tx, _rx) = watch::channel(OverlayView::hidden(&config));
        Self {
            config,
            view: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            timer: None,
        }
    }

    /// Watch the overlay; the receiver sees every show, hide and progress change
    pub fn subscribe(&self) -> watch::Receiver<OverlayView> {
        self.view.subscribe()
    }

    /// Current view
    pub fn view(&self) -> OverlayView {
        self.view.borrow().clone()
    }

    /// Whether the overlay is on screen
    pub fn is_visible(&self) -> bool {
        self.view.borrow().state == OverlayState::Visible
    }

    /// Show with the configured message
    pub fn show(&mut self) {
        self.show_inner(self.config.message.clone());
    }

    /// Show with a different body text
    pub fn show_message(&mut self, message: impl Into<String>) {
        self.show_inner(message.into());
    }

    /// Hide and release the timer; hiding a hidden overlay does nothing
    pub fn hide(&mut self) {
        self.release_timer();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.view.send_if_modified(|view| {
            if view.state == OverlayState::Hidden {
                return false;
            }
            view.state = OverlayState::Hidden;
            view.details = None;
            view.shown_at = None;
            true
        });
    }

    /// Replace the progress text while visible
    pub fn set_details(&mut self, details: impl Into<String>) {
        let details = details.into();
        self.view.send_if_modified(|view| {
            if view.state != OverlayState::Visible || view.details.as_deref() == Some(details.as_str()) {
                return false;
            }
            view.details = Some(details);
            true
        });
    }

    fn show_inner(&mut self, message: String) {
        self.release_timer();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.view.send_replace(OverlayView {
            state: OverlayState::Visible,
            title: self.config.title.clone(),
            message,
            details: None,
            shown_at: Some(Instant::now()),
        });

        let Some(timeout) = self.config.timeout else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no tokio runtime, overlay timeout disabled");
            return;
        };

        let view = Arc::clone(&self.view);
        let current = Arc::clone(&self.generation);
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            // Checked under the channel lock so a concurrent show wins.
            let expired = view.send_if_modified(|v| {
                if current.load(Ordering::SeqCst) != generation || v.state == OverlayState::Hidden {
                    return false;
                }
                v.state = OverlayState::Hidden;
                v.details = None;
                v.shown_at = None;
                true
            });
            if expired {
                tracing::warn!(timeout = ?timeout, "loading overlay timed out");
            }
        }));
    }

    fn release_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl Drop for LoadingOverlay {
    fn drop(&mut self) {
        self.release_timer();
    }
}

impl std::fmt::Debug for LoadingOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingOverlay")
            .field("config", &self.config)
            .field("state", &self.view.borrow().state)
            .finish()
    }
}

impl ProgressSink for LoadingOverlay {
    fn on_started(&mut self, _task: &TaskHandle) {
        self.show();
    }

    fn on_progress(&mut self, _status: &TaskStatus, progress: Option<&str>) {
        if let Some(text) = progress {
            self.set_details(text);
        }
    }

    fn on_finished(&mut self, _outcome: &Result<TaskStatus>) {
        self.hide();
    }
}
