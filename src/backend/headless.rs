//! In-process backend with no native window.
//!
//! Records every operation the view performs and replays scripted events, so
//! embedders can exercise the full API on build machines without a display
//! server. The paired [`HeadlessRemote`] plays the role of the page: it posts
//! events into the loop from any thread.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::backend::{BackendError, LoopWaker, ViewBackend};
use crate::config::{Rgba, ViewConfig};
use crate::dialog::DialogRequest;
use crate::event::{BackendEvent, NavigationPolicy};

#[derive(Default)]
struct Recorded {
    opened_with: Option<ViewConfig>,
    scripts: Vec<String>,
    titles: Vec<String>,
    colors: Vec<Rgba>,
    fullscreen: Vec<bool>,
    dialogs: Vec<DialogRequest>,
    dialog_answers: VecDeque<String>,
    policies: Vec<(String, NavigationPolicy)>,
    closed: bool,
}

struct Inner {
    events: Mutex<VecDeque<BackendEvent>>,
    cond: Condvar,
    recorded: Mutex<Recorded>,
}

#[derive(Default)]
pub struct HeadlessBackend {
    inner: Arc<Inner>,
    open: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            recorded: Mutex::new(Recorded::default()),
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for posting events and inspecting recorded state. Cheap to
    /// clone, safe to move to other threads.
    pub fn remote(&self) -> HeadlessRemote {
        HeadlessRemote {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ViewBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn open(&mut self, config: &ViewConfig) -> Result<(), BackendError> {
        log::debug!(
            "headless: open {}x{} url={}",
            config.width,
            config.height,
            config.effective_url()
        );
        self.inner.recorded.lock().unwrap().opened_with = Some(config.clone());
        self.open = true;
        Ok(())
    }

    fn step(&mut self, blocking: bool) -> Result<Option<BackendEvent>, BackendError> {
        if !self.open {
            return Err(BackendError::Closed);
        }
        let mut events = self.inner.events.lock().unwrap();
        if blocking {
            while events.is_empty() {
                events = self.inner.cond.wait(events).unwrap();
            }
        }
        Ok(events.pop_front())
    }

    fn eval(&mut self, js: &str) -> Result<(), BackendError> {
        if !self.open {
            return Err(BackendError::Closed);
        }
        self.inner.recorded.lock().unwrap().scripts.push(js.to_string());
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.inner.recorded.lock().unwrap().titles.push(title.to_string());
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.inner.recorded.lock().unwrap().fullscreen.push(fullscreen);
    }

    fn set_color(&mut self, color: Rgba) {
        self.inner.recorded.lock().unwrap().colors.push(color);
    }

    fn dialog(&mut self, request: &DialogRequest) -> Result<String, BackendError> {
        if !self.open {
            return Err(BackendError::Closed);
        }
        let mut recorded = self.inner.recorded.lock().unwrap();
        recorded.dialogs.push(request.clone());
        Ok(recorded.dialog_answers.pop_front().unwrap_or_default())
    }

    fn apply_navigation_policy(&mut self, url: &str, policy: NavigationPolicy) {
        self.inner
            .recorded
            .lock()
            .unwrap()
            .policies
            .push((url.to_string(), policy));
    }

    fn waker(&self) -> Arc<dyn LoopWaker> {
        Arc::new(self.remote())
    }

    fn close(&mut self) {
        log::debug!("headless: close");
        self.open = false;
        self.inner.recorded.lock().unwrap().closed = true;
        // Unpark a loop thread that is still blocked
        self.inner.cond.notify_all();
    }
}

/// The page side of a [`HeadlessBackend`].
#[derive(Clone)]
pub struct HeadlessRemote {
    inner: Arc<Inner>,
}

impl HeadlessRemote {
    /// Post an event into the loop, unparking a blocking step.
    pub fn post(&self, event: BackendEvent) {
        self.inner.events.lock().unwrap().push_back(event);
        self.inner.cond.notify_all();
    }

    /// Shorthand for posting a page-to-host message.
    pub fn post_message(&self, body: impl Into<String>) {
        self.post(BackendEvent::Message(body.into()));
    }

    /// Queue the answer the next dialog call will return.
    pub fn push_dialog_answer(&self, answer: impl Into<String>) {
        self.inner
            .recorded
            .lock()
            .unwrap()
            .dialog_answers
            .push_back(answer.into());
    }

    pub fn opened_with(&self) -> Option<ViewConfig> {
        self.inner.recorded.lock().unwrap().opened_with.clone()
    }

    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.inner.recorded.lock().unwrap().scripts.clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.inner.recorded.lock().unwrap().titles.clone()
    }

    pub fn colors(&self) -> Vec<Rgba> {
        self.inner.recorded.lock().unwrap().colors.clone()
    }

    pub fn fullscreen_states(&self) -> Vec<bool> {
        self.inner.recorded.lock().unwrap().fullscreen.clone()
    }

    pub fn dialogs(&self) -> Vec<DialogRequest> {
        self.inner.recorded.lock().unwrap().dialogs.clone()
    }

    pub fn navigation_policies(&self) -> Vec<(String, NavigationPolicy)> {
        self.inner.recorded.lock().unwrap().policies.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.recorded.lock().unwrap().closed
    }
}

impl LoopWaker for HeadlessRemote {
    fn wake(&self) {
        self.post(BackendEvent::Wake);
    }
}
