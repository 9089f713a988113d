//! The seam between the portable view and the platform web engine.
//!
//! A [`ViewBackend`] owns the native window and the embedded web-rendering
//! control. The view drives it from the loop-owning thread only; the single
//! cross-thread entry point is the [`LoopWaker`] a backend hands out, which
//! must interrupt a blocking [`ViewBackend::step`].

use std::sync::Arc;

use crate::config::{Rgba, ViewConfig};
use crate::dialog::DialogRequest;
use crate::event::{BackendEvent, NavigationPolicy};

pub mod headless;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("window initialization failed: {0}")]
    Init(String),

    #[error("script evaluation failed: {0}")]
    Eval(String),

    #[error("dialog failed: {0}")]
    Dialog(String),

    #[error("backend is closed")]
    Closed,
}

/// Interrupts a blocking loop step from another thread.
pub trait LoopWaker: Send + Sync {
    fn wake(&self);
}

/// Platform delegate contract.
///
/// Required operations map one-to-one onto the native window and web engine.
/// Capability methods have default no-op implementations so a backend only
/// implements what its platform supports.
pub trait ViewBackend {
    fn name(&self) -> &'static str;

    /// Create the native window and web view for `config` and start loading
    /// its effective URL.
    fn open(&mut self, config: &ViewConfig) -> Result<(), BackendError>;

    /// Relay one step of the host event loop. With `blocking` set, park
    /// until an event arrives; otherwise return immediately.
    fn step(&mut self, blocking: bool) -> Result<Option<BackendEvent>, BackendError>;

    /// Evaluate a script in the page context.
    fn eval(&mut self, js: &str) -> Result<(), BackendError>;

    fn set_title(&mut self, title: &str);

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn set_color(&mut self, color: Rgba);

    /// Present a modal dialog and return the user's selection or input.
    fn dialog(&mut self, request: &DialogRequest) -> Result<String, BackendError>;

    /// Answer an earlier [`BackendEvent::Navigation`]. Backends without
    /// navigation interception ignore this.
    fn apply_navigation_policy(&mut self, _url: &str, _policy: NavigationPolicy) {}

    /// A waker tied to this backend's event loop, safe to call from any
    /// thread.
    fn waker(&self) -> Arc<dyn LoopWaker>;

    /// Tear down all native resources.
    fn close(&mut self);
}
