use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::backend::headless::HeadlessBackend;
use crate::backend::ViewBackend;
use crate::bind::Binding;
use crate::config::{Rgba, ViewConfig};
use crate::dialog::{DialogFlags, DialogKind, DialogRequest};
use crate::dispatch::{DispatchHandle, DispatchQueue};
use crate::errors::ViewError;
use crate::escape::css_inject_script;
use crate::event::{BackendEvent, LoopStatus};
use crate::hooks::{NoopHooks, ViewHooks};

type MessageCallback = Box<dyn FnMut(&mut View, &str)>;

/// One window plus its embedded web view.
///
/// A view owns its backend and its dispatch queue; there is no process-wide
/// state, so an application can run any number of independent views (each on
/// its own loop-owning thread).
pub struct View {
    config: ViewConfig,
    backend: Box<dyn ViewBackend>,
    callbacks: Vec<MessageCallback>,
    hooks: Box<dyn ViewHooks>,
    dispatch: Arc<DispatchQueue>,
    opened: bool,
    exit_requested: bool,
}

impl View {
    /// A view on the default (headless) backend.
    ///
    /// ```
    /// # use hostview::{config::ViewConfig, View};
    /// let view = View::new(ViewConfig::default());
    /// assert!(!view.is_open());
    /// ```
    pub fn new(config: ViewConfig) -> Self {
        Self::with_backend(config, Box::new(HeadlessBackend::new()))
    }

    pub fn with_backend(config: ViewConfig, backend: Box<dyn ViewBackend>) -> Self {
        Self {
            config,
            backend,
            callbacks: Vec::new(),
            hooks: Box::new(NoopHooks),
            dispatch: Arc::new(DispatchQueue::new()),
            opened: false,
            exit_requested: false,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Handle for scheduling work onto the loop thread from anywhere else.
    pub fn dispatch_handle(&self) -> DispatchHandle {
        DispatchHandle::new(Arc::clone(&self.dispatch))
    }

    /// Replace the capability hooks (navigation, downloads, close).
    pub fn set_hooks(&mut self, hooks: impl ViewHooks + 'static) {
        self.hooks = Box::new(hooks);
    }

    /// Register a page-message callback. Callbacks run on the loop thread in
    /// registration order whenever the page posts through
    /// `window.external.invoke`.
    pub fn add_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut View, &str) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Validate the configured URL and open the native window.
    pub fn open(&mut self) -> Result<(), ViewError> {
        if self.opened {
            return Err(ViewError::AlreadyOpen);
        }
        let url = self.config.effective_url();
        if let Err(source) = url::Url::parse(url) {
            return Err(ViewError::InvalidUrl {
                url: url.to_string(),
                source,
            });
        }
        log::debug!(
            "opening view '{}' on {} backend",
            self.config.title,
            self.backend.name()
        );
        self.backend.open(&self.config)?;
        self.dispatch.set_waker(self.backend.waker());
        self.opened = true;
        Ok(())
    }

    /// One loop iteration: run queued dispatch jobs, pull at most one
    /// backend event and route it, report whether termination was requested.
    pub fn step(&mut self, blocking: bool) -> Result<LoopStatus, ViewError> {
        if !self.opened {
            return Err(ViewError::NotOpen);
        }
        self.drain_dispatch();
        if self.exit_requested {
            return Ok(LoopStatus::Exit);
        }
        // Jobs that raced in after the drain still land in this iteration
        let block = blocking && !self.dispatch.has_pending();
        if let Some(event) = self.backend.step(block)? {
            self.handle_event(event);
        }
        self.drain_dispatch();
        Ok(if self.exit_requested {
            LoopStatus::Exit
        } else {
            LoopStatus::Continue
        })
    }

    /// Pump the loop to completion, then tear the window down.
    pub fn run(&mut self) -> Result<(), ViewError> {
        if !self.opened {
            self.open()?;
        }
        while self.step(true)? == LoopStatus::Continue {}
        self.exit();
        Ok(())
    }

    /// Evaluate a script in the page context.
    pub fn eval(&mut self, js: &str) -> Result<(), ViewError> {
        if !self.opened {
            return Err(ViewError::NotOpen);
        }
        self.backend.eval(js)?;
        Ok(())
    }

    /// Escape `css`, wrap it into the injection helper and evaluate it. The
    /// evaluation result is the result of the whole operation.
    pub fn inject_css(&mut self, css: &str) -> Result<(), ViewError> {
        self.eval(&css_inject_script(css.as_bytes()))
    }

    pub fn set_title(&mut self, title: &str) {
        self.config.title = title.to_string();
        if self.opened {
            self.backend.set_title(title);
        }
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.opened {
            self.backend.set_fullscreen(fullscreen);
        }
    }

    pub fn set_color(&mut self, color: Rgba) {
        if self.opened {
            self.backend.set_color(color);
        }
    }

    /// Present a modal dialog and return the user's selection or input.
    pub fn dialog(
        &mut self,
        kind: DialogKind,
        flags: DialogFlags,
        title: &str,
        arg: &str,
    ) -> Result<String, ViewError> {
        if !self.opened {
            return Err(ViewError::NotOpen);
        }
        let request = DialogRequest {
            kind,
            flags,
            title: title.to_string(),
            arg: arg.to_string(),
        };
        Ok(self.backend.dialog(&request)?)
    }

    /// Install a [`Binding`]: declare its page-side stub object, push the
    /// initial data sync, and register the callback that dispatches incoming
    /// RPC payloads and re-syncs after each successful call.
    pub fn bind<T>(&mut self, binding: Binding<T>) -> Result<(), ViewError>
    where
        T: serde::Serialize + 'static,
    {
        let stub = binding.stub_script();
        let initial_sync = binding.sync_script()?;
        let cell = Rc::new(RefCell::new(binding));
        self.add_callback(move |view, payload| {
            let mut binding = cell.borrow_mut();
            if binding.call(payload) {
                match binding.sync_script() {
                    Ok(js) => {
                        if let Err(e) = view.eval(&js) {
                            log::error!("binding '{}': sync failed: {}", binding.name(), e);
                        }
                    }
                    Err(e) => {
                        log::error!("binding '{}': serialization failed: {}", binding.name(), e)
                    }
                }
            }
        });
        self.eval(&stub)?;
        self.eval(&initial_sync)?;
        Ok(())
    }

    /// Cooperative termination: observed by the next [`View::step`]. Safe to
    /// call from a dispatch job; from other threads go through
    /// [`DispatchHandle::terminate`].
    pub fn terminate(&mut self) {
        log::debug!("termination requested");
        self.exit_requested = true;
    }

    /// Tear down the native window and release backend resources.
    pub fn exit(&mut self) {
        if self.opened {
            self.backend.close();
            self.opened = false;
        }
    }

    fn drain_dispatch(&mut self) {
        loop {
            let jobs = self.dispatch.take_jobs();
            if jobs.is_empty() {
                break;
            }
            for job in jobs {
                job(self);
            }
        }
    }

    fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Message(body) => {
                log::debug!("page message: {}", body);
                // Move the callback list out so callbacks can borrow the view
                let mut callbacks = std::mem::take(&mut self.callbacks);
                for callback in callbacks.iter_mut() {
                    callback(self, &body);
                }
                // Callbacks registered while running go behind the originals
                callbacks.extend(self.callbacks.drain(..));
                self.callbacks = callbacks;
            }
            BackendEvent::Navigation { url } => {
                let policy = self.hooks.on_navigation(&url);
                log::debug!("navigation to {} -> {:?}", url, policy);
                self.backend.apply_navigation_policy(&url, policy);
            }
            BackendEvent::Download(download) => {
                self.hooks.on_download(&download);
            }
            BackendEvent::CloseRequested => {
                if self.hooks.on_close() {
                    self.exit_requested = true;
                }
            }
            BackendEvent::Wake => {}
        }
    }
}

/// Run a window to completion: the one-shot convenience entry point.
pub fn run(
    title: &str,
    url: &str,
    width: u32,
    height: u32,
    resizable: bool,
) -> Result<(), ViewError> {
    let mut view = View::new(ViewConfig {
        title: title.to_string(),
        url: url.to_string(),
        width,
        height,
        resizable,
        debug: false,
    });
    view.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessBackend, HeadlessRemote};
    use crate::event::{DownloadEvent, NavigationPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    fn headless_view(config: ViewConfig) -> (View, HeadlessRemote) {
        let backend = HeadlessBackend::new();
        let remote = backend.remote();
        (View::with_backend(config, Box::new(backend)), remote)
    }

    #[test]
    fn open_validates_the_url() {
        let (mut view, _remote) = headless_view(ViewConfig {
            url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(view.open(), Err(ViewError::InvalidUrl { .. })));
        assert!(!view.is_open());
    }

    #[test]
    fn open_twice_fails() {
        let (mut view, _remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        assert!(matches!(view.open(), Err(ViewError::AlreadyOpen)));
    }

    #[test]
    fn operations_require_an_open_view() {
        let (mut view, _remote) = headless_view(ViewConfig::default());
        assert!(matches!(view.eval("1+1"), Err(ViewError::NotOpen)));
        assert!(matches!(view.step(false), Err(ViewError::NotOpen)));
        assert!(matches!(
            view.dialog(DialogKind::Alert, DialogFlags::INFO, "t", "m"),
            Err(ViewError::NotOpen)
        ));
    }

    #[test]
    fn backend_sees_the_configured_document() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        let opened = remote.opened_with().unwrap();
        assert_eq!(opened.effective_url(), crate::config::DEFAULT_URL);
    }

    #[test]
    fn inject_css_evaluates_the_wrapped_script() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        view.inject_css("a{color:red}").unwrap();

        let scripts = remote.evaluated_scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0], css_inject_script(b"a{color:red}"));
    }

    #[test]
    fn setters_reach_the_backend() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        view.set_title("renamed");
        view.set_fullscreen(true);
        view.set_color(Rgba::new(255, 0, 0, 255));

        assert_eq!(remote.titles(), vec!["renamed".to_string()]);
        assert_eq!(remote.fullscreen_states(), vec![true]);
        assert_eq!(remote.colors(), vec![Rgba::new(255, 0, 0, 255)]);
        assert_eq!(view.config().title, "renamed");
    }

    #[test]
    fn messages_reach_callbacks_in_registration_order() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            view.add_callback(move |_, body| {
                seen.borrow_mut().push(format!("{}:{}", tag, body));
            });
        }
        view.open().unwrap();
        remote.post_message("ping");
        assert_eq!(view.step(true).unwrap(), LoopStatus::Continue);

        assert_eq!(
            *seen.borrow(),
            vec!["first:ping".to_string(), "second:ping".to_string()]
        );
    }

    #[test]
    fn callbacks_can_evaluate_scripts() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.add_callback(|view, body| {
            let js = format!("echo(\"{}\")", body);
            view.eval(&js).unwrap();
        });
        view.open().unwrap();
        remote.post_message("hi");
        view.step(true).unwrap();

        assert_eq!(remote.evaluated_scripts(), vec!["echo(\"hi\")".to_string()]);
    }

    #[test]
    fn navigation_policy_flows_back_to_the_backend() {
        struct DenyAll;
        impl ViewHooks for DenyAll {
            fn on_navigation(&mut self, _url: &str) -> NavigationPolicy {
                NavigationPolicy::Deny
            }
        }

        let (mut view, remote) = headless_view(ViewConfig::default());
        view.set_hooks(DenyAll);
        view.open().unwrap();
        remote.post(BackendEvent::Navigation {
            url: "https://example.com/next".to_string(),
        });
        view.step(true).unwrap();

        assert_eq!(
            remote.navigation_policies(),
            vec![(
                "https://example.com/next".to_string(),
                NavigationPolicy::Deny
            )]
        );
    }

    #[test]
    fn downloads_reach_the_hooks() {
        struct Capture(Rc<RefCell<Vec<DownloadEvent>>>);
        impl ViewHooks for Capture {
            fn on_download(&mut self, event: &DownloadEvent) {
                self.0.borrow_mut().push(event.clone());
            }
        }

        let events = Rc::new(RefCell::new(Vec::new()));
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.set_hooks(Capture(Rc::clone(&events)));
        view.open().unwrap();
        remote.post(BackendEvent::Download(DownloadEvent::Started {
            url: "https://example.com/f.bin".to_string(),
        }));
        view.step(true).unwrap();

        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn close_request_exits_the_loop() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        remote.post(BackendEvent::CloseRequested);
        assert_eq!(view.step(true).unwrap(), LoopStatus::Exit);
    }

    #[test]
    fn close_request_can_be_vetoed() {
        struct KeepOpen;
        impl ViewHooks for KeepOpen {
            fn on_close(&mut self) -> bool {
                false
            }
        }

        let (mut view, remote) = headless_view(ViewConfig::default());
        view.set_hooks(KeepOpen);
        view.open().unwrap();
        remote.post(BackendEvent::CloseRequested);
        assert_eq!(view.step(true).unwrap(), LoopStatus::Continue);
    }

    #[test]
    fn terminate_is_observed_by_the_next_step() {
        let (mut view, _remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        view.terminate();
        assert_eq!(view.step(false).unwrap(), LoopStatus::Exit);
    }

    #[test]
    fn dispatch_runs_exactly_once_on_the_loop_thread() {
        let (mut view, _remote) = headless_view(ViewConfig::default());
        view.open().unwrap();

        let loop_thread = thread::current().id();
        let runs = Arc::new(AtomicUsize::new(0));
        let seen_thread = Arc::new(Mutex::new(None));

        let handle = view.dispatch_handle();
        let job_runs = Arc::clone(&runs);
        let job_thread = Arc::clone(&seen_thread);
        let dispatcher = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.dispatch(move |view| {
                job_runs.fetch_add(1, Ordering::SeqCst);
                *job_thread.lock().unwrap() = Some(thread::current().id());
                view.terminate();
            });
        });

        // The loop is parked in a blocking step; the dispatch must wake it
        while view.step(true).unwrap() == LoopStatus::Continue {}
        dispatcher.join().unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(*seen_thread.lock().unwrap(), Some(loop_thread));
        // Nothing left behind
        assert_eq!(view.step(false).unwrap(), LoopStatus::Exit);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn terminate_handle_stops_a_parked_loop() {
        let (mut view, _remote) = headless_view(ViewConfig::default());
        view.open().unwrap();

        let handle = view.dispatch_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.terminate();
        });

        while view.step(true).unwrap() == LoopStatus::Continue {}
        stopper.join().unwrap();
    }

    #[test]
    fn run_tears_down_after_the_window_closes() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        let closer = remote.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.post(BackendEvent::CloseRequested);
        });

        view.run().unwrap();
        t.join().unwrap();
        assert!(!view.is_open());
        assert!(remote.is_closed());
    }

    #[test]
    fn dialog_round_trips_through_the_backend() {
        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        remote.push_dialog_answer("/home/user/file.css");

        let answer = view
            .dialog(DialogKind::Open, DialogFlags::empty(), "Pick a file", "")
            .unwrap();
        assert_eq!(answer, "/home/user/file.css");

        let dialogs = remote.dialogs();
        assert_eq!(dialogs.len(), 1);
        assert_eq!(dialogs[0].kind, DialogKind::Open);
        assert_eq!(dialogs[0].title, "Pick a file");
    }

    #[test]
    fn bind_installs_stub_sync_and_rpc_dispatch() {
        #[derive(serde::Serialize, Default)]
        struct Counter {
            count: i64,
        }

        let (mut view, remote) = headless_view(ViewConfig::default());
        view.open().unwrap();
        view.bind(
            Binding::new("counter", Counter::default()).method("add", 1, |c: &mut Counter, p| {
                let Some(n) = p[0].as_i64() else { return false };
                c.count += n;
                true
            }),
        )
        .unwrap();

        // Stub declaration plus the initial data sync
        let scripts = remote.evaluated_scripts();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].contains("counter.add = function(a0)"));
        assert!(scripts[1].starts_with("counter.data={\"count\":0}"));

        remote.post_message(r#"{"scope":"counter","method":"add","params":[5]}"#);
        view.step(true).unwrap();
        let scripts = remote.evaluated_scripts();
        assert!(scripts.last().unwrap().starts_with("counter.data={\"count\":5}"));

        // A payload the binding rejects does not re-sync
        remote.post_message(r#"{"scope":"other","method":"add","params":[5]}"#);
        view.step(true).unwrap();
        assert_eq!(remote.evaluated_scripts().len(), scripts.len());
    }
}
