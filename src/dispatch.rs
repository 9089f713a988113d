//! Cross-thread scheduling onto the loop-owning thread.
//!
//! Any thread may push a job through a [`DispatchHandle`]; the view drains
//! the queue at every loop iteration, so each job runs exactly once on the
//! thread pumping the loop, never concurrently with other loop work.

use std::sync::{Arc, Mutex};

use crate::backend::LoopWaker;
use crate::view::View;

type Job = Box<dyn FnOnce(&mut View) + Send>;

#[derive(Default)]
pub struct DispatchQueue {
    jobs: Mutex<Vec<Job>>,
    waker: Mutex<Option<Arc<dyn LoopWaker>>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed when the backend opens; wakes a blocking loop step so a
    /// freshly pushed job is not stuck behind an empty event queue.
    pub(crate) fn set_waker(&self, waker: Arc<dyn LoopWaker>) {
        *self.waker.lock().unwrap() = Some(waker);
    }

    pub(crate) fn push(&self, job: Job) {
        self.jobs.lock().unwrap().push(job);
        if let Some(waker) = self.waker.lock().unwrap().as_ref() {
            waker.wake();
        }
    }

    /// Take all queued jobs, leaving the queue empty.
    pub(crate) fn take_jobs(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }

    pub fn has_pending(&self) -> bool {
        !self.jobs.lock().unwrap().is_empty()
    }
}

/// Cheap, cloneable, `Send + Sync` entry point for scheduling work on the
/// loop thread from anywhere else.
#[derive(Clone)]
pub struct DispatchHandle {
    queue: Arc<DispatchQueue>,
}

impl DispatchHandle {
    pub(crate) fn new(queue: Arc<DispatchQueue>) -> Self {
        Self { queue }
    }

    /// Schedule `f` to run on the loop thread at the next loop iteration.
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce(&mut View) + Send + 'static,
    {
        self.queue.push(Box::new(f));
    }

    /// Request cooperative termination from any thread.
    pub fn terminate(&self) {
        self.dispatch(|view| view.terminate());
    }
}
