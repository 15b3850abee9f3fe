use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::debug;

/// Owner of background operations started on behalf of one view.
///
/// Cancelling the scope (or dropping it) makes every handle it produced
/// yield `None`, whether or not the work already finished. Dropping also
/// joins the worker threads.
#[derive(Debug, Default)]
pub struct TaskScope {
    cancelled: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
    cancelled: Arc<AtomicBool>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<T, F>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let cancelled = Arc::clone(&self.cancelled);
        let join = thread::spawn(move || {
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            let output = task();
            if !cancelled.load(Ordering::Acquire) {
                let _ = sender.send(output);
            }
        });

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        workers.retain(|worker| !worker.is_finished());
        workers.push(join);

        TaskHandle {
            receiver,
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("task scope cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel();
        let workers = std::mem::take(
            self.workers
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes. `None` if the scope was cancelled or
    /// the task panicked.
    pub fn wait(self) -> Option<T> {
        let output = self.receiver.recv().ok()?;
        self.keep(output)
    }

    /// The output if the task already finished, without blocking.
    pub fn try_take(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(output) => self.keep(output),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn keep(&self, output: T) -> Option<T> {
        (!self.cancelled.load(Ordering::Acquire)).then_some(output)
    }
}
