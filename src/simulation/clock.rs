use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// A repeating task. Returning `ControlFlow::Break` stops further ticks.
pub type Task = Box<dyn FnMut() -> ControlFlow<()> + Send>;

/// Source of periodic ticks driving a running simulation.
pub trait Scheduler {
    fn schedule_repeating(&self, interval: Duration, task: Task) -> TickHandle;
}

/// Handle on a scheduled task. Cancelling more than once has no further effect.
#[derive(Clone, Debug, Default)]
pub struct TickHandle {
    cancelled: Arc<AtomicBool>,
}

impl TickHandle {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("tick cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs each task on its own thread. The next tick is only waited for once the current
/// one has returned, so ticks of one task never overlap.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: Task) -> TickHandle {
        let handle = TickHandle::new();
        let thread_handle = handle.clone();

        let spawned = thread::Builder::new()
            .name("simulation-clock".to_string())
            .spawn(move || loop {
                thread::sleep(interval);
                if thread_handle.is_cancelled() || task().is_break() {
                    break;
                }
            });
        if let Err(error) = spawned {
            warn!(%error, "could not start simulation clock");
            handle.cancel();
        }

        handle
    }
}

/// Scheduler whose ticks are fired explicitly by the host, e.g. once per rendered frame.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<(TickHandle, Task)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    /// Run every live task once. Returns how many tasks ran.
    pub fn fire(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|(handle, _)| !handle.is_cancelled());
        let fired = tasks.len();
        for (handle, task) in tasks.iter_mut() {
            if task().is_break() {
                handle.cancel();
            }
        }
        tasks.retain(|(handle, _)| !handle.is_cancelled());

        fired
    }

    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|(handle, _)| !handle.is_cancelled())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, _interval: Duration, task: Task) -> TickHandle {
        let handle = TickHandle::new();
        self.tasks.lock().push((handle.clone(), task));
        handle
    }
}
