use std::{
    io,
    ops::ControlFlow,
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    thread::{
        self,
        JoinHandle,
    },
    time::{
        Duration,
        Instant,
    },
};

use log::debug;

/// A repeating task on a dedicated thread, fired at a fixed rate.
///
/// The task runs once immediately and then once per `period` until either the clock is
/// cancelled or the task returns [`ControlFlow::Break`]. Cancelling never waits for the
/// thread: a firing already in progress completes, and the thread exits before the next one.
/// Dropping a `Clock` cancels it.
pub struct Clock {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Clock {
    pub fn spawn<F>(name: &str, period: Duration, mut task: F) -> io::Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = thread::Builder::new().name(name.to_owned()).spawn(move || {
            let mut deadline = Instant::now();
            while !flag.load(Ordering::Acquire) {
                if task().is_break() {
                    break;
                }

                deadline += period;
                let now = Instant::now();
                if deadline > now {
                    spin_sleep::sleep(deadline - now);
                } else {
                    // Overran the period; drop the missed firings instead of bursting.
                    deadline = now;
                }
            }
            debug!("{} clock stopped", thread::current().name().unwrap_or("unnamed"));
        })?;

        Ok(Self { cancelled, handle })
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel();
    }
}
