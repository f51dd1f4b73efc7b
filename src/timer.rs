use std::{
    io,
    ops::ControlFlow,
    sync::{
        atomic::{
            AtomicU8,
            Ordering,
        },
        Arc,
        Mutex,
    },
};

use crate::{
    clock::Clock,
    constants,
    lock,
};

/// The 60Hz countdown timer. The counter is shared with the CPU thread, which sets it while
/// the timer's own clock decrements it.
#[derive(Default)]
pub struct Timer {
    counter: Arc<AtomicU8>,
    clock: Mutex<Option<Clock>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)starts the 60Hz schedule. A schedule that is already running is cancelled first.
    pub fn start(&self) -> io::Result<()> {
        let mut clock = lock(&self.clock);
        if let Some(previous) = clock.take() {
            previous.cancel();
        }

        let counter = Arc::clone(&self.counter);
        *clock = Some(Clock::spawn("d5700-timer", constants::TIMER_PERIOD, move || {
            decrement(&counter);
            ControlFlow::Continue(())
        })?);

        Ok(())
    }

    pub fn stop(&self) {
        if let Some(clock) = lock(&self.clock).take() {
            clock.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.clock).as_ref().is_some_and(|clock| !clock.is_cancelled())
    }

    pub fn set(&self, value: u8) {
        self.counter.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> u8 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn tick(&self) {
        decrement(&self.counter);
    }
}

fn decrement(counter: &AtomicU8) {
    // None at zero leaves the counter untouched.
    let _ = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| value.checked_sub(1));
}
