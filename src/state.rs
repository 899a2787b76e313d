use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub enabled: bool,
    pub last_real_input: Instant,
}

/// Feature toggle and idle clock shared between the control plane, the
/// input-forwarding path and the scheduler.
///
/// Both fields live behind one lock so the scheduler always sees a pair that
/// was current at the same moment.
#[derive(Debug)]
pub struct JigglerState {
    inner: Mutex<StateSnapshot>,
}

impl Default for JigglerState {
    fn default() -> Self {
        Self::new(false, Instant::now())
    }
}

impl JigglerState {
    pub fn new(enabled: bool, last_real_input: Instant) -> Self {
        Self {
            inner: Mutex::new(StateSnapshot {
                enabled,
                last_real_input,
            }),
        }
    }

    // A poisoned lock still holds a usable snapshot; these values are advisory.
    fn lock(&self) -> MutexGuard<'_, StateSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn report_real_input(&self, at: Instant) {
        self.lock().last_real_input = at;
    }

    pub fn report_real_input_now(&self) {
        self.report_real_input(Instant::now());
    }

    pub fn snapshot(&self) -> StateSnapshot {
        *self.lock()
    }
}

/// Blocks the scheduler until process configuration has been loaded.
#[derive(Debug, Default)]
pub struct ReadyGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        *self.ready.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.cond.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait until the gate opens. Returns `false` if `stop` was raised first.
    pub fn wait_ready(&self, stop: &AtomicBool) -> bool {
        let mut ready = self.ready.lock().unwrap_or_else(|e| e.into_inner());
        while !*ready {
            if stop.load(Ordering::SeqCst) {
                return false;
            }
            ready = match self.cond.wait_timeout(ready, Duration::from_millis(50)) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }
}
