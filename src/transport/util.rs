use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Sleep for `ms` milliseconds in short steps, returning early once `stop` is raised.
pub fn sleep_interruptible(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(50);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}
