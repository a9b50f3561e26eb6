use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token shared between the signal handler and a mode driver.
///
/// Starts running; [`RunFlag::stop`] flips it once and it never runs again.
/// Clones observe the same state.
#[derive(Debug, Clone)]
pub struct RunFlag {
    running: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopping_is_shared_and_permanent() {
        let flag = RunFlag::new();
        let handle = flag.clone();
        assert!(flag.is_running());

        handle.stop();
        assert!(!flag.is_running());
        handle.stop();
        assert!(!flag.is_running());
    }

    #[test]
    fn stop_crosses_threads() {
        let flag = RunFlag::new();
        let handle = flag.clone();
        std::thread::spawn(move || handle.stop()).join().unwrap();
        assert!(!flag.is_running());
    }
}
