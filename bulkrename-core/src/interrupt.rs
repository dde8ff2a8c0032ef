use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the signal handlers once the user asked to stop.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set while a commit is past the point where it can stop cleanly.
static COMMIT_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

pub fn request_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn interrupt_requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn clear_interrupt() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// RAII helper that marks a commit as non-cancellable while it is in scope.
pub struct CommitInFlightGuard;

impl CommitInFlightGuard {
    pub fn activate() -> Self {
        COMMIT_IN_FLIGHT.store(true, Ordering::SeqCst);
        Self
    }
}

impl Drop for CommitInFlightGuard {
    fn drop(&mut self) {
        COMMIT_IN_FLIGHT.store(false, Ordering::SeqCst);
    }
}

/// True while storage is being renamed and re-linked.
pub fn commit_in_flight() -> bool {
    COMMIT_IN_FLIGHT.load(Ordering::SeqCst)
}
