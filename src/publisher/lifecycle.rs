//! Finish/stop state machine shared by the publishing loops.
//!
//! Two independent flag groups, each behind its own lock: finish state
//! (cooperative shutdown) and stop state (pause/resume, orthogonal to
//! shutdown). Only [`LifecycleController::try_stop`] holds both locks, so
//! unrelated readers never contend with each other.

use parking_lot::Mutex;

#[derive(Default)]
struct FinishState {
    requested: bool,
    finished: bool,
}

#[derive(Default)]
struct StopState {
    requested: bool,
    stopped: bool,
}

/// Thread-safe lifecycle flags for the publishing loops.
pub struct LifecycleController {
    finish: Mutex<FinishState>,
    stop: Mutex<StopState>,
}

impl LifecycleController {
    /// A controller in the not-yet-running state: finished and stopped,
    /// with no requests pending.
    pub fn new() -> Self {
        Self {
            finish: Mutex::new(FinishState {
                requested: false,
                finished: true,
            }),
            stop: Mutex::new(StopState {
                requested: false,
                stopped: true,
            }),
        }
    }

    /// Loop owner: clear finished/stopped as the loops come up.
    pub fn start(&self) {
        self.finish.lock().finished = false;
        self.stop.lock().stopped = false;
    }

    /// Request cooperative shutdown. Irreversible: there is no
    /// un-request operation.
    pub fn request_finish(&self) {
        self.finish.lock().requested = true;
    }

    pub fn is_finish_requested(&self) -> bool {
        self.finish.lock().requested
    }

    /// Loop owner: called once after all publishing loops have exited.
    pub fn mark_finished(&self) {
        self.finish.lock().finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finish.lock().finished
    }

    /// Request a pause. No-op if already stopped.
    pub fn request_stop(&self) {
        let mut stop = self.stop.lock();
        if !stop.stopped {
            stop.requested = true;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.lock().stopped
    }

    /// Grant a pending stop request, unless finish has been requested.
    ///
    /// Holds both locks for the transition: finish takes precedence over
    /// stop, and a request is consumed exactly once. Returns whether the
    /// stop was granted; calling after a finish request is defined
    /// behavior (refusal), not an error.
    pub fn try_stop(&self) -> bool {
        let mut stop = self.stop.lock();
        let finish = self.finish.lock();

        if finish.requested {
            return false;
        }
        if stop.requested {
            stop.stopped = true;
            stop.requested = false;
            return true;
        }
        false
    }

    /// Resume from a stop. The caller guarantees this does not race a
    /// fresh `request_stop`/`try_stop` pair; that contract is not enforced
    /// here.
    pub fn release(&self) {
        self.stop.lock().stopped = false;
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_finished_and_stopped() {
        let lc = LifecycleController::new();
        assert!(lc.is_finished());
        assert!(lc.is_stopped());
        assert!(!lc.is_finish_requested());
    }

    #[test]
    fn test_start_clears_finished_and_stopped() {
        let lc = LifecycleController::new();
        lc.start();
        assert!(!lc.is_finished());
        assert!(!lc.is_stopped());
    }

    #[test]
    fn test_finish_request_then_mark_finished() {
        let lc = LifecycleController::new();
        lc.start();
        lc.request_finish();
        assert!(lc.is_finish_requested());
        assert!(!lc.is_finished());
        lc.mark_finished();
        assert!(lc.is_finished());
    }

    #[test]
    fn test_try_stop_without_request_does_nothing() {
        let lc = LifecycleController::new();
        lc.start();
        assert!(!lc.try_stop());
        assert!(!lc.is_stopped());
    }

    #[test]
    fn test_stop_granted_exactly_once() {
        let lc = LifecycleController::new();
        lc.start();
        lc.request_stop();
        assert!(!lc.is_stopped());

        assert!(lc.try_stop());
        assert!(lc.is_stopped());
        // The request was consumed; a second grant needs a new request.
        assert!(!lc.try_stop());
    }

    #[test]
    fn test_finish_wins_over_stop() {
        let lc = LifecycleController::new();
        lc.start();
        lc.request_stop();
        lc.request_finish();
        assert!(!lc.try_stop());
        assert!(!lc.is_stopped());
    }

    #[test]
    fn test_request_stop_is_noop_while_stopped() {
        let lc = LifecycleController::new();
        lc.start();
        lc.request_stop();
        assert!(lc.try_stop());

        // Already stopped: a new request is ignored.
        lc.request_stop();
        lc.release();
        assert!(!lc.is_stopped());
        assert!(!lc.try_stop());
    }

    #[test]
    fn test_release_resumes() {
        let lc = LifecycleController::new();
        lc.start();
        lc.request_stop();
        assert!(lc.try_stop());
        lc.release();
        assert!(!lc.is_stopped());
    }
}
