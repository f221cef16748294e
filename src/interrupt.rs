//! Interrupt (SIGINT) handling for the read loop.
//!
//! The signal handler never transfers control. It records that an interrupt
//! arrived, and the read loop checks for that record at the top of every
//! iteration, abandoning whatever was being typed and prompting again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// How often [`InterruptController::settle`] looks at the pending flag.
const SETTLE_POLL: Duration = Duration::from_millis(2);

/// Process-wide interrupt state.
///
/// The controller starts unarmed. Interrupts that arrive before [`arm`] is
/// called (or after [`disarm`]) are dropped, so startup can be interrupted
/// without the loop ever seeing a stale request.
///
/// [`arm`]: InterruptController::arm
/// [`disarm`]: InterruptController::disarm
#[derive(Debug, Default)]
pub struct InterruptController {
    armed: AtomicBool,
    pending: AtomicBool,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the process SIGINT handler, which forwards to [`raise`].
    ///
    /// `ctrlc` installs the handler with `SA_RESTART`, so blocking calls such
    /// as waiting for a child are resumed rather than failing with `EINTR`.
    /// It can only succeed once per process.
    ///
    /// [`raise`]: InterruptController::raise
    pub fn install(self: &Arc<Self>) -> Result<(), ctrlc::Error> {
        let controller = Arc::clone(self);
        ctrlc::set_handler(move || controller.raise())
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Stops reacting to interrupts and forgets any that are pending.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Records an interrupt. Does nothing while unarmed.
    pub fn raise(&self) {
        if !self.is_armed() {
            log::debug!("interrupt ignored, controller is not armed");
            return;
        }
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Returns whether an interrupt arrived since the last call.
    pub fn poll_and_clear(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Waits up to `timeout` for an interrupt to be recorded, without
    /// clearing it.
    ///
    /// A SIGINT sent to the foreground group reaches the child and the shell
    /// at once, but the handler thread may record it only after the child
    /// has already been reaped. Settling first keeps that late record from
    /// surfacing one line later.
    pub fn settle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.pending.load(Ordering::SeqCst) {
                return true;
            }
            if !self.is_armed() || Instant::now() >= deadline {
                return false;
            }
            thread::sleep(SETTLE_POLL);
        }
    }
}
