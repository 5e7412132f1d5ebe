//! Keyboard interrupt handling.
//!
//! The SIGINT handler does nothing but raise a flag. The interpreter polls
//! the flag whenever a blocking read or wait returns, and only then prints the
//! help text and records the synthetic history entry, on the main flow.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Flag shared with the installed handler; set once, on first install.
static HANDLER_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_interrupt(_signal: libc::c_int) {
    if let Some(flag) = HANDLER_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Source of pending keyboard interrupts.
#[derive(Debug, Clone, Default)]
pub struct SignalController {
    pending: Arc<AtomicBool>,
    installed: bool,
}

impl SignalController {
    /// A controller that is not yet connected to any signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the SIGINT handler for this process.
    ///
    /// `SA_RESTART` is left out on purpose, so blocked `read`/`waitpid` calls
    /// return `EINTR` and the caller gets a chance to poll.
    pub fn install(&mut self) -> nix::Result<()> {
        self.pending = Arc::clone(HANDLER_FLAG.get_or_init(|| Arc::clone(&self.pending)));
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::empty(),
            SigSet::empty(),
        );
        // SAFETY: the handler only performs an atomic store.
        unsafe { sigaction(Signal::SIGINT, &action) }?;
        self.installed = true;
        debug!("SIGINT handler installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Mark an interrupt as pending without a signal, e.g. when the line
    /// editor itself reports Ctrl-C.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Consume the pending interrupt, if any.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}
