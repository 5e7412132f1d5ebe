use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that change the working directory, fork children, or
/// install the SIGINT handler.
///
/// Child sweeps use `waitpid(-1)`, which would otherwise steal children
/// from a concurrently running test.
pub(crate) fn lock_process() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Stand-in for `fork` that always fails as if the process table were full.
pub(crate) unsafe fn failing_fork() -> nix::Result<nix::unistd::ForkResult> {
    Err(nix::errno::Errno::EAGAIN)
}
