use crate::command::ExitCode;
use crate::error::ShellError;
use crate::lexer::CommandLine;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork, write};
use std::borrow::Cow;
use std::ffi::{CStr, CString, OsStr};
use std::io::Write;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exit status of a child whose program could not be started.
pub const EXEC_FAILURE: ExitCode = 1;

const ANY_CHILD: Pid = Pid::from_raw(-1);

type ForkFn = unsafe fn() -> nix::Result<ForkResult>;

/// What happened to a launched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A foreground child ran to completion.
    Exited(ExitCode),
    /// The child was left running; it is reaped by a later sweep.
    Background(Pid),
}

/// Forks, execs and waits for external commands.
///
/// There is no job table: background children are only known to the kernel
/// until [`Supervisor::reap_zombies`] collects them.
#[derive(Debug)]
pub struct Supervisor {
    reaped: usize,
    fork: ForkFn,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self { reaped: 0, fork }
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A supervisor that creates children through `fork` instead of the real one.
    #[cfg(test)]
    pub(crate) fn with_fork(fork: ForkFn) -> Self {
        Self { reaped: 0, fork }
    }

    /// Run `line` as a child process.
    ///
    /// `on_interrupt` is called whenever the foreground wait is cut short by a
    /// signal, before the wait is resumed. Finished children are swept up after
    /// every attempt, including a failed fork.
    pub fn launch(
        &mut self,
        line: &CommandLine,
        on_interrupt: &mut dyn FnMut(),
    ) -> Result<Outcome, ShellError> {
        let res = self.spawn_and_wait(line, on_interrupt);
        self.reap_zombies();
        res
    }

    fn spawn_and_wait(
        &mut self,
        line: &CommandLine,
        on_interrupt: &mut dyn FnMut(),
    ) -> Result<Outcome, ShellError> {
        let argv = to_argv(&line.tokens)?;
        // Anything still buffered would otherwise be written by both processes.
        let _ = std::io::stdout().flush();

        // SAFETY: the child only execs or reports the failure and exits.
        match unsafe { (self.fork)() } {
            Ok(ForkResult::Child) => exec_child(&argv),
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, background = line.background, "launched {:?}", line.tokens);
                if line.background {
                    Ok(Outcome::Background(child))
                } else {
                    wait_for(child, on_interrupt).map(Outcome::Exited)
                }
            }
            Err(e) => {
                warn!("fork failed: {}", e);
                Err(ShellError::os("fork", e))
            }
        }
    }

    /// Collect every child that has already terminated, without blocking.
    ///
    /// Returns how many were reaped by this sweep.
    pub fn reap_zombies(&mut self) -> usize {
        let mut count = 0;
        loop {
            match waitpid(ANY_CHILD, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => {
                    debug!(?status, "reaped child");
                    count += 1;
                }
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    warn!("reaping children failed: {}", e);
                    break;
                }
            }
        }
        self.reaped += count;
        count
    }

    /// Total number of children collected by sweeps so far.
    pub fn reaped(&self) -> usize {
        self.reaped
    }
}

fn to_argv(tokens: &[String]) -> Result<Vec<CString>, ShellError> {
    if tokens.is_empty() {
        return Err(ShellError::os("exec", Errno::ENOENT));
    }
    tokens
        .iter()
        .map(|t| CString::new(t.as_bytes()).map_err(|_| ShellError::os(t.clone(), Errno::EINVAL)))
        .collect()
}

/// Replace the child image, or report why that failed and exit at once.
fn exec_child(argv: &[CString]) -> ! {
    let err = match execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    // Straight to fd 1: the `Stdout` lock may have been held by another thread at fork time.
    report_exec_failure(std::io::stdout(), &argv[0], err);
    // SAFETY: `_exit` skips atexit handlers and buffers that belong to the parent.
    unsafe { libc::_exit(EXEC_FAILURE) }
}

/// Write `<name>: <description>\n` to `fd` without allocating.
fn report_exec_failure<Fd: AsFd>(fd: Fd, name: &CStr, err: Errno) {
    let fd = fd.as_fd();
    let parts: [&[u8]; 4] = [name.to_bytes(), b": ", err.desc().as_bytes(), b"\n"];
    for part in parts {
        if write(fd, part).is_err() {
            return;
        }
    }
}

fn wait_for(child: Pid, on_interrupt: &mut dyn FnMut()) -> Result<ExitCode, ShellError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(status) => debug!(?status, "child changed state"),
            Err(Errno::EINTR) => on_interrupt(),
            Err(e) => {
                warn!(pid = %child, "waiting for child failed: {}", e);
                return Err(ShellError::os("waitpid", e));
            }
        }
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - `./foo`: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() || path.starts_with("./") {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_process;
    use std::thread;
    use std::time::Duration;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn launch(line: &str) -> Result<Outcome, ShellError> {
        Supervisor::new().launch(&CommandLine::parse(line), &mut || {})
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path).expect("Expected to find /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nowhere:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting_cmd_xyz"));
        assert!(res.is_none());
    }

    #[test]
    fn relative_path_with_components() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("bin")).unwrap();
        std::fs::File::create(tmp.path().join("bin").join("tool")).unwrap();

        let _lock = lock_process();
        let cwd_before = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let nested = find_command_path(osstr("/bin"), Path::new("bin/tool")).is_some();
        let dotted = find_command_path(osstr("/bin"), Path::new("./bin/tool")).is_some();
        let missing = find_command_path(osstr("/bin"), Path::new("./nope")).is_none();
        std::env::set_current_dir(&cwd_before).ok();

        assert!(nested);
        assert!(dotted);
        assert!(missing);
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn foreground_reports_exit_code() {
        let _lock = lock_process();
        assert_eq!(launch("true").unwrap(), Outcome::Exited(0));
        assert_eq!(launch("false").unwrap(), Outcome::Exited(1));
    }

    #[test]
    fn missing_program_exits_child_only() {
        let _lock = lock_process();
        let res = launch("definitely_not_a_real_program_1234").unwrap();
        assert_eq!(res, Outcome::Exited(EXEC_FAILURE));
    }

    #[test]
    fn exec_failure_message_names_program() {
        use std::io::{Read, Seek};

        let mut file = tempfile::tempfile().unwrap();
        let name = CString::new("no_such_tool").unwrap();
        report_exec_failure(&file, &name, Errno::ENOENT);

        file.rewind().unwrap();
        let mut written = String::new();
        file.read_to_string(&mut written).unwrap();
        assert_eq!(written, "no_such_tool: No such file or directory\n");
    }

    #[test]
    fn fork_failure_is_reported_as_error() {
        let _lock = lock_process();
        let mut supervisor = Supervisor::with_fork(crate::test_support::failing_fork);
        let err = supervisor
            .launch(&CommandLine::parse("true"), &mut || {})
            .unwrap_err();
        assert!(matches!(
            err,
            ShellError::Os {
                source: Errno::EAGAIN,
                ..
            }
        ));
        assert!(err.to_string().starts_with("fork: "));
    }

    #[test]
    fn background_child_is_reaped_later() {
        let _lock = lock_process();
        let mut supervisor = Supervisor::new();

        let outcome = supervisor
            .launch(&CommandLine::parse("true &"), &mut || {})
            .unwrap();
        assert!(matches!(outcome, Outcome::Background(_)));

        // Give the child time to finish, then sweep until it shows up.
        let mut reaped = supervisor.reaped();
        for _ in 0..50 {
            if reaped > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(20));
            reaped += supervisor.reap_zombies();
        }
        assert_eq!(reaped, 1);

        // Nothing left: the sweep must return immediately.
        assert_eq!(supervisor.reap_zombies(), 0);
    }

    #[test]
    fn background_does_not_block() {
        let _lock = lock_process();
        let mut supervisor = Supervisor::new();
        let started = std::time::Instant::now();
        let outcome = supervisor
            .launch(&CommandLine::parse("sleep 1 &"), &mut || {})
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(900));

        let Outcome::Background(pid) = outcome else {
            panic!("expected background outcome");
        };
        // Clean up so later sweeps in other tests do not see it.
        waitpid(pid, None).unwrap();
    }

    #[test]
    fn nul_byte_in_argument_is_rejected() {
        let line = CommandLine {
            tokens: vec!["echo".into(), "a\0b".into()],
            background: false,
        };
        let _lock = lock_process();
        assert!(Supervisor::new().launch(&line, &mut || {}).is_err());
    }
}
