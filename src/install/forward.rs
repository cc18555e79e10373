//! Forwarding an invocation to the installed executable.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use log::debug;

use crate::error::{LauncherError, Result};

/// Argument vector and standard streams for one forwarded run.
///
/// Streams are inherited from the launcher unless overridden.
#[derive(Debug)]
pub struct Invocation {
    args: Vec<OsString>,
    stdin: Stdio,
    stdout: Stdio,
    stderr: Stdio,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: Stdio::inherit(),
            stdout: Stdio::inherit(),
            stderr: Stdio::inherit(),
        }
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn stdin(mut self, stdin: impl Into<Stdio>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn stdout(mut self, stdout: impl Into<Stdio>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn stderr(mut self, stderr: impl Into<Stdio>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// How a forwarded child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Normal exit with this status code.
    Code(i32),
    /// Killed by this signal number (Unix only).
    Signal(i32),
}

impl Exit {
    /// Shell-style exit code; a signal death maps to `128 + signal`.
    pub fn code(self) -> i32 {
        match self {
            Exit::Code(code) => code,
            Exit::Signal(signal) => 128 + signal,
        }
    }

    /// End the current process the same way the child ended.
    ///
    /// A signal death is reproduced by re-raising the signal with its default
    /// disposition, so a parent shell sees a signal rather than an exit code.
    /// Falls back to [`Exit::code`] if the process survives the signal.
    pub fn exit_process(self) -> ! {
        #[cfg(unix)]
        {
            if let Exit::Signal(signal) = self {
                reraise(signal);
            }
        }
        std::process::exit(self.code())
    }
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Exit::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Exit::Signal(signal);
            }
        }

        Exit::Code(1)
    }
}

#[cfg(unix)]
fn reraise(signal: i32) {
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    let Ok(sig) = Signal::try_from(signal) else {
        return;
    };
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    // SAFETY: installs SIG_DFL, which runs no code in signal context.
    if let Err(e) = unsafe { signal::sigaction(sig, &default) } {
        log::warn!("Failed to reset {sig:?} handler: {e}");
        return;
    }
    let mut mask = SigSet::empty();
    mask.add(sig);
    if let Err(e) = mask.thread_unblock() {
        log::warn!("Failed to unblock {sig:?}: {e}");
    }
    if let Err(e) = signal::raise(sig) {
        log::warn!("Failed to raise {sig:?}: {e}");
    }
}

/// Run `binary` with the invocation's arguments and streams, wait for it, and
/// report how it terminated.
pub async fn forward(binary: &Path, invocation: Invocation) -> Result<Exit> {
    debug!("Forwarding {:?} to {}", invocation.args, binary.display());

    let mut child = tokio::process::Command::new(binary)
        .args(&invocation.args)
        .stdin(invocation.stdin)
        .stdout(invocation.stdout)
        .stderr(invocation.stderr)
        .spawn()
        .map_err(LauncherError::execution(binary))?;

    // Set up after spawn: ignored dispositions would otherwise be inherited
    // by the child across exec.
    let _interrupts = InterruptGuard::ignore();

    let status = child.wait().await.map_err(LauncherError::execution(binary))?;
    debug!("{} exited with {status}", binary.display());
    Ok(Exit::from(status))
}

/// Keeps the launcher alive through terminal interrupts while the child runs.
///
/// SIGINT and SIGQUIT reach the whole foreground process group, so the child
/// gets them directly; the launcher ignores them and then reports the child's
/// status. Previous dispositions are restored on drop.
#[cfg(unix)]
struct InterruptGuard {
    previous: Vec<(nix::sys::signal::Signal, nix::sys::signal::SigAction)>,
}

#[cfg(unix)]
impl InterruptGuard {
    fn ignore() -> Self {
        use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let mut previous = Vec::new();
        for sig in [Signal::SIGINT, Signal::SIGQUIT] {
            // SAFETY: installs SIG_IGN, which runs no code in signal context.
            match unsafe { signal::sigaction(sig, &ignore) } {
                Ok(old) => previous.push((sig, old)),
                Err(e) => log::warn!("Failed to ignore {sig:?} while forwarding: {e}"),
            }
        }
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        for (sig, old) in self.previous.drain(..).rev() {
            // SAFETY: restores the disposition that was in place before `ignore`.
            if let Err(e) = unsafe { nix::sys::signal::sigaction(sig, &old) } {
                log::warn!("Failed to restore {sig:?} handler: {e}");
            }
        }
    }
}

#[cfg(not(unix))]
struct InterruptGuard;

#[cfg(not(unix))]
impl InterruptGuard {
    fn ignore() -> Self {
        Self
    }
}
