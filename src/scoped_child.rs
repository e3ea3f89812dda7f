use std::io::BufReader;
use std::process::Child;
use std::process::ChildStdout;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

use command_error::ChildContext;
use command_error::ChildExt;
use command_error::CommandExt;
use miette::miette;
use miette::IntoDiagnostic;

/// A child process whose stdout is read as a stream.
///
/// The child is always waited for: either by [`ScopedChild::finish`], or by killing it when
/// dropped.
#[derive(Debug)]
pub struct ScopedChild {
    child: ChildContext<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    reaped: bool,
}

impl ScopedChild {
    /// Spawn `command` with stdout piped. Stderr is discarded unless `forward_stderr` is set.
    pub fn spawn(mut command: Command, forward_stderr: bool) -> miette::Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if forward_stderr {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .spawn_checked()
            .into_diagnostic()?;
        tracing::trace!(command = %child.command(), "Spawned");

        let stdout = child.child_mut().stdout.take().map(BufReader::new);
        Ok(Self {
            child,
            stdout,
            reaped: false,
        })
    }

    pub fn stdout(&mut self) -> miette::Result<&mut BufReader<ChildStdout>> {
        let command = self.child.command();
        self.stdout
            .as_mut()
            .ok_or_else(|| miette!("Stdout of `{command}` is not available"))
    }

    /// Close stdout and wait for the child to exit.
    ///
    /// Closing stdout before the child has written everything kills it with `SIGPIPE`; `accept`
    /// decides which exit statuses are not errors.
    pub fn finish(mut self, accept: impl Fn(ExitStatus) -> bool) -> miette::Result<ExitStatus> {
        drop(self.stdout.take());
        let result = self.child.wait_checked_with(|status| {
            if accept(status) {
                Ok(())
            } else {
                Err(None::<String>)
            }
        });
        self.reaped = true;
        result.into_diagnostic()
    }
}

impl Drop for ScopedChild {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        drop(self.stdout.take());
        let command = self.child.command().to_string();
        if let Err(error) = self.child.child_mut().kill() {
            tracing::debug!(%command, %error, "Failed to kill child");
        }
        if let Err(error) = self.child.child_mut().wait() {
            tracing::debug!(%command, %error, "Failed to wait for child");
        }
    }
}

/// Whether a process was killed for writing to a closed pipe.
#[cfg(unix)]
pub fn is_broken_pipe(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    const SIGPIPE: i32 = 13;
    status.signal() == Some(SIGPIPE)
}

#[cfg(not(unix))]
pub fn is_broken_pipe(_status: ExitStatus) -> bool {
    false
}
