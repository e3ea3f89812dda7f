use std::io::BufRead;
use std::process::Command;
use std::process::ExitStatus;

use camino::Utf8Path;
use command_error::CommandExt;
use miette::Context;
use miette::IntoDiagnostic;

use crate::config::Config;
use crate::repository::Repository;
use crate::revision::Revision;
use crate::revision::RevisionId;
use crate::scoped_child::is_broken_pipe;
use crate::scoped_child::ScopedChild;

/// `git` CLI wrapper.
#[derive(Debug, Clone)]
pub struct Git {
    config: Config,
}

impl Git {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a `git` command.
    pub fn command(&self) -> Command {
        let mut command = Command::new("git");
        if let Some(repo) = &self.config.repo {
            command.current_dir(repo);
        }
        command
    }

    /// Run `command`, lending its stdout to `read`.
    fn stream<T>(
        &self,
        command: Command,
        accept: impl Fn(ExitStatus) -> bool,
        read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
    ) -> miette::Result<T> {
        let mut child = ScopedChild::spawn(command, self.config.verbose)?;
        let value = read(child.stdout()?)?;
        child.finish(accept)?;
        Ok(value)
    }
}

/// `git blame` exit statuses which aren't worth failing over.
///
/// We stop reading blame output after the last hunk, which kills `git` with `SIGPIPE`. Exit
/// code 128 is `git`'s generic fatal error, which includes the path not existing at the blamed
/// revision.
fn blame_status_is_expected(status: ExitStatus) -> bool {
    status.success() || is_broken_pipe(status) || status.code() == Some(128)
}

impl Repository for Git {
    fn parents(&self, revision: &RevisionId) -> miette::Result<Vec<RevisionId>> {
        Ok(self
            .command()
            .args(["rev-parse", &format!("{revision}^@")])
            .output_checked_utf8()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to get parents of {revision}"))?
            .stdout
            .lines()
            .map(|line| RevisionId::from(line.trim()))
            .collect())
    }

    fn diff<T>(
        &self,
        origin: &RevisionId,
        target: &Revision,
        read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
    ) -> miette::Result<T> {
        let mut command = self.command();
        command.args([
            "diff",
            "--unified=1",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            origin.as_str(),
        ]);
        if let Some(target) = target.id() {
            command.arg(target.as_str());
        }
        self.stream(command, |status| status.success(), read)
            .wrap_err_with(|| format!("Failed to diff {origin} against {target}"))
    }

    fn blame<T>(
        &self,
        revision: &RevisionId,
        path: &Utf8Path,
        read: impl FnOnce(&mut dyn BufRead) -> miette::Result<T>,
    ) -> miette::Result<T> {
        let mut command = self.command();
        command
            .args(["blame", "-s", revision.as_str(), "--"])
            .arg(path);
        self.stream(command, blame_status_is_expected, read)
    }

    fn summary(&self, revision: &RevisionId) -> miette::Result<String> {
        let color = if self.config.color {
            "--color=always"
        } else {
            "--color=never"
        };
        Ok(self
            .command()
            .args(["show", "--quiet", "--oneline", color, revision.as_str()])
            .output_checked_utf8()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to describe {revision}"))?
            .stdout
            .trim()
            .to_owned())
    }
}
