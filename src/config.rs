use std::io::IsTerminal;

use camino::Utf8PathBuf;

use crate::cli::ColorChoice;
use crate::cli::Opts;

/// Settings shared by the parts of the program that talk to `git` or print output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Directory to run `git` in, if not the current one.
    pub repo: Option<Utf8PathBuf>,
    /// Forward `git`'s stderr.
    pub verbose: bool,
    /// Colorize output.
    pub color: bool,
}

impl From<&Opts> for Config {
    fn from(opts: &Opts) -> Self {
        Self {
            repo: opts.repo.clone(),
            verbose: opts.verbose,
            color: match opts.color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => std::io::stdout().is_terminal(),
            },
        }
    }
}
