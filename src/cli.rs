use camino::Utf8PathBuf;
use clap::Parser;
use clap::ValueEnum;

use crate::revision::Revision;

/// Find the commits a change depends on.
///
/// By default, compares the working tree against `HEAD`. Given a base revision, compares that
/// revision against each of its parents. The lines each change touches are blamed to find the
/// commits which last modified them; those commits are then dug into in turn.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
#[command(max_term_width = 100, disable_help_subcommand = true)]
pub struct Opts {
    /// Log filter directives, of the form `target[span{field=value}]=level`, where all components
    /// except the level are optional.
    ///
    /// Try `debug` or `trace`.
    #[arg(long, default_value = "info", env = "GIT_DIG_LOG")]
    pub log: String,

    /// Show `git` errors and trace every command and line read.
    #[arg(short, long)]
    pub verbose: bool,

    /// The revision to dig from. `WORKING` is the uncommitted working tree.
    #[arg(short, long, default_value = Revision::WORKING)]
    pub base: Revision,

    /// How many levels of dependencies to dig through.
    #[arg(short, long, default_value_t = 1)]
    pub max_depth: usize,

    /// Run as if started in this directory.
    #[arg(short = 'C', long)]
    pub repo: Option<Utf8PathBuf>,

    /// How to print dependencies.
    #[arg(short, long, value_enum, default_value_t = Format::Indented)]
    pub format: Format,

    /// When to use color.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print shell completions and exit.
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}

impl Opts {
    /// Log filter directives, including those implied by `--verbose`.
    pub fn log_filter(&self) -> String {
        if self.verbose {
            format!("{},git_dig=trace", self.log)
        } else {
            self.log.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One line per dependency, indented four spaces per level.
    Indented,
    /// A tree drawn with box-drawing characters.
    Tree,
    /// One JSON object per dependency per line.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Use color when printing to a terminal.
    Auto,
    Always,
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use crate::revision::RevisionId;

    #[test]
    fn test_opts_debug_assert() {
        Opts::command().debug_assert();
    }

    #[test]
    fn test_opts_defaults() {
        let opts = Opts::try_parse_from(["git-dig"]).unwrap();
        assert_eq!(opts.base, Revision::WorkingState);
        assert_eq!(opts.max_depth, 1);
        assert_eq!(opts.format, Format::Indented);
        assert_eq!(opts.log_filter(), "info");
    }

    #[test]
    fn test_opts_base() {
        let opts =
            Opts::try_parse_from(["git-dig", "-b", "HEAD~1", "-m", "3", "--verbose"]).unwrap();
        assert_eq!(opts.base, Revision::Concrete(RevisionId::from("HEAD~1")));
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.log_filter(), "info,git_dig=trace");
    }
}
