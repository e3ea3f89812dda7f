mod blame;
mod cli;
mod config;
mod correlate;
mod diff;
mod dig;
mod git;
mod hunk;
mod install_tracing;
mod lines;
mod ordered_set;
mod report;
mod repository;
mod revision;
mod scoped_child;
mod unicode_tree;

use clap::CommandFactory;
use clap::Parser;
use cli::Format;
use cli::Opts;
use config::Config;
use dig::dig;
use git::Git;
use install_tracing::install_tracing;
use report::IndentedReport;
use report::JsonReport;
use report::Report;
use report::TreeReport;
use repository::Repository;
use revision::Revision;

fn main() -> miette::Result<()> {
    let opts = Opts::parse();

    if let Some(shell) = opts.completions {
        clap_complete::generate(
            shell,
            &mut Opts::command(),
            env!("CARGO_PKG_NAME"),
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    install_tracing(&opts.log_filter())?;

    let config = Config::from(&opts);
    let git = Git::new(config.clone());

    match opts.format {
        Format::Indented => run(&git, IndentedReport::new(config.color), &opts),
        Format::Tree => {
            let root = match &opts.base {
                Revision::WorkingState => "Working tree".to_owned(),
                Revision::Concrete(id) | Revision::Boundary(id) => git.summary(id)?,
            };
            run(&git, TreeReport::new(root, config.color), &opts)
        }
        Format::Json => run(&git, JsonReport, &opts),
    }
}

fn run(git: &Git, mut report: impl Report, opts: &Opts) -> miette::Result<()> {
    tracing::debug!(base = %opts.base, max_depth = opts.max_depth, "Digging");
    dig(git, &mut report, &opts.base, opts.max_depth)?;
    report.finish()
}
