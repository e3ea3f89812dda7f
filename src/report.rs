use calm_io::stdoutln;
use miette::IntoDiagnostic;
use owo_colors::OwoColorize;

use crate::revision::RevisionId;
use crate::unicode_tree::Tree;

/// A commit found while digging.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub revision: RevisionId,
    /// One-line description of the commit.
    pub summary: String,
    /// How many dependencies deep this was found; direct dependencies are at depth 0.
    pub depth: usize,
    /// The commit is at the edge of the explorable history and wasn't dug into.
    pub boundary: bool,
    /// The commit was already reported (and dug into) elsewhere.
    pub already_followed: bool,
}

const ALREADY_FOLLOWED: &str = "(already followed)";

impl Dependency {
    fn label(&self, color: bool) -> String {
        if !self.already_followed {
            self.summary.clone()
        } else if color {
            format!("{} {}", self.summary, ALREADY_FOLLOWED.green())
        } else {
            format!("{} {ALREADY_FOLLOWED}", self.summary)
        }
    }
}

/// Receives dependencies as they're found, depth-first.
pub trait Report {
    fn dependency(&mut self, dependency: Dependency) -> miette::Result<()>;

    /// Called once digging is done.
    fn finish(&mut self) -> miette::Result<()> {
        Ok(())
    }
}

impl Report for Vec<Dependency> {
    fn dependency(&mut self, dependency: Dependency) -> miette::Result<()> {
        self.push(dependency);
        Ok(())
    }
}

/// Prints each dependency on its own line, indented by depth.
#[derive(Debug)]
pub struct IndentedReport {
    color: bool,
}

impl IndentedReport {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn format(&self, dependency: &Dependency) -> String {
        format!(
            "{}{}",
            "    ".repeat(dependency.depth),
            dependency.label(self.color)
        )
    }
}

impl Report for IndentedReport {
    fn dependency(&mut self, dependency: Dependency) -> miette::Result<()> {
        let _ = stdoutln!("{}", self.format(&dependency));
        Ok(())
    }
}

/// Prints a tree of dependencies once they've all been found.
#[derive(Debug)]
pub struct TreeReport {
    root: String,
    color: bool,
    nodes: Vec<(usize, String)>,
}

impl TreeReport {
    pub fn new(root: impl Into<String>, color: bool) -> Self {
        Self {
            root: root.into(),
            color,
            nodes: Vec::new(),
        }
    }

    fn tree(&self) -> Tree {
        Tree::from_preorder(
            &self.root,
            self.nodes.iter().map(|(depth, label)| (*depth, label)),
        )
    }
}

impl Report for TreeReport {
    fn dependency(&mut self, dependency: Dependency) -> miette::Result<()> {
        self.nodes
            .push((dependency.depth, dependency.label(self.color)));
        Ok(())
    }

    fn finish(&mut self) -> miette::Result<()> {
        let tree = self.tree();
        let _ = calm_io::stdout!("{tree}");
        Ok(())
    }
}

/// Prints each dependency as a line of JSON.
#[derive(Debug, Default)]
pub struct JsonReport;

impl Report for JsonReport {
    fn dependency(&mut self, dependency: Dependency) -> miette::Result<()> {
        let json = serde_json::to_string(&dependency).into_diagnostic()?;
        let _ = stdoutln!("{json}");
        Ok(())
    }
}
